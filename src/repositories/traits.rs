//! Repository traits shared by the messaging tables
//!
//! Threads, participations and messages are append-mostly: a thread is only
//! renamed, a participation is closed instead of removed and a message never
//! changes. Batch reads and writes that need a transaction live on the
//! repositories themselves.

/// Inserts one row and hands back the stored entity
///
/// # Type Parameters
/// * `Entity` - Stored row, carrying the id and defaults SQLite filled in
/// * `CreateDTO` - Caller-provided columns
pub trait Create<Entity, CreateDTO> {
    /// Inserts the row with `INSERT ... RETURNING`
    ///
    /// # Arguments
    /// * `data` - Columns of the new row
    ///
    /// # Returns
    /// * `Ok(Entity)` - The stored row
    /// * `Err(sqlx::Error)` - Constraint violation or connection failure
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Point lookup by primary key
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(None)` - No row with that key
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Partial update of a mutable row
///
/// # Type Parameters
/// * `UpdateDTO` - Columns to change, `None` leaving a column untouched
pub trait Update<Entity, UpdateDTO, Id> {
    /// Applies the changes and returns the row as stored afterwards
    ///
    /// # Arguments
    /// * `id` - Primary key of the row
    /// * `data` - Changed columns; an empty update returns the current row
    ///
    /// # Returns
    /// * `Ok(Entity)` - Row after the update
    /// * `Err(sqlx::Error::RowNotFound)` - No row with that key
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}
