//! Participant entity - Mirror of an externally issued user id

use serde::{Deserialize, Serialize};

/// A participant only carries the id handed out by the identity provider.
/// Rows are created on first contact and never deleted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Participant {
    pub participant_id: i64,
}
