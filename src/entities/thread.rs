//! Thread entity - Conversation container

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Thread {
    pub thread_id: i64,
    // informational only, never used to resolve a thread
    pub name: Option<String>,
}

impl Thread {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Thread {}", self.thread_id),
        }
    }
}
