//! Query DTOs - Query string parameters

use serde::{Deserialize, Serialize};

/// Query parameters of `GET /messages`
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LatestMessagesQuery {
    #[serde(default)]
    pub check_notifications: Option<bool>,
}

/// Query parameters of paginated lists (pages start at 1)
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
}
