use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Who authored a chat entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Anything that is not literally `user` is treated as the assistant.
    pub fn from_db(raw: &str) -> Self {
        if raw == "user" {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatEntryRow {
    pub phone_number: String,
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
    pub role: String,
    pub message: String,
}

impl ChatEntryRow {
    pub fn role(&self) -> Role {
        Role::from_db(&self.role)
    }
}
