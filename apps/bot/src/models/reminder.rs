use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pending reminder. Existing in storage means PENDING; delivery deletes it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ReminderRow {
    pub reminder_id: String,
    pub phone_number: String,
    /// Target delivery time, epoch seconds.
    pub remind_at: i64,
    pub message: String,
    pub created_at: i64,
}

impl ReminderRow {
    pub fn new(phone_number: &str, remind_at: i64, message: String, created_at: i64) -> Self {
        Self {
            reminder_id: reminder_id(phone_number, remind_at),
            phone_number: phone_number.to_string(),
            remind_at,
            message,
            created_at,
        }
    }
}

/// Composite identifier. Two reminders for the same sender and second share it.
pub fn reminder_id(phone_number: &str, remind_at: i64) -> String {
    format!("{phone_number}_{remind_at}")
}
