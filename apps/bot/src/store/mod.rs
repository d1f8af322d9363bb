//! Persistence seam for users, chat history and reminders.
//!
//! The webhook, workers and poller only see `Arc<dyn ChatStore>`; `PgStore`
//! is the production backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::chat::{ChatEntryRow, Role};
use crate::models::reminder::ReminderRow;
use crate::models::user::UserRow;

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Records a sender. First sight sets `created_at`; later calls only
    /// move `last_interaction`. Returns the stored row.
    async fn upsert_user(&self, phone_number: &str, now: i64) -> Result<UserRow, StoreError>;

    /// Appends one history entry. `timestamp_ms` is epoch milliseconds.
    async fn append_chat(
        &self,
        phone_number: &str,
        timestamp_ms: i64,
        role: Role,
        message: &str,
    ) -> Result<(), StoreError>;

    /// Up to `limit` entries for the sender, newest first.
    async fn recent_chat(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<ChatEntryRow>, StoreError>;

    /// Writes a reminder, overwriting any reminder with the same id.
    async fn put_reminder(&self, reminder: &ReminderRow) -> Result<(), StoreError>;

    /// Exact-match lookup on the delivery second.
    async fn reminders_at(&self, remind_at: i64) -> Result<Vec<ReminderRow>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_reminder(&self, reminder_id: &str) -> Result<bool, StoreError>;
}
