use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::chat::{ChatEntryRow, Role};
use crate::models::reminder::ReminderRow;
use crate::models::user::UserRow;
use crate::store::{ChatStore, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn upsert_user(&self, phone_number: &str, now: i64) -> Result<UserRow, StoreError> {
        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO whatsapp_users (phone_number, created_at, last_interaction)
            VALUES ($1, $2, $2)
            ON CONFLICT (phone_number) DO UPDATE SET last_interaction = EXCLUDED.last_interaction
            RETURNING phone_number, created_at, last_interaction
            "#,
        )
        .bind(phone_number)
        .bind(now)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn append_chat(
        &self,
        phone_number: &str,
        timestamp_ms: i64,
        role: Role,
        message: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO chat_history (phone_number, timestamp_ms, role, message) VALUES ($1, $2, $3, $4)",
        )
        .bind(phone_number)
        .bind(timestamp_ms)
        .bind(role.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_chat(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<ChatEntryRow>, StoreError> {
        Ok(sqlx::query_as::<_, ChatEntryRow>(
            r#"
            SELECT phone_number, timestamp_ms, role, message
            FROM chat_history
            WHERE phone_number = $1
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(phone_number)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn put_reminder(&self, reminder: &ReminderRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reminders (reminder_id, phone_number, remind_at, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (reminder_id) DO UPDATE SET
                phone_number = EXCLUDED.phone_number,
                remind_at = EXCLUDED.remind_at,
                message = EXCLUDED.message,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&reminder.reminder_id)
        .bind(&reminder.phone_number)
        .bind(reminder.remind_at)
        .bind(&reminder.message)
        .bind(reminder.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reminders_at(&self, remind_at: i64) -> Result<Vec<ReminderRow>, StoreError> {
        Ok(sqlx::query_as::<_, ReminderRow>(
            "SELECT reminder_id, phone_number, remind_at, message, created_at FROM reminders WHERE remind_at = $1",
        )
        .bind(remind_at)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reminders WHERE reminder_id = $1")
            .bind(reminder_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
