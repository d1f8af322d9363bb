use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A WhatsApp sender, keyed by the transport's phone identifier
/// (e.g. `whatsapp:+905551112233`). Times are epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserRow {
    pub phone_number: String,
    pub created_at: i64,
    pub last_interaction: i64,
}
