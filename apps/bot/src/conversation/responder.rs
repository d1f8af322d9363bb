//! Free-form chat: recent history plus the new message, answered by the model.

use std::sync::Arc;

use tracing::{error, warn};

use crate::llm_client::prompts::{CHAT_MAX_TOKENS, CHAT_SYSTEM};
use crate::llm_client::{ChatTurn, CompletionRequest, LanguageModel};
use crate::models::chat::{ChatEntryRow, Role};
use crate::replies;
use crate::store::ChatStore;

/// History entries fetched per reply, the freshly recorded message included.
pub const HISTORY_LIMIT: i64 = 6;

#[derive(Clone)]
pub struct Responder {
    store: Arc<dyn ChatStore>,
    llm: Arc<dyn LanguageModel>,
}

impl Responder {
    pub fn new(store: Arc<dyn ChatStore>, llm: Arc<dyn LanguageModel>) -> Self {
        Self { store, llm }
    }

    /// Callers must record `message` as the newest user entry before calling:
    /// the newest history entry is dropped and `message` re-appended in its place.
    pub async fn respond(&self, phone_number: &str, message: &str) -> String {
        let history = self.chronological_history(phone_number).await;
        let request = CompletionRequest {
            system: Some(CHAT_SYSTEM.to_string()),
            turns: build_turns(&history, message),
            max_tokens: CHAT_MAX_TOKENS,
        };

        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                error!("Chat completion failed for {phone_number}: {e}");
                replies::CHAT_FALLBACK.to_string()
            }
        }
    }

    async fn chronological_history(&self, phone_number: &str) -> Vec<ChatEntryRow> {
        match self.store.recent_chat(phone_number, HISTORY_LIMIT).await {
            Ok(mut entries) => {
                entries.reverse();
                entries
            }
            Err(e) => {
                warn!("Failed to load chat history for {phone_number}: {e}");
                Vec::new()
            }
        }
    }
}

/// All but the newest history entry, then `message` as the final user turn.
pub fn build_turns(history: &[ChatEntryRow], message: &str) -> Vec<ChatTurn> {
    let prior = history.split_last().map(|(_, rest)| rest).unwrap_or_default();
    prior
        .iter()
        .map(|entry| ChatTurn {
            role: entry.role(),
            content: entry.message.clone(),
        })
        .chain(std::iter::once(ChatTurn {
            role: Role::User,
            content: message.to_string(),
        }))
        .collect()
}
