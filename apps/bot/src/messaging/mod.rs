//! Outbound WhatsApp delivery and inbound media download (Twilio), plus
//! the TwiML reply format returned to the webhook.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod twilio;
pub mod twiml;

pub use twilio::TwilioClient;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Downloaded attachment.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Bytes,
    /// MIME type reported by the media host, if any.
    pub content_type: Option<String>,
}

/// One-way push message to a WhatsApp recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError>;
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, MessagingError>;
}
