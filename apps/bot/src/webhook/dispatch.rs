//! Message classification and the reply pipeline for one inbound message.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::conversation::{record_chat, record_user, Responder};
use crate::errors::AppError;
use crate::models::chat::Role;
use crate::queue::{JobQueue, QueueError, WorkerJob};
use crate::reminders::{contains_trigger, handle_reminder_request};
use crate::replies;
use crate::store::ChatStore;

/// Form fields of a Twilio WhatsApp webhook; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: String,
    #[serde(rename = "MediaContentType0", default)]
    pub media_type: String,
}

impl InboundMessage {
    /// Text stored in history for the inbound side.
    fn logged_text(&self) -> &str {
        if self.body.is_empty() {
            replies::MEDIA_PLACEHOLDER
        } else {
            &self.body
        }
    }
}

/// Where a message goes. First match wins, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Transcribe { audio_url: &'a str },
    AnalyzeImage { image_url: &'a str },
    UnsupportedMedia,
    Reminder,
    Chat,
}

pub fn classify(inbound: &InboundMessage) -> Route<'_> {
    if !inbound.media_url.is_empty() {
        if inbound.media_type.contains("audio") {
            Route::Transcribe {
                audio_url: &inbound.media_url,
            }
        } else if inbound.media_type.contains("image") {
            Route::AnalyzeImage {
                image_url: &inbound.media_url,
            }
        } else {
            Route::UnsupportedMedia
        }
    } else if contains_trigger(&inbound.body) {
        Route::Reminder
    } else {
        Route::Chat
    }
}

pub struct Dispatcher {
    store: Arc<dyn ChatStore>,
    queue: Arc<dyn JobQueue>,
    responder: Responder,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ChatStore>, queue: Arc<dyn JobQueue>, responder: Responder) -> Self {
        Self {
            store,
            queue,
            responder,
        }
    }

    /// Records the sender and message, computes the reply, records the reply.
    ///
    /// Recording is best-effort. An `Err` means the reply could not be
    /// computed at all; nothing further is recorded in that case.
    pub async fn handle(&self, inbound: &InboundMessage) -> Result<String, AppError> {
        if inbound.from.trim().is_empty() {
            return Err(AppError::Validation("webhook without a sender".to_string()));
        }
        let phone_number = inbound.from.as_str();

        record_user(self.store.as_ref(), phone_number).await;
        record_chat(
            self.store.as_ref(),
            phone_number,
            Role::User,
            inbound.logged_text(),
        )
        .await;

        let reply = self.reply_to(inbound).await?;

        record_chat(self.store.as_ref(), phone_number, Role::Assistant, &reply).await;
        Ok(reply)
    }

    async fn reply_to(&self, inbound: &InboundMessage) -> Result<String, AppError> {
        let phone_number = inbound.from.as_str();
        match classify(inbound) {
            Route::Transcribe { audio_url } => {
                self.delegate(
                    WorkerJob::transcribe_audio(phone_number, audio_url),
                    replies::AUDIO_ACK,
                    replies::AUDIO_ENQUEUE_FAILED,
                )
                .await
            }
            Route::AnalyzeImage { image_url } => {
                self.delegate(
                    WorkerJob::analyze_image(phone_number, image_url),
                    replies::IMAGE_ACK,
                    replies::IMAGE_ENQUEUE_FAILED,
                )
                .await
            }
            Route::UnsupportedMedia => {
                info!(
                    "Unsupported media type '{}' from {phone_number}",
                    inbound.media_type
                );
                Ok(replies::UNSUPPORTED_MEDIA.to_string())
            }
            Route::Reminder => Ok(handle_reminder_request(
                self.store.as_ref(),
                phone_number,
                &inbound.body,
                Utc::now().timestamp(),
            )
            .await),
            Route::Chat => Ok(self.responder.respond(phone_number, &inbound.body).await),
        }
    }

    /// Hands the job to its worker without waiting for it. The worker answers
    /// the sender directly, possibly before this request returns.
    async fn delegate(
        &self,
        job: WorkerJob,
        ack: &str,
        unavailable: &str,
    ) -> Result<String, AppError> {
        let queue_name = job.queue_name();
        match self.queue.enqueue(job).await {
            Ok(()) => {
                info!("Job handed to {queue_name}");
                Ok(ack.to_string())
            }
            Err(QueueError::Redis(e)) => {
                warn!("Could not reach {queue_name}: {e}");
                Ok(unavailable.to_string())
            }
            Err(e) => Err(AppError::Queue(e)),
        }
    }
}
