//! Image pipeline: download → S3 → label detection → narration → reply.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::conversation::record_chat;
use crate::llm_client::prompts::{describe_labels_prompt, DESCRIBE_MAX_TOKENS};
use crate::llm_client::{CompletionRequest, LanguageModel};
use crate::media::{Label, LabelDetector, ObjectStore};
use crate::messaging::{MediaFetcher, Notifier};
use crate::models::chat::Role;
use crate::queue::ImageJob;
use crate::replies;
use crate::store::ChatStore;
use crate::workers::{WorkerError, WorkerOutcome};

pub const MAX_LABELS: i32 = 10;
pub const MIN_CONFIDENCE: f32 = 70.0;

pub struct ImageWorker {
    store: Arc<dyn ChatStore>,
    llm: Arc<dyn LanguageModel>,
    notifier: Arc<dyn Notifier>,
    fetcher: Arc<dyn MediaFetcher>,
    objects: Arc<dyn ObjectStore>,
    labels: Arc<dyn LabelDetector>,
}

impl ImageWorker {
    pub fn new(
        store: Arc<dyn ChatStore>,
        llm: Arc<dyn LanguageModel>,
        notifier: Arc<dyn Notifier>,
        fetcher: Arc<dyn MediaFetcher>,
        objects: Arc<dyn ObjectStore>,
        labels: Arc<dyn LabelDetector>,
    ) -> Self {
        Self {
            store,
            llm,
            notifier,
            fetcher,
            objects,
            labels,
        }
    }

    pub async fn run(&self, job: &ImageJob) -> WorkerOutcome {
        info!("Analyzing image for {}: {}", job.phone_number, job.image_url);
        match self.analyze(job).await {
            Ok(()) => WorkerOutcome::Completed,
            Err(e) => {
                error!("Image analysis failed for {}: {e}", job.phone_number);
                if let Err(e) = self
                    .notifier
                    .send(&job.phone_number, replies::IMAGE_FAILED)
                    .await
                {
                    warn!("Could not tell {} about the failure: {e}", job.phone_number);
                }
                WorkerOutcome::Failed
            }
        }
    }

    async fn analyze(&self, job: &ImageJob) -> Result<(), WorkerError> {
        let media = self.fetcher.fetch(&job.image_url).await?;
        let key = format!("images/{}.jpg", Uuid::new_v4());
        let content_type = media.content_type.as_deref().unwrap_or("image/jpeg");
        self.objects.put(&key, media.bytes, content_type).await?;

        let labels = self
            .labels
            .detect_labels(self.objects.bucket(), &key, MAX_LABELS, MIN_CONFIDENCE)
            .await?;
        let labels_text = join_label_names(&labels);
        info!("Detected labels for {}: {labels_text}", job.phone_number);
        for label in &labels {
            debug!("{}: {:.1}%", label.name, label.confidence);
        }

        let narration = self.narrate(&labels_text).await;
        let message = replies::image_report(&narration, &labels_text);
        self.notifier.send(&job.phone_number, &message).await?;

        record_chat(
            self.store.as_ref(),
            &job.phone_number,
            Role::User,
            replies::IMAGE_PLACEHOLDER,
        )
        .await;
        record_chat(self.store.as_ref(), &job.phone_number, Role::Assistant, &message).await;
        Ok(())
    }

    async fn narrate(&self, labels_text: &str) -> String {
        let request =
            CompletionRequest::single_turn(describe_labels_prompt(labels_text), DESCRIBE_MAX_TOKENS);
        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Label narration failed: {e}");
                replies::NARRATION_FALLBACK.to_string()
            }
        }
    }
}

pub fn join_label_names(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
