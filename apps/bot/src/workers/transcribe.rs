//! Voice notes: download → S3 → transcription → chat reply.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::conversation::{record_chat, Responder};
use crate::media::{AudioFormat, ObjectStore, Transcriber};
use crate::messaging::{MediaFetcher, Notifier};
use crate::models::chat::Role;
use crate::queue::TranscribeJob;
use crate::replies;
use crate::store::ChatStore;
use crate::workers::{WorkerError, WorkerOutcome};

pub struct TranscribeWorker {
    store: Arc<dyn ChatStore>,
    responder: Responder,
    notifier: Arc<dyn Notifier>,
    fetcher: Arc<dyn MediaFetcher>,
    objects: Arc<dyn ObjectStore>,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscribeWorker {
    pub fn new(
        store: Arc<dyn ChatStore>,
        responder: Responder,
        notifier: Arc<dyn Notifier>,
        fetcher: Arc<dyn MediaFetcher>,
        objects: Arc<dyn ObjectStore>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            store,
            responder,
            notifier,
            fetcher,
            objects,
            transcriber,
        }
    }

    pub async fn run(&self, job: &TranscribeJob) -> WorkerOutcome {
        info!("Transcribing audio for {}: {}", job.phone_number, job.audio_url);
        match self.transcribe(job).await {
            Ok(()) => WorkerOutcome::Completed,
            Err(e) => {
                error!("Transcription failed for {}: {e}", job.phone_number);
                if let Err(e) = self
                    .notifier
                    .send(&job.phone_number, replies::VOICE_FAILED)
                    .await
                {
                    warn!("Could not tell {} about the failure: {e}", job.phone_number);
                }
                WorkerOutcome::Failed
            }
        }
    }

    async fn transcribe(&self, job: &TranscribeJob) -> Result<(), WorkerError> {
        let media = self.fetcher.fetch(&job.audio_url).await?;
        let format = AudioFormat::from_mime(media.content_type.as_deref());
        let key = format!("audio/{}.{}", Uuid::new_v4(), format.extension());
        let content_type = media.content_type.as_deref().unwrap_or("audio/ogg");
        self.objects.put(&key, media.bytes, content_type).await?;

        let transcript = self
            .transcriber
            .transcribe(self.objects.bucket(), &key, format)
            .await?;
        if transcript.trim().is_empty() {
            return Err(WorkerError::EmptyTranscript);
        }
        info!("Transcript for {}: {transcript:?}", job.phone_number);

        // Recorded before asking the responder, which replaces the newest entry.
        record_chat(self.store.as_ref(), &job.phone_number, Role::User, &transcript).await;
        let answer = self.responder.respond(&job.phone_number, &transcript).await;

        let message = replies::voice_report(&transcript, &answer);
        self.notifier.send(&job.phone_number, &message).await?;
        record_chat(self.store.as_ref(), &job.phone_number, Role::Assistant, &message).await;
        Ok(())
    }
}
