//! Media workers. Each job is consumed from the Redis queue, handled once and
//! answered directly to the sender; failures are never retried.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::media::MediaError;
use crate::messaging::MessagingError;
use crate::queue::{JobSource, WorkerJob};

pub mod image;
pub mod transcribe;

pub use image::ImageWorker;
pub use transcribe::TranscribeWorker;

/// Seconds a single `BRPOP` blocks before looping.
const POP_TIMEOUT_SECS: u64 = 5;
/// Pause after the queue itself errors, so a dead Redis does not spin the loop.
const QUEUE_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("transcript was empty")]
    EmptyTranscript,
}

/// Reported to the invoker (the loop); nobody acts on it beyond logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed,
    Failed,
}

#[derive(Clone)]
pub struct Workers {
    pub image: Arc<ImageWorker>,
    pub transcribe: Arc<TranscribeWorker>,
}

impl Workers {
    pub async fn run(&self, job: WorkerJob) -> WorkerOutcome {
        match job {
            WorkerJob::AnalyzeImage(job) => self.image.run(&job).await,
            WorkerJob::TranscribeAudio(job) => self.transcribe.run(&job).await,
        }
    }
}

/// Pops jobs forever, running each on its own task with at most
/// `max_in_flight` jobs running at once.
pub async fn run_worker_loop(source: Arc<dyn JobSource>, workers: Workers, max_in_flight: usize) {
    let permits = Arc::new(Semaphore::new(max_in_flight));
    info!("Media workers started (max {max_in_flight} jobs in flight)");
    loop {
        // Taken before popping, so a job never sits popped while waiting.
        let Ok(permit) = permits.clone().acquire_owned().await else {
            error!("Worker permits closed; stopping");
            return;
        };

        let (queue, payload) = match source.next_job(POP_TIMEOUT_SECS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                error!("Worker queue unavailable: {e}");
                tokio::time::sleep(QUEUE_ERROR_PAUSE).await;
                continue;
            }
        };

        let job = match WorkerJob::from_payload(&queue, &payload) {
            Ok(job) => job,
            Err(e) => {
                warn!("Dropping undecodable job from {queue}: {e}");
                continue;
            }
        };

        let workers = workers.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let phone_number = job.phone_number().to_string();
            let outcome = workers.run(job).await;
            info!("Job from {queue} for {phone_number} finished: {outcome:?}");
        });
    }
}
