//! One-way hand-off from the webhook to the media workers.
//!
//! Each worker owns a Redis list. The webhook `LPUSH`es a small JSON payload
//! and returns immediately; it never learns whether (or when) the job ran.
//! Workers `BRPOP` across both lists.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const IMAGE_QUEUE: &str = "whatsapp-bot-image";
pub const TRANSCRIBE_QUEUE: &str = "whatsapp-bot-transcribe";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown worker queue '{0}'")]
    UnknownQueue(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJob {
    pub phone_number: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeJob {
    pub phone_number: String,
    pub audio_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerJob {
    AnalyzeImage(ImageJob),
    TranscribeAudio(TranscribeJob),
}

impl WorkerJob {
    pub fn analyze_image(phone_number: &str, image_url: &str) -> Self {
        WorkerJob::AnalyzeImage(ImageJob {
            phone_number: phone_number.to_string(),
            image_url: image_url.to_string(),
        })
    }

    pub fn transcribe_audio(phone_number: &str, audio_url: &str) -> Self {
        WorkerJob::TranscribeAudio(TranscribeJob {
            phone_number: phone_number.to_string(),
            audio_url: audio_url.to_string(),
        })
    }

    /// Name of the worker list the job is delivered to.
    pub fn queue_name(&self) -> &'static str {
        match self {
            WorkerJob::AnalyzeImage(_) => IMAGE_QUEUE,
            WorkerJob::TranscribeAudio(_) => TRANSCRIBE_QUEUE,
        }
    }

    pub fn phone_number(&self) -> &str {
        match self {
            WorkerJob::AnalyzeImage(job) => &job.phone_number,
            WorkerJob::TranscribeAudio(job) => &job.phone_number,
        }
    }

    pub fn to_payload(&self) -> Result<String, QueueError> {
        Ok(match self {
            WorkerJob::AnalyzeImage(job) => serde_json::to_string(job)?,
            WorkerJob::TranscribeAudio(job) => serde_json::to_string(job)?,
        })
    }

    pub fn from_payload(queue: &str, payload: &str) -> Result<Self, QueueError> {
        match queue {
            IMAGE_QUEUE => Ok(WorkerJob::AnalyzeImage(serde_json::from_str(payload)?)),
            TRANSCRIBE_QUEUE => Ok(WorkerJob::TranscribeAudio(serde_json::from_str(payload)?)),
            other => Err(QueueError::UnknownQueue(other.to_string())),
        }
    }
}

/// Fire-and-forget delivery. `Ok` means the job was handed over, nothing more.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: WorkerJob) -> Result<(), QueueError>;
}

/// Raw `(queue, payload)` pair as popped by a worker.
pub type RawJob = (String, String);

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Blocks up to `timeout_secs` for the next job on any worker list.
    async fn next_job(&self, timeout_secs: u64) -> Result<Option<RawJob>, QueueError>;
}

/// Producer side, shared by every webhook request. The connection manager
/// re-dials after Redis drops the connection; only the in-flight command fails.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(client: &redis::Client) -> Result<Self, QueueError> {
        Ok(Self {
            conn: ConnectionManager::new(client.clone()).await?,
        })
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn enqueue(&self, job: WorkerJob) -> Result<(), QueueError> {
        let payload = job.to_payload()?;
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(job.queue_name())
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// Consumer side. Holds its own connection since `BRPOP` blocks it.
pub struct RedisJobSource {
    conn: ConnectionManager,
}

impl RedisJobSource {
    pub async fn connect(client: &redis::Client) -> Result<Self, QueueError> {
        Ok(Self {
            conn: ConnectionManager::new(client.clone()).await?,
        })
    }
}

#[async_trait]
impl JobSource for RedisJobSource {
    async fn next_job(&self, timeout_secs: u64) -> Result<Option<RawJob>, QueueError> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(IMAGE_QUEUE)
            .arg(TRANSCRIBE_QUEUE)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;
        Ok(popped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_job_payload_shape() {
        let job = WorkerJob::analyze_image("whatsapp:+905551112233", "https://api.twilio.com/m/1");
        let value: serde_json::Value = serde_json::from_str(&job.to_payload().unwrap()).unwrap();
        assert_eq!(value["phone_number"], "whatsapp:+905551112233");
        assert_eq!(value["image_url"], "https://api.twilio.com/m/1");
        assert_eq!(job.queue_name(), IMAGE_QUEUE);
    }

    #[test]
    fn test_payload_decodes_by_queue_name() {
        let payload = r#"{"phone_number": "whatsapp:+1", "audio_url": "https://x/a.ogg"}"#;
        let job = WorkerJob::from_payload(TRANSCRIBE_QUEUE, payload).unwrap();
        assert_eq!(job, WorkerJob::transcribe_audio("whatsapp:+1", "https://x/a.ogg"));
        assert_eq!(job.phone_number(), "whatsapp:+1");
    }

    #[test]
    fn test_payload_for_wrong_queue_is_rejected() {
        let payload = r#"{"phone_number": "whatsapp:+1", "audio_url": "https://x/a.ogg"}"#;
        assert!(matches!(
            WorkerJob::from_payload(IMAGE_QUEUE, payload),
            Err(QueueError::Serialization(_))
        ));
        assert!(matches!(
            WorkerJob::from_payload("other", payload),
            Err(QueueError::UnknownQueue(_))
        ));
    }
}
