use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_transcribe::error::DisplayErrorContext;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat, TranscriptionJobStatus};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::media::{AudioFormat, MediaError, Transcriber};

/// Delay between job status checks.
const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Status checks before giving up (~3 minutes).
const MAX_STATUS_CHECKS: u32 = 90;

/// Shape of the transcript document Transcribe writes.
#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    transcripts: Vec<TranscriptText>,
}

#[derive(Debug, Deserialize)]
struct TranscriptText {
    transcript: String,
}

/// Batch transcription through AWS Transcribe (Turkish).
#[derive(Clone)]
pub struct AwsTranscriber {
    client: aws_sdk_transcribe::Client,
    http: Client,
}

impl AwsTranscriber {
    pub fn new(client: aws_sdk_transcribe::Client) -> Self {
        Self {
            client,
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Waits for the job to leave the queued/in-progress states and returns
    /// the transcript document URI.
    async fn wait_for_transcript_uri(&self, job_name: &str) -> Result<String, MediaError> {
        for attempt in 1..=MAX_STATUS_CHECKS {
            let output = self
                .client
                .get_transcription_job()
                .transcription_job_name(job_name)
                .send()
                .await
                .map_err(|e| MediaError::Transcription(DisplayErrorContext(&e).to_string()))?;

            let Some(job) = output.transcription_job() else {
                return Err(MediaError::Transcription(format!(
                    "job {job_name} not found"
                )));
            };

            match job.transcription_job_status() {
                Some(TranscriptionJobStatus::Completed) => {
                    return job
                        .transcript()
                        .and_then(|t| t.transcript_file_uri())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            MediaError::Transcription(format!(
                                "job {job_name} completed without a transcript"
                            ))
                        });
                }
                Some(TranscriptionJobStatus::Failed) => {
                    return Err(MediaError::Transcription(format!(
                        "job {job_name} failed: {}",
                        job.failure_reason().unwrap_or("unknown reason")
                    )));
                }
                status => {
                    debug!("Transcription job {job_name} status {status:?} (check {attempt})");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        Err(MediaError::TranscriptionTimeout {
            job: job_name.to_string(),
            attempts: MAX_STATUS_CHECKS,
        })
    }
}

#[async_trait]
impl Transcriber for AwsTranscriber {
    async fn transcribe(
        &self,
        bucket: &str,
        key: &str,
        format: AudioFormat,
    ) -> Result<String, MediaError> {
        let job_name = format!("whatsapp-{}", Uuid::new_v4());
        let media = Media::builder()
            .media_file_uri(format!("s3://{bucket}/{key}"))
            .build();

        self.client
            .start_transcription_job()
            .transcription_job_name(&job_name)
            .language_code(LanguageCode::TrTr)
            .media_format(media_format(format))
            .media(media)
            .send()
            .await
            .map_err(|e| MediaError::Transcription(DisplayErrorContext(&e).to_string()))?;

        info!("Started transcription job {job_name} for s3://{bucket}/{key}");

        let uri = self.wait_for_transcript_uri(&job_name).await?;
        let body = self
            .http
            .get(&uri)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_transcript(&body)
    }
}

fn media_format(format: AudioFormat) -> MediaFormat {
    match format {
        AudioFormat::Ogg => MediaFormat::Ogg,
        AudioFormat::Mp3 => MediaFormat::Mp3,
        AudioFormat::Mp4 => MediaFormat::Mp4,
        AudioFormat::M4a => MediaFormat::M4A,
        AudioFormat::Amr => MediaFormat::Amr,
        AudioFormat::Wav => MediaFormat::Wav,
        AudioFormat::Webm => MediaFormat::Webm,
        AudioFormat::Flac => MediaFormat::Flac,
    }
}

/// Concatenates every transcript alternative in the document.
fn parse_transcript(body: &str) -> Result<String, MediaError> {
    let document: TranscriptDocument = serde_json::from_str(body)
        .map_err(|e| MediaError::Transcription(format!("malformed transcript document: {e}")))?;

    Ok(document
        .results
        .transcripts
        .into_iter()
        .map(|t| t.transcript)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string())
}
