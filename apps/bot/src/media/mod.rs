//! Managed media services: object storage (S3), label detection
//! (Rekognition) and speech-to-text (Transcribe).

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod rekognition;
pub mod s3;
pub mod transcribe;

pub use rekognition::RekognitionLabelDetector;
pub use s3::S3ObjectStore;
pub use transcribe::AwsTranscriber;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("S3 error: {0}")]
    Storage(String),

    #[error("label detection error: {0}")]
    Vision(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("transcription job {job} did not finish after {attempts} status checks")]
    TranscriptionTimeout { job: String, attempts: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub confidence: f32,
}

/// Audio containers the transcription backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Ogg,
    Mp3,
    Mp4,
    M4a,
    Amr,
    Wav,
    Webm,
    Flac,
}

impl AudioFormat {
    /// Maps a MIME type such as `audio/ogg; codecs=opus`. WhatsApp voice
    /// notes are ogg, so unknown types fall back to it.
    pub fn from_mime(mime: Option<&str>) -> Self {
        let mime = mime.unwrap_or_default().to_ascii_lowercase();
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "audio/mpeg" | "audio/mp3" => AudioFormat::Mp3,
            "audio/mp4" | "video/mp4" => AudioFormat::Mp4,
            "audio/x-m4a" | "audio/m4a" | "audio/aac" => AudioFormat::M4a,
            "audio/amr" => AudioFormat::Amr,
            "audio/wav" | "audio/x-wav" | "audio/wave" => AudioFormat::Wav,
            "audio/webm" => AudioFormat::Webm,
            "audio/flac" | "audio/x-flac" => AudioFormat::Flac,
            _ => AudioFormat::Ogg,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::M4a => "m4a",
            AudioFormat::Amr => "amr",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Flac => "flac",
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket every object is written to.
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), MediaError>;
}

#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// At most `max_labels` labels with confidence >= `min_confidence` (percent).
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: i32,
        min_confidence: f32,
    ) -> Result<Vec<Label>, MediaError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Full transcript of a stored audio object.
    async fn transcribe(
        &self,
        bucket: &str,
        key: &str,
        format: AudioFormat,
    ) -> Result<String, MediaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_from_mime_ignores_parameters() {
        assert_eq!(
            AudioFormat::from_mime(Some("audio/ogg; codecs=opus")),
            AudioFormat::Ogg
        );
        assert_eq!(AudioFormat::from_mime(Some("Audio/MPEG")), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_mime(Some("audio/amr")), AudioFormat::Amr);
    }

    #[test]
    fn test_audio_format_defaults_to_ogg() {
        assert_eq!(AudioFormat::from_mime(None), AudioFormat::Ogg);
        assert_eq!(AudioFormat::from_mime(Some("application/octet-stream")), AudioFormat::Ogg);
        assert_eq!(AudioFormat::Ogg.extension(), "ogg");
    }
}
