use async_trait::async_trait;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::types::{Image, S3Object};

use crate::media::{Label, LabelDetector, MediaError};

#[derive(Clone)]
pub struct RekognitionLabelDetector {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionLabelDetector {
    pub fn new(client: aws_sdk_rekognition::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LabelDetector for RekognitionLabelDetector {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: i32,
        min_confidence: f32,
    ) -> Result<Vec<Label>, MediaError> {
        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let output = self
            .client
            .detect_labels()
            .image(image)
            .max_labels(max_labels)
            .min_confidence(min_confidence)
            .send()
            .await
            .map_err(|e| MediaError::Vision(DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .labels()
            .iter()
            .filter_map(|label| {
                Some(Label {
                    name: label.name()?.to_string(),
                    confidence: label.confidence().unwrap_or_default(),
                })
            })
            .collect())
    }
}
