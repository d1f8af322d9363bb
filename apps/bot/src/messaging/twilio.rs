use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::TwilioConfig;
use crate::messaging::{FetchedMedia, MediaFetcher, MessagingError, Notifier};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    sid: String,
}

/// Twilio REST client for the WhatsApp channel. Build once at startup.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.whatsapp_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message: twilio_error_message(text),
            });
        }

        let sid = serde_json::from_str::<SentMessage>(&text)
            .map(|m| m.sid)
            .unwrap_or_default();
        info!("Message sent to {to} (sid: {sid})");
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for TwilioClient {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, MessagingError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message: twilio_error_message(text),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}

fn twilio_error_message(body: String) -> String {
    serde_json::from_str::<TwilioErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body)
}
