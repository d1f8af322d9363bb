use anyhow::{ensure, Context, Result};

/// Kept below the poller's 60-second scan window so a late tick never leaves
/// seconds unscanned.
pub const DEFAULT_REMINDER_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_WORKER_CONCURRENCY: u64 = 8;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    /// Custom endpoint for MinIO / localstack. `None` talks to AWS.
    pub s3_endpoint: Option<String>,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub anthropic_api_key: String,
    pub twilio: TwilioConfig,
    pub port: u16,
    pub rust_log: String,
    pub run_webhook: bool,
    pub run_workers: bool,
    pub run_reminder_poller: bool,
    pub reminder_poll_interval_secs: u64,
    /// Upper bound on media jobs running at once in this process.
    pub worker_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub whatsapp_number: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_region: optional_env("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            twilio: TwilioConfig {
                account_sid: require_env("TWILIO_ACCOUNT_SID")?,
                auth_token: require_env("TWILIO_AUTH_TOKEN")?,
                whatsapp_number: require_env("TWILIO_WHATSAPP_NUMBER")?,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            run_webhook: flag_env("RUN_WEBHOOK")?,
            run_workers: flag_env("RUN_WORKERS")?,
            run_reminder_poller: flag_env("RUN_REMINDER_POLLER")?,
            reminder_poll_interval_secs: positive_env(
                "REMINDER_POLL_INTERVAL_SECS",
                DEFAULT_REMINDER_POLL_INTERVAL_SECS,
            )?,
            worker_concurrency: positive_env("WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY)?
                as usize,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Unit toggles default to enabled.
fn flag_env(key: &str) -> Result<bool> {
    match optional_env(key) {
        None => Ok(true),
        Some(raw) => parse_flag(&raw)
            .with_context(|| format!("Environment variable '{key}' must be true/false, got '{raw}'")),
    }
}

/// Counts and intervals: absent means `default`, zero is rejected.
fn positive_env(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => parse_positive(key, &raw),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Environment variable '{key}' must be a whole number, got '{raw}'"))?;
    ensure!(value > 0, "Environment variable '{key}' must be greater than zero");
    Ok(value)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
