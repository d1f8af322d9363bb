mod config;
mod conversation;
mod db;
mod errors;
mod llm_client;
mod media;
mod messaging;
mod models;
mod queue;
mod reminders;
mod replies;
mod routes;
mod state;
mod store;
mod webhook;
mod workers;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::conversation::Responder;
use crate::db::create_pool;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::media::{AwsTranscriber, RekognitionLabelDetector, S3ObjectStore};
use crate::messaging::{MediaFetcher, Notifier, TwilioClient};
use crate::queue::{RedisJobSource, RedisQueue};
use crate::reminders::poller::run_poller;
use crate::reminders::ReminderPoller;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ChatStore, PgStore};
use crate::webhook::Dispatcher;
use crate::workers::{run_worker_loop, ImageWorker, TranscribeWorker, Workers};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("whatsapp_bot={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting WhatsApp bot v{}", env!("CARGO_PKG_VERSION"));

    // Long-lived collaborators, shared by every unit
    let pool = create_pool(&config.database_url).await?;
    let store: Arc<dyn ChatStore> = Arc::new(PgStore::new(pool));

    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let twilio = Arc::new(TwilioClient::new(config.twilio.clone()));
    let notifier: Arc<dyn Notifier> = twilio.clone();
    let fetcher: Arc<dyn MediaFetcher> = twilio;

    let responder = Responder::new(store.clone(), llm.clone());
    let mut background: Vec<JoinHandle<()>> = Vec::new();

    if config.run_workers {
        let sdk = load_aws_config(&config).await;
        let objects = Arc::new(S3ObjectStore::new(
            build_s3_client(&sdk, &config),
            config.s3_bucket.clone(),
        ));
        info!("S3 client initialized (bucket: {})", config.s3_bucket);

        let workers = Workers {
            image: Arc::new(ImageWorker::new(
                store.clone(),
                llm.clone(),
                notifier.clone(),
                fetcher.clone(),
                objects.clone(),
                Arc::new(RekognitionLabelDetector::new(aws_sdk_rekognition::Client::new(
                    &sdk,
                ))),
            )),
            transcribe: Arc::new(TranscribeWorker::new(
                store.clone(),
                responder.clone(),
                notifier.clone(),
                fetcher.clone(),
                objects,
                Arc::new(AwsTranscriber::new(aws_sdk_transcribe::Client::new(&sdk))),
            )),
        };
        let source = Arc::new(
            RedisJobSource::connect(&redis)
                .await
                .context("failed to connect worker queue to Redis")?,
        );
        background.push(tokio::spawn(run_worker_loop(
            source,
            workers,
            config.worker_concurrency,
        )));
    }

    if config.run_reminder_poller {
        let poller = Arc::new(ReminderPoller::new(store.clone(), notifier.clone()));
        background.push(tokio::spawn(run_poller(
            poller,
            Duration::from_secs(config.reminder_poll_interval_secs),
        )));
    }

    if config.run_webhook {
        let queue = Arc::new(
            RedisQueue::connect(&redis)
                .await
                .context("failed to connect job queue to Redis")?,
        );
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(store.clone(), queue, responder)),
            config: config.clone(),
        };

        let app = build_router(state).layer(TraceLayer::new_for_http());

        let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
        info!("Listening on {addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    for task in background {
        task.abort();
    }
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

/// Shared AWS configuration. Static credentials when both keys are set,
/// otherwise the default provider chain.
async fn load_aws_config(config: &Config) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.aws_region.clone()));

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "whatsapp-bot-static",
        ));
    }

    loader.load().await
}

/// S3 client, pointed at MinIO when `S3_ENDPOINT` is set.
fn build_s3_client(sdk: &SdkConfig, config: &Config) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::config::Builder::from(sdk);
    if let Some(endpoint) = &config.s3_endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}
