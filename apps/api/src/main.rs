mod analysis;
mod auth;
mod config;
mod errors;
mod llm_client;
mod models;
mod presentation;
mod records;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::feedback::LlmFeedbackBackend;
use crate::analysis::rasterize::PdftoppmRasterizer;
use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::records::RecordStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{ContentStore, RedisKvStore, S3ContentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumind API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis (record store)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let kv = RedisKvStore::connect(&redis).await?;
    let records = RecordStore::new(Arc::new(kv));
    info!("Redis record store connected");

    // Initialize S3 / MinIO (content store)
    let s3 = build_s3_client(&config).await;
    let content: Arc<dyn ContentStore> =
        Arc::new(S3ContentStore::new(s3, config.s3_bucket.clone()));
    info!("S3 content store initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .with_max_attempts(config.llm_max_attempts);
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm_client::MODEL,
        config.llm_max_attempts
    );

    let rasterizer = PdftoppmRasterizer::new(config.pdftoppm_path.clone(), config.raster_dpi);
    info!(
        "Rasterizer: {} at {} dpi",
        config.pdftoppm_path, config.raster_dpi
    );

    let pipeline = AnalysisPipeline::new(
        content.clone(),
        records.clone(),
        Arc::new(rasterizer),
        Arc::new(LlmFeedbackBackend::new(llm, content.clone())),
    );

    if config.api_token.is_none() {
        warn!("API_TOKEN is not set; resume routes are open to anyone");
    }

    // Build app state
    let state = AppState {
        records,
        content,
        pipeline,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the frontend host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumind-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
