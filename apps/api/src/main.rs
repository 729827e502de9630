mod artifacts;
mod auth;
mod config;
mod db;
mod engine;
mod errors;
mod llm_client;
mod models;
mod profile;
mod resumes;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::{ArtifactStore, FsArtifactStore, S3ArtifactStore};
use crate::auth::delivery::ConsoleDelivery;
use crate::auth::session::RedisSessionStore;
use crate::config::{ArtifactBackend, Config, EngineKind};
use crate::db::create_pool;
use crate::engine::{LlmEngine, ResumeEngine, StubEngine};
use crate::llm_client::LlmClient;
use crate::resumes::reconcile::reconcile;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AutoTailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = redis
        .get_multiplexed_async_connection()
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connection established");

    let artifacts = build_artifact_store(&config).await?;
    let engine = build_engine(&config)?;
    info!("Resume engine: {}", engine.name());

    let report = reconcile(store.as_ref(), artifacts.as_ref()).await?;
    if report.finished_deletions + report.orphans_removed + report.temp_files_removed > 0 {
        info!("Startup reconciliation: {report:?}");
    }

    // Build app state
    let state = AppState {
        store,
        sessions: Arc::new(RedisSessionStore::new(redis_conn)),
        artifacts,
        engine,
        delivery: Arc::new(ConsoleDelivery),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_artifact_store(config: &Config) -> Result<Arc<dyn ArtifactStore>> {
    match &config.artifacts {
        ArtifactBackend::Filesystem { root } => {
            let store = FsArtifactStore::new(root.clone())
                .await
                .with_context(|| format!("Failed to open artifact directory {}", root.display()))?;
            info!("Artifact storage: filesystem at {}", root.display());
            Ok(Arc::new(store))
        }
        ArtifactBackend::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let client = build_s3_client(endpoint, access_key_id, secret_access_key).await;
            info!("Artifact storage: s3://{bucket} via {endpoint}");
            Ok(Arc::new(S3ArtifactStore::new(client, bucket.clone())))
        }
    }
}

fn build_engine(config: &Config) -> Result<Arc<dyn ResumeEngine>> {
    match config.engine {
        EngineKind::Stub => Ok(Arc::new(StubEngine)),
        EngineKind::Llm => {
            let llm = LlmClient::new(config.anthropic_api_key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmEngine::new(llm)?))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "autotailor-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
