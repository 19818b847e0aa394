use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use telenurse_bedrock::chat::BedrockGateway;
use telenurse_bedrock::gateway::{Guarded, LanguageModel};
use telenurse_server::config::{self, ServerConfig, StorageBackend};
use telenurse_server::state::AppState;
use telenurse_server::{DEFAULT_POLICY, router};
use telenurse_session::SessionManager;
use telenurse_storage::local::FileRepository;
use telenurse_storage::policy::PolicyStore;
use telenurse_storage::repository::AssessmentRepository;
use telenurse_storage::s3::S3Repository;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = config::load_config()?;
    let session = build_session(&config).await?;
    let app = router(AppState::new(session));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, model = %config.model_id, "telenurse listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn build_session(config: &ServerConfig) -> eyre::Result<SessionManager> {
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;

    let model: Arc<dyn LanguageModel> = Arc::new(
        Guarded::new(BedrockGateway::new(&aws, &config.model_id))
            .with_timeout(config.llm_timeout())
            .with_max_attempts(config.llm_max_attempts),
    );

    let repository: Arc<dyn AssessmentRepository> = match &config.storage {
        StorageBackend::Local { dir } => Arc::new(FileRepository::new(dir)),
        StorageBackend::S3 { bucket, prefix } => {
            Arc::new(S3Repository::new(&aws, bucket, prefix.clone()))
        }
    };

    let store = PolicyStore::new(&config.policy_path);
    let policy = match store.load().await? {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            tracing::info!(path = %store.path().display(), "using bundled interview policy");
            DEFAULT_POLICY.to_string()
        }
    };

    Ok(SessionManager::new(model, repository, policy).with_policy_store(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
