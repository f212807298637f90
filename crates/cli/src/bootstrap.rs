use std::sync::Arc;

use reviewlens_agent::AgentRuntime;
use reviewlens_analytics::OpenAiCompatibleClient;
use reviewlens_core::config::{AppConfig, LogFormat};
use reviewlens_core::errors::ApplicationError;
use reviewlens_core::store::{ReviewStore, StoreError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<ReviewStore>,
    pub agent_runtime: AgentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("dataset load failed: {0}")]
    Dataset(#[from] StoreError),
    #[error("llm client setup failed: {0}")]
    LlmClient(String),
    #[error("agent runtime setup failed: {0}")]
    Runtime(#[from] ApplicationError),
}

impl BootstrapError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Dataset(_) => "dataset_load",
            Self::LlmClient(_) | Self::Runtime(_) => "runtime_setup",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Dataset(_) => 3,
            Self::LlmClient(_) | Self::Runtime(_) => 7,
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// command output. A second call is a no-op.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn load_store(config: &AppConfig) -> Result<Arc<ReviewStore>, StoreError> {
    let store = ReviewStore::load(&config.dataset.path)?;
    info!(
        event_name = "system.bootstrap.dataset_loaded",
        correlation_id = "bootstrap",
        reviews = store.reviews().len(),
        "review dataset ready"
    );
    Ok(Arc::new(store))
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "starting application bootstrap"
    );
    let store = load_store(&config)?;

    let llm = OpenAiCompatibleClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::LlmClient(format!("{error:#}")))?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        endpoint = %llm.endpoint(),
        "llm client configured"
    );

    let agent_runtime = AgentRuntime::new(store.clone(), Arc::new(llm), &config)?;
    Ok(Application { config, store, agent_runtime })
}
