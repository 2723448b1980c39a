use std::sync::Arc;

use axum::Router;
use bidwright_agent::{BidExtractor, OpenAiCompatibleClient};
use bidwright_core::config::AppConfig;
use bidwright_core::DeterministicPricingEngine;
use thiserror::Error;
use tracing::info;

use crate::api::{self, ApiState};
use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub state: ApiState,
}

impl Application {
    pub fn router(&self) -> Router {
        api::router(self.state.clone()).merge(health::router(self.config.llm.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("llm client setup failed: {0:#}")]
    LlmClient(#[source] anyhow::Error),
}

pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "starting application bootstrap"
    );

    let client =
        OpenAiCompatibleClient::from_config(&config.llm).map_err(BootstrapError::LlmClient)?;
    let extractor = BidExtractor::new(Arc::new(client), config.llm.max_retries);
    let state = ApiState::new(Arc::new(DeterministicPricingEngine::default()), Arc::new(extractor));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        max_attempts = config.llm.max_retries,
        "pricing engine and extractor initialized"
    );

    Ok(Application { config, state })
}
