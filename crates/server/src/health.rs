use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bidwright_core::config::{LlmConfig, LlmProvider};
use bidwright_core::{RateTable, TradeCategory};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    llm: LlmConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub rate_table: HealthCheck,
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub fn router(llm: LlmConfig) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { llm })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let rate_table = rate_table_check(RateTable::standard());
    let llm = llm_check(&state.llm);
    let ready = rate_table.status == "ready" && llm.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "bidwright-server runtime initialized".to_string(),
        },
        rate_table,
        llm,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn rate_table_check(table: &RateTable) -> HealthCheck {
    let missing = TradeCategory::ALL
        .iter()
        .filter(|category| table.lookup(category.as_str()).is_err())
        .map(|category| category.as_str())
        .collect::<Vec<_>>();

    if missing.is_empty() {
        HealthCheck {
            status: "ready",
            detail: format!("{} trade categories loaded", TradeCategory::ALL.len()),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("rate table is missing: {}", missing.join(", ")),
        }
    }
}

fn llm_check(config: &LlmConfig) -> HealthCheck {
    if config.provider == LlmProvider::OpenAi && config.api_key.is_none() {
        return HealthCheck {
            status: "degraded",
            detail: "openai provider has no API key configured".to_string(),
        };
    }

    HealthCheck {
        status: "ready",
        detail: format!("model `{}` at {}", config.model, config.effective_base_url()),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use bidwright_core::config::{LlmConfig, LlmProvider};
    use bidwright_core::{Rate, RateTable, TradeCategory};
    use rust_decimal::Decimal;

    use crate::health::{health, rate_table_check, HealthState};

    fn llm_config(provider: LlmProvider, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: api_key.map(|key| key.to_string().into()),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }

    #[tokio::test]
    async fn health_returns_ready_with_a_configured_model() {
        let (status, Json(payload)) = health(State(HealthState {
            llm: llm_config(LlmProvider::OpenAi, Some("sk-test")),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.rate_table.detail, "4 trade categories loaded");
        assert!(payload.llm.detail.contains("https://api.openai.com/v1"));
    }

    #[tokio::test]
    async fn health_is_degraded_without_an_openai_key() {
        let (status, Json(payload)) =
            health(State(HealthState { llm: llm_config(LlmProvider::OpenAi, None) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.llm.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn ollama_needs_no_key() {
        let (status, Json(payload)) =
            health(State(HealthState { llm: llm_config(LlmProvider::Ollama, None) })).await;

        assert_eq!(status, StatusCode::OK);
        assert!(payload.llm.detail.contains("localhost:11434"));
    }

    #[test]
    fn partial_rate_table_is_reported() {
        let table = RateTable::new([(
            TradeCategory::Regular,
            Rate::new(Decimal::new(4000, 2), Decimal::ZERO, Decimal::new(5747, 2)),
        )]);

        let check = rate_table_check(&table);

        assert_eq!(check.status, "degraded");
        assert_eq!(check.detail, "rate table is missing: Communication, Electrical, Plumbing");
    }
}
