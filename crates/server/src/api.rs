//! JSON API for pricing and extraction.
//!
//! - `GET  /api/v1/rates`          trade rate table
//! - `POST /api/v1/bids/price`     price a structured `BidInput`
//! - `POST /api/v1/extract`        extract a `BidInput` from plain text
//! - `POST /api/v1/bids/estimate`  extract, then price, plus a markdown table

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bidwright_agent::{BidExtractor, ExtractionError};
use bidwright_core::{
    report, ApplicationError, BidInput, BidSummary, InterfaceError, PricingEngine, RateEntry,
    RateTable,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pricing: Arc<dyn PricingEngine>,
    extractor: Arc<BidExtractor>,
}

impl ApiState {
    pub fn new(pricing: Arc<dyn PricingEngine>, extractor: Arc<BidExtractor>) -> Self {
        Self { pricing, extractor }
    }
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub input: BidInput,
    pub summary: BidSummary,
    pub markdown: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub correlation_id: String,
}

/// Interface error carried out of a handler and rendered as [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        })
    }

    fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.user_message(),
            message: self.0.message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/rates", get(list_rates))
        .route("/api/v1/bids/price", post(price_bid))
        .route("/api/v1/extract", post(extract_bid))
        .route("/api/v1/bids/estimate", post(estimate_bid))
        .with_state(state)
}

pub async fn list_rates() -> Json<Vec<RateEntry>> {
    Json(RateTable::standard().entries().to_vec())
}

pub async fn price_bid(
    State(state): State<ApiState>,
    payload: Result<Json<BidInput>, JsonRejection>,
) -> Result<Json<BidSummary>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(input) = payload.map_err(|rejection| {
        warn!(
            event_name = "server.bids.price.rejected",
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "bid input could not be decoded"
        );
        ApiError::bad_request(rejection.body_text(), &correlation_id)
    })?;

    let summary = price_input(state.pricing.as_ref(), &input, &correlation_id)?;
    info!(
        event_name = "server.bids.priced",
        correlation_id = %correlation_id,
        bid_type = %summary.bid_type,
        line_count = summary.lines.len(),
        total = %summary.total,
        "bid priced"
    );
    Ok(Json(summary))
}

pub async fn extract_bid(
    State(state): State<ApiState>,
    body: String,
) -> Result<Json<BidInput>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let input = extract_input(&state.extractor, &body, &correlation_id).await?;
    Ok(Json(input))
}

pub async fn estimate_bid(
    State(state): State<ApiState>,
    body: String,
) -> Result<Json<EstimateResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let input = extract_input(&state.extractor, &body, &correlation_id).await?;
    let summary = price_input(state.pricing.as_ref(), &input, &correlation_id)?;
    info!(
        event_name = "server.bids.estimated",
        correlation_id = %correlation_id,
        bid_type = %summary.bid_type,
        total = %summary.total,
        "bid estimated from description"
    );

    let markdown = report::render_markdown_table(&summary);
    Ok(Json(EstimateResponse { input, summary, markdown }))
}

fn price_input(
    pricing: &dyn PricingEngine,
    input: &BidInput,
    correlation_id: &str,
) -> Result<BidSummary, ApiError> {
    let summary = pricing
        .price(input)
        .map_err(|error| ApiError::from_application(error.into(), correlation_id))?;
    input
        .validate()
        .map_err(|error| ApiError::from_application(error.into(), correlation_id))?;
    Ok(summary)
}

async fn extract_input(
    extractor: &BidExtractor,
    text: &str,
    correlation_id: &str,
) -> Result<BidInput, ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("request body is empty", correlation_id));
    }

    extractor.extract(text).await.map_err(|error| {
        warn!(
            event_name = "server.extract.failed",
            correlation_id = %correlation_id,
            error = %error,
            "bid extraction failed"
        );
        match error {
            ExtractionError::EmptyInput => ApiError::bad_request(error.to_string(), correlation_id),
            other => ApiError::from_application(other.into(), correlation_id),
        }
    })
}
