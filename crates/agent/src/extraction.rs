use std::sync::Arc;

use bidwright_core::{ApplicationError, BidInput};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::schema::submit_function;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const SYSTEM_PROMPT: &str = "You are a data-extraction engine. Return ONLY valid JSON that \
matches the BidInput schema. Do not add commentary. Express tax_percent as a fraction \
(7% is 0.07). If a line item has no stated markup, omit material_markup_factor.";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no bid description was provided")]
    EmptyInput,
    #[error("llm request failed: {0}")]
    Llm(String),
    #[error("failed to extract bid data after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl From<ExtractionError> for ApplicationError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::Llm(message) => Self::Integration(message),
            other => Self::Extraction(other.to_string()),
        }
    }
}

/// Why a single model response was not accepted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error("response was not valid JSON: {0}")]
    Unparseable(String),
    #[error("response did not match the BidInput schema: {0}")]
    Invalid(String),
}

impl AttemptFailure {
    /// Corrective message fed back to the model before the next attempt.
    pub fn feedback(&self) -> String {
        match self {
            Self::Unparseable(detail) => format!(
                "The previous JSON could not be parsed ({detail}). Please output valid JSON only."
            ),
            Self::Invalid(detail) => format!(
                "The JSON you produced was invalid: {detail}. Correct the JSON and output only valid JSON."
            ),
        }
    }
}

/// Turns free text into a validated [`BidInput`], re-prompting the model a
/// bounded number of times when its output does not decode or validate.
pub struct BidExtractor {
    client: Arc<dyn LlmClient>,
    max_attempts: u32,
}

impl BidExtractor {
    pub fn new(client: Arc<dyn LlmClient>, max_attempts: u32) -> Self {
        Self { client, max_attempts: max_attempts.max(1) }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn extract(&self, text: &str) -> Result<BidInput, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)];
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let request =
                CompletionRequest { messages: messages.clone(), function: Some(submit_function()) };
            let raw = self
                .client
                .complete(&request)
                .await
                .map_err(|error| ExtractionError::Llm(format!("{error:#}")))?;

            match parse_bid_input(&raw) {
                Ok(bid) => {
                    info!(
                        event_name = "agent.extraction.succeeded",
                        attempt,
                        bid_type = %bid.bid_type,
                        item_count = bid.items.len(),
                        "bid input extracted"
                    );
                    return Ok(bid);
                }
                Err(failure) => {
                    warn!(
                        event_name = "agent.extraction.retry",
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %failure,
                        "model output rejected"
                    );
                    messages.push(ChatMessage::assistant(failure.feedback()));
                    last_error = failure.to_string();
                }
            }
        }

        warn!(
            event_name = "agent.extraction.exhausted",
            attempts = self.max_attempts,
            error = %last_error,
            "bid extraction failed"
        );
        Err(ExtractionError::Exhausted { attempts: self.max_attempts, last_error })
    }
}

/// Decodes and validates one raw model response.
pub fn parse_bid_input(raw: &str) -> Result<BidInput, AttemptFailure> {
    let payload = strip_code_fences(raw);
    let value: Value = serde_json::from_str(payload)
        .map_err(|error| AttemptFailure::Unparseable(error.to_string()))?;
    let bid: BidInput =
        serde_json::from_value(value).map_err(|error| AttemptFailure::Invalid(error.to_string()))?;
    bid.validate().map_err(|error| {
        AttemptFailure::Invalid(
            error.issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
        )
    })?;
    Ok(bid)
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
