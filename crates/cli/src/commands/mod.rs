pub mod config;
pub mod estimate;
pub mod price;
pub mod rates;

use std::fs;
use std::io::{self, Read};

use bidwright_core::{ApplicationError, DomainError};
use serde::Serialize;
use serde_json::json;

pub const EXIT_EMPTY_INPUT: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 2;
pub const EXIT_PRICING: u8 = 3;
pub const EXIT_EXTRACTION: u8 = 4;

/// Text printed to stdout plus the process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: &'a str,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Failure rendered as a one-line JSON envelope so scripts can branch on `error_class`.
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let message = message.into();
        let envelope = FailureEnvelope { command, status: "error", error_class, message: &message };
        let output = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            json!({ "command": command, "status": "error", "error_class": error_class }).to_string()
        });
        Self { exit_code, output }
    }

    /// Classifies an application failure into an error class and exit code.
    pub fn from_application(command: &str, error: ApplicationError) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(DomainError::Pricing(_)) => ("pricing", EXIT_PRICING),
            ApplicationError::Domain(DomainError::InvalidInput(_)) => {
                ("input_validation", EXIT_INVALID_INPUT)
            }
            ApplicationError::Extraction(_) => ("extraction", EXIT_EXTRACTION),
            ApplicationError::Integration(_) => ("llm_transport", EXIT_EXTRACTION),
            ApplicationError::Configuration(_) => ("configuration", EXIT_INVALID_INPUT),
        };
        Self::failure(command, error_class, error.to_string(), exit_code)
    }
}

pub(crate) fn to_pretty_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::ok(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

/// Reads a whole file, or stdin when `source` is `-`.
pub(crate) fn read_source(source: &str) -> io::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    fs::read_to_string(source)
}

#[cfg(test)]
mod tests {
    use bidwright_core::{ApplicationError, PricingError};
    use serde_json::Value;

    use super::{CommandResult, EXIT_EXTRACTION, EXIT_INVALID_INPUT, EXIT_PRICING};

    fn envelope(result: &CommandResult) -> Value {
        serde_json::from_str(&result.output).expect("failure output is JSON")
    }

    #[test]
    fn failures_carry_the_envelope_fields() {
        let result = CommandResult::failure("price", "input_read", "no such file", 2);

        let payload = envelope(&result);
        assert_eq!(payload["command"], "price");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "input_read");
        assert_eq!(payload["message"], "no such file");
    }

    #[test]
    fn application_errors_choose_class_and_exit_code() {
        let pricing = CommandResult::from_application(
            "price",
            PricingError::UnsupportedCategory { category: "Roofing".into(), supported: vec![] }
                .into(),
        );
        assert_eq!(pricing.exit_code, EXIT_PRICING);
        assert_eq!(envelope(&pricing)["error_class"], "pricing");

        let transport = CommandResult::from_application(
            "estimate",
            ApplicationError::Integration("connection refused".into()),
        );
        assert_eq!(transport.exit_code, EXIT_EXTRACTION);
        assert_eq!(envelope(&transport)["error_class"], "llm_transport");

        let config = CommandResult::from_application(
            "estimate",
            ApplicationError::Configuration("llm.api_key is required".into()),
        );
        assert_eq!(config.exit_code, EXIT_INVALID_INPUT);
        assert!(envelope(&config)["message"].as_str().is_some_and(|m| m.contains("llm.api_key")));
    }
}
