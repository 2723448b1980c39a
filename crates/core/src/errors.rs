use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::bid::InputValidationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("unsupported bid type `{category}`; supported categories: {}", .supported.join(", "))]
    UnsupportedCategory { category: String, supported: Vec<String> },
    #[error("invalid tax rate {tax_percent}: tax percent must be a non-negative fraction")]
    InvalidTaxRate { tax_percent: Decimal },
    #[error("amount overflow computing {field} for `{line}`; reduce the quantity or unit cost")]
    AmountOverflow { line: String, field: &'static str },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    InvalidInput(#[from] InputValidationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("extraction failure: {0}")]
    Extraction(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<PricingError> for ApplicationError {
    fn from(value: PricingError) -> Self {
        Self::Domain(DomainError::Pricing(value))
    }
}

impl From<InputValidationError> for ApplicationError {
    fn from(value: InputValidationError) -> Self {
        Self::Domain(DomainError::InvalidInput(value))
    }
}

/// Error shape handed to HTTP and CLI callers, tagged with the request's correlation id.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("rejected request [{correlation_id}]: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("upstream unavailable [{correlation_id}]: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal failure [{correlation_id}]: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The bid could not be priced. Check the offending value and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The extraction service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        let (Self::BadRequest { message, .. }
        | Self::ServiceUnavailable { message, .. }
        | Self::Internal { message, .. }) = self;
        message
    }

    pub fn correlation_id(&self) -> &str {
        let (Self::BadRequest { correlation_id, .. }
        | Self::ServiceUnavailable { correlation_id, .. }
        | Self::Internal { correlation_id, .. }) = self;
        correlation_id
    }
}

impl ApplicationError {
    /// Domain failures keep their message since it names the offending value.
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(error) => {
                InterfaceError::BadRequest { message: error.to_string(), correlation_id }
            }
            Self::Extraction(message) | Self::Integration(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::Configuration(message) => InterfaceError::Internal { message, correlation_id },
        }
    }
}
