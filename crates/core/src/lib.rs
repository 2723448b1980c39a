pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod pricing;
pub mod report;

pub use domain::bid::{BidInput, InputValidationError, LineItem, ValidationIssue};
pub use errors::{ApplicationError, DomainError, InterfaceError, PricingError};
pub use pricing::engine::{price_bid, price_bid_with, price_line, BidSummary, PricedLine};
pub use pricing::rates::{Rate, RateEntry, RateTable, TradeCategory};
pub use pricing::{DeterministicPricingEngine, PricingEngine};
