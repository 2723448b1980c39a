//! Extraction collaborator for the bid pricing engine.
//!
//! This crate turns free-text bid descriptions into a validated `BidInput`:
//! - `llm` - the `LlmClient` seam and an OpenAI-compatible chat client
//! - `schema` - the BidInput JSON schema advertised to the model
//! - `extraction` - `BidExtractor`, the bounded retry loop around the model
//!
//! The model only transcribes. Every number in a priced bid comes from the
//! deterministic engine in `bidwright-core`.

pub mod extraction;
pub mod llm;
pub mod schema;

pub use extraction::{BidExtractor, ExtractionError, DEFAULT_MAX_ATTEMPTS};
pub use llm::{LlmClient, OpenAiCompatibleClient};
