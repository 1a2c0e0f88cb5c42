//! Typed errors at module boundaries.
//!
//! Pipeline and IO plumbing use `anyhow`; these are the failures callers
//! match on to decide whether an item is skipped.

use thiserror::Error;

/// Failures from the chat-completion call. The pipeline logs these and skips
/// the item; they are never retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("chat completion request failed: {0}")]
    Request(#[from] async_openai::error::OpenAIError),

    #[error("completion returned no choices")]
    NoChoices,
}

/// A confidence field was present but could not be read as a number.
/// Fatal to the single item being aggregated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: String, value: String },

    #[error("field `confidence_distribution` must be an object, got {0}")]
    DistributionShape(String),
}
