//! Error taxonomy for a single triage request

use thiserror::Error;

/// Everything that can go wrong between receiving an email and producing a verdict.
///
/// None of these reach the external caller: attempt-level failures advance the
/// roster, and `ProviderUnconfigured` / `RosterExhausted` resolve to the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    #[error("no provider credential configured")]
    ProviderUnconfigured,

    #[error("provider call failed: {0}")]
    ProviderCallFailed(String),

    #[error("no JSON object found in model response")]
    NoJsonFound,

    #[error("malformed JSON in model response: {0}")]
    MalformedJson(String),

    #[error("model response violates verdict schema: {0}")]
    SchemaViolation(String),

    #[error("all models in the roster failed")]
    RosterExhausted,

    #[error("model roster must contain at least one model")]
    EmptyRoster,
}
