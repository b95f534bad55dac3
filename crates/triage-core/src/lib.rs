//! triage-core - Urgency verdicts for email from a roster of generative models
//!
//! This crate provides:
//! - Prompt rendering and verdict extraction from free-form model output
//! - A provider abstraction with a Google Gemini implementation
//! - A model router that walks an ordered roster, first success wins
//! - A fixed fallback verdict so every request ends with a usable answer

pub mod analyzer;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod providers;
pub mod roster;
pub mod types;

pub use analyzer::Analyzer;
pub use error::TriageError;
pub use extract::{extract_json, parse_verdict, validate};
pub use fallback::{FallbackCause, fallback_result};
pub use prompt::build_prompt;
pub use providers::{GeminiProvider, InvocationReport, ModelRouter, TextGenerator};
pub use roster::ModelRoster;
pub use types::{AnalysisRequest, AnalysisResult, AttemptOutcome, ModelAttempt, Urgency};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _ = std::mem::size_of::<Analyzer>();
        let _ = std::mem::size_of::<ModelRouter>();
        let _ = std::mem::size_of::<ModelRoster>();
        let _ = std::mem::size_of::<AnalysisResult>();
        let _ = std::mem::size_of::<TriageError>();
    }
}
