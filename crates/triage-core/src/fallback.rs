//! Fixed verdict used when no model produces one

use tracing::{info, warn};

use crate::error::TriageError;
use crate::types::{AnalysisResult, Urgency};

pub const FALLBACK_ACTION: &str = "Review manually.";
pub const EXHAUSTED_REASON: &str = "Fallback triggered after AI model failure.";
pub const UNCONFIGURED_REASON: &str = "Fallback triggered: no AI provider credential configured.";

/// Why the fallback verdict was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    /// No credential, so no model was asked
    Unconfigured,
    /// Every model in the roster was asked and none answered usefully
    Exhausted,
}

impl FallbackCause {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unconfigured => UNCONFIGURED_REASON,
            Self::Exhausted => EXHAUSTED_REASON,
        }
    }
}

impl From<&TriageError> for FallbackCause {
    /// A missing credential maps to `Unconfigured`; anything else means the roster gave up
    fn from(err: &TriageError) -> Self {
        match err {
            TriageError::ProviderUnconfigured => Self::Unconfigured,
            _ => Self::Exhausted,
        }
    }
}

/// Build the fallback verdict and log which cause triggered it
pub fn fallback_result(cause: FallbackCause) -> AnalysisResult {
    match cause {
        FallbackCause::Unconfigured => {
            info!("No provider credential found, using fallback verdict");
        }
        FallbackCause::Exhausted => {
            warn!("All models failed, using fallback verdict");
        }
    }

    AnalysisResult {
        urgency: Urgency::Important,
        reason: cause.reason().to_string(),
        action: FALLBACK_ACTION.to_string(),
    }
}
