//! Request, verdict and attempt types

use serde::{Deserialize, Serialize};

/// How soon the recipient should deal with an email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Urgent,
    Important,
    Ignore,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Urgent, Urgency::Important, Urgency::Ignore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::Important => "IMPORTANT",
            Self::Ignore => "IGNORE",
        }
    }

    /// Parse the wire form (exact, uppercase)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == s)
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An email to classify. Both fields are free-form and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl AnalysisRequest {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// The verdict returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub urgency: Urgency,
    pub reason: String,
    pub action: String,
}

/// What happened when one model was asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(AnalysisResult),
    Failure(String),
}

/// One model's attempt at a request. Lives only for the duration of a roster walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub outcome: AttemptOutcome,
}

impl ModelAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success(_))
    }
}
