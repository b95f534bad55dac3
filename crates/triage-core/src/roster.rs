//! Ordered model roster

use std::sync::Arc;

use crate::error::TriageError;

/// Gemini models in attempt order, newest first
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-pro-preview-03-25",
    "gemini-2.5-flash-preview-04-17",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.0-pro-exp-02-05",
    "gemini-2.0-flash-thinking-exp-01-21",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
];

/// Immutable, non-empty list of model identifiers. Order is attempt priority.
///
/// Cloning is cheap; clones share the same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoster {
    models: Arc<[String]>,
}

impl ModelRoster {
    pub fn new<I, S>(models: I) -> Result<Self, TriageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models.into_iter().map(Into::into).collect();
        if models.is_empty() {
            return Err(TriageError::EmptyRoster);
        }
        Ok(Self {
            models: models.into(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Highest-priority model
    pub fn primary(&self) -> &str {
        &self.models[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.models
    }
}

impl Default for ModelRoster {
    fn default() -> Self {
        Self {
            models: DEFAULT_GEMINI_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .into(),
        }
    }
}
