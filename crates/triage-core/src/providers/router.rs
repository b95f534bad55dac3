//! Model router: sequential failover across a roster of models on one provider

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::TriageError;
use crate::extract::parse_verdict;
use crate::prompt::build_prompt;
use crate::roster::ModelRoster;
use crate::types::{AnalysisRequest, AnalysisResult, AttemptOutcome, ModelAttempt};

use super::types::TextGenerator;

/// Longest failure diagnostic kept per attempt
const MAX_DIAGNOSTIC_CHARS: usize = 80;

/// Outcome of one walk over the roster
#[derive(Debug, Clone)]
pub struct InvocationReport {
    /// Attempts in the order they were made
    pub attempts: Vec<ModelAttempt>,
    /// First successful verdict, or `RosterExhausted`
    pub outcome: Result<AnalysisResult, TriageError>,
}

impl InvocationReport {
    /// Model that produced the verdict, if any
    pub fn winning_model(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| a.is_success())
            .map(|a| a.model.as_str())
    }

    pub fn into_result(self) -> Result<AnalysisResult, TriageError> {
        self.outcome
    }
}

/// Tries each model of the roster in order against a single provider.
///
/// Each model is called at most once per request. The first model whose reply
/// yields a valid verdict wins and later models are never called.
pub struct ModelRouter {
    provider: Arc<dyn TextGenerator>,
    roster: ModelRoster,
    /// Deadline for a single provider call; `None` waits as long as the provider does
    attempt_timeout: Option<Duration>,
}

impl ModelRouter {
    pub fn new(provider: Arc<dyn TextGenerator>, roster: ModelRoster) -> Self {
        Self {
            provider,
            roster,
            attempt_timeout: None,
        }
    }

    /// Bound each provider call; an elapsed deadline counts as a failed attempt
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Walk the roster for one request
    pub async fn invoke(&self, request: &AnalysisRequest) -> InvocationReport {
        let prompt = build_prompt(&request.subject, &request.body);
        let mut attempts = Vec::with_capacity(self.roster.len());

        for (idx, model) in self.roster.iter().enumerate() {
            debug!(
                "Trying {} model {} ({}/{})",
                self.provider.provider_name(),
                model,
                idx + 1,
                self.roster.len(),
            );

            match self.attempt(model, &prompt).await {
                Ok(result) => {
                    info!("Verdict from {} ({})", model, result.urgency);
                    attempts.push(ModelAttempt {
                        model: model.to_string(),
                        outcome: AttemptOutcome::Success(result.clone()),
                    });
                    return InvocationReport {
                        attempts,
                        outcome: Ok(result),
                    };
                }
                Err(e) => {
                    let diagnostic = truncate_diagnostic(&e.to_string(), MAX_DIAGNOSTIC_CHARS);
                    warn!("Model {} failed: {}", model, diagnostic);
                    attempts.push(ModelAttempt {
                        model: model.to_string(),
                        outcome: AttemptOutcome::Failure(diagnostic),
                    });
                }
            }
        }

        InvocationReport {
            attempts,
            outcome: Err(TriageError::RosterExhausted),
        }
    }

    /// One provider call plus extraction
    async fn attempt(&self, model: &str, prompt: &str) -> Result<AnalysisResult, TriageError> {
        let call = self.provider.generate(model, prompt);
        let reply = match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                TriageError::ProviderCallFailed(format!("timed out after {:?}", limit))
            })?,
            None => call.await,
        }
        .map_err(|e| TriageError::ProviderCallFailed(format!("{:#}", e)))?;

        parse_verdict(reply.trim())
    }

    pub fn roster(&self) -> &ModelRoster {
        &self.roster
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }
}

/// Cut a diagnostic to at most `max` characters
fn truncate_diagnostic(message: &str, max: usize) -> String {
    match message.char_indices().nth(max) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::types::Urgency;

    const URGENT_REPLY: &str =
        r#"{"urgency":"URGENT","reason":"Server is down.","action":"Restart it."}"#;

    /// Mock provider with a scripted reply per model; unknown models error
    struct ScriptedProvider {
        replies: HashMap<String, Result<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[(&str, Result<&str, &str>)]) -> Arc<Self> {
            Arc::new(Self {
                replies: replies
                    .iter()
                    .map(|(m, r)| {
                        (
                            m.to_string(),
                            (*r).map(str::to_string).map_err(str::to_string),
                        )
                    })
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedProvider {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            match self.replies.get(model) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(anyhow!("{}", e)),
                None => Err(anyhow!("status 404: model {} not found", model)),
            }
        }
    }

    /// Mock provider that never answers
    struct HangingProvider;

    #[async_trait]
    impl TextGenerator for HangingProvider {
        fn provider_name(&self) -> &str {
            "hanging"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
            std::future::pending::<Result<String>>().await
        }
    }

    fn roster(models: &[&str]) -> ModelRoster {
        ModelRoster::new(models.iter().copied()).unwrap()
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("Outage", "Everything is on fire.")
    }

    #[tokio::test]
    async fn test_first_model_success() {
        let provider = ScriptedProvider::new(&[("a", Ok(URGENT_REPLY)), ("b", Ok(URGENT_REPLY))]);
        let router = ModelRouter::new(provider.clone(), roster(&["a", "b"]));

        let report = router.invoke(&request()).await;
        assert_eq!(report.outcome.as_ref().unwrap().urgency, Urgency::Urgent);
        assert_eq!(report.winning_model(), Some("a"));
        assert_eq!(provider.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_failover_stops_at_first_success() {
        let provider = ScriptedProvider::new(&[
            ("a", Err("status 429: quota exceeded")),
            ("b", Ok("I cannot help with that.")),
            ("c", Ok("```json\n{\"urgency\":\"IGNORE\",\"reason\":\"Ad.\",\"action\":\"Delete.\"}\n```")),
            ("d", Ok(URGENT_REPLY)),
        ]);
        let router = ModelRouter::new(provider.clone(), roster(&["a", "b", "c", "d"]));

        let report = router.invoke(&request()).await;
        let result = report.outcome.clone().unwrap();
        assert_eq!(result.urgency, Urgency::Ignore);
        assert_eq!(result.reason, "Ad.");
        assert_eq!(provider.calls(), vec!["a", "b", "c"]);
        assert_eq!(report.attempts.len(), 3);
        assert!(!report.attempts[0].is_success());
        assert!(!report.attempts[1].is_success());
        assert_eq!(report.winning_model(), Some("c"));
    }

    #[tokio::test]
    async fn test_all_models_fail_once_each_in_order() {
        let provider = ScriptedProvider::new(&[]);
        let router = ModelRouter::new(provider.clone(), roster(&["x", "y", "z"]));

        let report = router.invoke(&request()).await;
        assert_eq!(report.outcome, Err(TriageError::RosterExhausted));
        assert_eq!(provider.calls(), vec!["x", "y", "z"]);
        assert!(report.winning_model().is_none());
        assert!(report.attempts.iter().all(|a| !a.is_success()));
    }

    #[tokio::test]
    async fn test_schema_violation_advances() {
        let provider = ScriptedProvider::new(&[
            ("a", Ok(r#"{"urgency":"CRITICAL","reason":"r","action":"a"}"#)),
            ("b", Ok(URGENT_REPLY)),
        ]);
        let router = ModelRouter::new(provider.clone(), roster(&["a", "b"]));

        let report = router.invoke(&request()).await;
        assert_eq!(report.winning_model(), Some("b"));
        match &report.attempts[0].outcome {
            AttemptOutcome::Failure(msg) => assert!(msg.contains("schema")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reply_is_trimmed_before_extraction() {
        let padded = format!("\n\n   {}   \n", URGENT_REPLY);
        let provider = ScriptedProvider::new(&[("a", Ok(padded.as_str()))]);
        let router = ModelRouter::new(provider, roster(&["a"]));

        let report = router.invoke(&request()).await;
        assert!(report.outcome.is_ok());
    }

    #[tokio::test]
    async fn test_failure_diagnostics_are_truncated() {
        let long_error = "e".repeat(500);
        let provider = ScriptedProvider::new(&[("a", Err(long_error.as_str()))]);
        let router = ModelRouter::new(provider, roster(&["a"]));

        let report = router.invoke(&request()).await;
        match &report.attempts[0].outcome {
            AttemptOutcome::Failure(msg) => assert_eq!(msg.chars().count(), MAX_DIAGNOSTIC_CHARS),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_attempt_timeout_advances_to_next_model() {
        let router = ModelRouter::new(Arc::new(HangingProvider), roster(&["slow", "slower"]))
            .with_attempt_timeout(Duration::from_millis(20));

        let report = router.invoke(&request()).await;
        assert_eq!(report.outcome, Err(TriageError::RosterExhausted));
        assert_eq!(report.attempts.len(), 2);
        match &report.attempts[0].outcome {
            AttemptOutcome::Failure(msg) => assert!(msg.contains("timed out")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_diagnostic() {
        assert_eq!(truncate_diagnostic("short", 80), "short");
        assert_eq!(truncate_diagnostic("abcdef", 3), "abc");
        assert_eq!(truncate_diagnostic("ééééé", 2), "éé");
    }

    #[test]
    fn test_router_accessors() {
        let router = ModelRouter::new(ScriptedProvider::new(&[]), roster(&["m"]))
            .with_attempt_timeout(Duration::from_secs(30));
        assert_eq!(router.provider_name(), "scripted");
        assert_eq!(router.roster().primary(), "m");
        assert_eq!(router.attempt_timeout(), Some(Duration::from_secs(30)));
    }
}
