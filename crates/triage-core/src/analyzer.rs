//! Request handling: one email in, one verdict out

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::error::TriageError;
use crate::fallback::{FallbackCause, fallback_result};
use crate::providers::{GeminiProvider, ModelRouter, TextGenerator};
use crate::roster::ModelRoster;
use crate::types::{AnalysisRequest, AnalysisResult};

/// Entry point for callers that have a subject and a body and want a verdict.
///
/// `analyze` never fails. Without a provider it answers with the fallback
/// verdict immediately; with one it walks the roster once and falls back if
/// every model fails. Holds no per-request state, so one instance can serve
/// concurrent requests.
pub struct Analyzer {
    roster: ModelRoster,
    router: Option<ModelRouter>,
}

impl Analyzer {
    /// Analyzer backed by a configured router
    pub fn new(router: ModelRouter) -> Self {
        Self {
            roster: router.roster().clone(),
            router: Some(router),
        }
    }

    /// Analyzer with no provider credential; every request gets the fallback
    pub fn unconfigured(roster: ModelRoster) -> Self {
        Self {
            roster,
            router: None,
        }
    }

    /// Wire a Gemini provider if `api_key` holds a credential.
    ///
    /// A missing or blank key yields an unconfigured analyzer rather than an error.
    pub fn gemini(
        api_key: Option<&str>,
        base_url: &str,
        roster: ModelRoster,
        attempt_timeout: Option<Duration>,
    ) -> Result<Self> {
        let key = match api_key.map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => return Ok(Self::unconfigured(roster)),
        };

        let provider: Arc<dyn TextGenerator> =
            Arc::new(GeminiProvider::with_base_url(key.to_string(), base_url.to_string())?);
        let mut router = ModelRouter::new(provider, roster);
        if let Some(limit) = attempt_timeout {
            router = router.with_attempt_timeout(limit);
        }
        Ok(Self::new(router))
    }

    /// Classify one email
    pub async fn analyze(&self, subject: &str, body: &str) -> AnalysisResult {
        self.analyze_request(&AnalysisRequest::new(subject, body)).await
    }

    pub async fn analyze_request(&self, request: &AnalysisRequest) -> AnalysisResult {
        let span = info_span!("analyze", request_id = %Uuid::new_v4());
        async {
            let outcome = match &self.router {
                Some(router) => {
                    let report = router.invoke(request).await;
                    debug!("Roster walk made {} attempt(s)", report.attempts.len());
                    report.into_result()
                }
                None => Err(TriageError::ProviderUnconfigured),
            };

            outcome.unwrap_or_else(|e| fallback_result(FallbackCause::from(&e)))
        }
        .instrument(span)
        .await
    }

    pub fn is_configured(&self) -> bool {
        self.router.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.router.as_ref().map(|r| r.provider_name())
    }

    pub fn roster(&self) -> &ModelRoster {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::fallback::{EXHAUSTED_REASON, UNCONFIGURED_REASON};
    use crate::types::Urgency;

    /// Mock provider that always returns the same text
    struct FixedProvider {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.starts_with("Analyze this email."));
            Ok(self.reply.clone())
        }
    }

    /// Mock provider that always fails
    struct FailProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for FailProvider {
        fn provider_name(&self) -> &str {
            "fail"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("status 401: API key not valid"))
        }
    }

    fn roster() -> ModelRoster {
        ModelRoster::new(["m1", "m2", "m3"]).unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_returns_fallback() {
        let analyzer = Analyzer::unconfigured(roster());
        assert!(!analyzer.is_configured());
        assert!(analyzer.provider_name().is_none());

        let result = analyzer.analyze("subject", "body").await;
        assert_eq!(result.urgency, Urgency::Important);
        assert_eq!(result.reason, UNCONFIGURED_REASON);
        assert_eq!(result.action, "Review manually.");
    }

    #[tokio::test]
    async fn test_all_failing_returns_exhausted_fallback() {
        let provider = Arc::new(FailProvider {
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(ModelRouter::new(provider.clone(), roster()));

        let result = analyzer.analyze("subject", "body").await;
        assert_eq!(result.urgency, Urgency::Important);
        assert_eq!(result.reason, EXHAUSTED_REASON);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_passes_verdict_through() {
        let provider = Arc::new(FixedProvider {
            reply: r#"Sure! {"urgency":"IGNORE","reason":"Promotional.","action":"Archive."}"#
                .to_string(),
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(ModelRouter::new(provider.clone(), roster()));

        let result = analyzer.analyze("50% off", "Buy now").await;
        assert_eq!(result.urgency, Urgency::Ignore);
        assert_eq!(result.reason, "Promotional.");
        assert_eq!(result.action, "Archive.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analyze_is_idempotent_with_deterministic_provider() {
        let provider = Arc::new(FixedProvider {
            reply: r#"{"urgency":"URGENT","reason":"r","action":"a"}"#.to_string(),
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(ModelRouter::new(provider, roster()));

        let first = analyzer.analyze("same", "input").await;
        let second = analyzer.analyze("same", "input").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_inputs_still_yield_verdict() {
        let provider = Arc::new(FixedProvider {
            reply: "garbage".to_string(),
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(ModelRouter::new(provider, roster()));

        let result = analyzer.analyze("", "").await;
        assert!(Urgency::ALL.contains(&result.urgency));
        assert!(!result.reason.is_empty());
        assert!(!result.action.is_empty());
    }

    #[test]
    fn test_gemini_blank_key_is_unconfigured() {
        let analyzer = Analyzer::gemini(Some("   "), "http://localhost", roster(), None).unwrap();
        assert!(!analyzer.is_configured());
        let analyzer = Analyzer::gemini(None, "http://localhost", roster(), None).unwrap();
        assert!(!analyzer.is_configured());
        assert_eq!(analyzer.roster().len(), 3);
    }

    #[test]
    fn test_gemini_with_key_is_configured() {
        let analyzer = Analyzer::gemini(
            Some("AIza-test"),
            "http://localhost",
            roster(),
            Some(Duration::from_secs(10)),
        )
        .unwrap();
        assert!(analyzer.is_configured());
        assert_eq!(analyzer.provider_name(), Some("google"));
    }
}
