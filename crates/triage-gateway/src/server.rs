//! Gateway HTTP server — Axum router around an [`Analyzer`]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use triage_core::{AnalysisRequest, AnalysisResult, Analyzer};

/// Shared state for all requests
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Arc<Analyzer>,
    pub started_at: DateTime<Utc>,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self {
            analyzer,
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl GatewayServer {
    pub fn new(bind: SocketAddr, analyzer: Arc<Analyzer>) -> Self {
        Self {
            state: GatewayState::new(analyzer),
            bind,
        }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/analyze", post(analyze_handler))
            .route("/api/status", get(status_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        info!("Gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

// ── HTTP Handlers ──

async fn analyze_handler(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<AnalysisResult>, (StatusCode, String)> {
    let request = parse_analyze_body(&body).map_err(|e| {
        warn!("Rejected analyze request with invalid JSON: {}", e);
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e))
    })?;

    debug!(
        "Analyze request: subject_len={}, body_len={}",
        request.subject.len(),
        request.body.len()
    );
    Ok(Json(state.analyzer.analyze_request(&request).await))
}

/// Read `{subject, body}` without trusting the client's types or headers.
///
/// Any Content-Type is accepted and an empty body counts as `{}`. Missing or
/// null fields become `""`, other non-string values are rendered as JSON text.
/// Only syntactically invalid JSON is an error.
fn parse_analyze_body(raw: &[u8]) -> Result<AnalysisRequest, serde_json::Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalysisRequest::default());
    }

    let value: Value = serde_json::from_slice(raw)?;
    Ok(AnalysisRequest::new(
        field_text(&value, "subject"),
        field_text(&value, "body"),
    ))
}

fn field_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

async fn status_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let analyzer = &state.analyzer;

    Json(serde_json::json!({
        "status": "ok",
        "provider_configured": analyzer.is_configured(),
        "provider": analyzer.provider_name(),
        "roster": analyzer.roster().as_slice(),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}
