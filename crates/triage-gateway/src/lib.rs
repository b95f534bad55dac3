//! triage-gateway — HTTP boundary for email urgency triage
//!
//! Exposes `POST /analyze` for the mail UI and `GET /api/status` for operators.

pub mod server;

pub use server::{GatewayServer, GatewayState};
