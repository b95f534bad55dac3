//! Text generation providers and the roster router
//!
//! A provider implements [`TextGenerator`] and is driven by [`ModelRouter`],
//! which tries each model of a [`crate::ModelRoster`] in order until one of them
//! returns a usable verdict.

pub mod google;
pub mod router;
pub mod types;

pub use google::GeminiProvider;
pub use router::{InvocationReport, ModelRouter};
pub use types::TextGenerator;
