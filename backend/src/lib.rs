//! Shooting club attendance service.
//!
//! Shooters register a training session, receive a control-number ticket and
//! later confirm it on site. The crate is laid out hexagonally: `domain`
//! holds the rules and ports, `inbound` the HTTP adapter and `outbound` the
//! PostgreSQL and image adapters.

pub mod doc;
pub mod domain;
pub mod files;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::{Recover, Trace};
