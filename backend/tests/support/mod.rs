//! Embedded PostgreSQL helpers shared by the integration suites.
//!
//! Every test gets its own database cloned from a template that already
//! carries the migrations, so suites run in parallel against one cluster.

mod cluster_skip;
mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{provision_database, shared_cluster};
