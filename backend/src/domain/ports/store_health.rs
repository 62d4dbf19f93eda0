//! Port for probing the attendance store.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by store health probes.
    pub enum StoreHealthError {
        /// The store could not be reached or refused the probe.
        Unavailable { message: String } => "store unavailable: {message}",
    }
}

/// Liveness probe behind `GET /ping`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip a trivial statement through the store.
    async fn ping(&self) -> Result<(), StoreHealthError>;
}

/// Fixture probe that always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStoreHealth;

#[async_trait]
impl StoreHealth for FixtureStoreHealth {
    async fn ping(&self) -> Result<(), StoreHealthError> {
        Ok(())
    }
}
