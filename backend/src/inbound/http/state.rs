//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they run against in-memory services in tests.

use std::sync::Arc;

use crate::domain::ports::{AttendanceCommand, AttendanceQuery, StoreHealth};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub attendance: Arc<dyn AttendanceCommand>,
    pub attendance_query: Arc<dyn AttendanceQuery>,
    pub store_health: Arc<dyn StoreHealth>,
}

impl HttpState {
    /// Construct state from port implementations.
    pub fn new(
        attendance: Arc<dyn AttendanceCommand>,
        attendance_query: Arc<dyn AttendanceQuery>,
        store_health: Arc<dyn StoreHealth>,
    ) -> Self {
        Self {
            attendance,
            attendance_query,
            store_health,
        }
    }
}
