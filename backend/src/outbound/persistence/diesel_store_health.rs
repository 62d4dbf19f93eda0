//! PostgreSQL liveness probe.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{StoreHealth, StoreHealthError};

use super::pool::DbPool;

const PROBE: &str = "SELECT NOW() AT TIME ZONE 'UTC'";

/// Round-trips the clock query through a pooled connection.
#[derive(Clone)]
pub struct DieselStoreHealth {
    pool: DbPool,
}

impl DieselStoreHealth {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for DieselStoreHealth {
    async fn ping(&self) -> Result<(), StoreHealthError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            warn!(error = %err, "ping could not check out a connection");
            StoreHealthError::unavailable(err.to_string())
        })?;
        diesel::sql_query(PROBE)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                warn!(error = %err, "ping query failed");
                StoreHealthError::unavailable(err.to_string())
            })
    }
}
