//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the attendance repository and store health
//! ports, backed by PostgreSQL through `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Validation and lifecycle rules live in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Diesel and pool failures are mapped onto port
//!   error enums.
//!
//! # Example
//!
//! ```ignore
//! use frequencia::outbound::persistence::{DbPool, DieselAttendanceRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/frequencia")).await?;
//! let repository = DieselAttendanceRepository::new(pool, Arc::new(DefaultClock));
//! ```

mod diesel_attendance_repository;
mod diesel_basic_error_mapping;
mod diesel_helpers;
mod diesel_store_health;
mod migrations;
mod models;
mod pool;
mod schema;

#[cfg(any(test, feature = "test-support"))]
pub use diesel_attendance_repository::AuditTrailEntry;
pub use diesel_attendance_repository::DieselAttendanceRepository;
pub use diesel_store_health::DieselStoreHealth;
pub use migrations::{MigrationError, run_pending_migrations, run_pending_migrations_async};
pub use pool::{DbPool, PoolConfig, PoolError};
