//! Port for attendance persistence with optimistic locking and auditing.
//!
//! Work happens inside an [`AttendanceUnit`]: one store transaction opened by
//! [`AttendanceRepository::begin`]. The first mutation in a unit allocates a
//! transaction record; every audit row the unit writes carries its id.
//! Callers own the unit and must finish it with `commit` or `rollback`. A
//! unit dropped unfinished discards its work.

use async_trait::async_trait;

use crate::domain::Attendance;

use super::define_port_error;

define_port_error! {
    /// Errors raised by attendance repository adapters.
    pub enum AttendanceRepositoryError {
        /// No attendance row has this id.
        NotFound { id: i64 } => "attendance {id} not found",
        /// The row no longer carries the expected revision.
        Stale { id: i64, revision: u32 } =>
            "attendance {id} changed after revision {revision}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "attendance repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "attendance repository query failed: {message}",
    }
}

/// Opens transaction units against the attendance store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Start a unit of work. `remote_addr` is recorded on the transaction
    /// record if the unit mutates anything.
    async fn begin(
        &self,
        remote_addr: Option<String>,
    ) -> Result<Box<dyn AttendanceUnit>, AttendanceRepositoryError>;
}

/// One store transaction.
#[async_trait]
pub trait AttendanceUnit: Send {
    /// Insert `attendance`, writing a CREATE audit row.
    ///
    /// On success `id`, `created_at` and `updated_at` hold the stored values
    /// and `revision` is reset to 0. Returns the assigned id.
    async fn create(&mut self, attendance: &mut Attendance) -> Result<i64, AttendanceRepositoryError>;

    /// Store `attendance` if the row still carries `attendance.revision`,
    /// writing an UPDATE audit row.
    ///
    /// On success `updated_at` is refreshed and `revision` incremented. Fails
    /// with [`AttendanceRepositoryError::Stale`] when no row matches.
    async fn update(&mut self, attendance: &mut Attendance) -> Result<(), AttendanceRepositoryError>;

    /// Read the current row.
    async fn fetch(&mut self, id: i64) -> Result<Attendance, AttendanceRepositoryError>;

    /// Make the unit's writes durable.
    async fn commit(self: Box<Self>) -> Result<(), AttendanceRepositoryError>;

    /// Discard the unit's writes.
    async fn rollback(self: Box<Self>) -> Result<(), AttendanceRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn stale_error_names_revision() {
        let err = AttendanceRepositoryError::stale(7_i64, 3_u32);
        assert_eq!(err.to_string(), "attendance 7 changed after revision 3");
    }

    #[rstest]
    fn not_found_error_names_id() {
        let err = AttendanceRepositoryError::not_found(11_i64);
        assert_eq!(err, AttendanceRepositoryError::NotFound { id: 11 });
    }
}
