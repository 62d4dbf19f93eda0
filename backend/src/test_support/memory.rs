//! In-memory attendance store.
//!
//! Units write straight into the shared store and keep an undo log, so a
//! rolled-back or dropped unit leaves no trace while concurrent units still
//! observe each other's revisions the way row-level locking would.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AttendanceRepository, AttendanceRepositoryError, AttendanceUnit, StoreHealth,
    StoreHealthError,
};
use crate::domain::{Attendance, AuditAction};

/// Snapshot written after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub audit_id: i64,
    pub transaction_id: i64,
    pub action: AuditAction,
    pub snapshot: Attendance,
}

/// Transaction record shared by the audit rows of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub remote_addr: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    rows: BTreeMap<i64, Attendance>,
    audit: Vec<AuditRecord>,
    transactions: Vec<TransactionRecord>,
    last_id: i64,
    last_audit_id: i64,
    last_transaction_id: i64,
    begin_failure: Option<AttendanceRepositoryError>,
    unavailable: bool,
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, cloneable in-memory repository.
#[derive(Clone)]
pub struct InMemoryAttendanceRepository {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAttendanceRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            clock,
        }
    }

    /// Store `attendance` as-is under a fresh id, bypassing units and audit.
    pub fn seed(&self, mut attendance: Attendance) -> Attendance {
        let mut store = lock(&self.store);
        store.last_id += 1;
        attendance.id = store.last_id;
        store.rows.insert(attendance.id, attendance.clone());
        attendance
    }

    pub fn row(&self, id: i64) -> Option<Attendance> {
        lock(&self.store).rows.get(&id).cloned()
    }

    pub fn rows(&self) -> Vec<Attendance> {
        lock(&self.store).rows.values().cloned().collect()
    }

    pub fn audit_rows(&self) -> Vec<AuditRecord> {
        lock(&self.store).audit.clone()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        lock(&self.store).transactions.clone()
    }

    /// Make the next `begin` calls fail with `error` until cleared.
    pub fn fail_begin(&self, error: Option<AttendanceRepositoryError>) {
        lock(&self.store).begin_failure = error;
    }

    /// Toggle the outcome of [`StoreHealth::ping`].
    pub fn set_available(&self, available: bool) {
        lock(&self.store).unavailable = !available;
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn begin(
        &self,
        remote_addr: Option<String>,
    ) -> Result<Box<dyn AttendanceUnit>, AttendanceRepositoryError> {
        if let Some(error) = lock(&self.store).begin_failure.clone() {
            return Err(error);
        }
        Ok(Box::new(InMemoryUnit {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            remote_addr,
            transaction_id: None,
            undo: Vec::new(),
            finished: false,
        }))
    }
}

#[async_trait]
impl StoreHealth for InMemoryAttendanceRepository {
    async fn ping(&self) -> Result<(), StoreHealthError> {
        if lock(&self.store).unavailable {
            Err(StoreHealthError::unavailable("in-memory store switched off"))
        } else {
            Ok(())
        }
    }
}

enum Undo {
    Inserted(i64),
    Replaced(Attendance),
    Audited(i64),
    Opened(i64),
}

struct InMemoryUnit {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
    remote_addr: Option<String>,
    transaction_id: Option<i64>,
    undo: Vec<Undo>,
    finished: bool,
}

impl InMemoryUnit {
    fn transaction_id(&mut self, store: &mut Store) -> i64 {
        if let Some(id) = self.transaction_id {
            return id;
        }
        store.last_transaction_id += 1;
        let id = store.last_transaction_id;
        store.transactions.push(TransactionRecord {
            id,
            created_at: self.clock.utc(),
            remote_addr: self.remote_addr.clone(),
        });
        self.undo.push(Undo::Opened(id));
        self.transaction_id = Some(id);
        id
    }

    fn audit(&mut self, store: &mut Store, action: AuditAction, snapshot: &Attendance) {
        let transaction_id = self.transaction_id(store);
        store.last_audit_id += 1;
        let audit_id = store.last_audit_id;
        store.audit.push(AuditRecord {
            audit_id,
            transaction_id,
            action,
            snapshot: snapshot.clone(),
        });
        self.undo.push(Undo::Audited(audit_id));
    }

    fn undo_all(&mut self) {
        let mut store = lock(&self.store);
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Inserted(id) => {
                    store.rows.remove(&id);
                }
                Undo::Replaced(previous) => {
                    store.rows.insert(previous.id, previous);
                }
                Undo::Audited(audit_id) => store.audit.retain(|row| row.audit_id != audit_id),
                Undo::Opened(id) => store.transactions.retain(|row| row.id != id),
            }
        }
        self.finished = true;
    }
}

#[async_trait]
impl AttendanceUnit for InMemoryUnit {
    async fn create(&mut self, attendance: &mut Attendance) -> Result<i64, AttendanceRepositoryError> {
        let store_handle = Arc::clone(&self.store);
        let mut store = lock(&store_handle);
        let now = self.clock.utc();
        store.last_id += 1;
        attendance.id = store.last_id;
        attendance.created_at = now;
        attendance.updated_at = now;
        attendance.revision = 0;
        store.rows.insert(attendance.id, attendance.clone());
        self.undo.push(Undo::Inserted(attendance.id));
        self.audit(&mut store, AuditAction::Create, attendance);
        Ok(attendance.id)
    }

    async fn update(&mut self, attendance: &mut Attendance) -> Result<(), AttendanceRepositoryError> {
        let store_handle = Arc::clone(&self.store);
        let mut store = lock(&store_handle);
        let current = match store.rows.get(&attendance.id) {
            Some(current) if current.revision == attendance.revision => current.clone(),
            _ => {
                return Err(AttendanceRepositoryError::stale(
                    attendance.id,
                    attendance.revision,
                ));
            }
        };
        attendance.updated_at = self.clock.utc();
        attendance.revision += 1;
        store.rows.insert(attendance.id, attendance.clone());
        self.undo.push(Undo::Replaced(current));
        self.audit(&mut store, AuditAction::Update, attendance);
        Ok(())
    }

    async fn fetch(&mut self, id: i64) -> Result<Attendance, AttendanceRepositoryError> {
        lock(&self.store)
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AttendanceRepositoryError::not_found(id))
    }

    async fn commit(mut self: Box<Self>) -> Result<(), AttendanceRepositoryError> {
        self.undo.clear();
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), AttendanceRepositoryError> {
        self.undo_all();
        Ok(())
    }
}

impl Drop for InMemoryUnit {
    fn drop(&mut self) {
        if !self.finished {
            self.undo_all();
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::AttendanceDraft;
    use crate::test_support::MutableClock;

    #[fixture]
    fn repository() -> InMemoryAttendanceRepository {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 15, 0, 0)
            .single()
            .expect("valid timestamp");
        InMemoryAttendanceRepository::new(Arc::new(MutableClock::new(now)))
    }

    fn draft_attendance() -> Attendance {
        let now = Utc::now();
        Attendance::new(
            AttendanceDraft {
                cr: "380308".to_owned(),
                caliber: "CALIBRE .380".to_owned(),
                weapon: "ARMA DO CLUBE".to_owned(),
                serial_number: "ZA785671".to_owned(),
                traffic_guide: None,
                ammunition_count: 50,
                training_start: now,
                training_end: now,
            },
            9,
            now,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn audit_rows_share_the_unit_transaction(repository: InMemoryAttendanceRepository) {
        let mut unit = repository.begin(Some("10.0.0.1".to_owned())).await.expect("begin");
        let mut attendance = draft_attendance();
        attendance.revision = 12;
        unit.create(&mut attendance).await.expect("create");
        assert_eq!(attendance.revision, 0);
        unit.update(&mut attendance).await.expect("update");
        unit.commit().await.expect("commit");

        let audit = repository.audit_rows();
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|row| row.transaction_id == audit[0].transaction_id));
        assert_eq!(
            repository.transactions()[0].remote_addr.as_deref(),
            Some("10.0.0.1")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_unit_leaves_no_trace(repository: InMemoryAttendanceRepository) {
        {
            let mut unit = repository.begin(None).await.expect("begin");
            unit.create(&mut draft_attendance()).await.expect("create");
        }
        assert!(repository.rows().is_empty());
        assert!(repository.audit_rows().is_empty());
        assert!(repository.transactions().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn second_writer_on_same_revision_is_stale(repository: InMemoryAttendanceRepository) {
        let stored = repository.seed(draft_attendance());
        let mut first = repository.begin(None).await.expect("begin");
        let mut second = repository.begin(None).await.expect("begin");
        let mut a = first.fetch(stored.id).await.expect("fetch");
        let mut b = second.fetch(stored.id).await.expect("fetch");

        first.update(&mut a).await.expect("first update wins");
        let err = second.update(&mut b).await.expect_err("second update loses");
        assert_eq!(err, AttendanceRepositoryError::stale(stored.id, 0_u32));
        first.commit().await.expect("commit");
        second.rollback().await.expect("rollback");

        assert_eq!(repository.row(stored.id).map(|row| row.revision), Some(1));
    }
}
