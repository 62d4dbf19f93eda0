//! PostgreSQL-backed `AttendanceRepository` implementation using Diesel ORM.
//!
//! Each unit checks out one pooled connection and opens a transaction on it.
//! Updates are conditional on the stored `revisao`; every insert or update is
//! followed by an audit snapshot in `frequencia_atirador_log` that references
//! the unit's `log` row. A unit dropped without `commit` or `rollback` returns
//! its connection with the transaction still open, which the pool treats as
//! broken and closes, so PostgreSQL discards the work.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{AttendanceRepository, AttendanceRepositoryError, AttendanceUnit};
use crate::domain::{Attendance, AuditAction};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{cast_count, cast_count_for_db, cast_revision, cast_revision_for_db};
use super::models::{AttendanceRow, AttendanceUpdate, NewAttendanceRow, NewAuditRow, NewLogRow};
use super::pool::{DbPool, PoolError};
use super::schema::{frequencia_atirador, frequencia_atirador_log, log};

/// Diesel-backed implementation of the attendance repository port.
#[derive(Clone)]
pub struct DieselAttendanceRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselAttendanceRepository {
    /// Create a repository stamping rows with `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> AttendanceRepositoryError {
    map_basic_pool_error(error, AttendanceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> AttendanceRepositoryError {
    map_basic_diesel_error(
        error,
        operation,
        AttendanceRepositoryError::query,
        AttendanceRepositoryError::connection,
    )
}

fn row_to_attendance(row: AttendanceRow) -> Result<Attendance, AttendanceRepositoryError> {
    let AttendanceRow {
        id,
        controle,
        cr,
        calibre,
        arma_utilizada,
        numero_serie,
        guia_de_trafego,
        quantidade_municao,
        data_inicio_treino,
        data_termino_treino,
        data_criacao,
        data_atualizacao,
        data_confirmacao,
        imagem_numero_controle,
        imagem_confirmacao,
        revisao,
    } = row;

    Ok(Attendance {
        id,
        control: controle,
        cr,
        caliber: calibre,
        weapon: arma_utilizada,
        serial_number: numero_serie,
        traffic_guide: guia_de_trafego,
        ammunition_count: cast_count(quantidade_municao)
            .map_err(AttendanceRepositoryError::query)?,
        training_start: data_inicio_treino,
        training_end: data_termino_treino,
        created_at: data_criacao,
        updated_at: data_atualizacao,
        confirmed_at: data_confirmacao,
        control_number_image: imagem_numero_controle,
        confirmation_image: imagem_confirmacao,
        revision: cast_revision(revisao),
    })
}

#[async_trait]
impl AttendanceRepository for DieselAttendanceRepository {
    async fn begin(
        &self,
        remote_addr: Option<String>,
    ) -> Result<Box<dyn AttendanceUnit>, AttendanceRepositoryError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::begin_transaction(&mut *conn)
            .await
            .map_err(|err| map_diesel_error(err, "begin transaction"))?;
        Ok(Box::new(DieselAttendanceUnit {
            conn,
            clock: Arc::clone(&self.clock),
            remote_addr,
            log_id: None,
        }))
    }
}

/// One open transaction on a dedicated connection.
struct DieselAttendanceUnit {
    conn: PooledConnection<'static, AsyncPgConnection>,
    clock: Arc<dyn Clock>,
    remote_addr: Option<String>,
    log_id: Option<i64>,
}

impl DieselAttendanceUnit {
    /// Id of this unit's `log` row, inserting it on first use.
    async fn log_id(&mut self) -> Result<i64, AttendanceRepositoryError> {
        if let Some(id) = self.log_id {
            return Ok(id);
        }
        let row = NewLogRow {
            data_criacao: self.clock.utc(),
            endereco_remoto: self.remote_addr.as_deref(),
        };
        let id = diesel::insert_into(log::table)
            .values(&row)
            .returning(log::id)
            .get_result::<i64>(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert log"))?;
        self.log_id = Some(id);
        Ok(id)
    }

    async fn audit(
        &mut self,
        action: AuditAction,
        attendance: &Attendance,
    ) -> Result<(), AttendanceRepositoryError> {
        let id_log = self.log_id().await?;
        let row = NewAuditRow {
            id_log,
            acao: action.as_str(),
            id_frequencia_atirador: attendance.id,
            controle: attendance.control,
            cr: &attendance.cr,
            calibre: &attendance.caliber,
            arma_utilizada: &attendance.weapon,
            numero_serie: &attendance.serial_number,
            guia_de_trafego: attendance.traffic_guide,
            quantidade_municao: cast_count_for_db(attendance.ammunition_count)
                .map_err(AttendanceRepositoryError::query)?,
            data_inicio_treino: attendance.training_start,
            data_termino_treino: attendance.training_end,
            data_criacao: attendance.created_at,
            data_atualizacao: attendance.updated_at,
            data_confirmacao: attendance.confirmed_at,
            imagem_numero_controle: &attendance.control_number_image,
            imagem_confirmacao: &attendance.confirmation_image,
            revisao: cast_revision_for_db(attendance.revision),
        };
        diesel::insert_into(frequencia_atirador_log::table)
            .values(&row)
            .execute(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert audit row"))?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceUnit for DieselAttendanceUnit {
    async fn create(
        &mut self,
        attendance: &mut Attendance,
    ) -> Result<i64, AttendanceRepositoryError> {
        let now = self.clock.utc();
        let row = NewAttendanceRow {
            controle: attendance.control,
            cr: &attendance.cr,
            calibre: &attendance.caliber,
            arma_utilizada: &attendance.weapon,
            numero_serie: &attendance.serial_number,
            guia_de_trafego: attendance.traffic_guide,
            quantidade_municao: cast_count_for_db(attendance.ammunition_count)
                .map_err(AttendanceRepositoryError::query)?,
            data_inicio_treino: attendance.training_start,
            data_termino_treino: attendance.training_end,
            data_criacao: now,
            data_atualizacao: now,
            data_confirmacao: attendance.confirmed_at,
            imagem_numero_controle: &attendance.control_number_image,
            imagem_confirmacao: &attendance.confirmation_image,
            revisao: 0,
        };
        let id = diesel::insert_into(frequencia_atirador::table)
            .values(&row)
            .returning(frequencia_atirador::id)
            .get_result::<i64>(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert attendance"))?;

        attendance.id = id;
        attendance.created_at = now;
        attendance.updated_at = now;
        attendance.revision = 0;
        self.audit(AuditAction::Create, attendance).await?;
        Ok(id)
    }

    async fn update(&mut self, attendance: &mut Attendance) -> Result<(), AttendanceRepositoryError> {
        let now = self.clock.utc();
        let next_revision = attendance.revision.checked_add(1).ok_or_else(|| {
            AttendanceRepositoryError::query(format!(
                "attendance {} revision overflow",
                attendance.id
            ))
        })?;
        let changes = AttendanceUpdate {
            data_atualizacao: now,
            data_confirmacao: attendance.confirmed_at,
            imagem_numero_controle: &attendance.control_number_image,
            imagem_confirmacao: &attendance.confirmation_image,
            revisao: cast_revision_for_db(next_revision),
        };
        let updated = diesel::update(frequencia_atirador::table)
            .filter(frequencia_atirador::id.eq(attendance.id))
            .filter(frequencia_atirador::revisao.eq(cast_revision_for_db(attendance.revision)))
            .set(&changes)
            .execute(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "update attendance"))?;

        if updated == 0 {
            debug!(
                attendance_id = attendance.id,
                revision = attendance.revision,
                "optimistic update matched no row"
            );
            return Err(AttendanceRepositoryError::stale(
                attendance.id,
                attendance.revision,
            ));
        }

        attendance.updated_at = now;
        attendance.revision = next_revision;
        self.audit(AuditAction::Update, attendance).await
    }

    async fn fetch(&mut self, id: i64) -> Result<Attendance, AttendanceRepositoryError> {
        let row = frequencia_atirador::table
            .find(id)
            .select(AttendanceRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "select attendance"))?;
        row.ok_or_else(|| AttendanceRepositoryError::not_found(id))
            .and_then(row_to_attendance)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), AttendanceRepositoryError> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "commit transaction"))
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), AttendanceRepositoryError> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::rollback_transaction(&mut *self.conn)
            .await
            .map_err(|err| map_diesel_error(err, "rollback transaction"))
    }
}

/// One audit row as seen by integration tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTrailEntry {
    pub transaction_id: i64,
    pub action: String,
    pub revision: u32,
}

#[cfg(any(test, feature = "test-support"))]
impl DieselAttendanceRepository {
    /// Audit rows of attendance `id`, oldest first.
    pub async fn audit_trail(
        &self,
        id: i64,
    ) -> Result<Vec<AuditTrailEntry>, AttendanceRepositoryError> {
        use super::models::AuditRow;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AuditRow> = frequencia_atirador_log::table
            .filter(frequencia_atirador_log::id_frequencia_atirador.eq(id))
            .select(AuditRow::as_select())
            .order_by(frequencia_atirador_log::id)
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "select audit rows"))?;
        Ok(rows
            .into_iter()
            .map(|row| AuditTrailEntry {
                transaction_id: row.id_log,
                action: row.acao,
                revision: cast_revision(row.revisao),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; statements run in `tests/`.
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    fn row() -> AttendanceRow {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 14, 15, 0, 0)
            .single()
            .expect("valid timestamp");
        AttendanceRow {
            id: 3,
            controle: 99,
            cr: "380308".to_owned(),
            calibre: "CALIBRE .380".to_owned(),
            arma_utilizada: "ARMA DO CLUBE".to_owned(),
            numero_serie: "ZA785671".to_owned(),
            guia_de_trafego: Some(12),
            quantidade_municao: 50,
            data_inicio_treino: at,
            data_termino_treino: at,
            data_criacao: at,
            data_atualizacao: at,
            data_confirmacao: None,
            imagem_numero_controle: "png".to_owned(),
            imagem_confirmacao: String::new(),
            revisao: 1,
        }
    }

    #[rstest]
    fn rows_map_onto_attendance() {
        let attendance = row_to_attendance(row()).expect("valid row");
        assert_eq!(attendance.control_number().to_string(), "3-99");
        assert_eq!(attendance.ammunition_count, 50);
        assert_eq!(attendance.revision, 1);
        assert_eq!(attendance.traffic_guide, Some(12));
    }

    #[rstest]
    fn negative_counts_are_query_errors() {
        let mut bad = row();
        bad.quantidade_municao = -5;
        let err = row_to_attendance(bad).expect_err("negative count");
        assert!(matches!(err, AttendanceRepositoryError::Query { .. }));
    }
}
