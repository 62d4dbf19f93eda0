//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{frequencia_atirador, frequencia_atirador_log, log};

/// Row struct for reading from the frequencia_atirador table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = frequencia_atirador)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttendanceRow {
    pub id: i64,
    pub controle: i64,
    pub cr: String,
    pub calibre: String,
    pub arma_utilizada: String,
    pub numero_serie: String,
    pub guia_de_trafego: Option<i64>,
    pub quantidade_municao: i32,
    pub data_inicio_treino: DateTime<Utc>,
    pub data_termino_treino: DateTime<Utc>,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
    pub data_confirmacao: Option<DateTime<Utc>>,
    pub imagem_numero_controle: String,
    pub imagem_confirmacao: String,
    pub revisao: i32,
}

/// Insertable struct for creating attendance records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = frequencia_atirador)]
pub(crate) struct NewAttendanceRow<'a> {
    pub controle: i64,
    pub cr: &'a str,
    pub calibre: &'a str,
    pub arma_utilizada: &'a str,
    pub numero_serie: &'a str,
    pub guia_de_trafego: Option<i64>,
    pub quantidade_municao: i32,
    pub data_inicio_treino: DateTime<Utc>,
    pub data_termino_treino: DateTime<Utc>,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
    pub data_confirmacao: Option<DateTime<Utc>>,
    pub imagem_numero_controle: &'a str,
    pub imagem_confirmacao: &'a str,
    pub revisao: i32,
}

/// Changeset for the fields that may change after creation.
///
/// `data_confirmacao` is written even when `None`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = frequencia_atirador)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AttendanceUpdate<'a> {
    pub data_atualizacao: DateTime<Utc>,
    pub data_confirmacao: Option<DateTime<Utc>>,
    pub imagem_numero_controle: &'a str,
    pub imagem_confirmacao: &'a str,
    pub revisao: i32,
}

/// Insertable struct for the per-request transaction record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = log)]
pub(crate) struct NewLogRow<'a> {
    pub data_criacao: DateTime<Utc>,
    pub endereco_remoto: Option<&'a str>,
}

/// Insertable audit snapshot.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = frequencia_atirador_log)]
pub(crate) struct NewAuditRow<'a> {
    pub id_log: i64,
    pub acao: &'a str,
    pub id_frequencia_atirador: i64,
    pub controle: i64,
    pub cr: &'a str,
    pub calibre: &'a str,
    pub arma_utilizada: &'a str,
    pub numero_serie: &'a str,
    pub guia_de_trafego: Option<i64>,
    pub quantidade_municao: i32,
    pub data_inicio_treino: DateTime<Utc>,
    pub data_termino_treino: DateTime<Utc>,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
    pub data_confirmacao: Option<DateTime<Utc>>,
    pub imagem_numero_controle: &'a str,
    pub imagem_confirmacao: &'a str,
    pub revisao: i32,
}

/// Audit row as read back by integration tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = frequencia_atirador_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuditRow {
    pub id_log: i64,
    pub acao: String,
    pub id_frequencia_atirador: i64,
    pub revisao: i32,
}
