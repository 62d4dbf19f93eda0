//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. The
//! `diesel print-schema` command regenerates them from a live database.

diesel::table! {
    /// One row per request that mutated attendance data.
    log (id) {
        id -> Int8,
        data_criacao -> Timestamptz,
        endereco_remoto -> Nullable<Text>,
    }
}

diesel::table! {
    /// Live attendance records.
    frequencia_atirador (id) {
        id -> Int8,
        controle -> Int8,
        cr -> Varchar,
        calibre -> Varchar,
        arma_utilizada -> Varchar,
        numero_serie -> Varchar,
        guia_de_trafego -> Nullable<Int8>,
        quantidade_municao -> Int4,
        data_inicio_treino -> Timestamptz,
        data_termino_treino -> Timestamptz,
        data_criacao -> Timestamptz,
        data_atualizacao -> Timestamptz,
        data_confirmacao -> Nullable<Timestamptz>,
        imagem_numero_controle -> Text,
        imagem_confirmacao -> Text,
        /// Optimistic-lock version, bumped by every update.
        revisao -> Int4,
    }
}

diesel::table! {
    /// Append-only snapshots of `frequencia_atirador`.
    frequencia_atirador_log (id) {
        id -> Int8,
        id_log -> Int8,
        acao -> Varchar,
        id_frequencia_atirador -> Int8,
        controle -> Int8,
        cr -> Varchar,
        calibre -> Varchar,
        arma_utilizada -> Varchar,
        numero_serie -> Varchar,
        guia_de_trafego -> Nullable<Int8>,
        quantidade_municao -> Int4,
        data_inicio_treino -> Timestamptz,
        data_termino_treino -> Timestamptz,
        data_criacao -> Timestamptz,
        data_atualizacao -> Timestamptz,
        data_confirmacao -> Nullable<Timestamptz>,
        imagem_numero_controle -> Text,
        imagem_confirmacao -> Text,
        revisao -> Int4,
    }
}

diesel::joinable!(frequencia_atirador_log -> log (id_log));
diesel::joinable!(frequencia_atirador_log -> frequencia_atirador (id_frequencia_atirador));

diesel::allow_tables_to_appear_in_same_query!(log, frequencia_atirador, frequencia_atirador_log);
