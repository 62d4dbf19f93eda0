//! `AF_` environment overlay.
//!
//! Every option `a.b.c` can be replaced by the variable `AF_A_B_C`. Numeric
//! and boolean options are parsed as YAML scalars; text options are taken
//! verbatim so secrets made of digits stay strings.

use mockable::Env;
use serde_yaml::{Mapping, Value};

/// Prefix shared by every overriding variable.
pub const ENV_PREFIX: &str = "AF_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Scalar,
}

const OPTIONS: &[(&str, Kind)] = &[
    ("atirador.prazo_confirmacao", Kind::Text),
    ("atirador.tempo_maximo_cadastro", Kind::Text),
    ("atirador.duracao_maxima_treino", Kind::Text),
    ("atirador.chave_codigo_verificacao", Kind::Text),
    ("atirador.imagem_numero_controle.largura", Kind::Scalar),
    ("atirador.imagem_numero_controle.altura", Kind::Scalar),
    ("atirador.imagem_numero_controle.cor_fundo", Kind::Text),
    ("atirador.imagem_numero_controle.borda.largura", Kind::Scalar),
    ("atirador.imagem_numero_controle.borda.espacamento", Kind::Scalar),
    ("atirador.imagem_numero_controle.borda.cor", Kind::Text),
    ("atirador.imagem_numero_controle.linha_fundo.largura", Kind::Scalar),
    ("atirador.imagem_numero_controle.linha_fundo.espacamento", Kind::Scalar),
    ("atirador.imagem_numero_controle.linha_fundo.cor", Kind::Text),
    ("atirador.imagem_numero_controle.fonte.face", Kind::Text),
    ("atirador.imagem_numero_controle.fonte.cor", Kind::Text),
    ("atirador.imagem_numero_controle.fonte.tamanho", Kind::Scalar),
    ("atirador.imagem_numero_controle.imagem_base", Kind::Text),
    ("atirador.imagem_numero_controle.logo.espacamento", Kind::Scalar),
    ("atirador.imagem_numero_controle.url_qrcode", Kind::Text),
    ("atirador.imagem_numero_controle.qrcode.tamanho", Kind::Scalar),
    ("atirador.imagem_confirmacao.tamanho_maximo", Kind::Scalar),
    ("banco_de_dados.endereco", Kind::Text),
    ("banco_de_dados.nome", Kind::Text),
    ("banco_de_dados.usuario", Kind::Text),
    ("banco_de_dados.senha", Kind::Text),
    ("banco_de_dados.tempo_esgotado_conexao", Kind::Text),
    ("banco_de_dados.maximo_numero_conexoes_abertas", Kind::Scalar),
    ("banco_de_dados.maximo_numero_conexoes_ociosas", Kind::Scalar),
    ("banco_de_dados.migracoes_automaticas", Kind::Scalar),
    ("servidor.endereco", Kind::Text),
    ("servidor.tamanho_maximo_requisicao", Kind::Scalar),
    ("servidor.tls.habilitado", Kind::Scalar),
    ("servidor.tls.arquivo_certificado", Kind::Text),
    ("servidor.tls.arquivo_chave", Kind::Text),
    ("syslog.endereco", Kind::Text),
    ("syslog.tempo_esgotado_conexao", Kind::Text),
];

/// Variable name overriding `option`.
///
/// # Examples
/// ```
/// use frequencia::settings::env_var_for;
///
/// assert_eq!(env_var_for("servidor.tls.habilitado"), "AF_SERVIDOR_TLS_HABILITADO");
/// ```
pub fn env_var_for(option: &str) -> String {
    format!("{ENV_PREFIX}{}", option.replace('.', "_").to_uppercase())
}

/// Replace options in `document` with any variables set in `env`.
pub fn apply<E: Env>(document: &mut Value, env: &E) {
    for (option, kind) in OPTIONS {
        let Some(raw) = env.string(&env_var_for(option)) else {
            continue;
        };
        let value = match kind {
            Kind::Text => Value::String(raw),
            Kind::Scalar => serde_yaml::from_str(&raw).unwrap_or(Value::String(raw)),
        };
        let path: Vec<&str> = option.split('.').collect();
        insert(document, &path, value);
    }
}

fn insert(node: &mut Value, path: &[&str], value: Value) {
    match path {
        [] => *node = value,
        [head, rest @ ..] => {
            if !node.is_mapping() {
                *node = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(map) = node {
                let child = map
                    .entry(Value::String((*head).to_owned()))
                    .or_insert(Value::Null);
                insert(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockable::MockEnv;
    use rstest::rstest;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    #[rstest]
    fn every_option_has_a_distinct_variable() {
        let mut names: Vec<String> = OPTIONS.iter().map(|(option, _)| env_var_for(option)).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), OPTIONS.len());
    }

    #[rstest]
    fn variables_create_missing_branches() {
        let mut document = Value::Null;
        apply(
            &mut document,
            &env(&[
                ("AF_SERVIDOR_TLS_HABILITADO", "true"),
                ("AF_BANCO_DE_DADOS_MAXIMO_NUMERO_CONEXOES_ABERTAS", "25"),
            ]),
        );
        assert_eq!(document["servidor"]["tls"]["habilitado"], Value::Bool(true));
        assert_eq!(
            document["banco_de_dados"]["maximo_numero_conexoes_abertas"],
            Value::Number(25.into())
        );
    }

    #[rstest]
    fn text_options_stay_strings() {
        let mut document: Value =
            serde_yaml::from_str("atirador:\n  chave_codigo_verificacao: old\n").expect("yaml");
        apply(
            &mut document,
            &env(&[("AF_ATIRADOR_CHAVE_CODIGO_VERIFICACAO", "123456")]),
        );
        assert_eq!(
            document["atirador"]["chave_codigo_verificacao"],
            Value::String("123456".to_owned())
        );
    }

    #[rstest]
    fn unrelated_variables_are_ignored() {
        let mut document = Value::Null;
        apply(&mut document, &env(&[("AF_UNKNOWN_OPTION", "1")]));
        assert_eq!(document, Value::Null);
    }
}
