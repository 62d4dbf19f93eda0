//! Service configuration.
//!
//! Settings come from a YAML document whose options may be replaced through
//! `AF_` environment variables (see [`env_var_for`]). Every option has a
//! default, so an empty document describes a local development setup.
//!
//! ```yaml
//! atirador:
//!   prazo_confirmacao: 30m
//!   chave_codigo_verificacao: abc123
//!   imagem_numero_controle:
//!     fonte:
//!       face: /usr/share/fonts/DejaVuSansMono-Bold.ttf
//!     url_qrcode: https://clube.example/frequencia/%s/%s?verificacao=%s
//! banco_de_dados:
//!   endereco: localhost:5432
//!   nome: frequencia
//! servidor:
//!   endereco: 0.0.0.0:8080
//! ```

mod overlay;
mod values;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mockable::Env;
use serde::Deserialize;
use serde_yaml::Value;
use url::Url;

use crate::domain::AttendancePolicy;
use crate::files::read_file;
use crate::outbound::imaging::ControlNumberImageConfig;
use crate::outbound::persistence::PoolConfig;

pub use overlay::{ENV_PREFIX, env_var_for};
pub use values::Colour;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The document is not valid YAML or does not fit the settings shape.
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// An option holds a value the service cannot use.
    #[error("invalid value for {option}: {message}")]
    Invalid {
        option: &'static str,
        message: String,
    },
}

impl SettingsError {
    fn invalid(option: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            option,
            message: message.into(),
        }
    }
}

/// Root of the settings document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "atirador")]
    pub attendance: AttendanceSettings,
    #[serde(rename = "banco_de_dados")]
    pub database: DatabaseSettings,
    #[serde(rename = "servidor")]
    pub server: ServerSettings,
    pub syslog: SyslogSettings,
}

/// `atirador.*`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttendanceSettings {
    #[serde(rename = "prazo_confirmacao", deserialize_with = "values::duration")]
    pub confirmation_window: Duration,
    #[serde(rename = "tempo_maximo_cadastro", deserialize_with = "values::duration")]
    pub max_registration_delay: Duration,
    #[serde(rename = "duracao_maxima_treino", deserialize_with = "values::duration")]
    pub max_training_duration: Duration,
    #[serde(rename = "chave_codigo_verificacao")]
    pub verification_secret: String,
    #[serde(rename = "imagem_numero_controle")]
    pub control_number_image: ControlNumberImageSettings,
    #[serde(rename = "imagem_confirmacao")]
    pub confirmation_image: ConfirmationImageSettings,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            confirmation_window: Duration::from_secs(30 * 60),
            max_registration_delay: Duration::from_secs(12 * 60 * 60),
            max_training_duration: Duration::from_secs(12 * 60 * 60),
            verification_secret: String::new(),
            control_number_image: ControlNumberImageSettings::default(),
            confirmation_image: ConfirmationImageSettings::default(),
        }
    }
}

/// `atirador.imagem_numero_controle.*`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlNumberImageSettings {
    #[serde(rename = "largura")]
    pub width: u32,
    #[serde(rename = "altura")]
    pub height: u32,
    #[serde(rename = "cor_fundo")]
    pub background: Colour,
    #[serde(rename = "borda")]
    pub border: BorderSettings,
    #[serde(rename = "linha_fundo")]
    pub stripes: StripeSettings,
    #[serde(rename = "fonte")]
    pub font: FontSettings,
    #[serde(rename = "imagem_base")]
    pub logo_path: Option<PathBuf>,
    pub logo: LogoSettings,
    #[serde(rename = "url_qrcode")]
    pub qr_url_template: String,
    #[serde(rename = "qrcode")]
    pub qr: QrSettings,
}

impl Default for ControlNumberImageSettings {
    fn default() -> Self {
        let defaults = ControlNumberImageConfig::default();
        Self {
            width: defaults.width,
            height: defaults.height,
            background: Colour::new(0xFF, 0xFF, 0xFF),
            border: BorderSettings::default(),
            stripes: StripeSettings::default(),
            font: FontSettings::default(),
            logo_path: None,
            logo: LogoSettings::default(),
            qr_url_template: defaults.qr_url_template,
            qr: QrSettings::default(),
        }
    }
}

/// `atirador.imagem_numero_controle.borda.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BorderSettings {
    #[serde(rename = "largura")]
    pub thickness: u32,
    /// Gap between the canvas edge and the border.
    #[serde(rename = "espacamento")]
    pub pad: u32,
    #[serde(rename = "cor")]
    pub colour: Colour,
}

impl Default for BorderSettings {
    fn default() -> Self {
        Self {
            thickness: 20,
            pad: 10,
            colour: Colour::new(0x2E, 0x7D, 0x32),
        }
    }
}

/// `atirador.imagem_numero_controle.linha_fundo.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StripeSettings {
    #[serde(rename = "largura")]
    pub thickness: u32,
    /// Gap between consecutive stripes.
    #[serde(rename = "espacamento")]
    pub spacing: u32,
    #[serde(rename = "cor")]
    pub colour: Colour,
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            thickness: 2,
            spacing: 16,
            colour: Colour::new(0xE0, 0xE0, 0xE0),
        }
    }
}

/// `atirador.imagem_numero_controle.fonte.*`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    #[serde(rename = "face")]
    pub path: PathBuf,
    #[serde(rename = "cor")]
    pub colour: Colour,
    #[serde(rename = "tamanho")]
    pub size: f32,
}

impl Default for FontSettings {
    fn default() -> Self {
        let defaults = ControlNumberImageConfig::default();
        Self {
            path: defaults.font_path,
            colour: Colour::new(0, 0, 0),
            size: defaults.font_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogoSettings {
    #[serde(rename = "espacamento")]
    pub pad: u32,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self { pad: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QrSettings {
    #[serde(rename = "tamanho")]
    pub size: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self { size: 120 }
    }
}

/// `atirador.imagem_confirmacao.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfirmationImageSettings {
    /// Largest accepted decoded photograph, in bytes.
    #[serde(rename = "tamanho_maximo")]
    pub max_bytes: usize,
}

impl Default for ConfirmationImageSettings {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// `banco_de_dados.*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `host[:port]` of the PostgreSQL server.
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "tempo_esgotado_conexao", deserialize_with = "values::duration")]
    pub connect_timeout: Duration,
    #[serde(rename = "maximo_numero_conexoes_abertas")]
    pub max_open_connections: u32,
    #[serde(rename = "maximo_numero_conexoes_ociosas")]
    pub max_idle_connections: Option<u32>,
    #[serde(rename = "migracoes_automaticas")]
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            address: "localhost:5432".to_owned(),
            name: "frequencia".to_owned(),
            user: "frequencia".to_owned(),
            password: String::new(),
            connect_timeout: Duration::from_secs(30),
            max_open_connections: 10,
            max_idle_connections: Some(2),
            run_migrations: true,
        }
    }
}

impl DatabaseSettings {
    /// Compose the PostgreSQL connection URL, percent-encoding credentials.
    pub fn url(&self) -> Result<String, SettingsError> {
        const OPTION: &str = "banco_de_dados.endereco";
        let mut url = Url::parse(&format!("postgres://{}/", self.address.trim()))
            .map_err(|err| SettingsError::invalid(OPTION, err.to_string()))?;
        if !self.user.is_empty() {
            url.set_username(&self.user)
                .map_err(|()| SettingsError::invalid("banco_de_dados.usuario", "cannot be set"))?;
        }
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| SettingsError::invalid("banco_de_dados.senha", "cannot be set"))?;
        }
        url.path_segments_mut()
            .map_err(|()| SettingsError::invalid(OPTION, "address cannot carry a database name"))?
            .clear()
            .push(&self.name);
        Ok(url.into())
    }
}

/// `servidor.*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listener address, `host:port`.
    #[serde(rename = "endereco")]
    pub address: String,
    /// Largest accepted request body, in bytes.
    #[serde(rename = "tamanho_maximo_requisicao")]
    pub max_body_bytes: usize,
    pub tls: TlsSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_owned(),
            max_body_bytes: 16 * 1024 * 1024,
            tls: TlsSettings::default(),
        }
    }
}

/// `servidor.tls.*`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    #[serde(rename = "habilitado")]
    pub enabled: bool,
    #[serde(rename = "arquivo_certificado")]
    pub certificate_path: Option<PathBuf>,
    #[serde(rename = "arquivo_chave")]
    pub key_path: Option<PathBuf>,
}

/// `syslog.*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyslogSettings {
    /// `host:port` of a TCP syslog collector; unset keeps logs on stdout only.
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "tempo_esgotado_conexao", deserialize_with = "values::duration")]
    pub connect_timeout: Duration,
}

impl Default for SyslogSettings {
    fn default() -> Self {
        Self {
            address: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Load settings from `path` (when given) and overlay `env`.
///
/// # Examples
/// ```
/// use frequencia::settings::load;
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "AF_SERVIDOR_ENDERECO" => Some("127.0.0.1:9090".to_owned()),
///     _ => None,
/// });
/// let settings = load(None, &env).expect("defaults are valid");
/// assert_eq!(settings.server.address, "127.0.0.1:9090");
/// ```
pub fn load<E: Env>(path: Option<&Path>, env: &E) -> Result<Settings, SettingsError> {
    let mut document = match path {
        Some(path) => {
            let bytes = read_file(path).map_err(|source| SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_yaml::from_slice(&bytes)?
        }
        None => Value::Null,
    };
    overlay::apply(&mut document, env);

    let settings: Settings = if document.is_null() {
        Settings::default()
    } else {
        serde_yaml::from_value(document)?
    };
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let image = &self.attendance.control_number_image;
        if image.width == 0 || image.height == 0 {
            return Err(SettingsError::invalid(
                "atirador.imagem_numero_controle.largura",
                "canvas width and height must be positive",
            ));
        }
        let placeholders = image.qr_url_template.matches("%s").count();
        if placeholders != 3 {
            return Err(SettingsError::invalid(
                "atirador.imagem_numero_controle.url_qrcode",
                format!("expected three %s placeholders, found {placeholders}"),
            ));
        }
        if !(image.font.size.is_finite() && image.font.size > 0.0) {
            return Err(SettingsError::invalid(
                "atirador.imagem_numero_controle.fonte.tamanho",
                "font size must be positive",
            ));
        }
        if self.database.max_open_connections == 0 {
            return Err(SettingsError::invalid(
                "banco_de_dados.maximo_numero_conexoes_abertas",
                "at least one connection is required",
            ));
        }
        let tls = &self.server.tls;
        if tls.enabled && (tls.certificate_path.is_none() || tls.key_path.is_none()) {
            return Err(SettingsError::invalid(
                "servidor.tls.habilitado",
                "certificate and key files are required when TLS is enabled",
            ));
        }
        self.attendance_policy().map(|_| ())
    }

    /// Limits applied by attendance validation.
    pub fn attendance_policy(&self) -> Result<AttendancePolicy, SettingsError> {
        let attendance = &self.attendance;
        let convert = |option: &'static str, value: Duration| {
            chrono::Duration::from_std(value)
                .map_err(|err| SettingsError::invalid(option, err.to_string()))
        };
        Ok(AttendancePolicy {
            confirmation_window: convert(
                "atirador.prazo_confirmacao",
                attendance.confirmation_window,
            )?,
            max_registration_delay: convert(
                "atirador.tempo_maximo_cadastro",
                attendance.max_registration_delay,
            )?,
            max_training_duration: convert(
                "atirador.duracao_maxima_treino",
                attendance.max_training_duration,
            )?,
            max_confirmation_image_bytes: attendance.confirmation_image.max_bytes,
        })
    }

    /// Renderer configuration for the control-number ticket.
    pub fn image_config(&self) -> ControlNumberImageConfig {
        let image = &self.attendance.control_number_image;
        ControlNumberImageConfig {
            width: image.width,
            height: image.height,
            canvas_color: image.background.rgba(),
            border_thickness: image.border.thickness,
            border_pad: image.border.pad,
            border_color: image.border.colour.rgba(),
            line_thickness: image.stripes.thickness,
            line_spacing: image.stripes.spacing,
            line_color: image.stripes.colour.rgba(),
            font_path: image.font.path.clone(),
            font_color: image.font.colour.rgba(),
            font_size: image.font.size,
            logo_path: image.logo_path.clone(),
            logo_pad: image.logo.pad,
            qr_url_template: image.qr_url_template.clone(),
            qr_size: image.qr.size,
        }
    }

    /// Connection pool configuration.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let database = &self.database;
        Ok(PoolConfig {
            database_url: database.url()?,
            max_size: database.max_open_connections,
            min_idle: database.max_idle_connections,
            checkout_timeout: database.connect_timeout,
        })
    }
}
