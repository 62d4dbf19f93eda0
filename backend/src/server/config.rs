//! Listener configuration and TLS material.

use std::io;
use std::path::Path;
use std::sync::Arc;

use frequencia::files::read_file;
use frequencia::settings::ServerSettings;

/// Everything `create_server` needs besides the handler state.
pub struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) max_body_bytes: usize,
    pub(crate) tls: Option<rustls::ServerConfig>,
}

impl ServerConfig {
    /// Build the listener configuration, loading TLS files when enabled.
    ///
    /// # Errors
    /// Returns [`io::Error`] when the certificate or key cannot be read or
    /// do not form a usable pair.
    pub fn from_settings(settings: &ServerSettings) -> io::Result<Self> {
        let tls = match (
            settings.tls.enabled,
            &settings.tls.certificate_path,
            &settings.tls.key_path,
        ) {
            (true, Some(certificate), Some(key)) => Some(load_tls(certificate, key)?),
            (true, _, _) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "TLS is enabled but the certificate or key file is missing",
                ));
            }
            (false, _, _) => None,
        };
        Ok(Self {
            bind_addr: settings.address.clone(),
            max_body_bytes: settings.max_body_bytes,
            tls,
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }
}

fn load_tls(certificate: &Path, key: &Path) -> io::Result<rustls::ServerConfig> {
    let certificate_pem = read_file(certificate)?;
    let key_pem = read_file(key)?;

    let chain = rustls_pemfile::certs(&mut certificate_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()?;
    if chain.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} holds no certificate", certificate.display()),
        ));
    }
    let private_key = rustls_pemfile::private_key(&mut key_pem.as_slice())?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} holds no private key", key.display()),
        )
    })?;

    rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(io::Error::other)?
    .with_no_client_auth()
    .with_single_cert(chain, private_key)
    .map_err(io::Error::other)
}
