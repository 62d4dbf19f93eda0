//! Structured logging set-up.
//!
//! Events are formatted as JSON lines on stdout. When a syslog collector is
//! configured the same lines are also written to it over TCP.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::settings::SyslogSettings;

const DEFAULT_FILTER: &str = "info";

/// Open a TCP connection to `address`, trying each resolved address in turn.
pub fn connect_syslog(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for candidate in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{address} did not resolve to any address"),
        )
    }))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once, before the server starts.
pub fn init(syslog: &SyslogSettings) {
    let connection = syslog
        .address
        .as_deref()
        .map(|address| (address, connect_syslog(address, syslog.connect_timeout)));
    let (sink, failure) = match connection {
        Some((_, Ok(stream))) => (Some(Mutex::new(stream)), None),
        Some((address, Err(error))) => (None, Some((address, error))),
        None => (None, None),
    };
    let shipping = sink.is_some();

    let builder = fmt().with_env_filter(env_filter()).json();
    let installed = match sink {
        Some(sink) => builder.with_writer(io::stdout.and(sink)).try_init(),
        None => builder.try_init(),
    };
    if let Err(error) = installed {
        warn!(%error, "tracing init failed");
    }

    if let Some((address, error)) = failure {
        warn!(address, %error, "syslog unreachable; logging to stdout only");
    } else if shipping {
        info!(address = syslog.address.as_deref(), "shipping logs to syslog");
    }
}
