//! Attendance service entry-point: loads settings, prepares the database and
//! serves the REST endpoints.

mod server;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use mockable::DefaultEnv;
use tracing::{info, warn};

use frequencia::outbound::persistence::{DbPool, run_pending_migrations_async};
use frequencia::settings;
use frequencia::telemetry;

use server::{ServerConfig, build_http_state, create_server};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "frequencia", version, about = "Shooting club attendance service")]
struct Cli {
    /// YAML settings file. Built-in defaults apply when omitted.
    #[arg(long, short = 'c', env = "AF_CONFIG")]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let settings = settings::load(cli.config.as_deref(), &DefaultEnv::new())
        .map_err(|err| io::Error::other(format!("invalid settings: {err}")))?;
    telemetry::init(&settings.syslog);

    let pool_config = settings.pool_config().map_err(io::Error::other)?;
    if settings.database.run_migrations {
        run_pending_migrations_async(pool_config.database_url.clone())
            .await
            .map_err(|err| io::Error::other(format!("database migrations failed: {err}")))?;
    } else {
        warn!("automatic migrations disabled; schema must already be current");
    }

    let pool = DbPool::new(pool_config)
        .await
        .map_err(|err| io::Error::other(format!("database pool: {err}")))?;
    let http_state = build_http_state(pool, &settings).map_err(io::Error::other)?;

    let server_config = ServerConfig::from_settings(&settings.server)?;
    info!(
        address = server_config.bind_addr(),
        tls = server_config.is_tls(),
        "listening"
    );
    create_server(server_config, http_state)?.await
}
