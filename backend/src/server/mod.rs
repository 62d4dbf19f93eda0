//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::build_http_state;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use frequencia::doc::ApiDoc;
use frequencia::inbound::http::configure;
use frequencia::inbound::http::state::HttpState;
use frequencia::middleware::{Recover, Trace};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Bind the listener and start serving.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig, http_state: web::Data<HttpState>) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        max_body_bytes,
        tls,
    } = config;

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(http_state.clone())
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .wrap(Recover)
            .wrap(Trace)
            .configure(configure);

        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );

        app
    });
    let server = match tls {
        Some(tls) => server.bind_rustls_0_23(bind_addr.as_str(), tls)?,
        None => server.bind(bind_addr.as_str())?,
    };
    Ok(server.run())
}
