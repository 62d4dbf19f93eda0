//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod attendance;
pub mod error;
pub mod health;
pub mod remote_addr;
pub mod schemas;
pub mod state;

pub use error::ApiResult;

/// Media type of every JSON response body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Register every endpoint of the adapter.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(attendance::register_attendance)
        .service(attendance::get_attendance)
        .service(attendance::confirm_attendance)
        .service(health::ping);
}

