//! Store liveness probe.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use tracing::warn;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorMessageSchema;
use crate::inbound::http::state::HttpState;

/// Answer 204 when the store round-trips a trivial statement.
#[utoipa::path(
    get,
    path = "/ping",
    tags = ["health"],
    responses(
        (status = 204, description = "Store reachable"),
        (status = 500, description = "Store unreachable", body = [ErrorMessageSchema])
    ),
    operation_id = "ping"
)]
#[get("/ping")]
pub async fn ping(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.store_health.ping().await.map_err(|err| {
        warn!(error = %err, "store ping failed");
        Error::resource(ErrorCode::StorageUnavailable, "ping store", err)
    })?;
    Ok(HttpResponse::NoContent()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}
