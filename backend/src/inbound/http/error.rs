//! HTTP adapter mapping for domain errors.
//!
//! The domain error stays HTTP-agnostic; this module decides the status code
//! from the bundle's category and always answers with the JSON message array.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{debug, error};

use crate::domain::{Error, ErrorCategory, ErrorCode, TRACE_ID_HEADER};
use crate::inbound::http::JSON_CONTENT_TYPE;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(error: &Error) -> StatusCode {
    match error.category() {
        ErrorCategory::Input => StatusCode::BAD_REQUEST,
        ErrorCategory::State if error.contains(ErrorCode::Stale) => StatusCode::CONFLICT,
        ErrorCategory::State => StatusCode::NOT_FOUND,
        ErrorCategory::Resource => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                %status,
                error = %self,
                trace_id = self.trace_id().unwrap_or("-"),
                "request failed"
            );
        } else {
            debug!(%status, error = %self, "request rejected");
        }

        let mut builder = HttpResponse::build(status);
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.content_type(JSON_CONTENT_TYPE).json(self)
    }
}
