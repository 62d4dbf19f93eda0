//! Panic envelope for request handlers.
//!
//! A panic in a handler or inner middleware is logged at critical severity and
//! answered with `500` and an empty JSON error bundle. The worker keeps
//! serving.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse, ResponseError};
use futures_util::FutureExt as _;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::{ErrorMessage, TRACE_ID_HEADER, TraceId};
use crate::inbound::http::JSON_CONTENT_TYPE;

/// Middleware turning handler panics into `500` responses.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use frequencia::middleware::{Recover, Trace};
///
/// let app = App::new().wrap(Recover).wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Recover;

impl<S, B> Transform<S, ServiceRequest> for Recover
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverMiddleware { service }))
    }
}

/// Service wrapper produced by [`Recover`].
pub struct RecoverMiddleware<S> {
    service: S,
}

/// A caught handler panic, rendered as `500` with an empty bundle.
#[derive(Debug)]
struct HandlerPanicked {
    trace_id: Option<TraceId>,
}

impl fmt::Display for HandlerPanicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request handler panicked")
    }
}

impl ResponseError for HandlerPanicked {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::InternalServerError();
        if let Some(trace_id) = self.trace_id {
            builder.insert_header((TRACE_ID_HEADER, trace_id.to_string()));
        }
        builder
            .content_type(JSON_CONTENT_TYPE)
            .json(Vec::<ErrorMessage>::new())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn recovered(payload: &(dyn Any + Send)) -> Error {
    let trace_id = TraceId::current();
    error!(
        severity = "critical",
        panic = panic_message(payload),
        trace_id = %trace_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_owned()),
        "request handler panicked"
    );
    HandlerPanicked { trace_id }.into()
}

impl<S, B> Service<ServiceRequest> for RecoverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(payload) => return Box::pin(ready(Err(recovered(&*payload)))),
        };
        Box::pin(async move {
            AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(recovered(&*payload)))
        })
    }
}
