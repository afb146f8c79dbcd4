use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, HttpResponse, ResponseError};
use error_stack::Report;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::Span;
use tracing_actix_web::{DefaultRootSpanBuilder, RootSpanBuilder};

use super::{Error, Result};
use crate::types::ErrorKind;
use crate::util::validator::single_error;

pub const HEALTH_PATH: &str = "/health";

/// Health checks are polled constantly, so their spans are only
/// visible at debug level. Server errors are logged with their
/// full report.
pub struct QuieterRootSpanBuilder;

impl RootSpanBuilder for QuieterRootSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> Span {
        if request.path() == HEALTH_PATH {
            tracing_actix_web::root_span!(level = tracing::Level::DEBUG, request)
        } else {
            tracing_actix_web::root_span!(request)
        }
    }

    fn on_request_end<B: MessageBody>(
        span: Span,
        outcome: &std::result::Result<ServiceResponse<B>, actix_web::Error>,
    ) {
        let error = match outcome {
            Ok(response) => response.response().error(),
            Err(error) => Some(error),
        };

        if let Some(error) = error.and_then(|v| v.as_error::<Error>()) {
            if error.status_code().is_server_error() {
                span.in_scope(|| tracing::error!(%error, "request failed"));
            }
        }

        DefaultRootSpanBuilder::on_request_end(span, outcome);
    }
}

#[derive(Debug, ThisError)]
#[error("malformed request {0}")]
struct Malformed(&'static str);

fn malformed(part: &'static str, detail: String) -> actix_web::Error {
    let report = Report::new(Malformed(part)).attach_printable(detail.clone());
    let kind = ErrorKind::Validation(single_error(part, "malformed", detail));
    Error::from_report(kind, report).into()
}

/// Undecodable bodies, paths and query strings are answered with
/// a `validation` error instead of actix's plain text.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| malformed("body", error.to_string()))
}

#[must_use]
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|error, _req| malformed("path", error.to_string()))
}

#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|error, _req| malformed("query", error.to_string()))
}

/// Upper bound for handling a single request. Read by
/// [`request_timeout`] from the app data.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

impl RequestTimeout {
    const DEFAULT: Duration = Duration::from_secs(65);
}

#[derive(Debug, ThisError)]
#[error("request did not finish within {0:?}")]
struct TimedOut(Duration);

/// Answers with `timeout` when the rest of the chain does not
/// finish within [`RequestTimeout`]. The request is handed over
/// untouched; holding on to a copy of it would keep the router
/// from resolving path parameters.
pub async fn request_timeout<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> std::result::Result<ServiceResponse<B>, actix_web::Error> {
    let limit = req
        .app_data::<web::Data<RequestTimeout>>()
        .map_or(RequestTimeout::DEFAULT, |v| v.0);

    match tokio::time::timeout(limit, next.call(req)).await {
        Ok(response) => response,
        Err(..) => {
            tracing::warn!(?limit, "request timed out");
            Err(Error::from_context(ErrorKind::Timeout, TimedOut(limit)).into())
        }
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> Result<HttpResponse> {
    Err(Error::not_found("Route not found"))
}
