//! Status code helpers shared by the interceptor and its error types

use std::borrow::Cow;

use http::StatusCode;
use tracing::{event, Level};

use crate::Severity;

/// The status used when an error does not carry one.
pub const DEFAULT_STATUS: u16 = 500;

/// Look up the canonical reason phrase for a status code, e.g. 404 -> "Not Found".
/// Codes without a registered phrase return `None`.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
}

/// The reason phrase for a status, or `Unknown status <n>` when there is none.
pub fn status_message(status: u16) -> Cow<'static, str> {
    match reason_phrase(status) {
        Some(reason) => Cow::Borrowed(reason),
        None => Cow::Owned(format!("Unknown status {status}")),
    }
}

/// Classify the outcome of a request from its status. This is binary: server errors are
/// [Severity::Error] and everything else is [Severity::Info]. [Severity::Warning] is never
/// derived from a status.
pub fn outcome_class(status: u16) -> Severity {
    if status < 500 {
        Severity::Info
    } else {
        Severity::Error
    }
}

/// Convert a derived status to one that can be written to a response. Values the HTTP layer
/// can't represent become a 500.
pub fn response_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or_else(|_| {
        event!(
            Level::WARN,
            status,
            "Error carried an invalid HTTP status, responding with 500"
        );
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
