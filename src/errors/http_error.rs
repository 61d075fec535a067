use std::fmt::{Debug, Display};

use axum::http::StatusCode;
use error_stack::{Context, Report};

use super::{Failure, RawError};

/// An error that knows which HTTP status it should produce
pub trait HttpError: Display + Debug {
    /// The status code that the error should return.
    fn status_code(&self) -> StatusCode;
}

impl<T> HttpError for Report<T>
where
    T: HttpError + Context,
{
    fn status_code(&self) -> StatusCode {
        self.current_context().status_code()
    }
}

impl<T> From<Report<T>> for RawError
where
    T: HttpError + Context,
{
    /// The report becomes a [Failure] carrying the status of its current context. The log
    /// detail is the current context's message.
    fn from(report: Report<T>) -> Self {
        let status = report.status_code().as_u16();
        RawError::Failure(Failure::opaque(report.current_context().to_string()).with_status(status))
    }
}

impl RawError {
    /// Create a [RawError::Failure] from an error that knows its own status.
    pub fn from_http_error<E>(err: E) -> RawError
    where
        E: HttpError + std::error::Error + Send + Sync + 'static,
    {
        let status = err.status_code().as_u16();
        RawError::Failure(Failure::new(err).with_status(status))
    }
}
