use std::{fmt::Display, sync::Arc};

use axum::{
    extract::OriginalUri,
    http::{request, response, Method, Request, Response, StatusCode, Uri},
};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};
use typed_builder::TypedBuilder;

use crate::{
    errors::{NormalizedError, RawError},
    logger::{log_to, ConsoleSink, LineKind, LogLine, LogSink},
    status::{outcome_class, response_status},
    LevelSet, Severity,
};

/// Configuration for an [Interceptor]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct InterceptorConfig {
    /// The severities to log. `None` logs everything. An empty list logs nothing.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub log_level: Option<Vec<Severity>>,
}

impl InterceptorConfig {
    /// The set of severities this configuration logs
    pub fn levels(&self) -> LevelSet {
        match &self.log_level {
            None => LevelSet::ALL,
            Some(levels) => levels.iter().copied().collect(),
        }
    }
}

/// The parts of a request that appear in a log line
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// The request method
    pub method: Method,
    /// The URI as the client sent it, before any router nesting stripped a prefix
    pub original_uri: Uri,
}

impl RequestInfo {
    /// Create a new RequestInfo
    pub fn new(method: Method, original_uri: Uri) -> RequestInfo {
        RequestInfo {
            method,
            original_uri,
        }
    }

    /// Read the method and URI from a request, preferring axum's [OriginalUri] when a router
    /// has recorded one.
    pub fn from_request<B>(req: &Request<B>) -> RequestInfo {
        let original_uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.clone())
            .unwrap_or_else(|| req.uri().clone());

        RequestInfo::new(req.method().clone(), original_uri)
    }

    /// Same as [RequestInfo::from_request], for a request that has been split into parts.
    pub fn from_parts(parts: &request::Parts) -> RequestInfo {
        let original_uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.clone())
            .unwrap_or_else(|| parts.uri.clone());

        RequestInfo::new(parts.method.clone(), original_uri)
    }
}

/// A response whose status can be set and read back
pub trait ResponseStatus {
    /// Set the status of the response
    fn set_status(&mut self, status: StatusCode);
    /// The current status of the response
    fn status(&self) -> StatusCode;
}

impl<B> ResponseStatus for Response<B> {
    fn set_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn status(&self) -> StatusCode {
        Response::status(self)
    }
}

impl ResponseStatus for response::Parts {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status(&self) -> StatusCode {
        self.status
    }
}

impl ResponseStatus for StatusCode {
    fn set_status(&mut self, status: StatusCode) {
        *self = status;
    }

    fn status(&self) -> StatusCode {
        *self
    }
}

/// Turns errors raised while handling a request into a response status, a log line, and a
/// normalized error for the next stage.
///
/// An Interceptor holds no per-request state, so one instance can be cloned into every
/// place that needs it.
#[derive(Clone)]
pub struct Interceptor {
    levels: LevelSet,
    sink: Arc<dyn LogSink>,
}

/// Create an [Interceptor] that logs to the console.
pub fn handle_errors(config: InterceptorConfig) -> Interceptor {
    Interceptor::new(config)
}

impl Interceptor {
    /// Create an [Interceptor] that logs to the console.
    pub fn new(config: InterceptorConfig) -> Interceptor {
        Interceptor::with_sink(config, ConsoleSink)
    }

    /// Create an [Interceptor] that logs to `sink`.
    pub fn with_sink(config: InterceptorConfig, sink: impl LogSink + 'static) -> Interceptor {
        Interceptor {
            levels: config.levels(),
            sink: Arc::new(sink),
        }
    }

    /// The severities this interceptor logs
    pub fn levels(&self) -> LevelSet {
        self.levels
    }

    /// Decide whether a request that ended with `status` should be logged, and at which
    /// severity.
    ///
    /// Only the binary outcome class matters here: server errors are logged when
    /// [Severity::Error] is configured, and everything else when [Severity::Info] is.
    /// [Severity::Warning] never affects request lines.
    pub fn should_log(&self, status: u16) -> Option<Severity> {
        let outcome = outcome_class(status);
        self.levels.contains(outcome).then_some(outcome)
    }

    /// Handle an error raised while processing `req`.
    ///
    /// This sets the status on `res`, writes a request line if the configured levels allow
    /// it, and finally calls `next` with the normalized error, returning whatever `next`
    /// returns.
    pub fn handle<R, F, T>(&self, err: RawError, req: &RequestInfo, res: &mut R, next: F) -> T
    where
        R: ResponseStatus + ?Sized,
        F: FnOnce(NormalizedError) -> T,
    {
        let status = err.status();
        res.set_status(response_status(status));

        match self.should_log(status) {
            Some(outcome) => self.log_request(&err, req, res.status(), outcome),
            None => event!(
                Level::TRACE,
                status,
                levels = ?self.levels,
                "Request outcome not logged"
            ),
        }

        next(err.normalize(status))
    }

    fn log_request(&self, err: &RawError, req: &RequestInfo, status: StatusCode, outcome: Severity) {
        let body = format!(
            "{} {} ({}) - {}",
            req.method,
            req.original_uri,
            status.as_u16(),
            err.detail()
        );

        self.sink
            .write_line(&LogLine::new(outcome, LineKind::Request, body));
    }

    /// Write a line to this interceptor's sink, regardless of the configured levels.
    pub fn log(&self, severity: Severity, text: impl Display) {
        log_to(self.sink.as_ref(), severity, text)
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}
