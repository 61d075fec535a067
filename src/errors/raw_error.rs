use std::{borrow::Cow, error::Error, fmt::Display, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NormalizedError;
use crate::status::{reason_phrase, status_message, DEFAULT_STATUS};

/// The log detail for an error object without a `message` field
pub const MISSING_MESSAGE: &str = "(no message)";

/// An error raised while handling a request, classified by shape.
///
/// The classification happens once, when the value is constructed. Everything the
/// interceptor derives from it (status, log detail, the normalized value passed downstream)
/// is a plain function of the variant.
#[derive(Debug, Clone)]
pub enum RawError {
    /// A caller-built error object. It is forwarded downstream unchanged.
    Rich(RichError),
    /// A bare status code
    Status(u16),
    /// A bare message. These always produce a 500.
    Message(String),
    /// A Rust error value, optionally carrying a status
    Failure(Failure),
}

impl RawError {
    /// Classify an arbitrary JSON value.
    ///
    /// Objects become [RawError::Rich], strings [RawError::Message], and numbers that fit a
    /// status code [RawError::Status]. Anything else becomes an opaque [Failure] with no
    /// status.
    pub fn from_value(value: Value) -> RawError {
        match value {
            Value::Object(fields) => RawError::Rich(RichError(fields)),
            Value::String(message) => RawError::Message(message),
            Value::Number(n) => match n.as_u64().and_then(|n| u16::try_from(n).ok()) {
                Some(status) => RawError::Status(status),
                None => RawError::Failure(Failure::opaque(n.to_string())),
            },
            other => RawError::Failure(Failure::opaque(other.to_string())),
        }
    }

    /// Create a [RawError::Failure] from any Rust error.
    pub fn failure<E>(err: E) -> RawError
    where
        E: Error + Send + Sync + 'static,
    {
        RawError::Failure(Failure::new(err))
    }

    /// The status this error should produce. An explicit status on an object wins, then a
    /// bare status code, and everything else is a 500.
    pub fn status(&self) -> u16 {
        match self {
            RawError::Rich(rich) => rich.status().unwrap_or(DEFAULT_STATUS),
            RawError::Status(status) => *status,
            RawError::Message(_) => DEFAULT_STATUS,
            RawError::Failure(failure) => failure.status().unwrap_or(DEFAULT_STATUS),
        }
    }

    /// The text describing this error in a request log line.
    pub fn detail(&self) -> Cow<'_, str> {
        match self {
            RawError::Status(status) => status_message(*status),
            RawError::Rich(rich) => rich.message().unwrap_or(Cow::Borrowed(MISSING_MESSAGE)),
            RawError::Message(message) => Cow::Borrowed(message.as_str()),
            RawError::Failure(failure) => Cow::Borrowed(failure.message()),
        }
    }

    /// Produce the value handed to the next stage, given the status derived for this
    /// error. Rich errors pass through untouched, and everything else is replaced by the
    /// status and its reason phrase.
    pub fn normalize(self, status: u16) -> NormalizedError {
        match self {
            RawError::Rich(rich) => NormalizedError::Passthrough(rich),
            RawError::Status(_) | RawError::Message(_) | RawError::Failure(_) => {
                NormalizedError::Status {
                    status,
                    message: reason_phrase(status),
                }
            }
        }
    }
}

/// The status derived from an error. See [RawError::status].
pub fn derive_status(err: &RawError) -> u16 {
    err.status()
}

impl Display for RawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail())
    }
}

impl From<u16> for RawError {
    fn from(status: u16) -> Self {
        RawError::Status(status)
    }
}

impl From<StatusCode> for RawError {
    fn from(status: StatusCode) -> Self {
        RawError::Status(status.as_u16())
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        RawError::Message(message)
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        RawError::Message(message.to_string())
    }
}

impl From<RichError> for RawError {
    fn from(rich: RichError) -> Self {
        RawError::Rich(rich)
    }
}

impl From<Failure> for RawError {
    fn from(failure: Failure) -> Self {
        RawError::Failure(failure)
    }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self {
        RawError::from_value(value)
    }
}

/// Returning a [RawError] from a handler produces a bare 500 response with the error
/// attached to its extensions. [InterceptErrorLayer](crate::InterceptErrorLayer) picks it
/// up from there and produces the real response.
impl IntoResponse for RawError {
    fn into_response(self) -> Response {
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        res.extensions_mut().insert(self);
        res
    }
}

/// An error object built by the application, such as `{"status": 409, "message": "taken",
/// "field": "email"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichError(Map<String, Value>);

impl RichError {
    /// Wrap a set of fields
    pub fn new(fields: Map<String, Value>) -> RichError {
        RichError(fields)
    }

    /// Build a [RichError] from any value that serializes to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<RichError, serde_json::Error> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(RichError(fields)),
            _ => Err(<serde_json::Error as serde::de::Error>::custom(
                "error value did not serialize to an object",
            )),
        }
    }

    /// The `status` field, if it is present and fits a status code
    pub fn status(&self) -> Option<u16> {
        self.0
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    /// The `message` field. Non-string messages are rendered as JSON.
    pub fn message(&self) -> Option<Cow<'_, str>> {
        match self.0.get("message")? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Null => None,
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// The fields of the error
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the error and return its fields
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RichError {
    fn from(fields: Map<String, Value>) -> Self {
        RichError(fields)
    }
}

/// A Rust error value raised during request handling.
#[derive(Clone)]
pub struct Failure {
    status: Option<u16>,
    message: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl Failure {
    /// Wrap an error. Its message is the error's `Display` output.
    pub fn new<E>(err: E) -> Failure
    where
        E: Error + Send + Sync + 'static,
    {
        Failure {
            status: None,
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    /// A failure that is only a piece of text
    pub fn opaque(message: impl Into<String>) -> Failure {
        Failure {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a status to the failure
    pub fn with_status(mut self, status: u16) -> Failure {
        self.status = Some(status);
        self
    }

    /// The status attached to this failure, if any
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The failure's message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped error, if the failure was created from one
    pub fn source(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl std::fmt::Debug for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Failure")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|s| format!("{s:?}")))
            .finish()
    }
}
