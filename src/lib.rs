#![warn(missing_docs)]
//! Error normalization and request-outcome logging for axum applications.
//!
//! Handlers return a [RawError]. The [InterceptErrorLayer] derives a status from it, writes
//! a colored log line describing the failed request when the configured levels allow it,
//! and replaces the response with the normalized error as JSON.
//!
//! ```
//! use axum::{routing::get, Router};
//! use error_interceptor::{handle_errors, InterceptErrorLayer, InterceptorConfig, RawError, Severity};
//!
//! async fn find_item() -> Result<String, RawError> {
//!     Err(RawError::from(404u16))
//! }
//!
//! let interceptor = handle_errors(
//!     InterceptorConfig::builder()
//!         .log_level(vec![Severity::Error, Severity::Info])
//!         .build(),
//! );
//!
//! let app: Router = Router::new()
//!     .route("/items/:id", get(find_item))
//!     .layer(InterceptErrorLayer::new(interceptor));
//! ```

pub mod config;
/// Error shapes accepted and produced by the interceptor
pub mod errors;
mod interceptor;
mod layer;
/// Log lines, sinks, and the direct logger
pub mod logger;
mod severity;
pub mod status;
/// Tracing configuration
#[cfg(feature = "tracing")]
pub mod tracing_config;

pub use config::ConfigError;
pub use errors::{derive_status, Failure, HttpError, NormalizedError, RawError, RichError};
pub use interceptor::{handle_errors, Interceptor, InterceptorConfig, RequestInfo, ResponseStatus};
pub use layer::{InterceptError, InterceptErrorLayer};
pub use logger::{log, log_to, ConsoleSink, LineKind, LogLine, LogSink, MemorySink, TracingSink};
pub use severity::{LevelSet, ParseSeverityError, Severity};
