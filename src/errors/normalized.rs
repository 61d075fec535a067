use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::RichError;
use crate::status::{response_status, DEFAULT_STATUS};

/// The error value handed to the next stage of request processing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedError {
    /// An application error object, forwarded unchanged
    Passthrough(RichError),
    /// A status and its reason phrase
    Status {
        /// The derived status
        status: u16,
        /// The reason phrase for the status. This is absent for codes with no registered
        /// phrase.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'static str>,
    },
}

impl NormalizedError {
    /// The status this error should be sent with
    pub fn status(&self) -> u16 {
        match self {
            NormalizedError::Passthrough(rich) => rich.status().unwrap_or(DEFAULT_STATUS),
            NormalizedError::Status { status, .. } => *status,
        }
    }
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        (response_status(self.status()), Json(self)).into_response()
    }
}
