//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use drop_context::ProcessError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Two descriptors claim overlapping URL prefixes.
    #[error("Mount point conflict: '{first}' overlaps '{second}'")]
    MountConflict { first: String, second: String },

    /// Listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No state of the chain produced a response.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A callable cannot be sent over the wire.
    #[error("Cannot serve {0}: result is a callable, not content")]
    Unservable(String),

    /// Resolution, configuration or transform failure while producing a response.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MountConflict { .. }
            | Self::Bind { .. }
            | Self::Io(_)
            | Self::Unservable(_)
            | Self::Process(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
