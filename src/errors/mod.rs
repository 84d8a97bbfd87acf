//! Unified error handling: every failure becomes the same opaque 500 body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The only message callers ever see for a failed request.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// Application error type. Categories exist for server-side logging only;
/// they all collapse to the same response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl AppError {
    /// Short category name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Query(_) => "query",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Check if this error means the data store could not be reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_connection_failure(&err) {
            Self::Connection(err)
        } else if is_decode_failure(&err) {
            Self::Mapping(err.to_string())
        } else {
            Self::Query(err)
        }
    }
}

fn is_connection_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => true,
        // SQLSTATE class 28: invalid authorization specification
        sqlx::Error::Database(db) => db.code().is_some_and(|code| code.starts_with("28")),
        _ => false,
    }
}

fn is_decode_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Decode(_)
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(kind = self.kind(), error = %self, "Request failed");

        let body = ErrorBody {
            error: INTERNAL_ERROR_MESSAGE,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
