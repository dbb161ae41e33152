//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps storage-engine errors to HTTP status codes and one normalized
//! JSON body shape — only the wire-level status varies, never the payload
//! shape. Internal error details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use boxstore_core::StorageError;

/// Structured JSON error response body.
///
/// All error responses use this format. The `details` field carries
/// structured recovery context (total size for 416, the ceiling for 413)
/// and is omitted for 500-class errors to prevent information leakage.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "RANGE_NOT_SATISFIABLE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional structured context, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Artifact (or record) not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request input — bad segment, bad header (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The artifact exceeds the configured size ceiling (413).
    #[error("artifact size {measured} exceeds maximum {max}")]
    SizeLimitExceeded {
        /// Size measured on disk.
        measured: u64,
        /// The configured ceiling.
        max: u64,
    },

    /// Measured size deviates from the declared length beyond tolerance (422).
    #[error("artifact size {measured} deviates from declared {declared}")]
    SizeMismatch {
        /// Size measured on disk.
        measured: u64,
        /// The declared `Content-Length`.
        declared: u64,
    },

    /// Declared checksum does not match the stored bytes (422).
    #[error("checksum mismatch ({algorithm}): declared {declared}, computed {computed}")]
    ChecksumMismatch {
        /// The checksum the client declared.
        declared: String,
        /// The checksum computed from disk.
        computed: String,
        /// The algorithm used.
        algorithm: String,
    },

    /// Byte-range request cannot be satisfied (416). Carries the total
    /// size so the client can recover.
    #[error("range not satisfiable against {size} bytes")]
    RangeNotSatisfiable {
        /// Total artifact size.
        size: u64,
    },

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::SizeLimitExceeded { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "SIZE_LIMIT_EXCEEDED")
            }
            Self::SizeMismatch { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "SIZE_MISMATCH"),
            Self::ChecksumMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CHECKSUM_MISMATCH")
            }
            Self::RangeNotSatisfiable { .. } => {
                (StatusCode::RANGE_NOT_SATISFIABLE, "RANGE_NOT_SATISFIABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Structured recovery context for client errors.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::SizeLimitExceeded { measured, max } => Some(serde_json::json!({
                "measured": measured,
                "maxFileSize": max,
            })),
            Self::SizeMismatch { measured, declared } => Some(serde_json::json!({
                "measured": measured,
                "declared": declared,
            })),
            Self::RangeNotSatisfiable { size } => Some(serde_json::json!({ "size": size })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Map storage-engine errors onto the API surface.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(msg) => Self::BadRequest(msg),
            StorageError::Segment(e) => Self::BadRequest(e.to_string()),
            StorageError::PathTraversal { path } => {
                // Defensive invariant; should be unreachable behind the
                // validated coordinate newtypes.
                tracing::error!(path = %path.display(), "path traversal attempt blocked");
                Self::BadRequest("invalid artifact coordinates".to_string())
            }
            StorageError::SizeLimitExceeded { measured, max } => {
                Self::SizeLimitExceeded { measured, max }
            }
            StorageError::SizeMismatch {
                measured, declared, ..
            } => Self::SizeMismatch { measured, declared },
            StorageError::ChecksumMismatch {
                declared,
                computed,
                algorithm,
            } => Self::ChecksumMismatch {
                declared,
                computed,
                algorithm,
            },
            StorageError::RangeNotSatisfiable { size } => Self::RangeNotSatisfiable { size },
            StorageError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}
