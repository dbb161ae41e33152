//! # Error Hierarchy
//!
//! Structured error types for the boxstore engine, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Each variant carries the diagnostic context an operator needs: measured
//! versus declared sizes, the total size a rejected range was evaluated
//! against.
//!
//! An incomplete chunked transfer is deliberately NOT an error: it is a
//! normal outcome reported by the merge itself, and an absent artifact
//! surfaces as [`StorageError::Io`] with `NotFound` kind, mapped by the
//! caller that knows which coordinates were requested.
//!
//! ## Propagation policy
//!
//! Filesystem cleanup is always best-effort: a failed delete is logged by
//! the caller and never surfaces as a secondary error that would mask the
//! primary failure.

use thiserror::Error;

/// Validation errors for a single coordinate segment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The segment is empty.
    #[error("coordinate segment must not be empty")]
    Empty,

    /// The segment exceeds the maximum accepted length.
    #[error("coordinate segment {segment:?} is {len} bytes, exceeding the maximum")]
    TooLong {
        /// The offending segment.
        segment: String,
        /// Its byte length.
        len: usize,
    },

    /// The segment is exactly `.` or `..`.
    #[error("coordinate segment {segment:?} is a reserved dot component")]
    ReservedDotComponent {
        /// The offending segment.
        segment: String,
    },

    /// The segment contains a path separator or NUL byte.
    #[error("coordinate segment {segment:?} contains a forbidden character")]
    ForbiddenCharacter {
        /// The offending segment.
        segment: String,
    },
}

/// Top-level error type for the storage engine.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Malformed request input (bad header value, invalid segment).
    #[error("validation error: {0}")]
    Validation(String),

    /// A coordinate segment failed validation.
    #[error("invalid coordinate segment: {0}")]
    Segment(#[from] SegmentError),

    /// A resolved path escaped the configured storage root.
    ///
    /// Defensive invariant — unreachable when segments come through the
    /// validated newtypes, but re-checked on every resolution.
    #[error("path traversal attempt: {path:?} escapes storage root")]
    PathTraversal {
        /// The offending resolved path, for the audit log.
        path: std::path::PathBuf,
    },

    /// The assembled artifact exceeds the configured size ceiling.
    #[error("artifact size {measured} exceeds the configured maximum {max}")]
    SizeLimitExceeded {
        /// Size measured on disk after assembly.
        measured: u64,
        /// The configured ceiling.
        max: u64,
    },

    /// The measured size deviates from the declared length beyond tolerance.
    #[error(
        "artifact size {measured} deviates from declared {declared} beyond tolerance {tolerance}"
    )]
    SizeMismatch {
        /// Size measured on disk after assembly.
        measured: u64,
        /// The declared `Content-Length`.
        declared: u64,
        /// The tolerance that was applied.
        tolerance: u64,
    },

    /// The declared checksum does not match the assembled bytes.
    #[error("checksum mismatch: declared {declared}, computed {computed} ({algorithm})")]
    ChecksumMismatch {
        /// The checksum the client declared.
        declared: String,
        /// The checksum computed from the final bytes.
        computed: String,
        /// The algorithm used.
        algorithm: String,
    },

    /// A byte-range request cannot be satisfied against the artifact size.
    #[error("range not satisfiable against artifact of {size} bytes")]
    RangeNotSatisfiable {
        /// Total artifact size, reported so the client can recover.
        size: u64,
    },

    /// An underlying filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
