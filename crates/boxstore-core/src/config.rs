//! # Storage Configuration
//!
//! [`StorageConfig`] carries the three values the engine consumes: the
//! storage root, the optional artifact size ceiling, and the upload
//! timeout. It is built once at startup — from the environment with
//! hard-coded fallback defaults — and injected into the components that
//! need it. There is no process-wide cached configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Fallback storage root when `BOXSTORE_STORAGE_ROOT` is unset.
pub const DEFAULT_STORAGE_ROOT: &str = "/var/lib/boxstore";

/// Fallback upload timeout. Transfers are multi-gigabyte, so the default
/// is hours-scale; there is no finer-grained per-chunk timeout.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration consumed by the storage engine.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory all canonical paths resolve under.
    pub root: PathBuf,
    /// Maximum accepted artifact size in bytes. `None` means unlimited.
    pub max_artifact_size: Option<u64>,
    /// Request timeout applied to uploads and downloads.
    pub upload_timeout: Duration,
}

impl StorageConfig {
    /// Build a configuration rooted at the given directory with defaults
    /// for everything else.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_artifact_size: None,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Build configuration from the environment.
    ///
    /// - `BOXSTORE_STORAGE_ROOT` — storage root (default [`DEFAULT_STORAGE_ROOT`])
    /// - `BOXSTORE_MAX_ARTIFACT_SIZE` — ceiling in bytes (unset = unlimited)
    /// - `BOXSTORE_UPLOAD_TIMEOUT_SECS` — timeout (default 24 hours)
    ///
    /// Unparseable numeric values fall back to the default rather than
    /// aborting startup.
    pub fn from_env() -> Self {
        let root = std::env::var("BOXSTORE_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_ROOT));

        let max_artifact_size = std::env::var("BOXSTORE_MAX_ARTIFACT_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        let upload_timeout = std::env::var("BOXSTORE_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UPLOAD_TIMEOUT);

        Self {
            root,
            max_artifact_size,
            upload_timeout,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::with_root(DEFAULT_STORAGE_ROOT)
    }
}
