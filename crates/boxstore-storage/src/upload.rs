//! # Streaming Writes and Upload Finalization
//!
//! The write primitives for both transfer modes and the post-assembly
//! validation gate. A single-shot upload streams its body straight into
//! the canonical path with truncate-and-create semantics; a chunked upload
//! reuses the same primitive per chunk (see [`crate::chunks`]).
//!
//! Final size is always measured from disk, never trusted from headers.
//! Every abort path — stream failure, size ceiling, declared-length
//! deviation, checksum mismatch — best-effort deletes the partial file;
//! a failed delete is logged and never masks the primary error.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use boxstore_core::{StorageConfig, StorageError};

use crate::checksum::{self, Verification};

/// Minimum declared-length tolerance: some transports do not report exact
/// lengths, so single-shot validation accepts a deviation of up to
/// `max(1 MiB, 1% of declared)`.
pub const SIZE_TOLERANCE_FLOOR: u64 = 1024 * 1024;

/// The tolerance applied when comparing measured size to a declared length.
pub fn size_tolerance(declared: u64) -> u64 {
    SIZE_TOLERANCE_FLOOR.max(declared / 100)
}

/// A checksum declared by the uploading client.
#[derive(Debug, Clone)]
pub struct DeclaredChecksum {
    /// The declared hex digest.
    pub value: String,
    /// The declared algorithm name, as sent (parsed leniently later).
    pub algorithm: String,
}

/// Client-declared values validated against the assembled artifact.
#[derive(Debug, Clone, Default)]
pub struct UploadValidation {
    /// The request's `Content-Length`, when present.
    pub declared_length: Option<u64>,
    /// The declared checksum, when present.
    pub checksum: Option<DeclaredChecksum>,
}

/// Which transfer mode produced the file being finalized.
///
/// Declared-length tolerance applies to single-shot transfers only: a
/// chunked transfer's per-request `Content-Length` describes one chunk,
/// not the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeMode {
    /// One request carried the whole body.
    SingleShot,
    /// The file was assembled from staged chunks.
    Chunked,
}

/// Stream a request body into `path` with truncate-and-create semantics.
///
/// Returns the number of bytes written. On a stream error the partial
/// file is best-effort deleted and the error propagated.
pub async fn write_stream<S, E>(path: &Path, mut stream: S) -> Result<u64, StorageError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(item) = stream.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                // Client disconnect or transport failure mid-stream.
                drop(file);
                remove_file_best_effort(path).await;
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                )));
            }
        };
        if let Err(e) = file.write_all(&bytes).await {
            drop(file);
            remove_file_best_effort(path).await;
            return Err(StorageError::Io(e));
        }
        written += bytes.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Stream a single-shot upload body into the canonical path, creating
/// parent directories lazily on first write.
///
/// Two fully concurrent single-shot uploads to the same tuple race at the
/// filesystem level with no ordering guarantee; last writer wins. This is
/// an accepted limitation of the shared-path model.
pub async fn write_artifact<S, E>(path: &Path, stream: S) -> Result<u64, StorageError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    write_stream(path, stream).await
}

/// Validate an assembled artifact and return its measured size.
///
/// Runs after both transfer modes:
///
/// 1. Measure size on disk.
/// 2. Reject if a configured ceiling is exceeded (`SizeLimitExceeded`).
/// 3. Single-shot only: reject if the measured size deviates from the
///    declared length beyond [`size_tolerance`] (`SizeMismatch`).
/// 4. Verify a declared checksum (`ChecksumMismatch`); unsupported
///    algorithm names are logged and skipped.
///
/// Any rejection deletes the artifact before returning, so a failed
/// upload leaves nothing at the canonical path.
pub async fn finalize(
    config: &StorageConfig,
    path: &Path,
    mode: FinalizeMode,
    validation: &UploadValidation,
) -> Result<u64, StorageError> {
    let measured = tokio::fs::metadata(path).await?.len();

    if let Some(max) = config.max_artifact_size {
        if measured > max {
            remove_file_best_effort(path).await;
            return Err(StorageError::SizeLimitExceeded { measured, max });
        }
    }

    if mode == FinalizeMode::SingleShot {
        if let Some(declared) = validation.declared_length {
            let tolerance = size_tolerance(declared);
            if measured.abs_diff(declared) > tolerance {
                remove_file_best_effort(path).await;
                return Err(StorageError::SizeMismatch {
                    measured,
                    declared,
                    tolerance,
                });
            }
        }
    }

    if let Some(declared) = &validation.checksum {
        match checksum::verify_file(path, &declared.value, &declared.algorithm).await? {
            Verification::Verified => {}
            Verification::Unsupported => {
                tracing::warn!(
                    algorithm = %declared.algorithm,
                    path = %path.display(),
                    "unsupported checksum algorithm; skipping verification"
                );
            }
            Verification::Mismatch { computed } => {
                remove_file_best_effort(path).await;
                return Err(StorageError::ChecksumMismatch {
                    declared: declared.value.clone(),
                    computed,
                    algorithm: declared.algorithm.clone(),
                });
            }
        }
    }

    Ok(measured)
}

/// Delete a file, logging on failure instead of escalating.
pub(crate) async fn remove_file_best_effort(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete partial artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use sha2::{Digest, Sha256};
    use std::convert::Infallible;

    fn ok_stream(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p))))
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn tolerance_has_one_mebibyte_floor() {
        assert_eq!(size_tolerance(0), SIZE_TOLERANCE_FLOOR);
        assert_eq!(size_tolerance(10 * 1024 * 1024), SIZE_TOLERANCE_FLOOR);
        // 1% dominates beyond 100 MiB.
        assert_eq!(size_tolerance(200 * 1024 * 1024), 2 * 1024 * 1024);
    }

    #[tokio::test]
    async fn write_artifact_creates_parents_and_measures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c/artifact.box");
        let written = write_artifact(&path, ok_stream(vec![b"hello ", b"world"]))
            .await
            .unwrap();
        assert_eq!(written, 11);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn write_artifact_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        write_artifact(&path, ok_stream(vec![b"a much longer first body"]))
            .await
            .unwrap();
        write_artifact(&path, ok_stream(vec![b"short"])).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn stream_error_deletes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client gone")),
        ]);
        let err = write_artifact(&path, broken).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn finalize_accepts_exact_declared_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"12345").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        let validation = UploadValidation {
            declared_length: Some(5),
            checksum: None,
        };
        let size = finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .unwrap();
        assert_eq!(size, 5);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn finalize_tolerates_small_declared_deviation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"12345").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        // Declared 100 KiB off by far less than the 1 MiB floor.
        let validation = UploadValidation {
            declared_length: Some(100 * 1024),
            checksum: None,
        };
        assert!(finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn finalize_rejects_large_declared_deviation_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"tiny").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        let validation = UploadValidation {
            declared_length: Some(10 * 1024 * 1024),
            checksum: None,
        };
        let err = finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SizeMismatch { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn chunked_mode_ignores_declared_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"tiny").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        // A chunked request's Content-Length describes one chunk only.
        let validation = UploadValidation {
            declared_length: Some(10 * 1024 * 1024),
            checksum: None,
        };
        assert!(finalize(&cfg, &path, FinalizeMode::Chunked, &validation)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn finalize_enforces_size_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, vec![0u8; 100]).await.unwrap();
        let mut cfg = StorageConfig::with_root(dir.path());
        cfg.max_artifact_size = Some(64);
        let err = finalize(&cfg, &path, FinalizeMode::Chunked, &UploadValidation::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::SizeLimitExceeded { measured: 100, max: 64 }
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn finalize_verifies_declared_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"checked bytes").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        let validation = UploadValidation {
            declared_length: None,
            checksum: Some(DeclaredChecksum {
                value: hex(&Sha256::digest(b"checked bytes")),
                algorithm: "sha256".to_string(),
            }),
        };
        assert!(finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .is_ok());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_deletes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"checked bytes").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        let validation = UploadValidation {
            declared_length: None,
            checksum: Some(DeclaredChecksum {
                value: "0".repeat(64),
                algorithm: "sha256".to_string(),
            }),
        };
        let err = finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ChecksumMismatch { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unsupported_checksum_algorithm_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.box");
        tokio::fs::write(&path, b"whatever").await.unwrap();
        let cfg = StorageConfig::with_root(dir.path());
        let validation = UploadValidation {
            declared_length: None,
            checksum: Some(DeclaredChecksum {
                value: "not-even-hex".to_string(),
                algorithm: "md5".to_string(),
            }),
        };
        assert!(finalize(&cfg, &path, FinalizeMode::SingleShot, &validation)
            .await
            .is_ok());
        assert!(path.exists());
    }
}
