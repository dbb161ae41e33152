//! # Artifact Readers
//!
//! Opens full or bounded async read handles over the canonical artifact
//! file for the download path. Size is always measured from disk at open
//! time, never taken from a metadata record.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncSeekExt, Take};

use boxstore_core::StorageError;

use crate::range::RangeSpec;

/// The artifact's current size on disk.
///
/// A missing file surfaces as [`StorageError::Io`] with `NotFound`; the
/// API layer maps that to its 404.
pub async fn measured_size(path: &Path) -> Result<u64, StorageError> {
    Ok(tokio::fs::metadata(path).await?.len())
}

/// Open the whole artifact for streaming, returning the handle and its
/// measured size.
pub async fn open_full(path: &Path) -> Result<(File, u64), StorageError> {
    let file = File::open(path).await?;
    let size = file.metadata().await?.len();
    Ok((file, size))
}

/// Open a bounded reader over `[spec.start, spec.end]`.
///
/// The caller is responsible for having parsed and clamped `spec` against
/// the same file's size.
pub async fn open_range(path: &Path, spec: RangeSpec) -> Result<Take<File>, StorageError> {
    use tokio::io::AsyncReadExt;

    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(spec.start)).await?;
    Ok(file.take(spec.len()))
}
