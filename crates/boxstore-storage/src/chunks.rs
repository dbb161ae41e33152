//! # Chunk Staging and Idempotent Merge
//!
//! A chunked transfer writes each numbered segment to
//! `.staging/chunk-{index}` as an independent file, so chunks with
//! distinct indices never conflict. Assembly triggers once the staged
//! index set equals exactly `{0 .. total-1}`; any other set is
//! "incomplete," never "corrupt."
//!
//! ## Merge idempotency
//!
//! Two requests may both observe a complete set and both trigger a merge.
//! No lock guards the staging directory; instead the merge treats every
//! "the files are already gone" signal as proof that a concurrent trigger
//! finished first and reports [`MergeOutcome::AlreadyMerged`] — a success,
//! not an error.

use std::collections::BTreeSet;
use std::path::Path;

use bytes::Bytes;
use futures::Stream;
use tokio::io::AsyncWriteExt;

use boxstore_core::StorageError;

use crate::upload::write_stream;

/// File name for one staged chunk.
pub fn chunk_file_name(index: u64) -> String {
    format!("chunk-{index}")
}

/// Parse a staging file name back to its chunk index.
///
/// Foreign file names (editor droppings, partial writes under a different
/// convention) return `None` and are ignored by the scan.
pub fn parse_chunk_index(name: &str) -> Option<u64> {
    name.strip_prefix("chunk-")?.parse().ok()
}

/// Write one chunk's body into the staging directory, creating it (and
/// the artifact directory above it) as needed.
pub async fn write_chunk<S, E>(
    staging: &Path,
    index: u64,
    stream: S,
) -> Result<u64, StorageError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::fs::create_dir_all(staging).await?;
    write_stream(&staging.join(chunk_file_name(index)), stream).await
}

/// Scan the staging directory for present chunk indices.
///
/// Returns `None` if the staging directory does not exist — the signal a
/// duplicate merge trigger uses to conclude the merge already happened.
pub async fn present_indices(staging: &Path) -> Result<Option<BTreeSet<u64>>, StorageError> {
    let mut entries = match tokio::fs::read_dir(staging).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::Io(e)),
    };
    let mut present = BTreeSet::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(index) = entry.file_name().to_str().and_then(parse_chunk_index) {
            present.insert(index);
        }
    }
    Ok(Some(present))
}

/// The chunk indices in `{0 .. total-1}` not present in the staged set.
pub fn missing_indices(present: &BTreeSet<u64>, total: u64) -> Vec<u64> {
    (0..total).filter(|i| !present.contains(i)).collect()
}

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// All chunks were appended in index order; `size` is the byte total.
    Merged {
        /// Total bytes written to the canonical path.
        size: u64,
    },
    /// The staged set does not equal `{0 .. total-1}` yet. Recoverable:
    /// the transfer is still in progress.
    Incomplete {
        /// The indices still missing.
        missing: Vec<u64>,
    },
    /// The staging directory (or a chunk mid-merge) was already gone — a
    /// concurrent trigger completed the merge first.
    AlreadyMerged,
}

/// Attempt to assemble the staged chunks into the canonical path.
///
/// Steps:
/// 1. Scan staging for present indices (absent directory → [`MergeOutcome::AlreadyMerged`]).
/// 2. Verify the set equals exactly `{0 .. total-1}` (otherwise
///    [`MergeOutcome::Incomplete`] with the missing set).
/// 3. Open a fresh write handle at `dest`; append each chunk in index
///    order, deleting each chunk file as soon as it is consumed.
/// 4. Remove the now-empty staging directory (best-effort).
///
/// A chunk file that vanishes between the scan and its read means a
/// concurrent merge consumed it; the partially written `dest` is left to
/// the winner's output and [`MergeOutcome::AlreadyMerged`] is returned.
pub async fn try_merge(
    staging: &Path,
    dest: &Path,
    total: u64,
) -> Result<MergeOutcome, StorageError> {
    let Some(present) = present_indices(staging).await? else {
        return Ok(MergeOutcome::AlreadyMerged);
    };

    let missing = missing_indices(&present, total);
    if !missing.is_empty() || present.len() as u64 != total {
        return Ok(MergeOutcome::Incomplete { missing });
    }

    let mut out = tokio::fs::File::create(dest).await?;
    let mut size: u64 = 0;
    for index in 0..total {
        let chunk_path = staging.join(chunk_file_name(index));
        let mut chunk = match tokio::fs::File::open(&chunk_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    chunk = index,
                    staging = %staging.display(),
                    "chunk vanished mid-merge; concurrent trigger won"
                );
                return Ok(MergeOutcome::AlreadyMerged);
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        size += tokio::io::copy(&mut chunk, &mut out).await?;
        drop(chunk);
        if let Err(e) = tokio::fs::remove_file(&chunk_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(chunk = index, error = %e, "failed to delete consumed chunk");
            }
        }
    }
    out.flush().await?;
    drop(out);

    if let Err(e) = tokio::fs::remove_dir(staging).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(staging = %staging.display(), error = %e, "failed to remove staging directory");
        }
    }

    Ok(MergeOutcome::Merged { size })
}
