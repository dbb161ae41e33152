#![deny(missing_docs)]

//! # boxstore-storage — The Artifact Storage Engine
//!
//! This crate implements the resumable upload and range-addressable
//! download engine behind the boxstore API:
//!
//! - **Path resolution** ([`paths`]) — pure, deterministic mapping from
//!   coordinate segments to a canonical location under the storage root,
//!   with a traversal-safety guarantee.
//! - **Chunk staging and merge** ([`chunks`]) — numbered chunk files in a
//!   transient `.staging` directory, assembled in index order by an
//!   idempotent merge that tolerates concurrent triggers.
//! - **Streaming writes and finalization** ([`upload`]) — single-shot body
//!   writes, size-ceiling and declared-length validation, checksum
//!   verification, and best-effort cleanup on every abort path.
//! - **Checksum verification** ([`checksum`]) — one streaming pass through
//!   a named digest, case-insensitive hex comparison, unsupported names
//!   degrade to "skip."
//! - **Byte ranges** ([`range`], [`download`]) — `bytes=start-end` parsing
//!   with permissive end clamping, and bounded async readers.
//! - **Metadata synchronization** ([`metadata`]) — the single boundary
//!   where the engine writes artifact records to the persistence layer.
//!
//! ## Concurrency stance
//!
//! There is no lock over a canonical path or its staging directory. Chunks
//! with distinct indices never conflict (independent files), and the merge
//! is idempotent: a trigger that finds the staging directory gone treats
//! the merge as already performed. Concurrent single-shot uploads to the
//! same tuple race at the filesystem level; last writer wins. This is a
//! documented accepted limitation, not an invariant.

pub mod checksum;
pub mod chunks;
pub mod download;
pub mod metadata;
pub mod paths;
pub mod range;
pub mod upload;

pub use checksum::{verify_file, Verification};
pub use chunks::{try_merge, MergeOutcome};
pub use metadata::{ArtifactMetadata, ArtifactMetadataStore, MetadataUpsert};
pub use paths::{artifact_path, resolve_segments, staging_dir, ARTIFACT_FILE_NAME};
pub use range::RangeSpec;
pub use upload::{finalize, write_artifact, DeclaredChecksum, FinalizeMode, UploadValidation};
