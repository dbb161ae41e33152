//! # Artifact Metadata Synchronization
//!
//! The single boundary where the engine writes to the persistence
//! collaborator: one record per artifact, created on first successful
//! upload completion and updated in place on overwrite. The engine never
//! queries relational ownership state — the surrounding layers resolve
//! authorization and hand the engine already-validated coordinates.
//!
//! The store is synchronous (`parking_lot::RwLock`, never held across an
//! `.await` point) and cloneable; clones share the same underlying map.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use boxstore_core::ArtifactCoords;

/// The metadata record kept for one stored artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// The coordinate tuple this record belongs to.
    pub coords: ArtifactCoords,
    /// The fixed on-disk file name.
    pub file_name: String,
    /// Declared checksum, when the uploader supplied one.
    pub checksum: Option<String>,
    /// Declared checksum algorithm, when supplied.
    pub checksum_type: Option<String>,
    /// Final size measured on disk at upload completion.
    pub file_size: u64,
    /// Number of successful download opens.
    pub download_count: u64,
    /// First upload completion time.
    pub created_at: DateTime<Utc>,
    /// Last upload completion or counter update.
    pub updated_at: DateTime<Utc>,
}

/// The fields the upload receiver hands over at finalization.
#[derive(Debug, Clone)]
pub struct MetadataUpsert {
    /// The fixed on-disk file name.
    pub file_name: String,
    /// Declared checksum, when supplied.
    pub checksum: Option<String>,
    /// Declared checksum algorithm, when supplied.
    pub checksum_type: Option<String>,
    /// Final measured size.
    pub file_size: u64,
}

/// Thread-safe, cloneable store of artifact metadata records, keyed by
/// the coordinate tuple.
#[derive(Debug, Default)]
pub struct ArtifactMetadataStore {
    data: Arc<RwLock<HashMap<ArtifactCoords, ArtifactMetadata>>>,
}

impl Clone for ArtifactMetadataStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl ArtifactMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for `coords` or update it in place, preserving
    /// `created_at` and the download counter across overwrites.
    pub fn upsert(&self, coords: &ArtifactCoords, fields: MetadataUpsert) -> ArtifactMetadata {
        let now = Utc::now();
        let mut guard = self.data.write();
        let record = guard
            .entry(coords.clone())
            .and_modify(|existing| {
                existing.file_name = fields.file_name.clone();
                existing.checksum = fields.checksum.clone();
                existing.checksum_type = fields.checksum_type.clone();
                existing.file_size = fields.file_size;
                existing.updated_at = now;
            })
            .or_insert_with(|| ArtifactMetadata {
                coords: coords.clone(),
                file_name: fields.file_name,
                checksum: fields.checksum,
                checksum_type: fields.checksum_type,
                file_size: fields.file_size,
                download_count: 0,
                created_at: now,
                updated_at: now,
            });
        record.clone()
    }

    /// Retrieve the record for a tuple.
    pub fn get(&self, coords: &ArtifactCoords) -> Option<ArtifactMetadata> {
        self.data.read().get(coords).cloned()
    }

    /// Increment the download counter, returning the new count.
    ///
    /// Returns `None` when no record exists; the download path treats that
    /// as a logged, best-effort miss and serves the bytes regardless.
    pub fn record_download(&self, coords: &ArtifactCoords) -> Option<u64> {
        let mut guard = self.data.write();
        let record = guard.get_mut(coords)?;
        record.download_count += 1;
        record.updated_at = Utc::now();
        Some(record.download_count)
    }

    /// Remove the record for a tuple.
    pub fn remove(&self, coords: &ArtifactCoords) -> Option<ArtifactMetadata> {
        self.data.write().remove(coords)
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
