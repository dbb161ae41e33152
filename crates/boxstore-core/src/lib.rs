#![deny(missing_docs)]

//! # boxstore-core — Foundational Types for the Boxstore Artifact Registry
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde` and `thiserror`
//! from the external ecosystem, and it performs no I/O.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifier segments.** Every segment of the
//!    artifact coordinate tuple is a distinct validated type. You cannot
//!    pass a [`ProviderName`] where an [`OrganizationId`] is expected, and
//!    a segment containing a path separator or `..` cannot be constructed
//!    at all.
//!
//! 2. **One [`StorageError`] hierarchy.** Structured errors with
//!    `thiserror` — no `Box<dyn Error>`, no `.unwrap()` outside tests.
//!    Every variant carries the diagnostic context an operator needs.
//!
//! 3. **Explicit configuration.** [`StorageConfig`] is constructed once at
//!    startup (environment with hard-coded fallbacks) and injected into the
//!    components that need it. No process-wide mutable state.

pub mod checksum;
pub mod config;
pub mod coords;
pub mod error;

// Re-export primary types at crate root for ergonomic imports.
pub use checksum::ChecksumAlgorithm;
pub use config::StorageConfig;
pub use coords::{
    ArchitectureName, ArtifactCoords, CollectionName, OrganizationId, ProviderName, VersionTag,
};
pub use error::{SegmentError, StorageError};
