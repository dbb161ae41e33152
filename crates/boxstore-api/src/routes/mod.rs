//! # API Route Modules
//!
//! - `artifacts` — the artifact transfer surface: resumable uploads
//!   (single-shot and chunked), range-aware downloads, and deletion.
//!
//! Relational CRUD for organizations, collections, versions, and
//! providers lives in the upstream service; only the byte-transfer
//! engine is served here.

pub mod artifacts;
