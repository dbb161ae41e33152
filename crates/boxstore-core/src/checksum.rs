//! # Checksum Algorithm Tags
//!
//! [`ChecksumAlgorithm`] names the streaming digests the verifier supports.
//! Parsing is case-insensitive, and an unrecognized name is simply `None` —
//! the engine treats unknown algorithms as "not verifiable" and skips
//! verification rather than failing the upload.

use serde::{Deserialize, Serialize};

/// A digest algorithm the checksum verifier can stream a file through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl ChecksumAlgorithm {
    /// Parse an algorithm name, case-insensitively.
    ///
    /// Returns `None` for unsupported names; callers treat that as
    /// "skip verification," never as an error.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Some(Self::Sha256),
            "sha384" | "sha-384" => Some(Self::Sha384),
            "sha512" | "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// The canonical lowercase name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
