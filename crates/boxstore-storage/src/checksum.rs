//! # Streaming Checksum Verification
//!
//! Streams a file once through a named digest and compares the result
//! against a declared hex value, case-insensitively. The verifier never
//! mutates state — the upload receiver alone decides what to do with a
//! mismatch.
//!
//! An unrecognized algorithm name reports [`Verification::Unsupported`]
//! rather than an error; callers treat that as "skip verification."

use std::path::Path;

use sha2::{Digest, Sha256, Sha384, Sha512};
use tokio::io::AsyncReadExt;

use boxstore_core::{ChecksumAlgorithm, StorageError};

/// Read buffer size for the streaming digest pass.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Outcome of a checksum verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The computed digest matches the declared value.
    Verified,
    /// The computed digest differs from the declared value.
    Mismatch {
        /// The digest computed from the file's bytes, lowercase hex.
        computed: String,
    },
    /// The algorithm name is not supported; the file was not read.
    Unsupported,
}

/// One streaming hasher, selected by algorithm.
enum Hasher {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            ChecksumAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => to_hex(&h.finalize()),
            Self::Sha384(h) => to_hex(&h.finalize()),
            Self::Sha512(h) => to_hex(&h.finalize()),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute the lowercase hex digest of a file in one streaming pass.
pub async fn digest_file(
    path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<String, StorageError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}

/// Verify a file against a declared hex checksum and algorithm name.
///
/// Comparison is case-insensitive on the hex value. Unknown algorithm
/// names return [`Verification::Unsupported`] without touching the file.
pub async fn verify_file(
    path: &Path,
    expected_hex: &str,
    algorithm_name: &str,
) -> Result<Verification, StorageError> {
    let Some(algorithm) = ChecksumAlgorithm::parse(algorithm_name) else {
        return Ok(Verification::Unsupported);
    };
    let computed = digest_file(path, algorithm).await?;
    if computed.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(Verification::Verified)
    } else {
        Ok(Verification::Mismatch { computed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Digest;

    async fn fixture(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        tokio::fs::write(&path, content).await.unwrap();
        (dir, path)
    }

    fn sha256_hex(content: &[u8]) -> String {
        to_hex(&Sha256::digest(content))
    }

    #[tokio::test]
    async fn correct_checksum_verifies() {
        let (_dir, path) = fixture(b"hello artifact").await;
        let expected = sha256_hex(b"hello artifact");
        let outcome = verify_file(&path, &expected, "sha256").await.unwrap();
        assert_eq!(outcome, Verification::Verified);
    }

    #[tokio::test]
    async fn uppercase_hex_still_verifies() {
        let (_dir, path) = fixture(b"hello artifact").await;
        let expected = sha256_hex(b"hello artifact").to_uppercase();
        let outcome = verify_file(&path, &expected, "SHA-256").await.unwrap();
        assert_eq!(outcome, Verification::Verified);
    }

    #[tokio::test]
    async fn wrong_checksum_reports_computed_value() {
        let (_dir, path) = fixture(b"hello artifact").await;
        let outcome = verify_file(&path, &"0".repeat(64), "sha256").await.unwrap();
        match outcome {
            Verification::Mismatch { computed } => {
                assert_eq!(computed, sha256_hex(b"hello artifact"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_algorithm_is_unsupported_not_error() {
        let (_dir, path) = fixture(b"hello artifact").await;
        let outcome = verify_file(&path, "abc", "md5").await.unwrap();
        assert_eq!(outcome, Verification::Unsupported);
    }

    #[tokio::test]
    async fn sha512_digest_matches_library() {
        let (_dir, path) = fixture(b"larger payload for the 512 path").await;
        let expected = to_hex(&Sha512::digest(b"larger payload for the 512 path"));
        let outcome = verify_file(&path, &expected, "sha512").await.unwrap();
        assert_eq!(outcome, Verification::Verified);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = verify_file(&dir.path().join("absent"), "00", "sha256")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
