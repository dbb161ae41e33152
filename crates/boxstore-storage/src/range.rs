//! # Byte-Range Parsing and Clamping
//!
//! Parses `bytes=start-end` request headers against a known total length
//! into a [`RangeSpec`] satisfying `0 <= start <= end < size`.
//!
//! The asymmetry in the rules is deliberate and load-bearing:
//!
//! - `start >= size` and `start > end` are **rejected** before any
//!   clamping — the client asked for something the artifact cannot serve.
//! - `end >= size` is **clamped** to `size - 1` — a permissive read of
//!   "give me everything from `start`."
//!
//! Multi-range (`bytes=0-1,5-9`) and suffix (`bytes=-500`) forms are not
//! served; they parse as not-satisfiable.

use boxstore_core::StorageError;

/// A parsed, clamped, inclusive byte interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First byte offset to serve.
    pub start: u64,
    /// Last byte offset to serve (inclusive), `< size`.
    pub end: u64,
}

impl RangeSpec {
    /// Number of bytes this range covers.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Parse a `Range` header value against an artifact of `size` bytes.
    ///
    /// Every failure is [`StorageError::RangeNotSatisfiable`] carrying the
    /// total size, so the client can retry with a valid range.
    pub fn parse(header: &str, size: u64) -> Result<Self, StorageError> {
        let unsatisfiable = || StorageError::RangeNotSatisfiable { size };

        let spec = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(unsatisfiable)?;
        if spec.contains(',') {
            return Err(unsatisfiable());
        }
        let (start_str, end_str) = spec.split_once('-').ok_or_else(unsatisfiable)?;

        let start: u64 = start_str.trim().parse().map_err(|_| unsatisfiable())?;
        if start >= size {
            return Err(unsatisfiable());
        }

        let end = match end_str.trim() {
            "" => size - 1,
            s => {
                let end: u64 = s.parse().map_err(|_| unsatisfiable())?;
                if start > end {
                    return Err(unsatisfiable());
                }
                end.min(size - 1)
            }
        };

        Ok(Self { start, end })
    }
}

impl std::fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
