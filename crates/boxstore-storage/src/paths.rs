//! # Canonical Path Resolution
//!
//! Pure mapping from coordinate segments to on-disk locations under the
//! configured storage root. Performs no I/O, has no side effects, and is
//! deterministic for identical inputs — safe to call concurrently.
//!
//! ## Layout
//!
//! ```text
//! {root}/{org}/{collection}/{version}/{provider}/{arch}/artifact.box
//! {root}/{org}/{collection}/{version}/{provider}/{arch}/.staging/chunk-{n}
//! ```
//!
//! ## Traversal safety
//!
//! Every segment must resolve to exactly one normal path component: `..`,
//! `.`, embedded separators, and absolute paths are all rejected with
//! [`StorageError::PathTraversal`]. The joined path is then re-checked to
//! be prefixed by the root. The coordinate newtypes already make escaping
//! segments unrepresentable; this module enforces the invariant again for
//! callers resolving raw strings.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use boxstore_core::{ArtifactCoords, StorageError};

/// Fixed file name of the canonical artifact inside its architecture
/// directory. Exactly one canonical file exists per coordinate tuple.
pub const ARTIFACT_FILE_NAME: &str = "artifact.box";

/// Name of the transient staging directory holding not-yet-merged chunks.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Resolve an ordered list of raw segments under `root`.
///
/// Fails with [`StorageError::PathTraversal`] if any segment is not a
/// single normal path component, or if the joined path does not remain
/// prefixed by `root`.
pub fn resolve_segments(root: &Path, segments: &[&str]) -> Result<PathBuf, StorageError> {
    let mut path = root.to_path_buf();
    for segment in segments {
        if segment.is_empty() {
            return Err(StorageError::Validation(
                "empty coordinate segment".to_string(),
            ));
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(c)), None) if c == OsStr::new(*segment) => path.push(c),
            _ => {
                return Err(StorageError::PathTraversal {
                    path: root.join(segment),
                })
            }
        }
    }
    // Re-checked even though the loop above cannot produce an escape.
    if !path.starts_with(root) {
        return Err(StorageError::PathTraversal { path });
    }
    Ok(path)
}

/// The directory owning one artifact: `{root}/{five segments}`.
pub fn artifact_dir(root: &Path, coords: &ArtifactCoords) -> Result<PathBuf, StorageError> {
    let segments = coords.segments();
    resolve_segments(root, &segments)
}

/// The canonical artifact file path for a coordinate tuple.
pub fn artifact_path(root: &Path, coords: &ArtifactCoords) -> Result<PathBuf, StorageError> {
    Ok(artifact_dir(root, coords)?.join(ARTIFACT_FILE_NAME))
}

/// The transient staging directory for a coordinate tuple's chunked upload.
pub fn staging_dir(root: &Path, coords: &ArtifactCoords) -> Result<PathBuf, StorageError> {
    Ok(artifact_dir(root, coords)?.join(STAGING_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxstore_core::{
        ArchitectureName, CollectionName, OrganizationId, ProviderName, VersionTag,
    };

    fn coords() -> ArtifactCoords {
        ArtifactCoords {
            organization: OrganizationId::new("acme").unwrap(),
            collection: CollectionName::new("base").unwrap(),
            version: VersionTag::new("1.0.0").unwrap(),
            provider: ProviderName::new("qemu").unwrap(),
            architecture: ArchitectureName::new("arm64").unwrap(),
        }
    }

    #[test]
    fn resolves_all_five_segments_in_order() {
        let path = artifact_path(Path::new("/srv/store"), &coords()).unwrap();
        assert_eq!(
            path,
            Path::new("/srv/store/acme/base/1.0.0/qemu/arm64/artifact.box")
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let root = Path::new("/srv/store");
        let a = resolve_segments(root, &["x", "y"]).unwrap();
        let b = resolve_segments(root, &["x", "y"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dot_dot_segment_is_traversal() {
        let err = resolve_segments(Path::new("/srv/store"), &["acme", "..", "etc"]).unwrap_err();
        assert!(matches!(err, StorageError::PathTraversal { .. }));
    }

    #[test]
    fn absolute_segment_is_traversal() {
        let err = resolve_segments(Path::new("/srv/store"), &["/etc/passwd"]).unwrap_err();
        assert!(matches!(err, StorageError::PathTraversal { .. }));
    }

    #[test]
    fn embedded_separator_is_traversal() {
        let err = resolve_segments(Path::new("/srv/store"), &["a/b"]).unwrap_err();
        assert!(matches!(err, StorageError::PathTraversal { .. }));
    }

    #[test]
    fn current_dir_segment_is_traversal() {
        let err = resolve_segments(Path::new("/srv/store"), &["."]).unwrap_err();
        assert!(matches!(err, StorageError::PathTraversal { .. }));
    }

    #[test]
    fn empty_segment_is_validation_error() {
        let err = resolve_segments(Path::new("/srv/store"), &[""]).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[test]
    fn nested_escape_never_leaves_root() {
        // Even a deep mix of valid and hostile segments must not resolve
        // outside the root.
        let root = Path::new("/srv/store");
        for hostile in ["..", "../..", "a/../../b", "..\u{2215}x"] {
            match resolve_segments(root, &["acme", hostile]) {
                Ok(path) => assert!(path.starts_with(root), "escaped: {}", path.display()),
                Err(StorageError::PathTraversal { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn staging_dir_sits_beside_artifact() {
        let root = Path::new("/srv/store");
        let staging = staging_dir(root, &coords()).unwrap();
        let artifact = artifact_path(root, &coords()).unwrap();
        assert_eq!(staging.parent(), artifact.parent());
        assert!(staging.ends_with(STAGING_DIR_NAME));
    }
}
