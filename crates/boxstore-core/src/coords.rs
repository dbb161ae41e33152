//! # Artifact Coordinate Newtypes
//!
//! Domain-primitive newtypes for the five segments of the artifact
//! coordinate tuple: organization → collection → version → provider →
//! architecture. Each segment is a distinct type — you cannot pass a
//! [`ProviderName`] where an [`OrganizationId`] is expected.
//!
//! ## Validation
//!
//! Every segment validates at construction time: non-empty, no path
//! separators, no NUL bytes, and never the reserved dot components `.` or
//! `..`. A segment that could escape the storage root is unrepresentable,
//! which is the first layer of the traversal-safety guarantee (the path
//! resolver re-checks the joined path as the second layer).

use serde::{Deserialize, Serialize};

use crate::error::SegmentError;

/// Maximum accepted length for any single coordinate segment.
pub const MAX_SEGMENT_LEN: usize = 128;

/// Validate one coordinate segment.
///
/// Shared by all five newtype constructors. Returns the offending segment
/// and reason on rejection.
fn validate_segment(segment: &str) -> Result<(), SegmentError> {
    if segment.is_empty() {
        return Err(SegmentError::Empty);
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(SegmentError::TooLong {
            segment: segment.to_string(),
            len: segment.len(),
        });
    }
    if segment == "." || segment == ".." {
        return Err(SegmentError::ReservedDotComponent {
            segment: segment.to_string(),
        });
    }
    if segment.contains('/') || segment.contains('\\') || segment.contains('\0') {
        return Err(SegmentError::ForbiddenCharacter {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

macro_rules! segment_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Construct from a string, validating the segment rules.
            pub fn new(value: impl Into<String>) -> Result<Self, SegmentError> {
                let value = value.into();
                validate_segment(&value)?;
                Ok(Self(value))
            }

            /// Access the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = SegmentError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = SegmentError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

segment_newtype!(
    /// The organization that owns a collection of artifacts.
    OrganizationId
);

segment_newtype!(
    /// A named collection of artifact versions within an organization.
    CollectionName
);

segment_newtype!(
    /// A version tag within a collection (e.g., `1.2.0`).
    VersionTag
);

segment_newtype!(
    /// The virtualization provider an artifact targets (e.g., `virtualbox`).
    ProviderName
);

segment_newtype!(
    /// The CPU architecture an artifact targets (e.g., `amd64`).
    ArchitectureName
);

/// The full five-segment coordinate tuple addressing one artifact.
///
/// Exactly one canonical on-disk path exists per tuple; the path resolver
/// derives it deterministically from these segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactCoords {
    /// Owning organization.
    pub organization: OrganizationId,
    /// Collection within the organization.
    pub collection: CollectionName,
    /// Version within the collection.
    pub version: VersionTag,
    /// Provider within the version.
    pub provider: ProviderName,
    /// Architecture within the provider.
    pub architecture: ArchitectureName,
}

impl ArtifactCoords {
    /// The ordered path segments for this tuple, organization first.
    pub fn segments(&self) -> [&str; 5] {
        [
            self.organization.as_str(),
            self.collection.as_str(),
            self.version.as_str(),
            self.provider.as_str(),
            self.architecture.as_str(),
        ]
    }
}

impl std::fmt::Display for ArtifactCoords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.organization, self.collection, self.version, self.provider, self.architecture
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> ArtifactCoords {
        ArtifactCoords {
            organization: OrganizationId::new("acme").unwrap(),
            collection: CollectionName::new("base-images").unwrap(),
            version: VersionTag::new("1.2.0").unwrap(),
            provider: ProviderName::new("virtualbox").unwrap(),
            architecture: ArchitectureName::new("amd64").unwrap(),
        }
    }

    #[test]
    fn valid_segments_construct() {
        assert_eq!(OrganizationId::new("acme").unwrap().as_str(), "acme");
        assert_eq!(VersionTag::new("1.2.0-rc1").unwrap().as_str(), "1.2.0-rc1");
    }

    #[test]
    fn empty_segment_rejected() {
        assert!(matches!(
            OrganizationId::new(""),
            Err(SegmentError::Empty)
        ));
    }

    #[test]
    fn dot_dot_segment_rejected() {
        assert!(matches!(
            CollectionName::new(".."),
            Err(SegmentError::ReservedDotComponent { .. })
        ));
        assert!(matches!(
            CollectionName::new("."),
            Err(SegmentError::ReservedDotComponent { .. })
        ));
    }

    #[test]
    fn separator_segment_rejected() {
        assert!(matches!(
            ProviderName::new("a/b"),
            Err(SegmentError::ForbiddenCharacter { .. })
        ));
        assert!(matches!(
            ProviderName::new("a\\b"),
            Err(SegmentError::ForbiddenCharacter { .. })
        ));
        assert!(matches!(
            ProviderName::new("a\0b"),
            Err(SegmentError::ForbiddenCharacter { .. })
        ));
    }

    #[test]
    fn oversized_segment_rejected() {
        let long = "x".repeat(MAX_SEGMENT_LEN + 1);
        assert!(matches!(
            ArchitectureName::new(long),
            Err(SegmentError::TooLong { .. })
        ));
    }

    #[test]
    fn dot_dot_with_embedded_content_allowed() {
        // "..foo" is a legitimate name; only the exact dot components are reserved.
        assert!(CollectionName::new("..foo").is_ok());
    }

    #[test]
    fn segments_order_is_org_first() {
        let c = coords();
        assert_eq!(
            c.segments(),
            ["acme", "base-images", "1.2.0", "virtualbox", "amd64"]
        );
    }

    #[test]
    fn display_joins_with_slashes() {
        assert_eq!(coords().to_string(), "acme/base-images/1.2.0/virtualbox/amd64");
    }

    #[test]
    fn serde_round_trip_validates() {
        let json = "\"acme\"";
        let org: OrganizationId = serde_json::from_str(json).unwrap();
        assert_eq!(org.as_str(), "acme");
        let bad: Result<OrganizationId, _> = serde_json::from_str("\"..\"");
        assert!(bad.is_err());
    }
}
