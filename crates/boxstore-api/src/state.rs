//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! `AppState` holds the injected [`StorageConfig`] and the artifact
//! metadata store — the persistence-collaborator boundary. Authorization
//! and relational CRUD for organizations/collections/versions live
//! upstream; by the time a handler runs, the coordinates it receives are
//! already authorized.

use boxstore_core::StorageConfig;
use boxstore_storage::ArtifactMetadataStore;

/// Process configuration assembled at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP listener binds.
    pub port: u16,
    /// Storage engine configuration (root, ceiling, timeout).
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Build configuration from the environment with fallback defaults.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self {
            port,
            storage: StorageConfig::from_env(),
        }
    }
}

/// Shared application state. Cheap to clone; the metadata store is an
/// `Arc` internally and clones observe the same records.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration.
    pub config: AppConfig,
    /// Artifact metadata records (persistence boundary).
    pub metadata: ArtifactMetadataStore,
}

impl AppState {
    /// State with the given storage configuration and default port.
    pub fn new(storage: StorageConfig) -> Self {
        Self::with_config(AppConfig { port: 8080, storage })
    }

    /// State with a fully specified configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            metadata: ArtifactMetadataStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_metadata_store() {
        let state = AppState::new(StorageConfig::with_root("/tmp/store"));
        let clone = state.clone();
        assert!(clone.metadata.is_empty());
        assert_eq!(clone.config.port, 8080);
    }
}
