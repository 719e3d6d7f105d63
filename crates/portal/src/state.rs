//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::google;
use crate::services::{
    FileStore, LedgerBackend, PhotoDirectory, Persister, ReferenceData, ReferenceStore,
};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cannot create image directory {path}: {source}")]
    ImageDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot build Google HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the reference data snapshot and the persistence backends.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    reference: ReferenceStore,
    persister: Persister,
}

impl AppState {
    /// Create the production state: Google Sheets ledger and Drive store.
    ///
    /// # Errors
    ///
    /// Returns an error if the image directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, StateError> {
        let (ledger, files) = google::clients(&config.google)?;
        Self::with_backends(config, Arc::new(ledger), Arc::new(files))
    }

    /// Create a state over explicit ledger and file store backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the image directory cannot be created.
    pub fn with_backends(
        config: PortalConfig,
        ledger: Arc<dyn LedgerBackend>,
        files: Arc<dyn FileStore>,
    ) -> Result<Self, StateError> {
        let photos =
            PhotoDirectory::create(config.image_dir.clone()).map_err(|source| StateError::ImageDir {
                path: config.image_dir.display().to_string(),
                source,
            })?;
        let reference = ReferenceStore::load(config.files.clone());
        let persister = Persister::new(photos, files, ledger);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                reference,
                persister,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get the reference data store.
    #[must_use]
    pub fn reference(&self) -> &ReferenceStore {
        &self.inner.reference
    }

    /// Get the order persister.
    #[must_use]
    pub fn persister(&self) -> &Persister {
        &self.inner.persister
    }

    /// Re-read the reference files off the async runtime and publish the new
    /// snapshot.
    pub async fn reload_reference(&self) -> Arc<ReferenceData> {
        let state = self.clone();
        match tokio::task::spawn_blocking(move || state.reference().reload()).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "reference reload task failed");
                self.reference().snapshot()
            }
        }
    }
}
