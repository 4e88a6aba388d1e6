//! Application state management
//!
//! Holds configuration and stateless service handles only. Parsed books are
//! never kept here; every request loads its own archive.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::storage::{LocalUploadStore, UploadStore};
use crate::vocab::WordSampler;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    uploads: Arc<dyn UploadStore>,
    words: WordSampler,
    http: reqwest::Client,
}

impl AppState {
    /// Create state backed by the local upload directory and the configured
    /// dictionary
    pub fn new(config: Config) -> Result<Self, StateError> {
        let uploads = Arc::new(LocalUploadStore::new(config.storage.upload_dir.clone()));
        let words = WordSampler::load(&config.vocabulary.words_file);
        Self::with_parts(config, uploads, words)
    }

    /// Create state from explicit parts
    pub fn with_parts(
        config: Config,
        uploads: Arc<dyn UploadStore>,
        words: WordSampler,
    ) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.proxy.timeout_secs))
            .user_agent(concat!("typealong-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                uploads,
                words,
                http,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload store
    pub fn uploads(&self) -> &dyn UploadStore {
        self.inner.uploads.as_ref()
    }

    /// Get the practice word sampler
    pub fn words(&self) -> &WordSampler {
        &self.inner.words
    }

    /// Get the outbound HTTP client
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
