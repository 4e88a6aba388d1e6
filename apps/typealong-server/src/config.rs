//! Configuration management for TypeAlong Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::epub::DEFAULT_MAX_SECTION_BYTES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub paging: PagingConfig,
    pub vocabulary: VocabularyConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded EPUBs
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Delete every upload when the server shuts down
    pub purge_on_shutdown: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    /// Cap on words returned for one page; `None` returns the whole section
    pub max_words_per_page: Option<usize>,
    /// Largest inflated size of one archive entry read while paging
    pub max_section_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyConfig {
    /// Newline-separated dictionary
    pub words_file: PathBuf,
    pub max_random_words: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("./uploaded_epubs"),
                max_upload_bytes: 50 * 1024 * 1024,
                purge_on_shutdown: false,
            },
            paging: PagingConfig {
                max_words_per_page: None,
                max_section_bytes: DEFAULT_MAX_SECTION_BYTES,
            },
            vocabulary: VocabularyConfig {
                words_file: PathBuf::from("/usr/share/dict/words"),
                max_random_words: 100,
            },
            proxy: ProxyConfig { timeout_secs: 30 },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server.port),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?
                    .unwrap_or(defaults.storage.max_upload_bytes),
                purge_on_shutdown: parse_var("PURGE_ON_SHUTDOWN")?
                    .unwrap_or(defaults.storage.purge_on_shutdown),
            },
            paging: PagingConfig {
                max_words_per_page: parse_var("MAX_WORDS_PER_PAGE")?
                    .filter(|&cap: &usize| cap > 0),
                max_section_bytes: parse_var("MAX_SECTION_BYTES")?
                    .unwrap_or(defaults.paging.max_section_bytes),
            },
            vocabulary: VocabularyConfig {
                words_file: env::var("WORDS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.vocabulary.words_file),
                max_random_words: parse_var("MAX_RANDOM_WORDS")?
                    .unwrap_or(defaults.vocabulary.max_random_words),
            },
            proxy: ProxyConfig {
                timeout_secs: parse_var("PROXY_TIMEOUT_SECS")?
                    .unwrap_or(defaults.proxy.timeout_secs),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read and parse an optional variable; unset or empty means `None`
fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => parse_value(key, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
