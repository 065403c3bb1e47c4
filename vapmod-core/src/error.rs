//! Installer error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Transport-level failures from a [`crate::http::Fetcher`]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, timeout or body read failure
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. } | FetchError::Transport { url, .. } => url,
        }
    }
}

/// Errors surfaced by the install pipeline and its collaborators
#[derive(Error, Debug)]
pub enum InstallError {
    /// The manifest document could not be retrieved or decoded
    #[error("Failed to load mod links from {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    /// A manifest line is not `name,url,category`
    #[error("Malformed manifest line {line}: '{content}' (expected name,url,category)")]
    ManifestParse { line: usize, content: String },

    /// The latest release of an item carries no `assets` field
    #[error("No assets available for mod: {name}")]
    MissingAssets { name: String },

    /// Downloading a resolved asset failed
    #[error("Failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Writing a downloaded asset to disk failed
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The host runtime has not created its plugins folder yet
    #[error("BepInEx is installed, but the 'plugins' folder is missing at {plugins_dir}.\n\nPlease run V.A Proxy once to initialize the folder.")]
    NotInitialized { plugins_dir: PathBuf },

    /// The runtime archive could not be extracted
    #[error("Failed to extract {archive}")]
    Extraction {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings or persisted path could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
}

impl InstallError {
    /// Errors that end a run before any item is processed
    pub fn is_fatal(&self) -> bool {
        matches!(self, InstallError::NotInitialized { .. })
    }
}
