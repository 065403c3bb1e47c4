//! Manifest loading and parsing
//!
//! The manifest is a text file served through GitHub's "repository
//! contents" API, so the body is JSON with the file base64-encoded in
//! `content`. The decoded text is one item per line:
//!
//! ```text
//! # name,url,category
//! Speedrun Timer,https://api.github.com/repos/someone/timer/releases,Speedrunning
//! Any%,https://raw.githubusercontent.com/someone/splits/main/any.json,Splits
//! ```

use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;

use super::{Catalog, CatalogEntry, Category};
use crate::error::InstallError;
use crate::http::Fetcher;

/// Repository-contents response, only the fields we read
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
}

/// Fetches and parses the remote manifest
pub struct ManifestLoader {
    fetcher: Arc<dyn Fetcher>,
    url: String,
}

impl ManifestLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Load the catalog, degrading to an empty one on failure
    ///
    /// The error, if any, is returned alongside the catalog. A non-empty
    /// catalog always means success, but an empty one does not mean failure.
    pub async fn load(&self) -> (Catalog, Option<InstallError>) {
        match self.try_load().await {
            Ok(catalog) => (catalog, None),
            Err(e) => {
                tracing::warn!("Failed to load manifest: {}", e);
                (Catalog::empty(), Some(e))
            }
        }
    }

    /// Load the catalog, propagating any failure
    pub async fn try_load(&self) -> Result<Catalog, InstallError> {
        let body = self
            .fetcher
            .get(&self.url)
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        let text = decode_contents(&body).map_err(|reason| self.fetch_error(reason))?;
        let catalog = parse_manifest(&text)?;

        tracing::debug!("Loaded {} catalog entries from {}", catalog.len(), self.url);
        Ok(catalog)
    }

    fn fetch_error(&self, reason: String) -> InstallError {
        InstallError::ManifestFetch {
            url: self.url.clone(),
            reason,
        }
    }
}

/// Decode a repository-contents JSON body into the file text
pub fn decode_contents(body: &[u8]) -> Result<String, String> {
    let response: ContentsResponse =
        serde_json::from_slice(body).map_err(|e| format!("invalid contents response: {e}"))?;

    // GitHub wraps the base64 payload every 60 characters
    let packed: String = response
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(packed)
        .map_err(|e| format!("invalid base64 content: {e}"))?;

    String::from_utf8(bytes).map_err(|e| format!("manifest is not UTF-8: {e}"))
}

/// Parse manifest text into a catalog
///
/// Blank lines and lines starting with `#` are skipped. Any other line
/// must be `name,url,category`; the first malformed line fails the whole
/// parse so no partial catalog is ever returned.
pub fn parse_manifest(text: &str) -> Result<Catalog, InstallError> {
    let mut catalog = Catalog::empty();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || InstallError::ManifestParse {
            line: index + 1,
            content: line.to_string(),
        };

        let fields: Vec<&str> = line.splitn(3, ',').map(str::trim).collect();
        let [name, url, token] = fields.as_slice() else {
            return Err(malformed());
        };

        let category = Category::from_token(token).ok_or_else(malformed)?;
        catalog.push(CatalogEntry::new(*name, *url, category));
    }

    Ok(catalog)
}
