//! Release resolution
//!
//! Turns a catalog entry into a concrete download URL. Split files named
//! in [`STATIC_ASSET_NAMES`] link straight to their asset; everything else
//! points at a GitHub-style release listing whose newest release carries
//! the plugin binary.

use serde::Deserialize;
use std::sync::Arc;

use super::CatalogEntry;
use crate::error::InstallError;
use crate::http::Fetcher;
use crate::PLUGIN_EXTENSION;

/// Items whose source URL is already the asset URL
pub const STATIC_ASSET_NAMES: [&str; 2] = ["Any%", "All Bosses"];

/// How an entry's source URL is turned into an asset URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Source URL is the asset
    Static,
    /// Source URL lists releases newest-first; take the first plugin asset
    LatestReleaseAsset,
}

impl ResolutionStrategy {
    /// Strategy is chosen by name, never by category
    pub fn for_name(name: &str) -> Self {
        if STATIC_ASSET_NAMES.contains(&name) {
            ResolutionStrategy::Static
        } else {
            ResolutionStrategy::LatestReleaseAsset
        }
    }
}

/// A concrete download for one item
///
/// `suggested_filename` is the basename of `download_url` and names the
/// installed file for mods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub download_url: String,
    pub suggested_filename: String,
}

impl ResolvedAsset {
    fn from_url(download_url: &str) -> Self {
        Self {
            download_url: download_url.to_string(),
            suggested_filename: url_basename(download_url).to_string(),
        }
    }
}

/// Why an entry could not be resolved
#[derive(Debug)]
pub enum ResolutionMiss {
    /// Release listing request failed
    Unreachable(String),
    /// Release listing was not a JSON array of releases
    InvalidListing(String),
    /// No releases published
    NoReleases,
    /// Latest release has no `assets` field
    MissingAssets(InstallError),
    /// Latest release has assets, none of them a plugin binary
    NoMatchingAsset,
}

impl std::fmt::Display for ResolutionMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionMiss::Unreachable(reason) => write!(f, "release listing unreachable: {reason}"),
            ResolutionMiss::InvalidListing(reason) => write!(f, "invalid release listing: {reason}"),
            ResolutionMiss::NoReleases => f.write_str("no releases published"),
            ResolutionMiss::MissingAssets(err) => write!(f, "{err}"),
            ResolutionMiss::NoMatchingAsset => {
                write!(f, "latest release has no .{PLUGIN_EXTENSION} asset")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Option<Vec<ReleaseAsset>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    browser_download_url: String,
}

/// Resolves catalog entries to downloadable assets
///
/// Nothing is cached: every call re-queries the release listing.
pub struct ReleaseResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl ReleaseResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve an entry, treating every miss as "skip this item"
    pub async fn resolve(&self, entry: &CatalogEntry) -> Option<ResolvedAsset> {
        self.resolve_detailed(entry).await.ok()
    }

    /// Resolve an entry, reporting why it missed
    pub async fn resolve_detailed(
        &self,
        entry: &CatalogEntry,
    ) -> Result<ResolvedAsset, ResolutionMiss> {
        let strategy = ResolutionStrategy::for_name(&entry.name);
        tracing::debug!("Resolving '{}' with {:?}", entry.name, strategy);

        let result = match strategy {
            ResolutionStrategy::Static => Ok(ResolvedAsset::from_url(&entry.source_url)),
            ResolutionStrategy::LatestReleaseAsset => self.latest_release_asset(entry).await,
        };

        match &result {
            Ok(asset) => tracing::debug!("Resolved '{}' -> {}", entry.name, asset.download_url),
            Err(ResolutionMiss::MissingAssets(err)) => {
                tracing::error!("'assets' key missing in the release data for mod: {}", entry.name);
                tracing::error!("{}", err);
            }
            Err(miss) => tracing::warn!("Could not resolve '{}': {}", entry.name, miss),
        }

        result
    }

    async fn latest_release_asset(
        &self,
        entry: &CatalogEntry,
    ) -> Result<ResolvedAsset, ResolutionMiss> {
        let body = self
            .fetcher
            .get(&entry.source_url)
            .await
            .map_err(|e| ResolutionMiss::Unreachable(e.to_string()))?;

        // Only the newest release is typed; older ones may be any shape
        let releases: Vec<serde_json::Value> = serde_json::from_slice(&body)
            .map_err(|e| ResolutionMiss::InvalidListing(e.to_string()))?;

        let latest = releases.into_iter().next().ok_or(ResolutionMiss::NoReleases)?;
        let latest: Release = serde_json::from_value(latest)
            .map_err(|e| ResolutionMiss::InvalidListing(e.to_string()))?;

        let assets = latest.assets.as_ref().ok_or_else(|| {
            ResolutionMiss::MissingAssets(InstallError::MissingAssets {
                name: entry.name.clone(),
            })
        })?;

        let suffix = format!(".{PLUGIN_EXTENSION}");
        let asset = assets
            .iter()
            .find(|asset| {
                asset.name.ends_with(&suffix) && !asset.browser_download_url.is_empty()
            })
            .ok_or(ResolutionMiss::NoMatchingAsset)?;

        Ok(ResolvedAsset::from_url(&asset.browser_download_url))
    }
}

/// Last path segment of a URL, ignoring query and fragment
pub fn url_basename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::http::mock::MockFetcher;

    const RELEASES: &str = "https://api.github.com/repos/o/moda/releases";

    fn dynamic_entry() -> CatalogEntry {
        CatalogEntry::new("ModA", RELEASES, Category::SpeedrunningMod)
    }

    #[test]
    fn test_strategy_is_chosen_by_name() {
        assert_eq!(ResolutionStrategy::for_name("Any%"), ResolutionStrategy::Static);
        assert_eq!(
            ResolutionStrategy::for_name("All Bosses"),
            ResolutionStrategy::Static
        );
        assert_eq!(
            ResolutionStrategy::for_name("Glitchless"),
            ResolutionStrategy::LatestReleaseAsset
        );
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://x/dl/ModA.dll"), "ModA.dll");
        assert_eq!(url_basename("https://x/dl/ModA.dll?raw=1"), "ModA.dll");
        assert_eq!(url_basename("ModA.dll"), "ModA.dll");
        assert_eq!(url_basename("https://x/dl/"), "");
    }

    #[tokio::test]
    async fn test_static_entry_needs_no_network() {
        let fetcher = Arc::new(MockFetcher::new());
        let resolver = ReleaseResolver::new(fetcher.clone());
        let entry = CatalogEntry::new("Any%", "https://raw.x/splits/any.json", Category::Split);

        let asset = resolver.resolve(&entry).await.unwrap();
        assert_eq!(asset.download_url, "https://raw.x/splits/any.json");
        assert_eq!(asset.suggested_filename, "any.json");
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_static_strategy_ignores_category() {
        let fetcher = Arc::new(MockFetcher::new());
        let resolver = ReleaseResolver::new(fetcher.clone());
        let entry = CatalogEntry::new("All Bosses", "https://x/b.json", Category::OptionalMod);

        assert!(resolver.resolve(&entry).await.is_some());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_latest_release_first_dll_asset() {
        let listing = r#"[
            {"tag_name": "v2", "assets": [
                {"name": "README.md", "browser_download_url": "https://x/README.md"},
                {"name": "ModA.dll", "browser_download_url": "https://x/v2/ModA.dll"},
                {"name": "ModA.Extra.dll", "browser_download_url": "https://x/v2/ModA.Extra.dll"}
            ]},
            {"tag_name": "v1", "assets": [
                {"name": "ModA.dll", "browser_download_url": "https://x/v1/ModA.dll"}
            ]}
        ]"#;
        let fetcher = Arc::new(MockFetcher::new().with_body(RELEASES, listing));
        let resolver = ReleaseResolver::new(fetcher.clone());

        let asset = resolver.resolve(&dynamic_entry()).await.unwrap();
        assert_eq!(asset.download_url, "https://x/v2/ModA.dll");
        assert_eq!(asset.suggested_filename, "ModA.dll");
        assert_eq!(fetcher.requests(), vec![RELEASES.to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_older_releases_are_ignored() {
        let listing = r#"[
            {"tag_name": "v2", "assets": [
                {"browser_download_url": "https://x/v2/nameless.bin"},
                {"name": "ModA.dll", "browser_download_url": "https://x/v2/ModA.dll"}
            ]},
            {"tag_name": "v1", "assets": [{"size": 12}]},
            "not even an object"
        ]"#;
        let resolver = ReleaseResolver::new(Arc::new(MockFetcher::new().with_body(RELEASES, listing)));

        let asset = resolver.resolve(&dynamic_entry()).await.unwrap();
        assert_eq!(asset.download_url, "https://x/v2/ModA.dll");
    }

    #[tokio::test]
    async fn test_missing_assets_field_is_surfaced() {
        let fetcher = Arc::new(MockFetcher::new().with_body(RELEASES, r#"[{"tag_name": "v1"}]"#));
        let resolver = ReleaseResolver::new(fetcher);

        assert!(resolver.resolve(&dynamic_entry()).await.is_none());

        let miss = resolver.resolve_detailed(&dynamic_entry()).await.unwrap_err();
        match miss {
            ResolutionMiss::MissingAssets(InstallError::MissingAssets { name }) => {
                assert_eq!(name, "ModA")
            }
            other => panic!("unexpected miss: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_misses() {
        let resolver = ReleaseResolver::new(Arc::new(MockFetcher::new().with_body(RELEASES, "[]")));
        assert!(matches!(
            resolver.resolve_detailed(&dynamic_entry()).await,
            Err(ResolutionMiss::NoReleases)
        ));

        let resolver = ReleaseResolver::new(Arc::new(
            MockFetcher::new().with_body(RELEASES, r#"[{"assets": [{"name": "a.zip", "browser_download_url": "https://x/a.zip"}]}]"#),
        ));
        assert!(matches!(
            resolver.resolve_detailed(&dynamic_entry()).await,
            Err(ResolutionMiss::NoMatchingAsset)
        ));

        let resolver = ReleaseResolver::new(Arc::new(MockFetcher::new().with_status(RELEASES, 403)));
        assert!(matches!(
            resolver.resolve_detailed(&dynamic_entry()).await,
            Err(ResolutionMiss::Unreachable(_))
        ));

        let resolver = ReleaseResolver::new(Arc::new(
            MockFetcher::new().with_body(RELEASES, r#"{"message": "Not Found"}"#),
        ));
        assert!(resolver.resolve(&dynamic_entry()).await.is_none());
    }

    #[tokio::test]
    async fn test_resolution_is_not_cached() {
        let listing = r#"[{"assets": [{"name": "ModA.dll", "browser_download_url": "https://x/ModA.dll"}]}]"#;
        let fetcher = Arc::new(MockFetcher::new().with_body(RELEASES, listing));
        let resolver = ReleaseResolver::new(fetcher.clone());

        resolver.resolve(&dynamic_entry()).await.unwrap();
        resolver.resolve(&dynamic_entry()).await.unwrap();
        assert_eq!(fetcher.request_count(), 2);
    }
}
