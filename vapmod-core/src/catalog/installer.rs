//! Asset installation into the plugins folder
//!
//! Mods land flat in the plugins folder under the resolver's suggested
//! filename; splits land in `SpeedrunningUtils.Splits/<item>.json`. Writes
//! go straight to the final path with no temp file, so an interrupted write
//! can leave a truncated file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Category, InstalledState, ResolvedAsset};
use crate::config::SPLITS_DIR;
use crate::error::InstallError;
use crate::http::Fetcher;
use crate::PLUGIN_EXTENSION;

/// Result of a single install call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Bytes written to this path
    Written(PathBuf),
    /// Item was in the snapshot; nothing downloaded
    AlreadyInstalled,
}

/// Downloads resolved assets and writes them to disk
pub struct Installer {
    fetcher: Arc<dyn Fetcher>,
    installed: InstalledState,
}

impl Installer {
    /// Create an installer bound to the run's installed-state snapshot
    pub fn new(fetcher: Arc<dyn Fetcher>, installed: InstalledState) -> Self {
        Self { fetcher, installed }
    }

    /// Whether the snapshot already lists `item_name`
    pub fn is_installed(&self, item_name: &str) -> bool {
        self.installed.contains(item_name)
    }

    /// Download `asset` and write it under `plugins_dir`
    ///
    /// Items in the snapshot are skipped before any network call,
    /// whatever their category.
    pub async fn install(
        &self,
        asset: &ResolvedAsset,
        plugins_dir: &Path,
        category: Category,
        item_name: &str,
    ) -> Result<Placement, InstallError> {
        if self.is_installed(item_name) {
            tracing::debug!("'{}' already installed, skipping download", item_name);
            return Ok(Placement::AlreadyInstalled);
        }

        let bytes = self
            .fetcher
            .get(&asset.download_url)
            .await
            .map_err(|source| InstallError::Download {
                url: asset.download_url.clone(),
                source,
            })?;

        let path = destination_path(asset, plugins_dir, category, item_name);
        write_asset(&path, &bytes)?;

        tracing::info!("Installed {} ({} bytes) to {:?}", item_name, bytes.len(), path);
        Ok(Placement::Written(path))
    }
}

/// Where an asset for `item_name` is written
pub fn destination_path(
    asset: &ResolvedAsset,
    plugins_dir: &Path,
    category: Category,
    item_name: &str,
) -> PathBuf {
    match category {
        Category::Split => plugins_dir.join(SPLITS_DIR).join(format!("{item_name}.json")),
        Category::SpeedrunningMod | Category::OptionalMod => {
            let filename = match asset.suggested_filename.as_str() {
                "" => format!("{item_name}.{PLUGIN_EXTENSION}"),
                name => name.to_string(),
            };
            plugins_dir.join(filename)
        }
    }
}

fn write_asset(path: &Path, bytes: &[u8]) -> Result<(), InstallError> {
    let write_error = |source: std::io::Error| InstallError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    std::fs::write(path, bytes).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::url_basename;
    use crate::http::mock::MockFetcher;
    use tempfile::TempDir;

    fn asset(url: &str) -> ResolvedAsset {
        ResolvedAsset {
            download_url: url.to_string(),
            suggested_filename: url_basename(url).to_string(),
        }
    }

    #[test]
    fn test_destination_paths() {
        let plugins = Path::new("/game/BepInEx/plugins");

        assert_eq!(
            destination_path(&asset("https://x/v2/ModA.dll"), plugins, Category::OptionalMod, "Mod A"),
            plugins.join("ModA.dll")
        );
        assert_eq!(
            destination_path(&asset("https://x/any.json"), plugins, Category::Split, "Any%"),
            plugins.join("SpeedrunningUtils.Splits").join("Any%.json")
        );
        assert_eq!(
            destination_path(&asset("https://x/"), plugins, Category::SpeedrunningMod, "ModA"),
            plugins.join("ModA.dll")
        );
    }

    #[test]
    fn test_mod_destination_uses_suggested_filename() {
        let plugins = Path::new("/game/BepInEx/plugins");
        let asset = ResolvedAsset {
            download_url: "https://objects.example/release-asset/83412?sig=abc".to_string(),
            suggested_filename: "SpeedrunTimer.dll".to_string(),
        };

        assert_eq!(
            destination_path(&asset, plugins, Category::SpeedrunningMod, "Speedrun Timer"),
            plugins.join("SpeedrunTimer.dll")
        );
    }

    #[tokio::test]
    async fn test_install_mod_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = temp_dir.path();
        std::fs::write(plugins.join("ModA.dll"), b"old").unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("https://x/ModA.dll", "new bytes"));
        let installer = Installer::new(fetcher, InstalledState::default());

        let placement = installer
            .install(&asset("https://x/ModA.dll"), plugins, Category::SpeedrunningMod, "Mod A")
            .await
            .unwrap();

        assert_eq!(placement, Placement::Written(plugins.join("ModA.dll")));
        assert_eq!(std::fs::read(plugins.join("ModA.dll")).unwrap(), b"new bytes");
    }

    #[tokio::test]
    async fn test_install_split_creates_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = temp_dir.path().join("BepInEx").join("plugins");
        std::fs::create_dir_all(&plugins).unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("https://x/any.json", r#"{"segments": []}"#));
        let installer = Installer::new(fetcher, InstalledState::default());

        installer
            .install(&asset("https://x/any.json"), &plugins, Category::Split, "Any%")
            .await
            .unwrap();

        let written = plugins.join("SpeedrunningUtils.Splits").join("Any%.json");
        assert_eq!(std::fs::read_to_string(written).unwrap(), r#"{"segments": []}"#);
    }

    #[tokio::test]
    async fn test_installed_item_is_skipped_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = temp_dir.path();
        std::fs::write(plugins.join("ModA.dll"), b"original").unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("https://x/ModA.dll", "replacement"));
        let snapshot = crate::catalog::scan(plugins);
        let installer = Installer::new(fetcher.clone(), snapshot);

        let placement = installer
            .install(&asset("https://x/ModA.dll"), plugins, Category::SpeedrunningMod, "ModA")
            .await
            .unwrap();

        assert_eq!(placement, Placement::AlreadyInstalled);
        assert_eq!(fetcher.request_count(), 0);
        assert_eq!(std::fs::read(plugins.join("ModA.dll")).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_download_failure() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_status("https://x/ModA.dll", 502));
        let installer = Installer::new(fetcher, InstalledState::default());

        let err = installer
            .install(&asset("https://x/ModA.dll"), temp_dir.path(), Category::OptionalMod, "ModA")
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Download { .. }));
        assert!(!temp_dir.path().join("ModA.dll").exists());
    }

    #[tokio::test]
    async fn test_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        // A file where the plugins folder should be
        let blocked = temp_dir.path().join("plugins");
        std::fs::write(&blocked, b"not a dir").unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("https://x/ModA.dll", "bytes"));
        let installer = Installer::new(fetcher, InstalledState::default());

        let err = installer
            .install(&asset("https://x/ModA.dll"), &blocked, Category::OptionalMod, "ModA")
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Write { .. }));
    }
}
