//! BepInEx bootstrap
//!
//! Unpacks the packaged BepInEx runtime into the game root. BepInEx
//! creates its `plugins` folder on the game's first launch, so a fresh
//! extraction is followed by "run the game once" before mods can go in.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::InstallConfig;
use crate::error::InstallError;

/// Default name of the packaged runtime archive
pub const DEFAULT_ARCHIVE: &str = "BepInExPack.tar.gz";

/// Outcome of [`install_runtime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// Archive unpacked; the game must be launched once
    Extracted,
    /// BepInEx present and its plugins folder exists
    AlreadyInitialized,
    /// BepInEx present but the game has not been launched since
    AwaitingFirstRun,
}

/// Install BepInEx into `config.root` unless it is already there
pub fn install_runtime(
    config: &InstallConfig,
    archive: &Path,
) -> Result<BootstrapStatus, InstallError> {
    if !config.root.is_dir() {
        return Err(InstallError::Config(format!(
            "invalid V.A Proxy root folder: {}",
            config.root.display()
        )));
    }

    if config.bepinex_dir().exists() {
        return Ok(if config.plugins_dir().exists() {
            BootstrapStatus::AlreadyInitialized
        } else {
            BootstrapStatus::AwaitingFirstRun
        });
    }

    extract(archive, &config.root)?;
    tracing::info!("Extracted {:?} into {:?}", archive, config.root);

    Ok(BootstrapStatus::Extracted)
}

/// Unpack a `.tar.gz` archive into `destination`
pub fn extract(archive: &Path, destination: &Path) -> Result<(), InstallError> {
    let extraction_error = |source: std::io::Error| InstallError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(extraction_error)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tarball = tar::Archive::new(decoder);

    tarball.unpack(destination).map_err(extraction_error)
}

/// Archive path next to the running executable, if present
pub fn default_archive_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(DEFAULT_ARCHIVE);
    candidate.exists().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::TempDir;

    /// Build a BepInEx-like pack with `BepInEx/core/BepInEx.dll`
    fn create_test_pack(dir: &Path) -> PathBuf {
        let staging = dir.join("staging");
        std::fs::create_dir_all(staging.join("BepInEx").join("core")).unwrap();
        std::fs::write(staging.join("BepInEx").join("core").join("BepInEx.dll"), b"core").unwrap();
        std::fs::write(staging.join("winhttp.dll"), b"doorstop").unwrap();

        let archive = dir.join("BepInExPack.tar.gz");
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
        let mut builder = Builder::new(encoder);
        builder
            .append_dir_all("BepInEx", staging.join("BepInEx"))
            .unwrap();
        builder
            .append_path_with_name(staging.join("winhttp.dll"), "winhttp.dll")
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        archive
    }

    #[test]
    fn test_fresh_root_is_extracted() {
        let temp_dir = TempDir::new().unwrap();
        let archive = create_test_pack(temp_dir.path());
        let root = temp_dir.path().join("game");
        std::fs::create_dir(&root).unwrap();
        let config = InstallConfig::new(&root);

        let status = install_runtime(&config, &archive).unwrap();

        assert_eq!(status, BootstrapStatus::Extracted);
        assert!(config.bepinex_dir().join("core").join("BepInEx.dll").exists());
        assert!(root.join("winhttp.dll").exists());
        assert!(!config.plugins_dir().exists());
    }

    #[test]
    fn test_existing_install_states() {
        let temp_dir = TempDir::new().unwrap();
        let config = InstallConfig::new(temp_dir.path());
        let missing_archive = temp_dir.path().join("missing.tar.gz");

        std::fs::create_dir(config.bepinex_dir()).unwrap();
        assert_eq!(
            install_runtime(&config, &missing_archive).unwrap(),
            BootstrapStatus::AwaitingFirstRun
        );

        std::fs::create_dir(config.plugins_dir()).unwrap();
        assert_eq!(
            install_runtime(&config, &missing_archive).unwrap(),
            BootstrapStatus::AlreadyInitialized
        );
    }

    #[test]
    fn test_invalid_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = InstallConfig::new(temp_dir.path().join("nope"));
        let err = install_runtime(&config, Path::new("pack.tar.gz")).unwrap_err();
        assert!(matches!(err, InstallError::Config(_)));
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let err = extract(&archive, temp_dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::Extraction { .. }));
    }
}
