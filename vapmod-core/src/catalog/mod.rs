//! Mod catalog - manifest loading, release resolution and installation
//!
//! # Overview
//!
//! The catalog system allows callers to:
//! - Load the categorized item list from the remote manifest
//! - Resolve an item to a concrete asset URL
//! - Download assets into the BepInEx plugins folder
//! - Tell which items are already installed
//!
//! # Architecture
//!
//! ```text
//! GitHub (vap-mod-links)
//!     │
//!     └── mods.txt            ← name,url,category per line
//!            │
//!            ▼
//!     ManifestLoader ──► Catalog
//!                           │  (selection)
//!                           ▼
//!     ReleaseResolver ──► ResolvedAsset ──► Installer
//!            │                                 │
//!            ▼                                 ▼
//!     releases API                 BepInEx/plugins/*.dll
//!                                  BepInEx/plugins/SpeedrunningUtils.Splits/*.json
//! ```

mod index;
mod installer;
mod manifest;
mod resolver;
mod scanner;

pub use index::{Catalog, CatalogEntry, Category};
pub use installer::{destination_path, Installer, Placement};
pub use manifest::{decode_contents, parse_manifest, ManifestLoader};
pub use resolver::{
    url_basename, ReleaseResolver, ResolutionMiss, ResolutionStrategy, ResolvedAsset,
    STATIC_ASSET_NAMES,
};
pub use scanner::{scan, InstalledState};
