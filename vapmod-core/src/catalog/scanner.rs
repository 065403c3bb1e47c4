//! Installed-state scanning
//!
//! There is no install record: an item counts as installed when a plugin
//! binary with its name sits directly in the plugins folder.

use std::collections::BTreeSet;
use std::path::Path;

use crate::PLUGIN_EXTENSION;

/// Names of items found in the plugins folder at scan time
///
/// A snapshot: writes made after the scan are not reflected until the
/// folder is scanned again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledState {
    names: BTreeSet<String>,
}

impl InstalledState {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for InstalledState {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Scan `plugins_dir` (non-recursive) for plugin binaries
///
/// Never fails: a missing or unreadable folder is an empty state.
pub fn scan(plugins_dir: &Path) -> InstalledState {
    let entries = match std::fs::read_dir(plugins_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("No installed plugins at {:?}: {}", plugins_dir, e);
            return InstalledState::default();
        }
    };

    let suffix = format!(".{PLUGIN_EXTENSION}");
    let state: InstalledState = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|name| name.strip_suffix(&suffix).map(str::to_string))
        .filter(|name| !name.is_empty())
        .collect();

    tracing::debug!("Found {} installed plugin(s) in {:?}", state.len(), plugins_dir);
    state
}
