//! Install pipeline
//!
//! Drives resolve → download → write over the caller's selection, one
//! item at a time. A run moves through
//!
//! ```text
//! NotStarted → Validating → Processing(i/total) → Completed
//!                  │
//!                  └──────► Failed (plugins folder missing)
//! ```
//!
//! Only a missing plugins folder stops a run. Every other failure is
//! recorded against its item in the [`InstallReport`] and the run carries
//! on with the next item.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{
    scan, Catalog, CatalogEntry, Category, Installer, Placement, ReleaseResolver, ResolutionMiss,
};
use crate::config::InstallConfig;
use crate::error::InstallError;
use crate::http::Fetcher;

/// Items the caller picked, in the order they should be processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    pub selected_mods: Vec<String>,
    pub selected_splits: Vec<String>,
}

impl InstallRequest {
    pub fn new(selected_mods: Vec<String>, selected_splits: Vec<String>) -> Self {
        Self {
            selected_mods,
            selected_splits,
        }
    }

    /// Mods first, then splits
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selected_mods
            .iter()
            .chain(self.selected_splits.iter())
            .map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.selected_mods.len() + self.selected_splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Validating,
    Processing { completed: usize, total: usize },
    Completed,
    Failed,
}

/// What happened to one selected item
#[derive(Debug)]
pub enum ItemOutcome {
    Installed(PathBuf),
    Skipped,
    ResolutionMiss(ResolutionMiss),
    DownloadFailed(InstallError),
    WriteFailed(InstallError),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, ItemOutcome::Installed(_) | ItemOutcome::Skipped)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Installed(_) => "installed",
            ItemOutcome::Skipped => "skipped",
            ItemOutcome::ResolutionMiss(_) => "not resolved",
            ItemOutcome::DownloadFailed(_) => "download failed",
            ItemOutcome::WriteFailed(_) => "write failed",
        }
    }

    /// Human-readable failure detail, if any
    pub fn detail(&self) -> Option<String> {
        match self {
            ItemOutcome::Installed(_) | ItemOutcome::Skipped => None,
            ItemOutcome::ResolutionMiss(miss) => Some(miss.to_string()),
            ItemOutcome::DownloadFailed(err) | ItemOutcome::WriteFailed(err) => {
                Some(error_chain(err))
            }
        }
    }
}

#[derive(Debug)]
pub struct ItemReport {
    pub name: String,
    pub category: Category,
    pub outcome: ItemOutcome,
}

/// Per-item outcomes of a run, in processing order
#[derive(Debug, Default)]
pub struct InstallReport {
    pub items: Vec<ItemReport>,
}

impl InstallReport {
    pub fn get(&self, name: &str) -> Option<&ItemReport> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn installed(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Installed(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Skipped))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|item| item.outcome.is_failure())
    }

    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Receives run updates as they happen
pub trait InstallObserver {
    /// Called once before the first item and after every item
    fn on_progress(&mut self, completed: usize, total: usize);

    fn on_state(&mut self, _state: &RunState) {}

    fn on_item(&mut self, _item: &ItemReport) {}
}

impl<F: FnMut(usize, usize)> InstallObserver for F {
    fn on_progress(&mut self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Observer that ignores every update
pub struct NoopObserver;

impl InstallObserver for NoopObserver {
    fn on_progress(&mut self, _completed: usize, _total: usize) {}
}

/// The plugins folder of `config`, if BepInEx has created it
pub fn ensure_initialized(config: &InstallConfig) -> Result<PathBuf, InstallError> {
    let plugins_dir = config.plugins_dir();
    if plugins_dir.is_dir() {
        Ok(plugins_dir)
    } else {
        Err(InstallError::NotInitialized { plugins_dir })
    }
}

/// Runs install requests against a catalog
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Install the selected items under `config.root`
    ///
    /// Fails only with [`InstallError::NotInitialized`], before any network
    /// call. Selected names missing from the catalog are ignored but still
    /// count towards progress.
    pub async fn run(
        &self,
        request: &InstallRequest,
        catalog: &Catalog,
        config: &InstallConfig,
        observer: &mut dyn InstallObserver,
    ) -> Result<InstallReport, InstallError> {
        observer.on_state(&RunState::Validating);

        let plugins_dir = match ensure_initialized(config) {
            Ok(plugins_dir) => plugins_dir,
            Err(e) => {
                observer.on_state(&RunState::Failed);
                return Err(e);
            }
        };

        let snapshot = scan(&plugins_dir);
        let resolver = ReleaseResolver::new(self.fetcher.clone());
        let installer = Installer::new(self.fetcher.clone(), snapshot);

        let total = request.total();
        let mut report = InstallReport::default();

        tracing::info!("Installing {} item(s) into {:?}", total, plugins_dir);
        observer.on_state(&RunState::Processing {
            completed: 0,
            total,
        });
        observer.on_progress(0, total);

        for (index, name) in request.names().enumerate() {
            match catalog.find(name) {
                Some(entry) => {
                    let outcome = self
                        .process(entry, &resolver, &installer, &plugins_dir)
                        .await;
                    let item = ItemReport {
                        name: entry.name.clone(),
                        category: entry.category,
                        outcome,
                    };
                    observer.on_item(&item);
                    report.items.push(item);
                }
                None => tracing::debug!("'{}' is not in the catalog, ignoring", name),
            }

            let completed = index + 1;
            observer.on_state(&RunState::Processing { completed, total });
            observer.on_progress(completed, total);

            // Let a front end handle pending events between items
            tokio::task::yield_now().await;
        }

        observer.on_state(&RunState::Completed);
        tracing::info!(
            "Installation completed: {} installed, {} skipped, {} failed",
            report.installed().count(),
            report.skipped().count(),
            report.failures().count()
        );

        Ok(report)
    }

    async fn process(
        &self,
        entry: &CatalogEntry,
        resolver: &ReleaseResolver,
        installer: &Installer,
        plugins_dir: &std::path::Path,
    ) -> ItemOutcome {
        // Checked before resolving so installed items cost no requests
        if installer.is_installed(&entry.name) {
            tracing::debug!("'{}' already installed, skipping", entry.name);
            return ItemOutcome::Skipped;
        }

        let asset = match resolver.resolve_detailed(entry).await {
            Ok(asset) => asset,
            Err(miss) => return ItemOutcome::ResolutionMiss(miss),
        };

        match installer
            .install(&asset, plugins_dir, entry.category, &entry.name)
            .await
        {
            Ok(Placement::Written(path)) => ItemOutcome::Installed(path),
            Ok(Placement::AlreadyInstalled) => ItemOutcome::Skipped,
            Err(err @ InstallError::Download { .. }) => {
                tracing::warn!("{}: {}", entry.name, error_chain(&err));
                ItemOutcome::DownloadFailed(err)
            }
            Err(err) => {
                tracing::warn!("{}: {}", entry.name, error_chain(&err));
                ItemOutcome::WriteFailed(err)
            }
        }
    }
}

/// Render an error with its sources, `outer: inner: root`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
