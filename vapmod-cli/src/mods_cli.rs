//! Mod installer CLI commands
//!
//! Provides commands for browsing the mod catalog, installing mods and
//! splits, bootstrapping BepInEx and managing the saved game root.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use vapmod_core::bootstrap::{self, BootstrapStatus};
use vapmod_core::catalog::{scan, Catalog, Category, ManifestLoader};
use vapmod_core::config::{InstallConfig, PathStore, Settings};
use vapmod_core::http::{Fetcher, HttpFetcher};
use vapmod_core::pipeline::{
    ensure_initialized, InstallObserver, InstallRequest, ItemReport, Pipeline, RunState,
};

#[derive(Subcommand, Debug)]
pub enum PathCommand {
    /// Print the saved V.A Proxy root folder
    Show,

    /// Save a V.A Proxy root folder
    Set {
        /// Game root (the folder containing the game executable)
        path: PathBuf,
    },
}

/// Shared state for every command
pub struct CliContext {
    settings: Settings,
    paths: PathStore,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl CliContext {
    pub fn new(settings: Settings, paths: PathStore) -> Self {
        Self {
            settings,
            paths,
            fetcher: None,
        }
    }

    #[cfg(test)]
    fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    fn fetcher(&self) -> Result<Arc<dyn Fetcher>> {
        if let Some(fetcher) = &self.fetcher {
            return Ok(fetcher.clone());
        }

        let fetcher = HttpFetcher::new(&self.settings).context("Failed to create HTTP client")?;
        Ok(Arc::new(fetcher))
    }

    /// Game root from the flag, else the saved one, else `None`
    fn root(&self, root: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if root.is_some() {
            return Ok(root);
        }

        let saved = self
            .paths
            .load()
            .context("Failed to read the saved root folder")?;
        Ok((!saved.is_empty()).then(|| PathBuf::from(saved)))
    }

    fn install_config(&self, root: Option<PathBuf>) -> Result<InstallConfig> {
        match self.root(root)? {
            Some(root) => Ok(InstallConfig::new(root)),
            None => anyhow::bail!(
                "No V.A Proxy root folder given.\n\nPass --root <PATH> or save one with:\n  vapmod path set <PATH>"
            ),
        }
    }

    async fn load_catalog(&self, fetcher: Arc<dyn Fetcher>) -> Catalog {
        println!("Fetching mod links...");
        let (catalog, error) = ManifestLoader::new(fetcher, &self.settings.manifest_url)
            .load()
            .await;

        if let Some(e) = error {
            eprintln!("Error: {e}");
        }

        catalog
    }
}

/// Table row for the catalog listing
#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub async fn execute_list(context: &CliContext, root: Option<PathBuf>, json: bool) -> Result<()> {
    let installed = match context.root(root)? {
        Some(root) => scan(&InstallConfig::new(root).plugins_dir()),
        None => Default::default(),
    };

    let catalog = context.load_catalog(context.fetcher()?).await;

    if json {
        let items: Vec<serde_json::Value> = catalog
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "name": entry.name,
                    "category": entry.category,
                    "url": entry.source_url,
                    "installed": installed.contains(&entry.name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("\nNo mods available.");
        return Ok(());
    }

    let rows: Vec<CatalogRow> = Category::ALL
        .iter()
        .flat_map(|category| catalog.entries(*category))
        .map(|entry| {
            let source = if entry.source_url.chars().count() > 60 {
                let head: String = entry.source_url.chars().take(57).collect();
                format!("{head}...")
            } else {
                entry.source_url.clone()
            };

            CatalogRow {
                section: entry.category.label().to_string(),
                name: entry.name.clone(),
                installed: if installed.contains(&entry.name) {
                    "yes".to_string()
                } else {
                    String::new()
                },
                source,
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("\n{table}");
    Ok(())
}

/// Prints progress and saves the root once the run has been validated
struct CliProgress<'a> {
    paths: &'a PathStore,
    root: &'a std::path::Path,
}

impl InstallObserver for CliProgress<'_> {
    fn on_progress(&mut self, completed: usize, total: usize) {
        println!("Installing Mods ({completed}/{total})");
    }

    fn on_state(&mut self, state: &RunState) {
        if let RunState::Processing { completed: 0, .. } = state {
            if let Err(e) = self.paths.save(&self.root.to_string_lossy()) {
                tracing::warn!("Could not save root folder: {}", e);
            }
        }
    }

    fn on_item(&mut self, item: &ItemReport) {
        match item.outcome.detail() {
            Some(detail) => println!("  {}: {} ({})", item.name, item.outcome.label(), detail),
            None => println!("  {}: {}", item.name, item.outcome.label()),
        }
    }
}

pub async fn execute_install(
    context: &CliContext,
    root: Option<PathBuf>,
    mods: Vec<String>,
    splits: Vec<String>,
) -> Result<()> {
    let config = context.install_config(root)?;
    let request = InstallRequest::new(mods, splits);

    if request.is_empty() {
        println!("No mods or splits selected. Pass --mod <NAME> or --split <NAME>.");
        return Ok(());
    }

    // Fail on an uninitialized root before touching the network
    ensure_initialized(&config)?;

    let fetcher = context.fetcher()?;
    let catalog = context.load_catalog(fetcher.clone()).await;

    let mut progress = CliProgress {
        paths: &context.paths,
        root: &config.root,
    };
    let report = Pipeline::new(fetcher)
        .run(&request, &catalog, &config, &mut progress)
        .await?;

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("Installation finished with {failed} failed item(s)");
    }

    println!("\nInstallation completed successfully!");
    Ok(())
}

pub fn execute_bootstrap(
    context: &CliContext,
    root: Option<PathBuf>,
    archive: Option<PathBuf>,
) -> Result<()> {
    let config = context.install_config(root)?;
    let archive = archive
        .or_else(bootstrap::default_archive_path)
        .unwrap_or_else(|| PathBuf::from(bootstrap::DEFAULT_ARCHIVE));

    match bootstrap::install_runtime(&config, &archive)? {
        BootstrapStatus::Extracted => println!(
            "BepInEx successfully installed! Run V.A Proxy to initialize your plugins folder."
        ),
        BootstrapStatus::AlreadyInitialized => {
            println!("BepInEx is already installed and initialized!")
        }
        BootstrapStatus::AwaitingFirstRun => println!(
            "BepInEx is installed, but the 'plugins' folder is missing. Please run V.A Proxy once to initialize the folder."
        ),
    }

    Ok(())
}

pub fn execute_path(context: &CliContext, command: PathCommand) -> Result<()> {
    match command {
        PathCommand::Show => {
            let saved = context.paths.load()?;
            if saved.is_empty() {
                println!("No root folder saved.");
            } else {
                println!("{saved}");
            }
        }
        PathCommand::Set { path } => {
            if !path.is_dir() {
                anyhow::bail!("Invalid V.A Proxy root folder path: {}", path.display());
            }
            context.paths.save(&path.to_string_lossy())?;
            println!("Saved root folder: {}", path.display());
        }
    }

    Ok(())
}
