//! Catalog data model
//!
//! The catalog groups every installable item under one of three
//! categories, keeping manifest order within each category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Item category, fixed when the manifest line is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    SpeedrunningMod,
    OptionalMod,
    Split,
}

impl Category {
    /// All categories in display (and lookup) order
    pub const ALL: [Category; 3] = [
        Category::SpeedrunningMod,
        Category::OptionalMod,
        Category::Split,
    ];

    /// Map a manifest category token
    ///
    /// `Splits` is the split category; any other token `T` names the
    /// `<T>Mod` category, of which only `Speedrunning` and `Optional` exist.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Splits" => Some(Category::Split),
            "Speedrunning" => Some(Category::SpeedrunningMod),
            "Optional" => Some(Category::OptionalMod),
            _ => None,
        }
    }

    /// Section heading
    pub fn label(&self) -> &'static str {
        match self {
            Category::SpeedrunningMod => "Speedrunning Mods",
            Category::OptionalMod => "Optional Mods",
            Category::Split => "Splits",
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Category::Split)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display name, also the lookup key
    pub name: String,

    /// Static asset URL or release-listing endpoint
    pub source_url: String,

    pub category: Category,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            category,
        }
    }
}

/// Items grouped by category
///
/// Every category is always present, possibly with no entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    entries: BTreeMap<Category, Vec<CatalogEntry>>,

    /// (category, index) of every entry in push order
    #[serde(skip)]
    order: Vec<(Category, usize)>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: Category::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect(),
            order: Vec::new(),
        }
    }
}

impl Catalog {
    /// Create a catalog with three empty categories
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append an entry to the end of its category
    pub fn push(&mut self, entry: CatalogEntry) {
        let category = entry.category;
        let items = self.entries.entry(category).or_default();
        self.order.push((category, items.len()));
        items.push(entry);
    }

    /// Entries of one category in manifest order
    pub fn entries(&self, category: Category) -> &[CatalogEntry] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Look up an entry by name across all categories
    ///
    /// Duplicate names are not rejected; the most recently pushed match
    /// wins, whatever its category.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.order
            .iter()
            .rev()
            .filter_map(|(category, index)| self.entries.get(category)?.get(*index))
            .find(|entry| entry.name == name)
    }

    /// All entries, category by category
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        Category::ALL
            .iter()
            .flat_map(move |category| self.entries(*category).iter())
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
