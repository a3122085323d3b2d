//! Import configuration
//!
//! Category metadata, classifier keywords, column synonyms, cleaning labels
//! and amount thresholds. Loaded once at startup and passed by reference to
//! the import pipeline.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Embedded defaults (compiled into binary from `config/import.toml`)
//! 2. An override file, either given explicitly or found in the data dir
//!    (~/.local/share/harcama/config/import.toml). Sections present in the
//!    override replace the embedded ones; absent sections are kept.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Category, CategoryDefinition};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/import.toml");

/// Environment variable pointing at an override config file
pub const CONFIG_ENV: &str = "HARCAMA_CONFIG";

/// Plausibility thresholds for parsed amounts
#[derive(Debug, Clone, PartialEq)]
pub struct AmountThresholds {
    pub min_amount: f64,
    pub max_amount: f64,
    pub borderline_amount: f64,
}

impl Default for AmountThresholds {
    fn default() -> Self {
        Self {
            min_amount: 0.5,
            max_amount: 1_000_000.0,
            borderline_amount: 100_000.0,
        }
    }
}

/// Statement (PDF text) import settings
#[derive(Debug, Clone)]
pub struct StatementSettings {
    pub auto_add_limit: usize,
    pub sample_size: usize,
    pub skip_markers: Vec<String>,
}

impl Default for StatementSettings {
    fn default() -> Self {
        Self {
            auto_add_limit: 20,
            sample_size: 5,
            skip_markers: Vec::new(),
        }
    }
}

/// Header synonyms per canonical column
#[derive(Debug, Clone, Default)]
pub struct ColumnSynonyms {
    pub title: Vec<String>,
    pub amount: Vec<String>,
    pub date: Vec<String>,
    pub category: Vec<String>,
    pub description: Vec<String>,
}

/// One category with its display metadata and classifier keywords
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub definition: CategoryDefinition,
    pub keywords: Vec<String>,
}

/// The fixed category list with configurable metadata
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
}

impl CategoryCatalog {
    fn builtin() -> Self {
        let entries = Category::ALL
            .iter()
            .map(|&id| CategoryEntry {
                definition: CategoryDefinition {
                    id,
                    name: id.as_str().to_string(),
                    color: "#A0A0A0".to_string(),
                    icon: "📦".to_string(),
                },
                keywords: Vec::new(),
            })
            .collect();
        Self { entries }
    }

    fn entry_mut(&mut self, category: Category) -> &mut CategoryEntry {
        // entries always holds Category::ALL in order
        &mut self.entries[category as usize]
    }

    pub fn entry(&self, category: Category) -> &CategoryEntry {
        &self.entries[category as usize]
    }

    pub fn definition(&self, category: Category) -> &CategoryDefinition {
        &self.entry(category).definition
    }

    /// All definitions in enumeration order
    pub fn definitions(&self) -> Vec<CategoryDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    pub fn keywords(&self, category: Category) -> &[String] {
        &self.entry(category).keywords
    }

    /// Resolve a category from its id or display name
    pub fn resolve(&self, value: &str) -> Option<Category> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(category) = value.parse::<Category>() {
            return Some(category);
        }
        let folded = crate::import::normalize_text(value);
        self.entries
            .iter()
            .find(|e| crate::import::normalize_text(&e.definition.name) == folded)
            .map(|e| e.definition.id)
    }
}

/// Complete import configuration
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub amounts: AmountThresholds,
    pub statement: StatementSettings,
    pub point_keywords: Vec<String>,
    pub columns: ColumnSynonyms,
    pub catalog: CategoryCatalog,
}

impl ImportConfig {
    /// Load config: embedded defaults, then the override file if any
    ///
    /// An explicit path must exist. Without one, `HARCAMA_CONFIG` and then the
    /// data-dir location are checked.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::embedded()?;

        let path = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => std::env::var(CONFIG_ENV)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .or_else(|| default_config_path().filter(|p| p.exists())),
        };

        if let Some(path) = path {
            debug!("Loading import config override from {}", path.display());
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
            config.apply(parse_raw(&content)?)?;
        }

        Ok(config)
    }

    /// The embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    fn builtin() -> Self {
        Self {
            amounts: AmountThresholds::default(),
            statement: StatementSettings::default(),
            point_keywords: Vec::new(),
            columns: ColumnSynonyms::default(),
            catalog: CategoryCatalog::builtin(),
        }
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(amounts) = raw.amounts {
            if let Some(v) = amounts.min_amount {
                self.amounts.min_amount = v;
            }
            if let Some(v) = amounts.max_amount {
                self.amounts.max_amount = v;
            }
            if let Some(v) = amounts.borderline_amount {
                self.amounts.borderline_amount = v;
            }
        }

        if let Some(statement) = raw.statement {
            if let Some(v) = statement.auto_add_limit {
                self.statement.auto_add_limit = v;
            }
            if let Some(v) = statement.sample_size {
                self.statement.sample_size = v;
            }
            if let Some(v) = statement.skip_markers {
                self.statement.skip_markers = v;
            }
        }

        if let Some(cleaner) = raw.cleaner {
            if let Some(v) = cleaner.point_keywords {
                self.point_keywords = v;
            }
        }

        if let Some(columns) = raw.columns {
            let target = &mut self.columns;
            for (value, slot) in [
                (columns.title, &mut target.title),
                (columns.amount, &mut target.amount),
                (columns.date, &mut target.date),
                (columns.category, &mut target.category),
                (columns.description, &mut target.description),
            ] {
                if let Some(v) = value {
                    *slot = v;
                }
            }
        }

        if let Some(categories) = raw.categories {
            for (id, raw_category) in categories {
                let category = match id.parse::<Category>() {
                    Ok(c) => c,
                    Err(_) => {
                        warn!("Ignoring unknown category in import config: {}", id);
                        continue;
                    }
                };
                let entry = self.catalog.entry_mut(category);
                if let Some(name) = raw_category.name {
                    entry.definition.name = name;
                }
                if let Some(color) = raw_category.color {
                    entry.definition.color = color;
                }
                if let Some(icon) = raw_category.icon {
                    entry.definition.icon = icon;
                }
                if let Some(keywords) = raw_category.keywords {
                    entry.keywords = keywords;
                }
            }
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        let a = &self.amounts;
        if a.min_amount <= 0.0 || a.min_amount >= a.max_amount {
            return Err(Error::Config(format!(
                "min_amount ({}) must be positive and below max_amount ({})",
                a.min_amount, a.max_amount
            )));
        }
        if a.borderline_amount > a.max_amount {
            return Err(Error::Config(format!(
                "borderline_amount ({}) exceeds max_amount ({})",
                a.borderline_amount, a.max_amount
            )));
        }
        if !self.catalog.keywords(Category::Other).is_empty() {
            warn!("Keywords for 'other' are ignored; it is the fallback category");
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("harcama").join("config").join("import.toml"))
}

/// Parse a complete config from TOML content on top of the builtin values
fn parse_config(content: &str) -> Result<ImportConfig> {
    let mut config = ImportConfig::builtin();
    config.apply(parse_raw(content)?)?;
    Ok(config)
}

fn parse_raw(content: &str) -> Result<RawConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    amounts: Option<RawAmounts>,
    statement: Option<RawStatement>,
    cleaner: Option<RawCleaner>,
    columns: Option<RawColumns>,
    categories: Option<HashMap<String, RawCategory>>,
}

#[derive(Debug, Deserialize)]
struct RawAmounts {
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    borderline_amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    auto_add_limit: Option<usize>,
    sample_size: Option<usize>,
    skip_markers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawCleaner {
    point_keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawColumns {
    title: Option<Vec<String>>,
    amount: Option<Vec<String>>,
    date: Option<Vec<String>>,
    category: Option<Vec<String>>,
    description: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    name: Option<String>,
    color: Option<String>,
    icon: Option<String>,
    keywords: Option<Vec<String>>,
}
