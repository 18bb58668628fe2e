//! Evaluation configuration
//!
//! Supports loading config from:
//! - An explicit `--config` path
//! - `./nutrient-eval.toml`
//! - `~/.config/nutrient-eval/config.toml`
//! - Environment variables (highest priority)

use super::nutrient_table::NutrientTable;
use crate::models::Nutrient;
use crate::scoring::{Tolerance, DEFAULT_TOLERANCE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = "nutrient-eval.toml";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Per-nutrient overrides, keyed by canonical nutrient name
    #[serde(default)]
    pub nutrients: BTreeMap<String, NutrientOverride>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Product metadata endpoint; `/{code}.json` is appended
    pub product_url: String,

    /// Base URL of the OCR documents; `/{split code}/{imgid}.json` is appended
    pub ocr_base_url: String,

    /// Nutrient prediction endpoint, called with `?ocr_url=...`
    pub predict_url: String,

    /// Image selected from `product.images` (default: nutrition_fr)
    pub image_key: String,

    /// Global timeout per HTTP request
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            product_url: "https://world.openfoodfacts.org/api/v0/product".to_string(),
            ocr_base_url: "https://static.openfoodfacts.org/images/products".to_string(),
            predict_url: "https://robotoff.openfoodfacts.org/api/v1/predict/nutrient".to_string(),
            image_key: "nutrition_fr".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Relative tolerance for every nutrient except energy
    pub tolerance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NutrientOverride {
    /// Set to false to leave the nutrient out of the evaluation
    pub enabled: Option<bool>,
    pub ground_truth_key: Option<String>,
    pub prediction_key: Option<String>,
}

impl EvalConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. `explicit` path, or the first of ./nutrient-eval.toml and the user config
    ///
    /// An explicit path must exist and parse; discovered files that fail to
    /// parse are skipped with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::discover(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn discover() -> Self {
        let candidates = [Some(PathBuf::from(PROJECT_CONFIG_FILE)), Self::user_config_path()];
        for path in candidates.into_iter().flatten().filter(|p| p.exists()) {
            match Self::from_file(&path) {
                Ok(config) => {
                    debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => warn!("Ignoring config file: {:#}", e),
            }
        }
        Self::default()
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("NUTRIENT_EVAL_TOLERANCE") {
            match value.trim().parse::<f64>() {
                Ok(tolerance) => self.scoring.tolerance = tolerance,
                Err(e) => warn!("Ignoring NUTRIENT_EVAL_TOLERANCE={:?}: {}", value, e),
            }
        }
        if let Ok(url) = std::env::var("NUTRIENT_EVAL_PREDICT_URL") {
            self.service.predict_url = url;
        }
        if let Ok(url) = std::env::var("NUTRIENT_EVAL_PRODUCT_URL") {
            self.service.product_url = url;
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nutrient-eval").join("config.toml"))
    }

    /// Validated tolerance, optionally overridden by a CLI flag
    pub fn tolerance(&self, cli_override: Option<f64>) -> Result<Tolerance> {
        let value = cli_override.unwrap_or(self.scoring.tolerance);
        Ok(Tolerance::new(value)?)
    }

    /// Nutrient table with the configured overrides applied
    pub fn nutrient_table(&self) -> Result<NutrientTable> {
        let mut table = NutrientTable::default();
        for (name, over) in &self.nutrients {
            let nutrient: Nutrient = name
                .parse()
                .with_context(|| format!("Invalid [nutrients.{}] section", name))?;
            if over.enabled == Some(false) {
                table.remove(nutrient);
                continue;
            }
            if let Some(spec) = table.get_mut(nutrient) {
                if let Some(key) = &over.ground_truth_key {
                    spec.ground_truth_key = key.clone();
                }
                if let Some(key) = &over.prediction_key {
                    spec.prediction_key = key.clone();
                }
            }
        }
        Ok(table)
    }

    /// Create the user config directory and an example config file
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, EXAMPLE_CONFIG)?;
        }

        Ok(config_path)
    }
}

const EXAMPLE_CONFIG: &str = r#"# nutrient-eval configuration

[service]
# product_url = "https://world.openfoodfacts.org/api/v0/product"
# ocr_base_url = "https://static.openfoodfacts.org/images/products"
# predict_url = "https://robotoff.openfoodfacts.org/api/v1/predict/nutrient"
# image_key = "nutrition_fr"
# timeout_secs = 30

[scoring]
# Relative tolerance for every nutrient except energy (energy: +/- 1 kcal)
# tolerance = 0.1

# Per-nutrient overrides
# [nutrients.salt]
# ground_truth_key = "salt_100g"
#
# [nutrients.fiber]
# enabled = false
"#;
