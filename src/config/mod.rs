//! Configuration module for nutrient-eval
//!
//! This module handles:
//! - Service endpoints and timeouts (eval config file + env)
//! - Scoring tolerance
//! - The nutrient table (field names per source, unit rules)

mod eval_config;
mod nutrient_table;

pub use eval_config::{
    EvalConfig, NutrientOverride, ScoringConfig, ServiceConfig, PROJECT_CONFIG_FILE,
};
pub use nutrient_table::{NutrientSpec, NutrientTable};
