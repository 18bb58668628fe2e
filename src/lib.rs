//! nutrient-eval - evaluation of OCR nutrient predictions
//!
//! Compares nutrient amounts predicted from nutrition-label photos with the
//! values users entered by hand, product by product, and summarizes how
//! often the prediction service finds a nutrient and gets it right.
//!
//! Layers, leaf first:
//! - [`scoring`]: tolerance rule, per-product outcome records, product scores
//! - [`stats`]: batch tallies, completeness histogram, mismatch heat-maps
//! - [`sources`] and [`normalize`]: where values come from and their units
//! - [`results`] and [`pipeline`]: the persisted result table and the batch run
//! - [`reporters`]: text, JSON, Markdown and HTML output

pub mod config;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod reporters;
pub mod results;
pub mod scoring;
pub mod sources;
pub mod stats;
