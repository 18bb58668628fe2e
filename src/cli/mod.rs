//! CLI command definitions and handlers

mod compare;
mod report;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use nutrient_eval::config::{EvalConfig, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};

/// Parse and validate a tolerance (0 <= t < 1)
fn parse_tolerance(s: &str) -> Result<f64, String> {
    let t: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !t.is_finite() || t < 0.0 {
        Err("tolerance cannot be negative".to_string())
    } else if t >= 1.0 {
        Err("tolerance must be below 1 (e.g. 0.1 for ±10%)".to_string())
    } else {
        Ok(t)
    }
}

/// nutrient-eval - score OCR nutrient predictions against user-entered values
#[derive(Parser, Debug)]
#[command(name = "nutrient-eval")]
#[command(
    version,
    about = "Evaluate OCR nutrient predictions against user-entered nutrition facts",
    long_about = "nutrient-eval fetches nutrient predictions for every product of a ground-truth \
directory, compares them under a tolerance rule and keeps one row per (product, nutrient) \
in a result table. Reports summarize detectability, accuracy, completeness and the most \
frequent mismatches.",
    after_help = "\
Examples:
  nutrient-eval run --data-dir data/             Evaluate every product under data/
  nutrient-eval run --data-dir data/ --resume    Continue an interrupted run
  nutrient-eval report                           Terminal summary of result.csv
  nutrient-eval report --format html -o eval.html
  nutrient-eval compare 3228857000852 --data-dir data/"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file (default: ./nutrient-eval.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log filter when RUST_LOG is not set
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch predictions for every ground-truth product and write the result table
    #[command(after_help = "\
Examples:
  nutrient-eval run --data-dir data/                       Fresh run, truncates result.csv
  nutrient-eval run --data-dir data/ --resume              Append products not yet in result.csv
  nutrient-eval run --data-dir data/ --limit 50            Try the first 50 products
  nutrient-eval run --data-dir data/ -o eval/run1.csv      Custom result table")]
    Run {
        /// Directory searched recursively for <code>.nutriments.json files
        #[arg(long)]
        data_dir: PathBuf,

        /// Result table path
        #[arg(long, short = 'o', default_value = "result.csv")]
        output: PathBuf,

        /// Keep existing rows and skip products already in the result table
        #[arg(long)]
        resume: bool,

        /// Maximum number of products to evaluate in this run
        #[arg(long)]
        limit: Option<usize>,

        /// Relative tolerance (overrides config; energy always uses ±1 kcal)
        #[arg(long, value_parser = parse_tolerance)]
        tolerance: Option<f64>,
    },

    /// Compute statistics over a result table
    #[command(after_help = "\
Examples:
  nutrient-eval report                                  Text summary of result.csv
  nutrient-eval report --input run1.csv --format json   JSON for scripting
  nutrient-eval report --format html -o eval.html       Standalone HTML with charts
  nutrient-eval report --tolerance 0.05                 Re-score with a tighter band")]
    Report {
        /// Result table to read
        #[arg(long, short = 'i', default_value = "result.csv")]
        input: PathBuf,

        /// Output format: text, json, html, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "html", "markdown", "md"])]
        format: String,

        /// Output file path (default: stdout); the format's extension is added when missing
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Relative tolerance (overrides config)
        #[arg(long, value_parser = parse_tolerance)]
        tolerance: Option<f64>,
    },

    /// Evaluate a single product and print its outcome record and scores
    Compare {
        /// Product barcode
        code: String,

        /// Directory holding the product's <code>.nutriments.json
        #[arg(long)]
        data_dir: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Relative tolerance (overrides config)
        #[arg(long, value_parser = parse_tolerance)]
        tolerance: Option<f64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize user config file with example settings
    Init,
    /// Show config paths and resolved values
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            data_dir,
            output,
            resume,
            limit,
            tolerance,
        } => {
            let config = EvalConfig::load(config_path)?;
            run::run(&config, &data_dir, &output, resume, limit, tolerance)
        }

        Commands::Report {
            input,
            format,
            output,
            tolerance,
        } => {
            let config = EvalConfig::load(config_path)?;
            report::run(&config, &input, &format, output.as_deref(), tolerance)
        }

        Commands::Compare {
            code,
            data_dir,
            json,
            tolerance,
        } => {
            let config = EvalConfig::load(config_path)?;
            compare::run(&config, &code, &data_dir, json, tolerance)
        }

        Commands::Config { action } => run_config_action(action, config_path),
    }
}

fn run_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = EvalConfig::init_user_config()?;
            println!(
                "{} Config initialized at: {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
            println!("\nOr override per run via environment:");
            println!("  export NUTRIENT_EVAL_TOLERANCE=0.05");
            println!("  export NUTRIENT_EVAL_PREDICT_URL=\"http://localhost:5500/api/v1/predict/nutrient\"");
            Ok(())
        }
        ConfigAction::Show => show_config(config_path),
    }
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = EvalConfig::load(config_path)?;

    println!("{}", style("Config paths:").bold());
    let status = |path: &Path| if path.exists() { "✓" } else { "(not found)" };
    if let Some(path) = config_path {
        println!("  Explicit: {} {}", path.display(), status(path));
    }
    println!(
        "  Project:  ./{} {}",
        PROJECT_CONFIG_FILE,
        status(Path::new(PROJECT_CONFIG_FILE))
    );
    if let Some(user_path) = EvalConfig::user_config_path() {
        println!("  User:     {} {}", user_path.display(), status(&user_path));
    }
    println!();

    println!("{}", style("Service:").bold());
    println!("  product_url:  {}", config.service.product_url);
    println!("  ocr_base_url: {}", config.service.ocr_base_url);
    println!("  predict_url:  {}", config.service.predict_url);
    println!("  image_key:    {}", config.service.image_key);
    println!("  timeout_secs: {}", config.service.timeout_secs);
    println!();

    println!("{}", style("Scoring:").bold());
    println!("  tolerance: {}", config.tolerance(None)?);
    println!();

    let table = config.nutrient_table()?;
    println!("{} ({})", style("Nutrients:").bold(), table.len());
    for spec in table.iter() {
        println!(
            "  {:<14} ground truth: {:<20} prediction: {}",
            spec.nutrient.name(),
            spec.ground_truth_key,
            spec.prediction_key
        );
    }
    Ok(())
}
