//! nutrient-eval - OCR nutrient prediction evaluator
//!
//! Scores nutrient predictions against user-entered nutrition facts and
//! reports detectability, accuracy and the most common mistakes.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging: RUST_LOG wins over --log-level / --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(cli)
}
