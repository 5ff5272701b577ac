//! Glossary builder CLI.
//!
//! Collects bilingual terminology from a structured-query endpoint, overlays
//! dictionary and ontology definitions plus curated overrides, and writes
//! the lookup indexes, detail map and minimal dictionary export.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
