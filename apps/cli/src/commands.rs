//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use glossary_core::pipeline::{BuildResult, ProgressReporter};
use glossary_shared::{AppConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Glossary builder — consolidate bilingual terminology from open knowledge sources.
#[derive(Parser)]
#[command(
    name = "glossary",
    version,
    about = "Build bilingual glossary artifacts from structured, dictionary and ontology sources.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.glossary-builder/glossary.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Query every source, consolidate and write the glossary artifacts.
    Build {
        /// Output directory (overrides `paths.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum number of entries to emit (overrides `limits.target_total`).
        #[arg(long)]
        target_total: Option<usize>,

        /// Skip the expired-cache sweep before building.
        #[arg(long)]
        no_sweep: bool,
    },

    /// Cache management.
    Cache {
        /// Cache subcommand.
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Delete cache files older than `fetch.cache_ttl_days`.
    Sweep,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "glossary=info",
        1 => "glossary=debug",
        _ => "glossary=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Build {
            out,
            target_total,
            no_sweep,
        } => cmd_build(config_path, out, target_total, no_sweep).await,
        Command::Cache { action } => match action {
            CacheAction::Sweep => cmd_cache_sweep(config_path),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config`, or the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)
            .wrap_err_with(|| format!("loading config {}", path.display()))?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    target_total: Option<usize>,
    no_sweep: bool,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(out) = out {
        config.paths.output_dir = out;
    }
    if let Some(target_total) = target_total {
        config.limits.target_total = target_total;
    }

    if !no_sweep {
        glossary_core::sweep_cache(&config)?;
    }

    info!(
        domains = config.domains.len(),
        output_dir = %config.paths.output_dir.display(),
        "building glossary"
    );

    let reporter = CliProgress::new();
    let result = glossary_core::build_glossary(&config, &reporter).await?;

    print_summary(&result);
    Ok(())
}

fn cmd_cache_sweep(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let removed = glossary_core::sweep_cache(&config)?;
    println!(
        "Removed {removed} cache file(s) older than {} days from {}",
        config.fetch.cache_ttl_days,
        config.fetch.cache_dir.display()
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(result: &BuildResult) {
    println!();
    println!("  Build summary");
    println!("  Domains queried:  {}", result.domains_queried);
    for (domain, count) in result.domain_stats.iter() {
        println!("    - {domain}: {count}");
    }
    println!("  Items fetched:    {}", result.total_fetched);
    println!("  Entries emitted:  {}", result.emitted);
    println!("  Entries dropped:  {}", result.missing());
    for (reason, count) in &result.dropped {
        println!("    - {reason}: {count}");
    }
    println!("  Output:           {}", result.output_dir.display());
    for artifact in &result.artifacts {
        println!(
            "    {} ({} bytes, sha256 {})",
            artifact.filename,
            artifact.size_bytes,
            &artifact.sha256[..12]
        );
    }
    println!("  Time:             {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn root_queried(&self, domain: &str, root: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Querying [{current}/{total}] {domain}: {root}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
