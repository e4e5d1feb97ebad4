//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use authorbib_core::config::DEFAULT_CONFIG_FILE;
use authorbib_core::paths::display_relative;
use authorbib_core::{
    Config, DeploymentOverrides, HistoryStatus, MatchSummary, PathResolver, Pipeline, RunReport,
    Settings,
};
use authorbib_pdf::TypstRenderer;
use authorbib_source::ZoteroClient;

/// Some author could not be rendered or written
pub const EXIT_AUTHOR_FAILED: u8 = 1;

/// Configuration or fetch failure; nothing was generated
pub const EXIT_FATAL: u8 = 2;

/// Output format for the match report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripts
    Json,
}

#[derive(Parser)]
#[command(name = "authorbib")]
#[command(author, version, about = "Per-author bibliography PDFs from a Zotero library", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(flatten)]
    deployment: DeploymentArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Deployment values; each wins over the `[deployment]` table
#[derive(Args, Debug, Default)]
struct DeploymentArgs {
    /// WordPress uploads directory
    #[arg(long, env = "WP_UPLOADS_PATH", global = true)]
    uploads_path: Option<PathBuf>,

    /// Multisite site id
    #[arg(long, env = "SITE_ID", global = true)]
    site_id: Option<String>,

    /// Bibliography directory below the site's uploads
    #[arg(long, env = "BIB_ROOT", global = true)]
    bib_root: Option<String>,

    /// Directory of the always-current PDFs
    #[arg(long, env = "PERMALINK_DIR", global = true)]
    permalink_dir: Option<String>,

    /// Directory of the timestamped PDFs
    #[arg(long, env = "HISTORY_DIR", global = true)]
    history_dir: Option<String>,

    /// Zotero API key (public libraries need none)
    #[arg(long, env = "ZOTERO_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
}

impl DeploymentArgs {
    fn overrides(&self, no_history: bool) -> DeploymentOverrides {
        DeploymentOverrides {
            uploads_path: self.uploads_path.clone(),
            site_id: self.site_id.clone(),
            bib_root: self.bib_root.clone(),
            permalink_dir: self.permalink_dir.clone(),
            history_dir: self.history_dir.clone(),
            api_key: self.api_key.clone(),
            no_history,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the library and write every author's PDF
    Generate {
        /// Write permalinks only, no timestamped copies
        #[arg(long)]
        no_history: bool,
    },

    /// Validate the configuration and show where PDFs would be written
    Check,

    /// Fetch and match only; report items per author
    Match {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments, sets up logging and dispatches to the command.
/// Fatal errors map to [`EXIT_FATAL`].
pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()));

    let log_file = settings
        .as_ref()
        .ok()
        .and_then(|s| s.general.log_file.clone());
    if let Err(err) = init_logging(log_file.as_deref()) {
        // Opening the log file failed before anything was installed
        let _ = init_logging(None);
        warn!("{:#}", err);
    }

    let result = settings.and_then(|settings| match cli.command {
        Commands::Generate { no_history } => {
            generate_command(settings, &cli.deployment.overrides(no_history))
        }
        Commands::Check => check_command(settings, &cli.deployment.overrides(false), &cli.config)
            .map(|()| ExitCode::SUCCESS),
        Commands::Match { format } => {
            match_command(settings, &cli.deployment.overrides(false), format)
                .map(|()| ExitCode::SUCCESS)
        }
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Install the stderr subscriber, plus an appending file writer when configured
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

fn load_config(settings: Settings, overrides: &DeploymentOverrides) -> Result<Config> {
    settings
        .into_config(overrides)
        .context("Invalid configuration")
}

/// Execute the generate command
///
/// Returns success only when every author was written.
pub fn generate_command(settings: Settings, overrides: &DeploymentOverrides) -> Result<ExitCode> {
    let config = load_config(settings, overrides)?;
    info!(
        version = authorbib_core::VERSION,
        authors = config.registry.len(),
        style = %config.citation_style,
        "starting run"
    );

    let client = ZoteroClient::new(&config.source).context("Failed to create Zotero client")?;
    let renderer = TypstRenderer::from_config(&config);

    let report = Pipeline::new(&config)
        .run(&client, &renderer)
        .context("Fetching library items failed")?;
    report.log_summary();
    print_report(&config, &report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_AUTHOR_FAILED))
    }
}

fn print_report(config: &Config, report: &RunReport) {
    let layout = &config.layout;
    println!(
        "authorbib v{}: {} items, {} authors",
        authorbib_core::VERSION,
        report.fetched,
        report.outcomes.len()
    );
    for outcome in &report.outcomes {
        match (&outcome.error, &outcome.permalink) {
            (Some(err), _) => println!("  FAILED {} ({}): {}", outcome.slug, err.stage(), err),
            (None, Some(permalink)) => {
                println!(
                    "  {} ({} items) -> {}",
                    outcome.slug,
                    outcome.matched,
                    display_relative(layout, permalink)
                );
                match &outcome.history {
                    HistoryStatus::Written(path) => {
                        println!("      history: {}", display_relative(layout, path))
                    }
                    HistoryStatus::Collision(path) => println!(
                        "      history: kept existing {}",
                        display_relative(layout, path)
                    ),
                    HistoryStatus::Disabled | HistoryStatus::Skipped => {}
                }
            }
            (None, None) => println!("  {} ({} items)", outcome.slug, outcome.matched),
        }
    }
}

/// Execute the check command
///
/// Validates the configuration without touching the network.
pub fn check_command(
    settings: Settings,
    overrides: &DeploymentOverrides,
    config_path: &Path,
) -> Result<()> {
    let config = load_config(settings, overrides)?;
    let resolver = PathResolver::new(&config.layout);
    let client = ZoteroClient::new(&config.source).context("Failed to create Zotero client")?;

    println!("authorbib v{}", authorbib_core::VERSION);
    println!("Configuration: {}", config_path.display());
    println!("  Style: {} ({})", config.citation_style, config.locale);
    println!(
        "  Source: {}",
        client.items_url(config.source.collection_key.as_deref())
    );
    println!(
        "  API key: {}",
        if config.source.api_key.is_some() {
            "set"
        } else {
            "none"
        }
    );
    println!("  Output: {}", resolver.bibliography_root().display());
    if config.layout.history {
        println!("  History: {}", config.layout.history_filename);
    } else {
        println!("  History: disabled");
    }
    println!();
    println!("Authors ({}):", config.registry.len());
    for author in &config.registry {
        println!(
            "  {} [{}] -> {}",
            author.slug,
            author.display_name(),
            resolver.permalink_path(&author.slug).display()
        );
    }
    println!();
    println!("Configuration OK");

    Ok(())
}

/// Execute the match command
pub fn match_command(
    settings: Settings,
    overrides: &DeploymentOverrides,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(settings, overrides)?;
    let client = ZoteroClient::new(&config.source).context("Failed to create Zotero client")?;

    let summary = Pipeline::new(&config)
        .preview(&client)
        .context("Fetching library items failed")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
        OutputFormat::Text => print_summary(&config, &summary),
    }

    Ok(())
}

fn print_summary(config: &Config, summary: &MatchSummary) {
    println!("Items fetched:      {}", summary.total_items);
    println!("Authors:            {}", summary.total_authors);
    println!("Authors with items: {}", summary.authors_with_items);
    println!("Matched items:      {}", summary.total_matched_items);
    println!("Unmatched items:    {}", summary.unmatched_items);
    println!();

    let width = config
        .registry
        .iter()
        .map(|a| a.slug.len())
        .max()
        .unwrap_or(0);
    for author in &config.registry {
        let count = summary.per_author.get(&author.slug).copied().unwrap_or(0);
        match summary.item_types.get(&author.slug) {
            Some(types) if !types.is_empty() => println!(
                "  {:<width$}  {} ({})",
                author.slug,
                count,
                format_item_types(types),
                width = width
            ),
            _ => println!("  {:<width$}  {}", author.slug, count, width = width),
        }
    }
}

/// "book: 2, journalArticle: 1"
fn format_item_types(types: &BTreeMap<String, usize>) -> String {
    types
        .iter()
        .map(|(item_type, count)| format!("{}: {}", item_type, count))
        .collect::<Vec<_>>()
        .join(", ")
}
