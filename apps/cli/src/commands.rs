//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use sitescout_core::{DomainReport, Orchestrator, ProgressReporter};
use sitescout_extract::{NoopExtractor, OpenRouterExtractor, OpenRouterOptions, SemanticExtractor};
use sitescout_shared::{
    AppConfig, PipelineConfig, config_file_path, init_config_at, load_config, load_config_from,
    parse_seeds, resolve_api_key,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteScout: find out what a company sells and who founded it.
#[derive(Parser)]
#[command(
    name = "sitescout",
    version,
    about = "Crawl company websites and report their products, services and founders.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.sitescout/sitescout.toml.
    #[arg(long, global = true, env = "SITESCOUT_CONFIG")]
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

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl one or more seed domains and print the consolidated report.
    Run {
        /// Seed URLs. Defaults to the `domains` list in the config file.
        urls: Vec<String>,

        /// Report format on stdout.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Skip semantic extraction; only the founder keyword scan runs.
        #[arg(long)]
        heuristic_only: bool,

        /// Linked pages fetched concurrently per domain (overrides config).
        #[arg(long)]
        link_concurrency: Option<usize>,

        /// Domains processed concurrently (overrides config).
        #[arg(long)]
        domain_concurrency: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout is the report.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitescout=info",
        1 => "sitescout=debug",
        _ => "sitescout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            urls,
            format,
            heuristic_only,
            link_concurrency,
            domain_concurrency,
        } => {
            let config = load(config_path.as_deref())?;
            let mut pipeline = PipelineConfig::from(&config);
            if let Some(n) = link_concurrency {
                pipeline.link_concurrency = n.max(1);
            }
            if let Some(n) = domain_concurrency {
                pipeline.domain_concurrency = n.max(1);
            }
            cmd_run(&config, pipeline, &urls, format, heuristic_only).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// Positional URLs win; otherwise fall back to the config's domain list.
fn seed_list(urls: &[String], config: &AppConfig) -> Vec<String> {
    if urls.is_empty() {
        config.domains.clone()
    } else {
        urls.to_vec()
    }
}

fn build_extractor(config: &AppConfig, heuristic_only: bool) -> Result<Arc<dyn SemanticExtractor>> {
    if heuristic_only {
        info!("semantic extraction disabled, using founder keyword scan only");
        return Ok(Arc::new(NoopExtractor));
    }

    let api_key = resolve_api_key(config)?;
    let extractor = OpenRouterExtractor::new(OpenRouterOptions::from_config(config, api_key))?;
    info!(model = %config.openrouter.default_model, "using OpenRouter extractor");
    Ok(Arc::new(extractor))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config: &AppConfig,
    pipeline: PipelineConfig,
    urls: &[String],
    format: OutputFormat,
    heuristic_only: bool,
) -> Result<()> {
    // Fail on bad input before any network work starts.
    let seeds = parse_seeds(&seed_list(urls, config))?;
    let extractor = build_extractor(config, heuristic_only)?;

    info!(
        domains = seeds.len(),
        link_concurrency = pipeline.link_concurrency,
        domain_concurrency = pipeline.domain_concurrency,
        "starting run"
    );

    let orchestrator = Orchestrator::new(pipeline, extractor)?;
    let progress = Arc::new(CliProgress::new());
    let report = orchestrator.run(&seeds, progress.clone()).await;
    progress.finish();

    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn domain_started(&self, seed: &str) {
        self.spinner.set_message(format!("Crawling {seed}"));
    }

    fn page_done(&self, seed: &str, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("{seed} [{current}/{total}] {url}"));
    }

    fn domain_finished(&self, report: &DomainReport) {
        match &report.seed_error {
            Some(e) => self.spinner.println(format!("✗ {} ({e})", report.seed)),
            None => self.spinner.println(format!(
                "✓ {} ({} pages, {} skipped)",
                report.seed,
                report.pages_processed,
                report.skipped.len()
            )),
        }
    }
}
