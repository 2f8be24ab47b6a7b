//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

use stackpost_completion::OpenAiClient;
use stackpost_core::pipeline::{
    GeneratePostOptions, GeneratePostResult, ProgressReporter, generate_post,
};
use stackpost_questions::StackExchangeClient;
use stackpost_shared::{
    AppConfig, GeneratedSection, Stage, StackpostError, init_config, load_config,
    load_config_from, resolve_api_key, resolve_questions_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// stackpost: write a blog post about a trending Stack Overflow question.
#[derive(Parser)]
#[command(
    name = "stackpost",
    version,
    about = "Pick a trending Stack Overflow question and write a markdown blog post about it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.stackpost/stackpost.toml.
    #[arg(long, env = "STACKPOST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Generate the post and print it instead of writing the file.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Subcommands. With none given, one post is generated.
#[derive(Subcommand)]
pub(crate) enum Command {
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "stackpost=info",
        1 => "stackpost=debug",
        _ => "stackpost=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
    match cli.command {
        None => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_generate(&config, cli.dry_run).await
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&resolve_config(cli.config.as_deref())?),
        },
    }
}

/// Load the config from `path`, or the default location. Loading validates.
fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(config: &AppConfig, dry_run: bool) -> Result<()> {
    // Fail on a missing key before any network call
    let api_key = resolve_api_key(config)?;

    let questions = StackExchangeClient::new(&config.questions, resolve_questions_key(config))
        .map_err(StackpostError::from)?;
    let completions = OpenAiClient::new(&config.completion, api_key)
        .map_err(|e| eyre!("failed to set up completion client: {e}"))?;

    let options = GeneratePostOptions {
        now: Utc::now(),
        today: Local::now().date_naive(),
        dry_run,
    };

    info!(
        today = %options.today,
        posts_dir = %config.output.posts_dir,
        model = %config.completion.model,
        "starting post generation"
    );

    let mut rng = StdRng::from_entropy();
    let reporter = CliProgress::new();

    let result = match generate_post(
        config,
        &questions,
        &completions,
        &mut rng,
        &options,
        &reporter,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            error!(stage = %e.stage(), error = %e, "post generation aborted");
            return Err(e.into());
        }
    };

    if dry_run {
        println!("{}", result.document);
        return Ok(());
    }

    println!();
    println!("  Post written!");
    println!("  Question: {}", result.topic.title);
    if let Some(link) = &result.topic.link {
        println!("  Link:     {link}");
    }
    println!("  Title:    {}", result.title);
    println!("  Path:     {}", result.path.display());
    println!("  Tokens:   {}", result.total_tokens);
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
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

    fn abandon(&self) {
        self.spinner.abandon();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, _stage: Stage, detail: &str) {
        self.spinner.set_message(detail.to_string());
    }

    fn section_generated(&self, section: &GeneratedSection, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Generated [{current}/{total}] {} ({} tokens)",
            section.kind, section.total_tokens
        ));
    }

    fn done(&self, _result: &GeneratePostResult) {
        self.spinner.finish_and_clear();
    }
}
