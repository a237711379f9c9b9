//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use promptpage_core::{
    ProgressReporter, RunOptions, RunOutcome, Services, handle_issue, prepare_page,
    render_response,
};
use promptpage_gemini::GeminiClient;
use promptpage_github::GitHubClient;
use promptpage_shared::{EnvVars, PromptPageError, Settings, init_settings, load_settings};

/// Crates whose logs `-v` controls.
const LOG_TARGETS: &[&str] = &[
    "promptpage_cli",
    "promptpage_core",
    "promptpage_markup",
    "promptpage_github",
    "promptpage_gemini",
    "promptpage_shared",
];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// promptpage: let visitors edit a static page by filing an issue.
#[derive(Parser)]
#[command(
    name = "promptpage",
    version,
    about = "Apply natural-language change requests from GitHub issues to a static HTML page.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (defaults to ~/.promptpage/promptpage.toml if present).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    #[command(flatten)]
    pub env: EnvArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Run identity and credentials, normally set by the workflow environment.
#[derive(Args, Default)]
pub(crate) struct EnvArgs {
    /// Repository owner.
    #[arg(long, env = "REPO_OWNER", global = true)]
    pub repo_owner: Option<String>,

    /// Repository name.
    #[arg(long, env = "REPO_NAME", global = true)]
    pub repo_name: Option<String>,

    /// Issue carrying the change request.
    #[arg(long, env = "ISSUE_NUMBER", global = true)]
    pub issue_number: Option<String>,

    /// GitHub token with contents and issues write access.
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    pub gemini_api_key: Option<String>,
}

impl From<EnvArgs> for EnvVars {
    fn from(args: EnvArgs) -> Self {
        Self {
            repo_owner: args.repo_owner,
            repo_name: args.repo_name,
            github_token: args.github_token,
            issue_number: args.issue_number,
            gemini_api_key: args.gemini_api_key,
        }
    }
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
    /// Process the configured issue end to end.
    Run {
        /// Render the new page and print it instead of committing, commenting and closing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply a saved model response to a local page, offline.
    Render {
        /// Current page.
        #[arg(long)]
        page: PathBuf,

        /// File holding the raw model response.
        #[arg(long)]
        response: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the prompt that would be sent for a local page.
    Prompt {
        /// Current page.
        #[arg(long)]
        page: PathBuf,

        /// Change request text.
        #[arg(long)]
        instructions: String,
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
    /// Initialize settings file with defaults.
    Init,
    /// Show resolved settings.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// free for rendered pages and prompts.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

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
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let env = EnvVars::from(cli.env);
    let config_path = cli.settings;

    match cli.command {
        Command::Run { dry_run } => cmd_run(env, config_path.as_deref(), dry_run).await,
        Command::Render {
            page,
            response,
            out,
        } => cmd_render(&env, config_path.as_deref(), &page, &response, out.as_deref()),
        Command::Prompt { page, instructions } => {
            cmd_prompt(&env, config_path.as_deref(), &page, &instructions)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(env: EnvVars, config_path: Option<&Path>, dry_run: bool) -> Result<ExitCode> {
    // Everything here fails before any network call.
    let settings = load_settings(config_path)?;
    let config = env.resolve(settings)?;
    let github = GitHubClient::new(&config)?;
    let gemini = GeminiClient::new(&config)?;

    info!(
        repo = %config.repo,
        issue = config.issue_number,
        model = gemini.model(),
        dry_run,
        "processing change request"
    );

    let services = Services {
        issues: &github,
        store: &github,
        generator: &gemini,
        sink: &github,
    };
    let reporter = CliProgress::new();

    let result = handle_issue(&config, &services, RunOptions { dry_run }, &reporter).await;
    reporter.clear();

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_reportable() => {
            error!(error = %e, "run failed");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(outcome: &RunOutcome) {
    match &outcome.commit {
        None => println!("{}", outcome.html),
        Some(commit) => {
            println!();
            println!("  Website updated!");
            println!("  Issue:    #{}", outcome.issue);
            println!("  Form:     {}", outcome.origin);
            println!("  Graft:    {}", outcome.strategy);
            println!("  Commit:   {}", commit.url);
            println!("  Time:     {:.1}s", outcome.elapsed.as_secs_f64());
            println!();
        }
    }
}

fn cmd_render(
    env: &EnvVars,
    config_path: Option<&Path>,
    page: &Path,
    response: &Path,
    out: Option<&Path>,
) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;
    let repo = env.repo()?;
    let page_html = read_file(page)?;
    let response_text = read_file(response)?;

    let prepared = prepare_page(&page_html, &repo, &settings.site.request_label);
    let rendered = render_response(&prepared.fragment, &response_text);
    info!(
        origin = %prepared.origin,
        strategy = %rendered.strategy,
        raw_response = rendered.used_raw_response,
        "rendered page"
    );

    match out {
        Some(path) => {
            std::fs::write(path, &rendered.html).map_err(|e| PromptPageError::io(path, e))?;
            info!(path = %path.display(), bytes = rendered.html.len(), "wrote rendered page");
        }
        None => println!("{}", rendered.html),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_prompt(
    env: &EnvVars,
    config_path: Option<&Path>,
    page: &Path,
    instructions: &str,
) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;
    let repo = env.repo()?;
    let page_html = read_file(page)?;

    let prepared = prepare_page(&page_html, &repo, &settings.site.request_label);
    println!("{}", prepared.prompt(instructions));
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_init() -> Result<ExitCode> {
    let path = init_settings()?;
    println!("Settings initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
    let settings: Settings = load_settings(config_path)?;
    let toml_str = toml::to_string_pretty(&settings)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

fn read_file(path: &Path) -> Result<String, PromptPageError> {
    std::fs::read_to_string(path).map_err(|e| PromptPageError::io(path, e))
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.clear();
    }
}
