//! textdash - a command line dashboard for the text-analysis service.
//!
//! Each subcommand opens one page of the dashboard. Protected pages go
//! through the session guard; when the session is missing the user is asked
//! to log in and then taken back to the page they asked for.

mod app;
mod utils;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use textdash_core::config::{ApiConfig, Config, API_URL_ENV};
use textdash_core::models::{DEFAULT_MAX_LENGTH, DEFAULT_TOP_K};

use app::{App, RawCall};

#[derive(Parser, Debug)]
#[command(name = "textdash", version, about = "Text analysis dashboard")]
struct Cli {
    /// Service address; overrides the saved config
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Fail instead of prompting for a login
    #[arg(long)]
    no_prompt: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long, short)]
        username: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long, short)]
        username: String,
        #[arg(long, short)]
        email: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Statistics and recent analyses
    Dashboard,
    /// Sentiment of a text (reads stdin when TEXT is omitted or `-`)
    Sentiment { text: Option<String> },
    /// Extract keywords
    Keywords {
        text: Option<String>,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: u32,
    },
    /// Summarize a text
    Summary {
        text: Option<String>,
        #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
        max_length: u32,
    },
    /// Compare two texts
    Similarity { text1: String, text2: String },
    /// Recent analyses
    History,
    /// Analysis counts
    Stats,
    /// LLM-backed analysis
    Llm(LlmCommand),
    /// Combined traditional and LLM analysis
    Hybrid { text: Option<String> },
}

#[derive(Args, Debug)]
struct LlmCommand {
    #[command(subcommand)]
    command: LlmSubcommand,
}

#[derive(Subcommand, Debug)]
enum LlmSubcommand {
    Sentiment {
        text: Option<String>,
    },
    Keywords {
        text: Option<String>,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: u32,
    },
    Summary {
        text: Option<String>,
        #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
        max_length: u32,
    },
    Comprehensive {
        text: Option<String>,
    },
    /// Whether the LLM backend is reachable
    Health,
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).with(filter).init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let config = Config::load()?;
    let api_config = match cli.api_url {
        Some(ref url) if !url.trim().is_empty() => ApiConfig::new(url.trim()),
        _ => ApiConfig::resolve(&config),
    };
    info!(base_url = %api_config.base_url, "textdash starting");

    let mut app = App::new(config, api_config, !cli.no_prompt, cli.json)?;

    match cli.command {
        Command::Login { username } => app.login(username).await,
        Command::Register { username, email } => app.register(&username, &email).await,
        Command::Logout => app.logout(),
        Command::Whoami => app.whoami(),
        Command::Dashboard => app.dashboard().await,
        Command::Sentiment { text } => app.sentiment(text).await,
        Command::Keywords { text, top_k } => app.keywords(text, top_k).await,
        Command::Summary { text, max_length } => app.summary(text, max_length).await,
        Command::Similarity { text1, text2 } => app.similarity(text1, text2).await,
        Command::History => app.history().await,
        Command::Stats => app.stats().await,
        Command::Hybrid { text } => app.raw(RawCall::Hybrid(text)).await,
        Command::Llm(llm) => {
            let call = match llm.command {
                LlmSubcommand::Sentiment { text } => RawCall::LlmSentiment(text),
                LlmSubcommand::Keywords { text, top_k } => RawCall::LlmKeywords(text, top_k),
                LlmSubcommand::Summary { text, max_length } => RawCall::LlmSummary(text, max_length),
                LlmSubcommand::Comprehensive { text } => RawCall::LlmComprehensive(text),
                LlmSubcommand::Health => RawCall::LlmHealth,
            };
            app.raw(call).await
        }
    }
}
