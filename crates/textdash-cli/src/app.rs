//! Application state for the textdash CLI.
//!
//! `App` wires the session store, API client and router together. Every
//! protected command is a navigation: the route is pushed, the session guard
//! decides, and a blocked route can be resumed after an interactive login.

use std::io::{self, BufRead, Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use textdash_core::api::ApiError;
use textdash_core::auth::{
    flow, FileSessionStore, Guarded, KeyringSessionStore, SessionGuard, SessionStore,
};
use textdash_core::config::{ApiConfig, Config, StoreBackend};
use textdash_core::models::{
    HistoryEntry, KeywordsResult, SentimentResult, SimilarityResult, Stats, SummaryResult,
};
use textdash_core::router::{Route, LOGIN_PATH};
use textdash_core::{ApiClient, Router};

use crate::utils::{format_optional, format_ratio, format_timestamp, truncate_string, weight_bar};

/// Width of keyword weight bars
const BAR_WIDTH: usize = 20;

/// History text column width
const HISTORY_TEXT_WIDTH: usize = 48;

pub struct App {
    pub config: Config,
    pub store: Arc<dyn SessionStore>,
    pub api: ApiClient,
    pub router: Router,
    /// Prompt for credentials when a protected route is blocked
    interactive: bool,
    /// Print raw JSON instead of the text views
    json: bool,
}

impl App {
    pub fn new(config: Config, api_config: ApiConfig, interactive: bool, json: bool) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match config.store {
            StoreBackend::File => Arc::new(FileSessionStore::new(config.cache_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringSessionStore::default()),
        };
        debug!(base_url = %api_config.base_url, backend = ?config.store, "Creating app");
        let api = ApiClient::new(&api_config, store.clone())?;

        Ok(Self {
            config,
            store,
            api,
            router: Router::default(),
            interactive,
            json,
        })
    }

    // ===== Navigation =====

    /// Navigate to a protected route. Returns once the route may be shown,
    /// logging in first when allowed.
    pub async fn open(&mut self, route: Route) -> Result<()> {
        self.router.push(route.path());

        debug!(route = route.path(), "Checking session");
        let mut guard = SessionGuard::new(self.store.clone());

        match guard.activate(&mut self.router, || ()) {
            Guarded::Protected(()) => Ok(()),
            Guarded::Loading => bail!("Session check did not complete"),
            Guarded::Redirected => {
                if !self.interactive {
                    bail!("Not logged in. Run `textdash login` first.");
                }
                eprintln!("Login required to open {}.", route.title());
                self.login(None).await?;

                // Back on the intended route; check again with a fresh guard
                let mut guard = SessionGuard::new(self.store.clone());
                match guard.activate(&mut self.router, || ()) {
                    Guarded::Protected(()) => Ok(()),
                    _ => bail!("Still not logged in"),
                }
            }
        }
    }

    // ===== Account =====

    /// Log in from the login page. Any recorded navigation intent is
    /// honored by the login flow.
    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        if self.router.current().pathname != LOGIN_PATH {
            self.router.push(LOGIN_PATH);
        }

        let username = match username.or_else(|| self.config.last_username.clone()) {
            Some(name) if !name.trim().is_empty() => name,
            _ => prompt("Username: ")?,
        };
        let password = rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?;

        let outcome = flow::login(&self.api, self.store.as_ref(), &mut self.router, &username, &password)
            .await
            .map_err(|e| user_facing(e, "Login failed, please try again"))?;

        eprintln!("Logged in as {}.", outcome.profile.display_name());

        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        Ok(())
    }

    pub async fn register(&mut self, username: &str, email: &str) -> Result<()> {
        self.router.push(Route::Register.path());
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        let confirm = rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
        if password != confirm {
            bail!("Passwords do not match");
        }

        let message = flow::register(&self.api, &mut self.router, username, email, &password)
            .await
            .map_err(|e| user_facing(e, "Registration failed, please try again"))?;
        eprintln!("{}", message.unwrap_or_else(|| "Registered.".to_string()));
        eprintln!("Run `textdash login` to sign in.");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        flow::logout(self.store.as_ref(), &mut self.router)?;
        eprintln!("Logged out.");
        Ok(())
    }

    pub fn whoami(&self) -> Result<()> {
        if !self.store.has_credential() {
            println!("Not logged in.");
            return Ok(());
        }
        match self.store.profile()? {
            Some(profile) => println!("{}", profile.display_name()),
            None => println!("Logged in."),
        }
        Ok(())
    }

    // ===== Views =====

    /// Home page: statistics plus the latest analyses. A failure to load
    /// statistics is shown but does not leave the page.
    pub async fn dashboard(&mut self) -> Result<()> {
        self.open(Route::Dashboard).await?;

        let (stats, history) = futures::join!(self.api.stats(), self.api.history());
        match stats {
            Ok(stats) => self.show(&stats, print_stats)?,
            Err(e) => eprintln!("{}", user_facing(e, "Failed to load statistics")),
        }
        match history {
            Ok(entries) => {
                let recent: Vec<HistoryEntry> = entries.into_iter().take(5).collect();
                self.show(recent.as_slice(), print_history)?
            }
            Err(e) => eprintln!("{}", user_facing(e, "Failed to load history")),
        }
        Ok(())
    }

    pub async fn sentiment(&mut self, text: Option<String>) -> Result<()> {
        self.open(Route::Sentiment).await?;
        let text = read_text(text)?;
        let result = self.api.sentiment(&text).await.map_err(|e| self.failed(e, "Analysis failed"))?;
        self.show(&result, print_sentiment)
    }

    pub async fn keywords(&mut self, text: Option<String>, top_k: u32) -> Result<()> {
        self.open(Route::Keywords).await?;
        let text = read_text(text)?;
        let result = self
            .api
            .keywords(&text, top_k)
            .await
            .map_err(|e| self.failed(e, "Keyword extraction failed"))?;
        self.show(&result, print_keywords)
    }

    pub async fn summary(&mut self, text: Option<String>, max_length: u32) -> Result<()> {
        self.open(Route::Summary).await?;
        let text = read_text(text)?;
        let result = self
            .api
            .summary(&text, max_length)
            .await
            .map_err(|e| self.failed(e, "Summary generation failed"))?;
        self.show(&result, print_summary)
    }

    pub async fn similarity(&mut self, text1: String, text2: String) -> Result<()> {
        self.open(Route::Similarity).await?;
        if text1.trim().is_empty() || text2.trim().is_empty() {
            bail!("Please provide two pieces of text");
        }
        let result = self
            .api
            .similarity(&text1, &text2)
            .await
            .map_err(|e| self.failed(e, "Similarity calculation failed"))?;
        self.show(&result, print_similarity)
    }

    pub async fn history(&mut self) -> Result<()> {
        self.open(Route::History).await?;
        let entries = self.api.history().await.map_err(|e| self.failed(e, "Failed to load history"))?;
        self.show(entries.as_slice(), print_history)
    }

    pub async fn stats(&mut self) -> Result<()> {
        self.open(Route::Stats).await?;
        let stats = self.api.stats().await.map_err(|e| self.failed(e, "Failed to load statistics"))?;
        self.show(&stats, print_stats)
    }

    /// LLM and hybrid endpoints return free-form JSON; always printed raw.
    pub async fn raw(&mut self, call: RawCall) -> Result<()> {
        self.open(Route::Dashboard).await?;
        let result = match call {
            RawCall::LlmSentiment(text) => self.api.llm_sentiment(&read_text(text)?).await,
            RawCall::LlmKeywords(text, top_k) => self.api.llm_keywords(&read_text(text)?, top_k).await,
            RawCall::LlmSummary(text, max_length) => self.api.llm_summary(&read_text(text)?, max_length).await,
            RawCall::LlmComprehensive(text) => self.api.llm_comprehensive(&read_text(text)?).await,
            RawCall::Hybrid(text) => self.api.hybrid_analysis(&read_text(text)?).await,
            RawCall::LlmHealth => self.api.llm_health().await,
        }
        .map_err(|e| self.failed(e, "Request failed"))?;
        print_json(&result)
    }

    fn show<T: serde::Serialize + ?Sized>(&self, value: &T, view: fn(&T)) -> Result<()> {
        if self.json {
            print_json(value)
        } else {
            view(value);
            Ok(())
        }
    }

    /// Turn a failed call into the message shown to the user, noting when
    /// the call also ended the session.
    fn failed(&self, err: anyhow::Error, fallback: &str) -> anyhow::Error {
        let session_ended = matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unprocessable(_)))
            && !self.store.has_credential();
        let err = user_facing(err, fallback);
        if session_ended {
            err.context("Session expired. Run `textdash login` to sign in again.")
        } else {
            err
        }
    }
}

/// Opaque endpoints reachable from the CLI.
pub enum RawCall {
    LlmSentiment(Option<String>),
    LlmKeywords(Option<String>, u32),
    LlmSummary(Option<String>, u32),
    LlmComprehensive(Option<String>),
    Hybrid(Option<String>),
    LlmHealth,
}

/// Prefer the server's own message when it sent one.
fn user_facing(err: anyhow::Error, fallback: &str) -> anyhow::Error {
    let message = err
        .downcast_ref::<ApiError>()
        .and_then(|api| api.server_message().map(str::to_string));
    match message {
        Some(message) => anyhow::anyhow!("{}: {}", fallback, message),
        None => err.context(fallback.to_string()),
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Text from the argument, or from stdin when absent or `-`.
fn read_text(text: Option<String>) -> Result<String> {
    let text = match text {
        Some(text) if text != "-" => text,
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };
    if text.trim().is_empty() {
        bail!("Please provide some text to analyze");
    }
    Ok(text)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_sentiment(result: &SentimentResult) {
    println!("Sentiment:  {}", result.sentiment);
    println!("Score:      {:.3}", result.score);
    println!("Confidence: {}", format_optional(&result.confidence, "-"));
}

fn print_keywords(result: &KeywordsResult) {
    for (title, keywords) in [("TF-IDF", &result.tfidf_keywords), ("TextRank", &result.textrank_keywords)] {
        println!("{}:", title);
        if keywords.is_empty() {
            println!("  (none)");
        }
        for keyword in keywords {
            println!("  {:<16} {} {:.3}", keyword.word, weight_bar(keyword.weight, BAR_WIDTH), keyword.weight);
        }
    }
}

fn print_summary(result: &SummaryResult) {
    println!("{}", result.summary);
    println!();
    match (result.original_length, result.compression_ratio) {
        (Some(original), Some(ratio)) => {
            println!("Length: {} of {} ({})", result.length, original, format_ratio(ratio));
        }
        _ => println!("Length: {}", result.length),
    }
}

fn print_similarity(result: &SimilarityResult) {
    println!("Similarity: {:.1}% ({:.3})", result.similarity_percentage, result.similarity_score);
    println!("{}", result.interpretation);
}

fn print_stats(stats: &Stats) {
    println!("Total analyses: {}", stats.total_analyses);
    for (kind, count) in stats.breakdown() {
        println!("  {:<12} {}", kind.display_name(), count);
    }
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No analyses yet.");
        return;
    }
    for entry in entries {
        println!(
            "{:>5}  {:<18}  {:<10}  {}",
            entry.id,
            format_timestamp(&entry.created_at),
            entry.analysis_type.display_name(),
            truncate_string(&entry.text.replace('\n', " "), HISTORY_TEXT_WIDTH),
        );
    }
}
