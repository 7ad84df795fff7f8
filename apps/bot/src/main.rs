mod apply;
mod browser;
mod config;
mod control;
mod db;
mod engine;
mod errors;
mod jitter;
mod llm_client;
mod login;
mod runner;
mod search;
mod selectors;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::browser::webdriver::WebDriverPage;
use crate::config::{Config, Profile};
use crate::control::PauseControl;
use crate::db::{PgApplicationLog, PgSessionStore};
use crate::llm_client::LlmClient;
use crate::login::LoginFlow;
use crate::runner::Runner;

#[derive(Parser, Debug)]
#[command(name = "bot", version, about = "Easy-apply automation for job listings")]
struct Cli {
    /// Path to the applicant profile JSON
    #[arg(long, default_value = "profile.json")]
    profile: PathBuf,

    /// Stop after this many submitted applications
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Actually click the final submit control (dry run otherwise)
    #[arg(long)]
    submit: bool,

    /// Hard cap on wizard pages per application
    #[arg(long, default_value_t = apply::DEFAULT_MAX_STEPS)]
    max_steps: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bot v{}", env!("CARGO_PKG_VERSION"));

    let profile = Profile::load(&cli.profile)?;
    let rules = profile.build_rule_set()?;
    let special = profile.special_fields();
    let context = profile.oracle_context();

    // Initialize PostgreSQL
    let pool = db::create_pool(&config.database_url).await?;
    db::ensure_schema(&pool).await?;
    let sessions = PgSessionStore::new(pool.clone());
    let log = PgApplicationLog::new(pool);

    // Initialize the LLM oracle
    let oracle = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_base_url.clone(),
        config.llm_model.clone(),
    );
    info!("LLM client initialized (model: {})", config.llm_model);

    // Attach to the WebDriver endpoint
    let page = WebDriverPage::connect(&config.webdriver_url).await?;
    info!("WebDriver session established at {}", config.webdriver_url);

    LoginFlow::new(&page, &sessions, &config.account_email, &config.account_password)
        .login()
        .await?;

    // The login flow owns stdin until here (captcha prompt).
    let pause = PauseControl::new();
    let _listener = pause.spawn_stdin_listener();
    info!("press 'p' then Enter to toggle pause");

    let runner = Runner::new(
        &page,
        &oracle,
        &log,
        &pause,
        &rules,
        &context,
        &special,
        &profile.search,
        &config.account_email,
        cli.limit,
        cli.max_steps,
        cli.submit,
    );
    let applied = runner.run().await?;
    info!(applied, "run complete");

    Ok(())
}
