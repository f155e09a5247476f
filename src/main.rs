//! Grid Carbon - UK grid carbon-intensity dashboard service
//!
//! Periodically fetches national carbon intensity, the 48-hour forecast,
//! regional intensities and the generation mix, and serves them with
//! forecast analysis and an LLM assistant over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Serve the dashboard API (default subcommand)
//! ./grid-carbon
//!
//! # One-off summary of the current grid
//! ./grid-carbon snapshot
//!
//! # Ask the assistant from the command line
//! GEMINI_API_KEY=AIza... ./grid-carbon ask "When should I run the dishwasher?"
//! ```
//!
//! # Environment Variables
//!
//! - `GRID_CARBON_CONFIG`: Path to a TOML config file
//! - `GRID_CARBON_ADDR`: Override the server address
//! - `GRID_CARBON_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `GEMINI_API_KEY`: Assistant key (takes precedence over the stored key)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use grid_carbon::acquisition::GridClient;
use grid_carbon::api::{create_app, DashboardState};
use grid_carbon::config::{validation, DashboardConfig};
use grid_carbon::context::build_context;
use grid_carbon::llm::Assistant;
use grid_carbon::pipeline::{AppState, DashboardSnapshot, RefreshCoordinator};
use grid_carbon::storage::{KeyValueStore, SledStore, UserSettings};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "grid-carbon")]
#[command(about = "UK grid carbon-intensity dashboard service")]
#[command(version)]
struct CliArgs {
    /// Explicit config file (otherwise $GRID_CARBON_CONFIG, then ./grid_carbon.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bind address, overriding `[server] addr`
    #[arg(short, long, env = "GRID_CARBON_ADDR")]
    addr: Option<String>,

    /// Override the settings database path
    #[arg(long, value_name = "PATH")]
    storage_path: Option<String>,

    /// Keep settings in a temporary database that is deleted on exit
    #[arg(long)]
    ephemeral: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the refresh loop and HTTP API (default)
    Serve,

    /// Fetch once and print a summary of the current grid
    Snapshot {
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch once and ask the assistant a question
    Ask {
        /// The question to ask
        question: String,
    },

    /// Validate the effective configuration
    Config {
        /// Print the effective configuration as TOML
        #[arg(long)]
        print: bool,
    },

    /// Remove every stored user setting (API key, location preference)
    ClearSettings,
}

// ============================================================================
// Task Supervision
// ============================================================================

/// Long-running tasks owned by `serve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskName {
    HttpServer,
    RefreshLoop,
}

impl TaskName {
    const fn as_str(self) -> &'static str {
        match self {
            Self::HttpServer => "http_server",
            Self::RefreshLoop => "refresh_loop",
        }
    }
}

/// Serve `app` until the token is cancelled.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        let task = TaskName::HttpServer.as_str();
        info!(task, "HTTP server accepting connections");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!(task, "HTTP server draining in-flight requests");
            })
            .await
            .inspect_err(|e| error!(task, error = %e, "HTTP server stopped with an error"))
            .context("HTTP server failed")?;
        Ok(TaskName::HttpServer)
    });
}

/// Timed refresh cycles until the token is cancelled.
fn spawn_refresh_loop(
    task_set: &mut JoinSet<Result<TaskName>>,
    coordinator: Arc<RefreshCoordinator>,
    config: &DashboardConfig,
    cancel_token: CancellationToken,
) {
    let period = Duration::from_secs(config.refresh.interval_secs);
    let run_on_start = config.refresh.run_on_start;
    task_set.spawn(async move {
        coordinator.run_periodic(period, run_on_start, cancel_token).await;
        Ok(TaskName::RefreshLoop)
    });
}

/// Wait for every task. The first failure or panic cancels the others and
/// becomes the process result.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut first_error = None;
    while let Some(joined) = task_set.join_next().await {
        let outcome = joined.map_err(|e| anyhow::anyhow!("task panicked: {e}")).and_then(|r| r);
        match outcome {
            Ok(task) => info!(task = task.as_str(), "Task finished"),
            Err(e) => {
                error!(error = %e, "Task failed, stopping the service");
                cancel_token.cancel();
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

// ============================================================================
// Initialization
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DashboardConfig::load(),
    };

    if let Some(addr) = &args.addr {
        config.server.addr.clone_from(addr);
    }
    if let Some(path) = &args.storage_path {
        config.storage.path.clone_from(path);
    }
    config.validate().context("Invalid configuration")?;

    for warning in validation::suspicious_values(&config) {
        warn!("{}", warning);
    }
    Ok(config)
}

fn open_store(args: &CliArgs, config: &DashboardConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store = if args.ephemeral {
        info!("💾 Settings: temporary database (--ephemeral)");
        SledStore::temporary().context("Failed to create temporary settings database")?
    } else {
        let path = PathBuf::from(&config.storage.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        SledStore::open(&path)
            .with_context(|| format!("Failed to open settings database at {}", path.display()))?
    };
    Ok(Arc::new(store))
}

fn build_coordinator(config: &DashboardConfig) -> Result<Arc<RefreshCoordinator>> {
    let client = GridClient::new(&config.grid_api).context("Failed to build grid API client")?;
    Ok(Arc::new(RefreshCoordinator::new(
        Arc::new(client),
        Arc::new(RwLock::new(AppState::default())),
        config.analysis.integrity_tolerance_pct,
    )))
}

/// Run one cycle and return its snapshot, or fail when nothing was fetched.
async fn fetch_once(coordinator: &RefreshCoordinator) -> Result<Arc<DashboardSnapshot>> {
    coordinator.run_cycle().await;
    let state = coordinator.state().read().await;
    match (&state.snapshot, &state.last_error) {
        (Some(snapshot), _) => Ok(Arc::clone(snapshot)),
        (None, Some(reason)) => Err(anyhow::anyhow!("Grid data unavailable: {reason}")),
        (None, None) => Err(anyhow::anyhow!("Grid data unavailable")),
    }
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_server(args: &CliArgs, config: DashboardConfig) -> Result<()> {
    let config = Arc::new(config);
    let store = open_store(args, &config)?;
    let settings = UserSettings::load(store.as_ref()).context("Failed to load user settings")?;
    let coordinator = build_coordinator(&config)?;
    let assistant = Arc::new(Assistant::gemini(config.assistant.clone()));

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Grid Carbon - UK grid carbon-intensity dashboard");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📥 Source: {}", config.grid_api.base_url);
    info!(
        "⏱️  Refresh: every {}s (run on start: {})",
        config.refresh.interval_secs, config.refresh.run_on_start
    );
    info!(
        "🤖 Assistant: {} ({})",
        config.assistant.model,
        if settings.is_configured() {
            "configured"
        } else {
            "no API key"
        }
    );

    let state = DashboardState::new(
        Arc::clone(&coordinator),
        store,
        settings,
        Arc::clone(&config),
        assistant,
    );
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!("🌐 Dashboard API: http://{}/api/v1", config.server.addr);

    let cancel_token = CancellationToken::new();
    let on_ctrl_c = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Ctrl+C, shutting down");
            on_ctrl_c.cancel();
        }
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    spawn_refresh_loop(&mut task_set, coordinator, &config, cancel_token.clone());

    run_supervisor(&mut task_set, cancel_token).await?;
    info!("✓ Grid Carbon shutdown complete");
    Ok(())
}

async fn run_snapshot(config: &DashboardConfig, json: bool) -> Result<()> {
    let coordinator = build_coordinator(config)?;
    let snapshot = fetch_once(&coordinator).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    let ctx = build_context(
        &snapshot.context_input(),
        &UserSettings::default(),
        &config.analysis,
        chrono::Utc::now(),
    );
    println!(
        "⚡ Carbon intensity: {:.0} gCO₂/kWh ({})",
        ctx.current_intensity, ctx.current_level
    );
    println!(
        "🌱 Renewable: {:.1}%  Low-carbon: {:.1}%  Fossil: {:.1}%",
        ctx.renewable_pct, ctx.low_carbon_pct, ctx.fossil_pct
    );
    if let Some(summary) = &ctx.summary {
        println!("{}", summary.to_text());
    }
    if let Some(regional) = &ctx.regional {
        println!(
            "🗺️  Cleanest: {} ({:.0})  Dirtiest: {} ({:.0})",
            regional.cleanest.short_name,
            regional.cleanest.forecast_intensity,
            regional.dirtiest.short_name,
            regional.dirtiest.forecast_intensity
        );
    }
    let failed = snapshot.failed_sections();
    if !failed.is_empty() {
        println!("⚠️  Unavailable: {}", failed.join(", "));
    }
    Ok(())
}

async fn run_ask(args: &CliArgs, config: &DashboardConfig, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(anyhow::anyhow!("Question must not be empty"));
    }
    let store = open_store(args, config)?;
    let settings = UserSettings::load(store.as_ref()).context("Failed to load user settings")?;
    let coordinator = build_coordinator(config)?;
    let snapshot = fetch_once(&coordinator).await?;

    let ctx = build_context(
        &snapshot.context_input(),
        &settings,
        &config.analysis,
        chrono::Utc::now(),
    );
    let assistant = Assistant::gemini(config.assistant.clone());
    let exchange = assistant.ask(question, &ctx, &settings).await;

    println!("{}", exchange.reply.content);
    if !exchange.reply.suggestions.is_empty() {
        println!();
        for suggestion in &exchange.reply.suggestions {
            println!("  • {suggestion}");
        }
    }
    Ok(())
}

fn run_config(config: &DashboardConfig, print: bool) -> Result<()> {
    if print {
        print!("{}", config.to_toml_string()?);
    } else {
        println!("✓ Configuration is valid");
    }
    Ok(())
}

fn run_clear_settings(args: &CliArgs, config: &DashboardConfig) -> Result<()> {
    let store = open_store(args, config)?;
    let mut settings = UserSettings::load(store.as_ref())?;
    settings.clear(store.as_ref())?;
    println!("✓ Stored settings removed");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = load_config(&args)?;

    match &args.command {
        None | Some(SubCommand::Serve) => run_server(&args, config).await?,
        Some(SubCommand::Snapshot { json }) => run_snapshot(&config, *json).await?,
        Some(SubCommand::Ask { question }) => run_ask(&args, &config, question).await?,
        Some(SubCommand::Config { print }) => run_config(&config, *print)?,
        Some(SubCommand::ClearSettings) => run_clear_settings(&args, &config)?,
    }

    Ok(())
}
