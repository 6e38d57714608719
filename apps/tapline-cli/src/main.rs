//! # Tapline CLI
//!
//! Terminal front-end over the Tapline use cases and models.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tracing (RUST_LOG) ──► TaplineConfig::load ──► Database (migrations)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppContext::production ──► command                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr; command output goes to stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tapline_core::{AuthViewState, DataState, ItemCollectionSummary, Payload};
use tapline_db::{Database, DbConfig};
use tapline_sync::{AppContext, AuthModel, ItemListModel, ItemSyncUseCase, TaplineConfig, UiContext};

#[derive(Debug, Parser)]
#[command(name = "tapline", version, about = "Browse and favorite the item catalog")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh the cache if stale and list the items
    Items {
        /// Fetch even if the cache is fresh
        #[arg(long)]
        force: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow the item list state until Ctrl-C
    Watch,

    /// Mark or unmark an item as favorite
    Favorite {
        id: i64,

        /// Remove the mark instead of setting it
        #[arg(long)]
        off: bool,
    },

    /// Log in with a username and password
    Login {
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Delete every cached item and reset the freshness mark
    Clear,

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tapline=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = TaplineConfig::load(cli.config.clone()).context("Failed to load configuration")?;

    if let Command::Config { init } = cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        if init {
            config.save(cli.config)?;
        }
        return Ok(());
    }

    let db_path = config
        .database_path()
        .ok_or_else(|| anyhow!("No database path available; set TAPLINE_DB_PATH"))?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    info!(path = %db_path.display(), "Opening database");
    let db = Database::new(DbConfig::new(&db_path)).await?;
    let timeout = Duration::from_secs(config.api.timeout_secs + 5);
    let ctx = AppContext::production(config, &db)?;

    let outcome = match cli.command {
        Command::Items { force, json } => list_items(&ctx, &db, force, json).await,
        Command::Watch => watch_items(ctx).await,
        Command::Favorite { id, off } => {
            ItemSyncUseCase::new(ctx).set_favorite(id, !off).await?;
            println!("Item {} {}", id, if off { "unmarked" } else { "marked as favorite" });
            Ok(())
        }
        Command::Login { username, password } => login(&ctx, username, password, timeout).await,
        Command::Clear => {
            ItemSyncUseCase::new(ctx).clear_cache().await?;
            println!("Cache cleared");
            Ok(())
        }
        Command::Config { .. } => Ok(()),
    };

    db.close().await;
    outcome
}

async fn list_items(ctx: &AppContext, db: &Database, force: bool, json: bool) -> Result<()> {
    let sync = ItemSyncUseCase::new(ctx.clone());

    let mut shown = DataState::loading();
    let mut refresh = sync.refresh_if_stale(force);
    while let Some(next) = refresh.next().await {
        shown = DataState::overlay(&shown, next);
    }

    match &shown.payload {
        Payload::Error(message) => bail!("{}", message),
        Payload::Empty => {
            println!("The server returned no items");
            return Ok(());
        }
        Payload::Idle | Payload::Data(_) => {}
    }

    let summary = ItemCollectionSummary::from_items(db.items().select_all().await?);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ItemCollectionSummary) {
    if summary.is_empty() {
        println!("No cached items");
        return;
    }

    for item in &summary.all_items {
        let mark = if item.favorite { "*" } else { " " };
        println!("{} {:>4}  {}", mark, item.id, item.name);
    }
    if let Some(longest) = &summary.longest_name_item {
        println!();
        println!("Longest name: {}", longest.name);
    }
}

async fn watch_items(ctx: AppContext) -> Result<()> {
    let ui = UiContext::dedicated("tapline-ui")?;
    let model = ItemListModel::new(ctx);

    let _subscription = model.state().observe(&ui, |state| {
        if state.loading {
            println!("[loading]");
        }
        match &state.payload {
            Payload::Data(summary) => print_summary(summary),
            Payload::Empty => println!("The server returned no items"),
            Payload::Error(message) => println!("error: {}", message),
            Payload::Idle => {}
        }
    });

    model.open();
    tokio::signal::ctrl_c().await?;
    debug!("Interrupted");
    model.close();
    Ok(())
}

async fn login(ctx: &AppContext, username: String, password: String, timeout: Duration) -> Result<()> {
    let model = AuthModel::new(ctx);
    model.login(username, password);

    let mut states = model.state().receiver();
    let settled = tokio::time::timeout(timeout, async {
        states
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone())
    })
    .await
    .context("Login timed out")?
    .context("Login did not complete")?;

    match settled {
        AuthViewState::AuthSuccess(user) => {
            println!("Logged in as {} <{}>", user.username, user.email);
            Ok(())
        }
        AuthViewState::Error(message) => bail!("{}", message),
        AuthViewState::Uninitialized | AuthViewState::Loading => bail!("Login did not complete"),
    }
}
