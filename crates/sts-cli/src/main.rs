use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::Context;

#[derive(Parser)]
#[command(name = "sts-casting")]
#[command(about = "Inspect and maintain persisted voice-casting sessions", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persisted state (defaults to the platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Default log level; RUST_LOG directives still apply on top
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage casting sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Manage the recent-projects list
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List sessions, most recently updated first
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print one session as JSON
    Show { id: String },
    /// Delete a session
    Delete { id: String },
    /// Apply the retention policy and rewrite the stored state
    Prune,
}

#[derive(Subcommand)]
enum RecentAction {
    /// List recent screenplay projects
    List,
    /// Record a project as most recently used
    Add { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::resolve(cli.config, cli.data_dir)?;
    let _guard = logging::init(cli.log_level.as_deref(), ctx.config.log_dir.as_deref())?;

    match cli.command {
        Commands::Sessions { action } => match action {
            SessionsAction::List { limit } => commands::sessions::list(&ctx, limit).await?,
            SessionsAction::Show { id } => commands::sessions::show(&ctx, &id).await?,
            SessionsAction::Delete { id } => commands::sessions::delete(&ctx, &id).await?,
            SessionsAction::Prune => commands::sessions::prune(&ctx).await?,
        },
        Commands::Recent { action } => match action {
            RecentAction::List => commands::recent::list(&ctx).await?,
            RecentAction::Add { path } => commands::recent::add(&ctx, &path).await?,
        },
    }

    Ok(())
}
