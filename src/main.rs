//! trackadmin - operator console for the tracker.
//!
//! Usage:
//! ```text
//! trackadmin stats
//! trackadmin users --search olga --sort created_at --sort created_at
//! trackadmin toggle-admin 12
//! trackadmin ticket 5
//! trackadmin reply 5 "Fixed in the latest release"
//! trackadmin watch
//! ```
//!
//! Every command first verifies that the configured session belongs to an
//! admin. `watch` keeps a live panel on screen, redrawn on every realtime
//! update from the server.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use trackadmin_client::AdminApi;
use trackadmin_core::TrackAdminConfig;
use trackadmin_core::types::TicketStatus;
use trackadmin_panel::view::{self, DateFormat};
use trackadmin_panel::{ArchiveFilter, Panel, SortField, StatusFilter};
use trackadmin_realtime::AdminListener;

#[derive(Parser, Debug)]
#[command(name = "trackadmin", version, about = "Tracker admin console", long_about = None)]
struct Cli {
    /// Config file (default: ~/.trackadmin/config.toml, or $TRACKADMIN_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show global statistics
    Stats,
    /// List users
    Users {
        /// Filter by username, email or id
        #[arg(long)]
        search: Option<String>,
        /// Sort column; repeat the same column to sort descending
        #[arg(long)]
        sort: Vec<SortField>,
    },
    /// Show one user's details
    User { id: i64 },
    /// Grant or revoke admin rights
    ToggleAdmin {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a user and all of their data
    DeleteUser {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Set a new password for a user
    ResetPassword { id: i64, password: String },
    /// List support tickets
    Tickets {
        /// Show archived tickets instead of active ones
        #[arg(long)]
        archived: bool,
        /// all, open, in_progress, resolved or closed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Show a ticket conversation
    Ticket { id: i64 },
    /// Change a ticket's status
    TicketStatus { id: i64, status: TicketStatus },
    /// Archive or unarchive a ticket
    Archive {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Reply to a ticket
    Reply { id: i64, text: String },
    /// End the admin session
    Logout,
    /// Live panel, refreshed by realtime updates
    Watch,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn ensure_admin(api: &AdminApi) -> anyhow::Result<()> {
    let is_admin = api
        .check_admin()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify access: {}", e.user_message()))?;
    if !is_admin {
        bail!("You do not have admin rights");
    }
    Ok(())
}

/// Select ticket `id`, looking in active tickets first, then archived ones.
async fn locate_ticket(panel: &Panel, id: i64) -> anyhow::Result<()> {
    for filter in [ArchiveFilter::Active, ArchiveFilter::Archived] {
        panel.set_archive_filter(filter).await?;
        if panel.snapshot().await.tickets.iter().any(|t| t.id == id) {
            panel.select_ticket(id).await?;
            return Ok(());
        }
    }
    bail!("Ticket #{id} not found")
}

async fn watch_panel(config: &TrackAdminConfig, panel: Panel, rx: mpsc::UnboundedReceiver<String>) -> anyhow::Result<()> {
    let me = panel.api().me().await.context("Failed to load current admin")?;
    tracing::info!("Signed in as {} (id={})", me.username, me.id);

    if let Err(e) = panel.load_all().await {
        tracing::error!("Initial load incomplete: {e}");
    }
    println!("{}", panel.render().await);

    let panel = Arc::new(panel);
    let listener = AdminListener::new(config.ws_url(), me.id, panel)
        .with_reconnect_delay(config.reconnect_delay());

    let mut rx = rx;
    let printer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            println!("\n{frame}");
        }
    });

    let (stop_tx, stop_rx) = watch::channel(false);
    let listener_task = tokio::spawn(async move { listener.run(stop_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = stop_tx.send(true);
    listener_task.await?;
    printer.abort();
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TrackAdminConfig::load(cli.config.as_deref())?;
    let api = AdminApi::new(config.base_url(), config.auth.session_cookie.as_deref())?;
    let dates = DateFormat::local();

    if !matches!(cli.command, Command::Logout) {
        ensure_admin(&api).await?;
    }

    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let panel = Panel::new(api).with_frames(frames_tx);

    match cli.command {
        Command::Stats => {
            panel.load_stats().await?;
            if let Some(stats) = &panel.snapshot().await.stats {
                println!("{}", view::render_stats(stats, &dates));
            }
        }
        Command::Users { search, sort } => {
            panel.load_users().await?;
            for field in sort {
                panel.click_sort(field).await;
            }
            if let Some(q) = search {
                panel.set_search(&q).await;
            }
            println!("{}", view::render_users(&panel.snapshot().await.visible_users(), &dates));
        }
        Command::User { id } => {
            println!("{}", panel.user_details(id).await?);
        }
        Command::ToggleAdmin { id, yes } => {
            if yes || confirm("Change admin rights for this user?")? {
                println!("{}", panel.toggle_admin(id).await?);
            }
        }
        Command::DeleteUser { id, yes } => {
            if yes || confirm(&format!("Delete user #{id}? ALL of their data will be removed permanently!"))? {
                println!("{}", panel.delete_user(id).await?);
            }
        }
        Command::ResetPassword { id, password } => {
            println!("{}", panel.reset_password(id, &password).await?);
        }
        Command::Tickets { archived, status } => {
            panel.set_status_filter(status).await;
            let filter = if archived { ArchiveFilter::Archived } else { ArchiveFilter::Active };
            panel.set_archive_filter(filter).await?;
            println!("{}", view::render_tickets(&panel.snapshot().await, &dates));
        }
        Command::Ticket { id } => {
            locate_ticket(&panel, id).await?;
            println!("{}", view::render_conversation(&panel.snapshot().await, &dates));
        }
        Command::TicketStatus { id, status } => {
            locate_ticket(&panel, id).await?;
            panel.save_ticket_status(status.clone()).await?;
            println!("Ticket #{id} is now {}", status.label());
        }
        Command::Archive { id, yes } => {
            locate_ticket(&panel, id).await?;
            let archived = panel.snapshot().await.current_ticket().is_some_and(|t| t.archived);
            let prompt = if archived { "Unarchive this ticket?" } else { "Archive this ticket?" };
            if yes || confirm(prompt)? {
                let now = panel.toggle_current_archive().await?;
                println!("Ticket #{id} {}", if now { "archived" } else { "unarchived" });
            }
        }
        Command::Reply { id, text } => {
            locate_ticket(&panel, id).await?;
            if panel.send_reply(&text).await? {
                println!("{}", view::render_conversation(&panel.snapshot().await, &dates));
            } else {
                bail!("Reply is empty");
            }
        }
        Command::Logout => {
            panel.api().logout().await?;
            println!("Logged out");
        }
        Command::Watch => watch_panel(&config, panel, frames_rx).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
