//! manage-admin - grant or revoke admin rights from the terminal.
//!
//! ```text
//! manage-admin op <username>                 # via the server's internal API
//! manage-admin deop <username>
//! manage-admin op <username> --direct        # write the SQLite row directly
//! manage-admin deop <username> --direct --db ~/tracker/database.db
//! ```
//!
//! The HTTP path needs the server running and the shared secret
//! (`INTERNAL_SECRET`, falling back to `JWT_SECRET`); connected admin panels
//! are notified. The direct path works with the server down and notifies
//! nobody.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use trackadmin_client::InternalApi;
use trackadmin_core::TrackAdminConfig;
use trackadmin_core::types::PrivilegeChange;
use trackadmin_store::UserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Give admin rights
    Op,
    /// Take admin rights away
    Deop,
}

#[derive(Parser, Debug)]
#[command(name = "manage-admin", version, about = "Grant or revoke tracker admin rights")]
struct Args {
    action: Action,
    username: String,

    /// Write `users.is_admin` directly instead of calling the server
    #[arg(long)]
    direct: bool,

    /// SQLite database for --direct (default from config / $TRACKADMIN_DB)
    #[arg(long, requires = "direct")]
    db: Option<String>,

    /// Config file (default: ~/.trackadmin/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn print_change(change: &PrivilegeChange) {
    println!("✅ {}", change.message);
    println!("   User: {}", change.username);
    println!("   ID: {}", change.user_id);
}

async fn via_http(config: &TrackAdminConfig, action: Action, username: &str) -> ExitCode {
    let api = InternalApi::new(config.base_url(), config.auth.internal_secret.clone());
    let result = match action {
        Action::Op => api.grant(username).await,
        Action::Deop => api.revoke(username).await,
    };
    match result {
        Ok(change) => {
            print_change(&change);
            println!("   🔔 WebSocket notification sent");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e.user_message());
            eprintln!("   Make sure the server is running on {}:{}", config.server.host, config.server.port);
            ExitCode::FAILURE
        }
    }
}

fn direct(config: &TrackAdminConfig, db: Option<&str>, action: Action, username: &str) -> ExitCode {
    let path = db.unwrap_or(&config.database.path);
    let result = UserStore::open(path).and_then(|store| store.set_admin(username, action == Action::Op));
    match result {
        Ok(change) => {
            print_change(&change);
            println!("   ⚠ Written directly to {path}; open admin panels were not notified");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help / --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            eprintln!();
            eprintln!("❌ Usage:");
            eprintln!("   manage-admin op <username>    - grant admin rights");
            eprintln!("   manage-admin deop <username>  - revoke admin rights");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = match TrackAdminConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.direct {
        direct(&config, args.db.as_deref(), args.action, &args.username)
    } else {
        via_http(&config, args.action, &args.username).await
    }
}
