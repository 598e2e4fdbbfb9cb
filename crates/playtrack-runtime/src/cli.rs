//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use playtrack_core::{PERIODIC_FLUSH_INTERVAL_SECS, REPORTER_FLUSH_INTERVAL_SECS};

#[derive(Parser)]
#[command(name = "playtrack", about = "web playtime tracking daemon")]
pub struct Cli {
    /// UDS socket path (default: $XDG_RUNTIME_DIR/playtrack/playtrackd.sock)
    #[arg(long, short = 's', global = true)]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the tracking daemon (session coordinator + UDS server)
    Daemon(DaemonOpts),
    /// Show the current session and tracked-game count
    Status,
    /// Print the persisted mapping list as JSON
    Mappings,
    /// Register a game for a URL
    AddGame(AddGameOpts),
    /// Measure dwell time for a page and report it to the daemon
    Report(ReportOpts),
}

#[derive(clap::Args)]
pub struct DaemonOpts {
    /// Safety-net flush interval in seconds
    #[arg(long, default_value_t = PERIODIC_FLUSH_INTERVAL_SECS)]
    pub flush_interval_secs: u64,

    /// Storage file (default: $XDG_DATA_HOME/playtrack/store.json)
    #[arg(long)]
    pub store_path: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct AddGameOpts {
    /// Page URL to register
    pub url: String,

    /// Page title forwarded to the resolve endpoint
    #[arg(long)]
    pub title: Option<String>,

    /// Cover/icon image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(clap::Args)]
pub struct ReportOpts {
    /// Page URL being displayed
    pub url: String,

    /// Reporting interval in seconds
    #[arg(long, default_value_t = REPORTER_FLUSH_INTERVAL_SECS)]
    pub interval_secs: u64,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/playtrack/playtrackd.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/playtrack-{user}/playtrackd.sock")
}

/// Default storage file under the XDG data directory.
pub fn default_store_path() -> PathBuf {
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".local/share")
        });
    data_home.join("playtrack/store.json")
}
