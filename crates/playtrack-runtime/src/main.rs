//! playtrack: web playtime tracking daemon binary.
//! Single-process binary embedding the session coordinator, its UDS
//! message server, and the CLI client subcommands.

use clap::Parser;

use playtrack_core::PageMeta;

mod cli;
mod client;
mod cmd_report;
mod daemon;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Daemon(opts) => {
            let filter = std::env::var("PLAYTRACK_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("playtrack daemon starting");

            let store_path = opts
                .store_path
                .clone()
                .unwrap_or_else(cli::default_store_path);
            daemon::run_daemon(opts, &socket_path, &store_path).await?;
        }
        cli::Command::Status => {
            client::cmd_status(&socket_path).await?;
        }
        cli::Command::Mappings => {
            client::cmd_mappings(&socket_path).await?;
        }
        cli::Command::AddGame(opts) => {
            let meta = PageMeta {
                title: opts.title,
                image: opts.image,
                description: opts.description,
            };
            client::cmd_add_game(&socket_path, &opts.url, meta).await?;
        }
        cli::Command::Report(opts) => {
            cmd_report::cmd_report(&socket_path, &opts.url, opts.interval_secs).await?;
        }
    }

    Ok(())
}
