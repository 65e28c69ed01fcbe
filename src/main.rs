use anyhow::Result;
use clap::Parser;
use host_redirect::cli::{Cli, Command};
use host_redirect::server::spawn_redirect_server;
use log::error;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            listen_addr,
            mappings,
        } => {
            let resolver = Arc::new(mappings.build_resolver()?);

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let shutdown_task = tokio::spawn(handle_shutdown_signal(shutdown_tx));

            spawn_redirect_server(&listen_addr, resolver, mappings.domains.clone(), shutdown_rx)
                .await?;

            shutdown_task.await?;
        }
        Command::Resolve { url, mappings } => {
            let rewrite = mappings.build_resolver()?.resolve(&url)?;
            println!("{}", rewrite.final_url);
        }
    }

    Ok(())
}

pub async fn handle_shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    // Wait for a shutdown signal (e.g., Ctrl+C)
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }

    let _ = shutdown_tx.send(true);
}
