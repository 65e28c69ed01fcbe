use crate::navigation::NavigationController;
use crate::resolver::watcher::start_config_watcher;
use crate::resolver::Resolver;
use crate::server::http::handle_http_connections;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub mod http;

/// Runs the redirect gateway until shutdown, reloading `config_path`
/// (when given) as it changes.
pub async fn spawn_redirect_server(
    listen_addr: &str,
    resolver: Arc<Resolver>,
    config_path: Option<PathBuf>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!(
        "Redirect gateway listening on {} with {} mappings",
        listen_addr,
        resolver.mapping_count()
    );

    let controller = Arc::new(NavigationController::new(resolver.clone()));

    let config_task = config_path.map(|path| {
        let config_rx = shutdown_rx.clone();
        let resolver = resolver.clone();
        tokio::spawn(async move {
            if let Err(e) = start_config_watcher(resolver, path, config_rx).await {
                error!("Failed to start config watcher: {:?}", e);
            }
        })
    });

    let mut http_task = tokio::spawn(handle_http_connections(
        listener,
        controller,
        shutdown_rx.clone(),
    ));

    tokio::select! {
        _ = shutdown_rx.changed() => {
            info!("Shutdown signal received. Stopping redirect gateway...");
        }
        result = &mut http_task => {
            if let Err(err) = result {
                error!("HTTP task ended with an error: {:?}", err);
            }
        }
    }

    if !http_task.is_finished() {
        http_task.abort();
    }

    if let Some(config_task) = config_task {
        config_task.abort();
        let _ = config_task.await;
    }

    Ok(())
}
