use crate::resolver::mapping_config::read_mapping_config;
use crate::resolver::Resolver;
use anyhow::anyhow;
use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Re-applies the mapping file to `resolver` whenever it changes on disk.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by rename keep triggering reloads.
pub async fn start_config_watcher(
    resolver: Arc<Resolver>,
    config_path: PathBuf,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let config_path = config_path.canonicalize()?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", config_path.display()))?;

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(16);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = event_tx.blocking_send(res);
    })?;
    watcher.watch(config_dir, RecursiveMode::NonRecursive)?;

    info!("Watching {} for mapping changes", config_path.display());

    loop {
        tokio::select! {
            Some(res) = event_rx.recv() => match res {
                Ok(event) if touches_config(&event, &config_path) => {
                    debug!("Mapping file event: {:?}", event.kind);
                    reload_mappings(&resolver, &config_path);
                }
                Ok(_) => {}
                Err(err) => warn!("Mapping file watcher error: {}", err),
            },
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Shutdown signal received in config watcher. Stopping...");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn touches_config(event: &Event, config_path: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path == config_path || path.file_name() == config_path.file_name())
}

/// Reads the mapping file and applies it. A file that fails to load
/// leaves the current mappings untouched.
pub(crate) fn reload_mappings(resolver: &Resolver, config_path: &Path) -> bool {
    match read_mapping_config(config_path) {
        Ok(config) => {
            let applied = resolver.apply_config(&config);
            info!(
                "Reloaded {} mappings from {}",
                applied,
                config_path.display()
            );
            true
        }
        Err(err) => {
            error!(
                "Failed to reload {}, keeping current mappings: {:?}",
                config_path.display(),
                err
            );
            false
        }
    }
}
