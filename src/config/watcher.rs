//! Filesystem watch on the configuration source.
use std::path::PathBuf;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Watch the config file and emit one unit per relevant change.
///
/// The watcher polls with content comparison so editors that replace the
/// file (rename-over) are seen too. It lives on its own thread; the reactor
/// only ever reads the channel.
pub fn spawn_watcher(file: PathBuf) -> mpsc::UnboundedReceiver<()> {
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("config-watcher".to_string())
        .spawn(move || {
            let (tx, rx) = std::sync::mpsc::channel::<notify::Result<Event>>();
            let mut watcher = match PollWatcher::new(
                move |res| {
                    let _ = tx.send(res);
                },
                NotifyConfig::default()
                    .with_poll_interval(Duration::from_secs(1))
                    .with_compare_contents(true),
            ) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("config watcher failed to start: {err}");
                    return;
                }
            };
            if let Err(err) = watcher.watch(&file, RecursiveMode::NonRecursive) {
                tracing::warn!("cannot watch {}: {err}", file.display());
                return;
            }
            tracing::info!("watching {}", file.display());

            while let Ok(event) = rx.recv() {
                match event {
                    Ok(event) if is_relevant(&event, &file) => {
                        tracing::debug!("config change detected: {:?}", event.kind);
                        if reload_tx.send(()).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!("watch error: {err}"),
                }
            }
        })
        .expect("failed to spawn config-watcher thread");

    reload_rx
}

fn is_relevant(event: &Event, file: &PathBuf) -> bool {
    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => event
            .paths
            .iter()
            .any(|p| p == file || p.file_name() == file.file_name()),
        _ => false,
    }
}
