// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::engine::RuntimeEvent;
use crate::types::ChangeKind;
use crate::watch::patterns::WatchFilter;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::FileChanged` for every path `filter` accepts.
///
/// Files that already exist when the watcher starts produce no events.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    filter: WatchFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("bundlewatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("bundlewatch: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            trace!(?event, "received notify event");

            for (path, kind) in changes_from_event(&event) {
                if !filter.accepts(&path) {
                    trace!(?path, "path not watched; ignoring");
                    continue;
                }
                debug!(?path, %kind, "file changed");
                if runtime_tx
                    .send(RuntimeEvent::FileChanged { path, kind })
                    .await
                    .is_err()
                {
                    debug!("runtime gone; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Translate a notify event into per-path changes.
///
/// Renames become a deletion of the old path and a creation of the new one.
/// Access and other non-content events are dropped.
pub fn changes_from_event(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let all = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };

    match &event.kind {
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => all(ChangeKind::Deleted),
            RenameMode::To => all(ChangeKind::Created),
            RenameMode::Both => {
                let mut out = Vec::new();
                if let Some(from) = event.paths.first() {
                    out.push((from.clone(), ChangeKind::Deleted));
                }
                if let Some(to) = event.paths.get(1) {
                    out.push((to.clone(), ChangeKind::Created));
                }
                out
            }
            // Backends that cannot tell the two sides apart.
            _ => event
                .paths
                .iter()
                .map(|p| (p.clone(), existence_kind(p)))
                .collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => all(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn existence_kind(path: &Path) -> ChangeKind {
    if path.exists() {
        ChangeKind::Created
    } else {
        ChangeKind::Deleted
    }
}
