//! Filesystem watching with event coalescing.
//!
//! Raw notify events arrive on the watcher's own thread and are forwarded
//! into a tokio task that coalesces them over a debounce window before
//! surfacing [`WatchEvent`]s. A burst of writes to one file produces a
//! single event.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;

use cem_core::{CemError, Result};

/// Default coalescing window.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Created,
    Changed,
    Deleted,
}

/// A coalesced filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchKind,
}

/// Merges a newly observed kind into one already buffered for the path
/// within the current window.
fn merge_kinds(buffered: WatchKind, incoming: WatchKind) -> WatchKind {
    match (buffered, incoming) {
        // A file created and rewritten within the window is still new.
        (WatchKind::Created, WatchKind::Changed) => WatchKind::Created,
        // Deleted then re-created collapses to a change.
        (WatchKind::Deleted, WatchKind::Created) => WatchKind::Changed,
        (_, incoming) => incoming,
    }
}

/// A running filesystem watcher. Dropping it stops the underlying notify
/// watcher and closes the event stream.
pub struct FileWatcher {
    // Held for its Drop; the watch stops when this goes away.
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watches `root` recursively, emitting coalesced events on the
    /// returned channel after `window` of quiescence per burst.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        root: &Path,
        window: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<WatchEvent>();

        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("watch error: {e}");
                        return;
                    }
                };
                let kind = match event.kind {
                    notify::EventKind::Create(_) => WatchKind::Created,
                    notify::EventKind::Modify(_) => WatchKind::Changed,
                    notify::EventKind::Remove(_) => WatchKind::Deleted,
                    _ => return,
                };
                for path in event.paths {
                    let _ = raw_tx.send(WatchEvent { path, kind });
                }
            })
            .map_err(|e| CemError::config(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| CemError::config(format!("failed to watch {}: {e}", root.display())))?;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(coalesce(raw_rx, out_tx, window));

        Ok((Self { _watcher: watcher }, out_rx))
    }
}

/// Buffers raw events per path and flushes once the stream stays quiet for
/// the window.
async fn coalesce(
    mut raw: mpsc::UnboundedReceiver<WatchEvent>,
    out: mpsc::UnboundedSender<WatchEvent>,
    window: Duration,
) {
    while let Some(first) = raw.recv().await {
        let mut pending: HashMap<PathBuf, WatchKind> = HashMap::new();
        pending.insert(first.path, first.kind);

        loop {
            tokio::select! {
                event = raw.recv() => match event {
                    Some(event) => {
                        pending
                            .entry(event.path)
                            .and_modify(|kind| *kind = merge_kinds(*kind, event.kind))
                            .or_insert(event.kind);
                    }
                    None => break,
                },
                () = tokio::time::sleep(window) => break,
            }
        }

        let mut events: Vec<_> = pending.into_iter().collect();
        events.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (path, kind) in events {
            if out.send(WatchEvent { path, kind }).is_err() {
                return;
            }
        }
    }
}
