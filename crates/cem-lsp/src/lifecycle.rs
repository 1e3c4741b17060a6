//! Document lifecycle: open/change/save/close, debounced re-analysis, and
//! workspace file-event handling.
//!
//! Per-document state machine: Closed → Opened → Modified* → Saved →
//! Closed. Analysis runs on open and on the first modification after the
//! debounce interval; a newer change supersedes a pending analysis through
//! the generation counter.
//!
//! The analysis cores are client-free; the `handle_*` entry points wrap
//! them and push diagnostics to the editor.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{TextDocumentContentChangeEvent, Uri};
use tower_lsp_server::Client;

use cem_workspace::{FileWatcher, WatchEvent, WatchKind, DEBOUNCE_WINDOW};

use crate::config::LspConfig;
use crate::document::{apply_change, DocumentLanguage, DocumentState, ServerState};
use crate::handlers::diagnostics;

/// How a debounced analysis task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// The task held the newest generation and patched the manifest.
    Analyzed,
    /// A later change arrived before the debounce expired; nothing ran.
    Superseded,
}

/// Records an opened document and, for script modules, analyzes it
/// immediately. Returns `None` for documents the server does not track.
pub fn open_and_analyze(
    state: &Arc<ServerState>,
    uri: Uri,
    text: String,
    version: i32,
) -> Option<DocumentState> {
    let doc = state.open_document(uri, text, version)?;
    if doc.language == DocumentLanguage::Script {
        reanalyze(state, &doc.path, doc.text.as_bytes());
    }
    Some(doc)
}

/// Applies incremental changes to the document store in arrival order and
/// returns the updated state. `None` when the document is not open.
pub fn apply_changes(
    state: &ServerState,
    uri: &Uri,
    changes: Vec<TextDocumentContentChangeEvent>,
    version: i32,
) -> Option<DocumentState> {
    let mut doc = state.documents.get_mut(uri)?;
    for change in changes {
        apply_change(&mut doc.text, change.range, &change.text);
    }
    doc.version = version;
    Some(doc.clone())
}

/// Schedules a debounced re-analysis of one module snapshot.
///
/// The task claims the document's current analysis generation up front; if
/// a later snapshot claims a newer one before the debounce expires, this
/// task wakes, notices, and discards its work.
pub fn schedule_reanalysis(
    state: Arc<ServerState>,
    uri: &Uri,
    path: String,
    snapshot: String,
    debounce: Duration,
) -> JoinHandle<DebounceOutcome> {
    let (generation, counter) = state.next_generation(uri);

    tokio::spawn(async move {
        tokio::time::sleep(debounce).await;
        if counter.load(Ordering::SeqCst) != generation {
            return DebounceOutcome::Superseded;
        }
        reanalyze_blocking(state, path, snapshot.into_bytes()).await;
        DebounceOutcome::Analyzed
    })
}

/// Re-reads a saved script module from disk so the manifest reflects what
/// other tools will see. Returns true when an analysis ran.
pub fn save_from_disk(state: &Arc<ServerState>, uri: &Uri) -> bool {
    let Some(doc) = state.documents.get(uri) else {
        return false;
    };
    let path = doc.path.clone();
    let language = doc.language;
    drop(doc);

    if language != DocumentLanguage::Script {
        return false;
    }
    let Ok(bytes) = state
        .session
        .workspace()
        .read_file(std::path::Path::new(&path))
    else {
        return false;
    };
    reanalyze(state, &path, &bytes);
    true
}

/// Dispatches one coalesced workspace file event.
///
/// Changed modules are re-analyzed from disk unless an open editor buffer
/// is authoritative for them; deleted modules are dropped from the
/// manifest and the tag index.
pub fn handle_watch_event(state: &Arc<ServerState>, event: &WatchEvent) {
    let relative = state.session.workspace().relative(&event.path);
    if DocumentLanguage::for_path(&relative) != Some(DocumentLanguage::Script) {
        return;
    }
    let open = state
        .documents
        .iter()
        .any(|entry| entry.value().path == relative);
    if open {
        return;
    }

    match event.kind {
        WatchKind::Deleted => {
            if state.session.remove_module(&relative) {
                state.rebuild_tag_index_for(&relative);
                tracing::info!(path = relative, "module removed");
            }
        }
        WatchKind::Created | WatchKind::Changed => {
            if let Ok(bytes) = state
                .session
                .workspace()
                .read_file(std::path::Path::new(&relative))
            {
                reanalyze(state, &relative, &bytes);
            }
        }
    }
}

/// Runs one synchronous module analysis and patches manifest + tag index.
fn reanalyze(state: &Arc<ServerState>, path: &str, source: &[u8]) {
    match state
        .session
        .reanalyze_file(path, source, &CancellationToken::new())
    {
        Ok(errors) => {
            state.rebuild_tag_index_for(path);
            if !errors.is_empty() {
                tracing::debug!(path, errors = errors.len(), "re-analysis reported warnings");
            }
        }
        Err(error) => tracing::warn!(path, "re-analysis failed: {error}"),
    }
}

/// Analysis off the dispatch loop, for the debounced path.
async fn reanalyze_blocking(state: Arc<ServerState>, path: String, source: Vec<u8>) {
    let result =
        tokio::task::spawn_blocking(move || reanalyze(&state, &path, &source)).await;
    if let Err(join_error) = result {
        tracing::error!("analysis task panicked: {join_error}");
    }
}

/// Opens a document, analyzes script modules, and publishes diagnostics.
/// The analysis runs off the dispatch loop.
pub async fn handle_document_open(
    uri: Uri,
    text: String,
    version: i32,
    state: Arc<ServerState>,
    client: Client,
    config: Arc<tokio::sync::RwLock<LspConfig>>,
) {
    let task_state = Arc::clone(&state);
    let task_uri = uri.clone();
    let opened = tokio::task::spawn_blocking(move || {
        open_and_analyze(&task_state, task_uri, text, version).is_some()
    })
    .await
    .unwrap_or(false);

    if !opened {
        tracing::debug!("unsupported document: {:?}", uri);
        return;
    }
    publish_diagnostics(&state, &client, &uri, &config).await;
}

/// Applies changes and schedules the superseding debounced re-analysis.
pub async fn handle_document_change(
    uri: Uri,
    changes: Vec<TextDocumentContentChangeEvent>,
    version: i32,
    state: Arc<ServerState>,
    client: Client,
    config: Arc<tokio::sync::RwLock<LspConfig>>,
) {
    let Some(doc) = apply_changes(&state, &uri, changes, version) else {
        return;
    };

    if doc.language != DocumentLanguage::Script {
        // HTML documents carry no manifest modules; refresh diagnostics
        // directly.
        publish_diagnostics(&state, &client, &uri, &config).await;
        return;
    }

    let debounce = Duration::from_millis(config.read().await.analysis.debounce_ms);
    let task = schedule_reanalysis(Arc::clone(&state), &uri, doc.path, doc.text, debounce);

    tokio::spawn(async move {
        if matches!(task.await, Ok(DebounceOutcome::Analyzed)) {
            publish_diagnostics(&state, &client, &uri, &config).await;
        }
    });
}

pub async fn handle_document_save(
    uri: Uri,
    state: Arc<ServerState>,
    client: Client,
    config: Arc<tokio::sync::RwLock<LspConfig>>,
) {
    let task_state = Arc::clone(&state);
    let task_uri = uri.clone();
    let _ = tokio::task::spawn_blocking(move || save_from_disk(&task_state, &task_uri)).await;
    publish_diagnostics(&state, &client, &uri, &config).await;
}

pub fn handle_document_close(uri: &Uri, state: &ServerState) {
    state.close_document(uri);
}

async fn publish_diagnostics(
    state: &Arc<ServerState>,
    client: &Client,
    uri: &Uri,
    config: &Arc<tokio::sync::RwLock<LspConfig>>,
) {
    let diagnostics_config = config.read().await.diagnostics.clone();
    let items =
        diagnostics::handle_diagnostics(Arc::clone(state), uri, &diagnostics_config).await;
    client.publish_diagnostics(uri.clone(), items, None).await;
}

/// Subscribes to workspace file events for the session's lifetime.
pub fn start_watcher(state: &Arc<ServerState>) -> Option<FileWatcher> {
    let root = state.session.workspace().root().to_path_buf();
    let (watcher, mut events) = match FileWatcher::start(&root, DEBOUNCE_WINDOW) {
        Ok(pair) => pair,
        Err(error) => {
            tracing::warn!("file watching disabled: {error}");
            return None;
        }
    };

    let state = Arc::clone(state);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let state = Arc::clone(&state);
            let outcome =
                tokio::task::spawn_blocking(move || handle_watch_event(&state, &event)).await;
            if let Err(join_error) = outcome {
                tracing::error!("watch dispatch panicked: {join_error}");
            }
        }
    });

    Some(watcher)
}
