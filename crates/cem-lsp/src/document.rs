//! Server state and the authoritative document store.
//!
//! The store owns the text of every open editor buffer, applies
//! incremental `didChange` ranges in arrival order, and tracks a
//! generation counter per document so a newer change supersedes any
//! pending analysis triggered by an earlier one.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp_server::ls_types::{Position, Range, Uri};

use cem_core::{ClassDeclaration, Module};
use cem_generate::GenerateSession;
use cem_workspace::FileWatcher;

/// What the server knows about one open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Authoritative buffer text.
    pub text: String,
    pub version: i32,
    pub language: DocumentLanguage,
    /// Workspace-relative path (manifest module path for scripts).
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentLanguage {
    Script,
    Html,
}

impl DocumentLanguage {
    pub fn for_path(path: &str) -> Option<Self> {
        match Path::new(path).extension().and_then(|e| e.to_str())? {
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts" => Some(Self::Script),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A tag-index record pointing into the current manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub module_path: String,
    pub declaration: String,
}

/// Shared state behind the LSP backend.
pub struct ServerState {
    pub session: GenerateSession,
    pub documents: DashMap<Uri, DocumentState>,
    /// `tagName` to its declaration site in the manifest.
    pub tag_index: DashMap<String, TagRecord>,
    /// Per-document analysis generation; bumped on every change.
    generations: DashMap<Uri, Arc<AtomicU64>>,
    /// Keeps the workspace watcher alive for the session's lifetime.
    pub watcher: parking_lot::Mutex<Option<FileWatcher>>,
}

impl ServerState {
    pub fn new(session: GenerateSession) -> Self {
        Self {
            session,
            documents: DashMap::new(),
            tag_index: DashMap::new(),
            generations: DashMap::new(),
            watcher: parking_lot::Mutex::new(None),
        }
    }

    /// Records a newly opened document.
    pub fn open_document(&self, uri: Uri, text: String, version: i32) -> Option<DocumentState> {
        let path = self.workspace_relative(&uri)?;
        let language = DocumentLanguage::for_path(&path)?;
        let state = DocumentState {
            text,
            version,
            language,
            path,
        };
        self.documents.insert(uri, state.clone());
        Some(state)
    }

    pub fn close_document(&self, uri: &Uri) {
        self.documents.remove(uri);
        self.generations.remove(uri);
    }

    /// Bumps and returns the document's analysis generation. A debounced
    /// task holds its generation and aborts if a newer one appears.
    pub fn next_generation(&self, uri: &Uri) -> (u64, Arc<AtomicU64>) {
        let counter = self
            .generations
            .entry(uri.clone())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (generation, counter)
    }

    /// Workspace-relative path of a document URI.
    pub fn workspace_relative(&self, uri: &Uri) -> Option<String> {
        let path = uri.to_file_path()?;
        Some(self.session.workspace().relative(&path))
    }

    /// Rebuilds the whole tag index from the current manifest.
    pub fn rebuild_tag_index(&self) {
        self.tag_index.clear();
        let manifest = self.session.in_memory_manifest();
        for (module, class) in manifest.custom_elements() {
            if let Some(tag) = &class.tag_name {
                self.tag_index.insert(
                    tag.clone(),
                    TagRecord {
                        module_path: module.path.clone(),
                        declaration: class.name.clone(),
                    },
                );
            }
        }
    }

    /// Incrementally rebuilds the index entries owned by one module.
    pub fn rebuild_tag_index_for(&self, module_path: &str) {
        self.tag_index
            .retain(|_, record| record.module_path != module_path);
        if let Some(module) = self.session.module_by_path(module_path) {
            for declaration in &module.declarations {
                if let Some(class) = declaration.as_custom_element() {
                    if let Some(tag) = &class.tag_name {
                        self.tag_index.insert(
                            tag.clone(),
                            TagRecord {
                                module_path: module_path.to_string(),
                                declaration: class.name.clone(),
                            },
                        );
                    }
                }
            }
        }
    }

    /// Resolves a tag name to its manifest module and class declaration.
    pub fn element_for_tag(&self, tag: &str) -> Option<(Module, ClassDeclaration)> {
        let record = self.tag_index.get(tag)?;
        let module = self.session.module_by_path(&record.module_path)?;
        let class = module.declarations.iter().find_map(|d| match d {
            cem_core::Declaration::Class(c) if c.name == record.declaration => Some(c.clone()),
            _ => None,
        })?;
        Some((module, class))
    }
}

/// Applies one LSP content change to a buffer. `None` range means a full
/// replacement.
pub fn apply_change(text: &mut String, range: Option<Range>, new_text: &str) {
    match range {
        None => *text = new_text.to_string(),
        Some(range) => {
            let start = position_to_byte(text, range.start);
            let end = position_to_byte(text, range.end);
            if start <= end && end <= text.len() {
                text.replace_range(start..end, new_text);
            } else {
                tracing::warn!("out-of-bounds change range, replacing whole document");
                *text = new_text.to_string();
            }
        }
    }
}

/// Converts an LSP position (UTF-16 character offset) to a byte offset.
/// Positions past the end of a line clamp to the line end.
pub fn position_to_byte(text: &str, position: Position) -> usize {
    let mut offset = 0;
    for (line_number, line) in text.split_inclusive('\n').enumerate() {
        if line_number == position.line as usize {
            let mut utf16 = 0;
            for (byte, c) in line.char_indices() {
                if utf16 >= position.character as usize {
                    return offset + byte;
                }
                utf16 += c.len_utf16();
            }
            return offset + line.trim_end_matches('\n').trim_end_matches('\r').len();
        }
        offset += line.len();
    }
    text.len()
}

/// Converts a byte offset back to an LSP position.
pub fn byte_to_position(text: &str, target: usize) -> Position {
    let mut line = 0u32;
    let mut character = 0u32;
    for (byte, c) in text.char_indices() {
        if byte >= target {
            break;
        }
        if c == '\n' {
            line += 1;
            character = 0;
        } else {
            character += c.len_utf16() as u32;
        }
    }
    Position::new(line, character)
}
