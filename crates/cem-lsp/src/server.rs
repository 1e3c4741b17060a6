//! The LSP backend.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DiagnosticOptions,
    DiagnosticServerCapabilities, DidChangeConfigurationParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    DocumentDiagnosticParams, DocumentDiagnosticReport, DocumentDiagnosticReportResult,
    DocumentSymbolParams, DocumentSymbolResponse, FullDocumentDiagnosticReport, Hover,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    Location, MessageType, OneOf, ReferenceParams, RelatedFullDocumentDiagnosticReport,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp_server::{jsonrpc::Result, Client, LanguageServer};

use cem_generate::GenerateSession;
use cem_workspace::WorkspaceContext;

use crate::config::LspConfig;
use crate::document::ServerState;
use crate::handlers::{completion, diagnostics, hover, references, symbols};
use crate::lifecycle;

pub struct Backend {
    client: Client,
    state: RwLock<Option<Arc<ServerState>>>,
    config: Arc<RwLock<LspConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: RwLock::new(None),
            config: Arc::new(RwLock::new(LspConfig::default())),
        }
    }

    async fn state(&self) -> Option<Arc<ServerState>> {
        self.state.read().await.clone()
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::INCREMENTAL,
            )),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(vec![
                    "<".into(),
                    "\"".into(),
                    "=".into(),
                    " ".into(),
                ]),
                resolve_provider: Some(false),
                ..Default::default()
            }),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            references_provider: Some(OneOf::Left(true)),
            document_symbol_provider: Some(OneOf::Left(true)),
            diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
                identifier: Some("cem".into()),
                inter_file_dependencies: true,
                workspace_diagnostics: false,
                ..Default::default()
            })),
            ..Default::default()
        }
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing cem language server");

        if let Some(options) = params.initialization_options {
            match serde_json::from_value::<LspConfig>(options) {
                Ok(config) => *self.config.write().await = config,
                Err(error) => tracing::warn!("invalid initialization options: {error}"),
            }
        }

        #[allow(deprecated)]
        let root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().into());

        let ctx = WorkspaceContext::discover(&root).unwrap_or_else(|_| {
            WorkspaceContext::rooted(root.clone())
        });
        let generate_config = {
            let config = self.config.read().await;
            config.generate.clone()
        };
        let session = GenerateSession::new(ctx, generate_config);
        *self.state.write().await = Some(Arc::new(ServerState::new(session)));

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "cem-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let Some(state) = self.state().await else {
            return;
        };

        // Initial manifest build, then the tag index, then file watching.
        match state.session.generate(&CancellationToken::new()).await {
            Ok((package, errors)) => {
                state.rebuild_tag_index();
                tracing::info!(
                    modules = package.modules.len(),
                    tags = state.tag_index.len(),
                    "initial manifest generated"
                );
                if !errors.is_empty() {
                    self.client
                        .log_message(
                            MessageType::WARNING,
                            format!("manifest generated with {} warning(s)", errors.len()),
                        )
                        .await;
                }
            }
            Err(error) => {
                tracing::error!("initial generate failed: {error}");
                self.client
                    .log_message(MessageType::ERROR, format!("generate failed: {error}"))
                    .await;
            }
        }

        *state.watcher.lock() = lifecycle::start_watcher(&state);
        self.client
            .log_message(MessageType::INFO, "cem-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down cem language server");
        if let Some(state) = self.state().await {
            state.watcher.lock().take();
            state.session.close();
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(state) = self.state().await else {
            return;
        };
        tracing::info!("document opened: {:?}", params.text_document.uri);
        lifecycle::handle_document_open(
            params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
            state,
            self.client.clone(),
            Arc::clone(&self.config),
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(state) = self.state().await else {
            return;
        };
        lifecycle::handle_document_change(
            params.text_document.uri,
            params.content_changes,
            params.text_document.version,
            state,
            self.client.clone(),
            Arc::clone(&self.config),
        )
        .await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(state) = self.state().await else {
            return;
        };
        lifecycle::handle_document_save(
            params.text_document.uri,
            state,
            self.client.clone(),
            Arc::clone(&self.config),
        )
        .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Some(state) = self.state().await {
            tracing::info!("document closed: {:?}", params.text_document.uri);
            lifecycle::handle_document_close(&params.text_document.uri, &state);
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match serde_json::from_value::<LspConfig>(params.settings) {
            Ok(config) => {
                tracing::info!("configuration updated");
                *self.config.write().await = config;
            }
            Err(error) => tracing::warn!("ignoring invalid configuration: {error}"),
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        Ok(hover::handle_hover(state, params).await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        Ok(completion::handle_completion(state, params).await)
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        let config = self.config.read().await.references.clone();
        Ok(references::handle_references(state, params, &config).await)
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        Ok(symbols::handle_document_symbol(state, params).await)
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let items = match self.state().await {
            Some(state) => {
                let config = self.config.read().await.diagnostics.clone();
                diagnostics::handle_diagnostics(state, &params.text_document.uri, &config).await
            }
            None => Vec::new(),
        };

        Ok(DocumentDiagnosticReportResult::Report(
            DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_capabilities() {
        let caps = Backend::server_capabilities();
        assert!(matches!(
            caps.text_document_sync,
            Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL))
        ));
        let completion = caps.completion_provider.unwrap();
        assert!(completion
            .trigger_characters
            .unwrap()
            .contains(&"<".to_string()));
        assert!(caps.hover_provider.is_some());
        assert!(caps.references_provider.is_some());
        assert!(caps.document_symbol_provider.is_some());
        assert!(caps.diagnostic_provider.is_some());
    }

    #[tokio::test]
    async fn backend_creation() {
        let (_service, _socket) = tower_lsp_server::LspService::build(Backend::new).finish();
    }
}
