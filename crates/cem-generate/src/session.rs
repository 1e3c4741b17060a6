//! The long-lived generation session.
//!
//! Owns the workspace context, parser pool, query manager, external type
//! resolver, and the in-memory package. Full generation fans file analysis
//! out over a bounded worker pool; incremental merges replace modules by
//! path under the package write lock.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use cem_analyze::{Analyzer, ModuleAnalysis, TemplateRange};
use cem_core::{CemError, Config, ErrorSink, Module, Package, Result};
use cem_demos::DesignTokens;
use cem_resolver::TypeResolver;
use cem_syntax::{ParserPool, QueryManager};
use cem_workspace::{source_files, WorkspaceContext};

/// Upper bound accepted by [`GenerateSession::set_max_workers`].
const MAX_WORKERS: usize = 256;

fn cpu_workers() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// The manifest generation session.
pub struct GenerateSession {
    ctx: WorkspaceContext,
    config: Config,
    pool: ParserPool,
    queries: Arc<QueryManager>,
    analyzer: Analyzer,
    manifest: RwLock<Package>,
    /// `module.path` to its index in the published package.
    path_index: DashMap<String, usize>,
    /// Secondary per-module template index for the language server.
    templates: DashMap<String, Vec<TemplateRange>>,
    max_workers: usize,
}

impl GenerateSession {
    /// Initializes a session: discovers the workspace and wires the
    /// resolver, pool, and query manager together.
    pub fn new(ctx: WorkspaceContext, config: Config) -> Self {
        let pool = ParserPool::new();
        let queries = Arc::new(QueryManager::new());
        let resolver = Arc::new(TypeResolver::new(
            ctx.clone(),
            pool.clone(),
            Arc::clone(&queries),
        ));
        let analyzer = Analyzer::new(
            pool.clone(),
            Arc::clone(&queries),
            Some(resolver),
            config.source_control_root_url.clone(),
        );

        Self {
            ctx,
            config,
            pool,
            queries,
            analyzer,
            manifest: RwLock::new(Package::new()),
            path_index: DashMap::new(),
            templates: DashMap::new(),
            max_workers: cpu_workers(),
        }
    }

    pub fn workspace(&self) -> &WorkspaceContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Worker-count override: `n <= 0` restores the CPU count, anything
    /// else is clamped.
    pub fn set_max_workers(&mut self, n: i64) {
        self.max_workers = if n <= 0 {
            cpu_workers()
        } else {
            (n as usize).min(MAX_WORKERS)
        };
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Full manifest generation.
    ///
    /// Analyzes every configured source file in parallel, merges the
    /// partial modules into a fresh package in lexicographic path order,
    /// attaches demos and token annotations, publishes the package under
    /// the write lock, and returns a deep copy together with the joined
    /// non-fatal errors. Cancellation leaves the published manifest
    /// untouched.
    pub async fn generate(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Package, Vec<CemError>)> {
        let files = source_files(&self.ctx, &self.config.generate)?;
        tracing::info!(files = files.len(), workers = self.max_workers, "generate started");

        let mut sink = ErrorSink::new();
        let results: Vec<(String, Result<ModuleAnalysis>, ErrorSink)> = stream::iter(files)
            .map(|path| {
                let analyzer = self.analyzer.clone();
                let ctx = self.ctx.clone();
                let cancel = cancel.clone();
                async move {
                    let relative = path.to_string_lossy().into_owned();
                    tokio::task::spawn_blocking(move || {
                        let mut file_sink = ErrorSink::new();
                        let analysis = ctx
                            .read_file(Path::new(&relative))
                            .and_then(|source| {
                                analyzer.analyze_module(
                                    &relative,
                                    &source,
                                    &cancel,
                                    &mut file_sink,
                                )
                            });
                        (relative, analysis, file_sink)
                    })
                    .await
                    .expect("analysis worker must not panic")
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }

        // Lexicographic path order fixes the module order of the package.
        let mut analyses: Vec<(String, ModuleAnalysis)> = Vec::new();
        for (path, result, file_sink) in results {
            sink.join(file_sink);
            match result {
                Ok(analysis) => analyses.push((path, analysis)),
                Err(CemError::Cancelled) => return Err(CemError::Cancelled),
                Err(error) => sink.push(error),
            }
        }
        analyses.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut package = Package::new();
        let mut templates: Vec<(String, Vec<TemplateRange>)> = Vec::new();
        for (path, analysis) in analyses {
            templates.push((path, analysis.templates));
            package.modules.push(analysis.module);
        }

        for error in crate::merge::enforce_tag_uniqueness(&mut package) {
            sink.push(error);
        }
        crate::inherit::resolve_inheritance(&mut package);

        self.run_demo_discovery(&mut package, &mut sink);
        self.run_token_annotation(&mut package, &mut sink);

        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }

        // Publish.
        {
            let mut manifest = self.manifest.write();
            *manifest = package.deep_clone();
            self.templates.clear();
            for (path, ranges) in templates {
                self.templates.insert(path, ranges);
            }
            self.rebuild_path_index(&manifest);
        }

        tracing::info!(
            modules = package.modules.len(),
            errors = sink.len(),
            "generate finished"
        );
        Ok((package, sink.into_errors()))
    }

    fn run_demo_discovery(&self, package: &mut Package, sink: &mut ErrorSink) {
        match cem_demos::discover(&self.ctx, &self.config, &self.pool, &self.queries) {
            Ok(map) => cem_demos::attach_demos(package, &map),
            Err(error) => sink.push(error),
        }
    }

    fn run_token_annotation(&self, package: &mut Package, sink: &mut ErrorSink) {
        let tokens_config = &self.config.generate.design_tokens;
        let (Some(spec), Some(prefix)) = (&tokens_config.spec, &tokens_config.prefix) else {
            return;
        };
        match DesignTokens::from_file(&self.ctx, spec) {
            Ok(tokens) => tokens.annotate_package(package, prefix),
            Err(error) => sink.push(error),
        }
    }

    /// Shallow copy for read-only observers.
    pub fn in_memory_manifest(&self) -> Package {
        self.manifest.read().clone()
    }

    /// Full deep copy for mutation-safe observers.
    pub fn in_memory_manifest_deep(&self) -> Package {
        self.manifest.read().deep_clone()
    }

    /// O(1) module lookup through the path index.
    pub fn module_by_path(&self, path: &str) -> Option<Module> {
        let index = *self.path_index.get(path)?;
        self.manifest.read().modules.get(index).cloned()
    }

    /// Replaces modules by path (preserving their positions), appends new
    /// modules at the end, and rebuilds the path index.
    pub fn merge_modules_into_manifest(&self, modules: Vec<Module>) -> Vec<CemError> {
        let mut manifest = self.manifest.write();
        crate::merge::merge_modules(&mut manifest, modules);
        let errors = crate::merge::enforce_tag_uniqueness(&mut manifest);
        self.rebuild_path_index(&manifest);
        errors
    }

    /// Drops a deleted file's module and its template index entry.
    pub fn remove_module(&self, path: &str) -> bool {
        let mut manifest = self.manifest.write();
        let removed = crate::merge::remove_module(&mut manifest, path);
        if removed {
            self.templates.remove(path);
            self.rebuild_path_index(&manifest);
        }
        removed
    }

    /// Analyzes one file from disk and merges the result, updating the
    /// template index. The incremental path used by the language server.
    pub fn reanalyze_file(
        &self,
        path: &str,
        source: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<CemError>> {
        let mut sink = ErrorSink::new();
        let analysis = self
            .analyzer
            .analyze_module(path, source, cancel, &mut sink)?;
        self.templates.insert(path.to_string(), analysis.templates);
        let mut errors = sink.into_errors();
        errors.extend(self.merge_modules_into_manifest(vec![analysis.module]));
        Ok(errors)
    }

    /// Template index of a module, for embedded-language dispatch.
    pub fn templates_for(&self, path: &str) -> Vec<TemplateRange> {
        self.templates
            .get(path)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Releases parsers and compiled queries.
    pub fn close(&self) {
        self.pool.clear();
        self.queries.close();
    }

    fn rebuild_path_index(&self, manifest: &Package) {
        self.path_index.clear();
        for (index, module) in manifest.modules.iter().enumerate() {
            self.path_index.insert(module.path.clone(), index);
        }
    }
}
