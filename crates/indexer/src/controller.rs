use crate::error::{IndexerError, Result};
use crate::root::find_common_workspace_root;
use crate::scanner::{DiscoveryRequest, FileScanner};
use crate::stats::DiscoveryStats;
use context_protocol::{
    ContextConfiguration, IndexScope, QueryInlineProjectContextParams,
    QueryInlineProjectContextResult, QueryVectorIndexParams, QueryVectorIndexResult,
    RelevantDocument, UpdateMode, WorkspaceFolder,
};
use context_search::ChunkAggregator;
use context_vector_store::VectorEngine;
use std::path::{Path, PathBuf};

/// Owns the vector engine for one set of workspace folders.
///
/// Without an engine every query answers with an empty result, so callers
/// can keep using the controller after a failed start.
pub struct ProjectContextController {
    client_name: String,
    workspace_folders: Vec<WorkspaceFolder>,
    config: ContextConfiguration,
    scanner: FileScanner,
    aggregator: ChunkAggregator,
    root: Option<PathBuf>,
    engine: Option<Box<dyn VectorEngine>>,
}

impl ProjectContextController {
    pub fn new(client_name: impl Into<String>, workspace_folders: Vec<WorkspaceFolder>) -> Self {
        Self {
            client_name: client_name.into(),
            workspace_folders,
            config: ContextConfiguration::default(),
            scanner: FileScanner::new(),
            aggregator: ChunkAggregator::default(),
            root: None,
            engine: None,
        }
    }

    pub fn with_configuration(mut self, config: ContextConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn with_scanner(mut self, scanner: FileScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_aggregator(mut self, aggregator: ChunkAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn configuration(&self) -> &ContextConfiguration {
        &self.config
    }

    pub fn workspace_folders(&self) -> &[WorkspaceFolder] {
        &self.workspace_folders
    }

    /// Common root of the workspace folders, once `init` resolved it.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Start `engine` for the workspace and build the first index.
    ///
    /// Failures are logged; the controller then stays usable with project
    /// context disabled.
    pub async fn init(&mut self, mut engine: Box<dyn VectorEngine>) {
        let root = match find_common_workspace_root(&self.workspace_folders) {
            Ok(root) => root,
            Err(e) => {
                log::error!("Project context disabled: {e}");
                return;
            }
        };

        if let Err(e) = engine.start(&self.client_name, &root).await {
            log::error!("Vector engine failed to start for {}: {e}", root.display());
            return;
        }
        log::info!("Project context enabled for {}", root.display());

        self.root = Some(root);
        self.engine = Some(engine);
        self.update_configuration(None).await;
    }

    /// Clear and drop the engine.
    pub async fn dispose(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.clear().await {
                log::error!("Failed to clear vector engine: {e}");
            }
        }
        self.root = None;
    }

    /// Store `config` (if given) and rebuild the index under it.
    pub async fn update_configuration(&mut self, config: Option<ContextConfiguration>) {
        if let Some(config) = config {
            self.config = config;
        }
        if self.engine.is_none() {
            return;
        }
        if let Err(e) = self.rebuild_index().await {
            log::error!("Failed to rebuild project index: {e}");
        }
    }

    /// Discover every eligible file and hand the list to the engine.
    pub async fn rebuild_index(&mut self) -> Result<DiscoveryStats> {
        let (Some(engine), Some(root)) = (self.engine.as_mut(), self.root.as_ref()) else {
            return Err(IndexerError::EngineUnavailable);
        };

        let request = DiscoveryRequest::from_configuration(&self.workspace_folders, &self.config);
        let scanner = self.scanner;
        let (files, stats) =
            tokio::task::spawn_blocking(move || scanner.discover_with_stats(&request))
                .await
                .map_err(|e| IndexerError::Other(format!("Discovery task failed: {e}")))?;

        engine.build_index(&files, root, IndexScope::All).await?;
        log::info!("Indexed {} files ({} bytes)", stats.files, stats.bytes);
        Ok(stats)
    }

    /// Forward an incremental change to the engine. No-op without one.
    pub async fn update_index(&mut self, paths: &[PathBuf], mode: UpdateMode) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Err(e) = engine.update_index(paths, mode).await {
            log::error!("Index {mode:?} failed for {} files: {e}", paths.len());
        }
    }

    pub async fn query_inline_project_context(
        &self,
        params: &QueryInlineProjectContextParams,
    ) -> QueryInlineProjectContextResult {
        let Some(engine) = self.engine.as_ref() else {
            return QueryInlineProjectContextResult::default();
        };
        match engine
            .query_inline_project_context(&params.query, &params.file_path, &params.target)
            .await
        {
            Ok(inline_project_context) => QueryInlineProjectContextResult {
                inline_project_context,
            },
            Err(e) => {
                log::error!("Inline project context query failed: {e}");
                QueryInlineProjectContextResult::default()
            }
        }
    }

    pub async fn query_vector_index(
        &self,
        params: &QueryVectorIndexParams,
    ) -> QueryVectorIndexResult {
        let Some(engine) = self.engine.as_ref() else {
            return QueryVectorIndexResult::default();
        };
        match engine.query_vector_index(&params.query).await {
            Ok(chunks) => QueryVectorIndexResult { chunks },
            Err(e) => {
                log::error!("Vector index query failed: {e}");
                QueryVectorIndexResult::default()
            }
        }
    }

    /// Vector query folded into one document per file.
    pub async fn query_relevant_documents(
        &self,
        params: &QueryVectorIndexParams,
    ) -> Vec<RelevantDocument> {
        let result = self.query_vector_index(params).await;
        self.aggregator.aggregate(&result.chunks)
    }
}
