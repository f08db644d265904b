use crate::corpus::{chunk_id, ChunkCorpus};
use crate::engine::VectorEngine;
use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use context_protocol::{language_for_path, Chunk, IndexScope, InlineProjectContext, UpdateMode};
use std::path::{Component, Path, PathBuf};

/// Lines per chunk when splitting a file.
pub const DEFAULT_WINDOW_LINES: usize = 50;
/// Chunks returned per query.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// In-process engine that splits files into fixed line windows and ranks them
/// by query-term overlap.
///
/// No embeddings are computed: every chunk carries an empty vector. Useful as
/// a local fallback and for exercising the controller end to end.
pub struct MemoryVectorEngine {
    corpus: ChunkCorpus,
    root: Option<PathBuf>,
    client_name: Option<String>,
    window_lines: usize,
    limit: usize,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryVectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVectorEngine {
    pub fn new() -> Self {
        Self {
            corpus: ChunkCorpus::new(),
            root: None,
            client_name: None,
            window_lines: DEFAULT_WINDOW_LINES,
            limit: DEFAULT_QUERY_LIMIT,
            snapshot_path: None,
        }
    }

    #[must_use]
    pub fn with_window_lines(mut self, window_lines: usize) -> Self {
        self.window_lines = window_lines.max(1);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Persist the corpus to `path` after every change and reload it on start.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn corpus(&self) -> &ChunkCorpus {
        &self.corpus
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    fn root(&self) -> Result<&Path> {
        self.root.as_deref().ok_or(VectorStoreError::NotStarted)
    }

    async fn load_file(&self, root: &Path, path: &Path) -> Option<(String, Vec<Chunk>)> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                return None;
            }
        };
        let Ok(text) = String::from_utf8(bytes) else {
            log::debug!("Skipping non-UTF-8 file {}", path.display());
            return None;
        };

        let relative = relative_path(root, path);
        let language = language_for_path(path).map(str::to_string);
        let lines: Vec<&str> = text.lines().collect();
        let chunks = lines
            .chunks(self.window_lines)
            .enumerate()
            .map(|(index, window)| {
                let start_line = index * self.window_lines + 1;
                let end_line = start_line + window.len() - 1;
                Chunk {
                    file_path: path.to_string_lossy().into_owned(),
                    relative_path: Some(relative.clone()),
                    content: window.join("\n"),
                    programming_language: language.clone(),
                    start_line: Some(start_line),
                    end_line: Some(end_line),
                    id: chunk_id(&relative, start_line, end_line),
                    index,
                    vector: Vec::new(),
                }
            })
            .collect();
        Some((relative, chunks))
    }

    async fn persist(&self) -> Result<()> {
        if let Some(path) = &self.snapshot_path {
            self.corpus.save(path).await?;
        }
        Ok(())
    }

    fn rank(&self, query: &str) -> Vec<(usize, &Chunk)> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Chunk)> = self
            .corpus
            .chunks()
            .filter_map(|chunk| {
                let haystack = chunk.content.to_lowercase();
                let score: usize = terms
                    .iter()
                    .map(|term| haystack.matches(term.as_str()).count())
                    .sum();
                (score > 0).then_some((score, chunk))
            })
            .collect();
        // Stable: equal scores keep corpus order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
    }
}

#[async_trait]
impl VectorEngine for MemoryVectorEngine {
    async fn start(&mut self, client_name: &str, root: &Path) -> Result<()> {
        log::info!(
            "Starting in-memory context engine for {client_name} at {}",
            root.display()
        );
        self.client_name = Some(client_name.to_string());
        self.root = Some(root.to_path_buf());

        if let Some(path) = self.snapshot_path.as_deref().filter(|p| p.exists()) {
            match ChunkCorpus::load(path).await {
                Ok(corpus) => {
                    log::info!(
                        "Loaded {} chunks from {}",
                        corpus.chunk_count(),
                        path.display()
                    );
                    self.corpus = corpus;
                }
                Err(e) => log::warn!("Ignoring unreadable snapshot {}: {e}", path.display()),
            }
        }
        Ok(())
    }

    async fn build_index(
        &mut self,
        files: &[PathBuf],
        root: &Path,
        scope: IndexScope,
    ) -> Result<()> {
        self.root()?;
        if scope == IndexScope::All {
            self.corpus.clear();
        }

        for path in files {
            if let Some((relative, chunks)) = self.load_file(root, path).await {
                self.corpus.set_file_chunks(relative, chunks);
            }
        }

        log::info!(
            "Built {} index: {} files, {} chunks",
            scope.as_str(),
            self.corpus.file_count(),
            self.corpus.chunk_count()
        );
        self.persist().await
    }

    async fn update_index(&mut self, files: &[PathBuf], mode: UpdateMode) -> Result<()> {
        let root = self.root()?.to_path_buf();
        for path in files {
            match mode {
                UpdateMode::Add | UpdateMode::Update => {
                    if let Some((relative, chunks)) = self.load_file(&root, path).await {
                        self.corpus.set_file_chunks(relative, chunks);
                    }
                }
                UpdateMode::Remove => {
                    let relative = relative_path(&root, path);
                    if !self.corpus.remove_file(&relative) {
                        log::debug!("{relative} was not indexed");
                    }
                }
            }
        }
        self.persist().await
    }

    async fn query_vector_index(&self, query: &str) -> Result<Vec<Chunk>> {
        self.root()?;
        Ok(self
            .rank(query)
            .into_iter()
            .take(self.limit)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }

    async fn query_inline_project_context(
        &self,
        query: &str,
        file_path: &str,
        target: &str,
    ) -> Result<Vec<InlineProjectContext>> {
        self.root()?;
        log::debug!("Inline context query for {file_path} (target: {target})");
        Ok(self
            .rank(query)
            .into_iter()
            .filter(|(_, chunk)| {
                chunk.file_path != file_path && chunk.relative_path.as_deref() != Some(file_path)
            })
            .take(self.limit)
            .map(|(score, chunk)| InlineProjectContext {
                content: chunk.content.clone(),
                file_path: chunk.file_path.clone(),
                score: Some(score as f32),
            })
            .collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.corpus.clear();
        if let Some(path) = &self.snapshot_path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// `/`-separated path of `path` below `root`, or the full path when it lies
/// outside.
fn relative_path(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.to_string_lossy().into_owned();
    };
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}
