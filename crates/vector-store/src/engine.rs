use crate::error::Result;
use async_trait::async_trait;
use context_protocol::{Chunk, IndexScope, InlineProjectContext, UpdateMode};
use std::path::{Path, PathBuf};

/// Boundary to the engine that stores and searches the local project index.
///
/// Callers serialize calls per workspace: at most one `build_index` or
/// `update_index` is in flight at a time. Taking `&mut self` for mutating
/// calls keeps that true for a single owner.
#[async_trait]
pub trait VectorEngine: Send + Sync {
    /// Prepare the engine for a workspace rooted at `root`.
    async fn start(&mut self, client_name: &str, root: &Path) -> Result<()>;

    /// Replace the index with the given files.
    async fn build_index(&mut self, files: &[PathBuf], root: &Path, scope: IndexScope)
        -> Result<()>;

    /// Apply an incremental change to the index.
    async fn update_index(&mut self, files: &[PathBuf], mode: UpdateMode) -> Result<()>;

    async fn query_vector_index(&self, query: &str) -> Result<Vec<Chunk>>;

    async fn query_inline_project_context(
        &self,
        query: &str,
        file_path: &str,
        target: &str,
    ) -> Result<Vec<InlineProjectContext>>;

    /// Drop everything the engine holds.
    async fn clear(&mut self) -> Result<()>;
}
