use crate::error::{Result, VectorStoreError};
use context_protocol::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const CORPUS_SNAPSHOT_VERSION: u32 = 1;

/// Line-window chunks of the indexed files, keyed by `/`-separated relative
/// path so iteration follows path order.
#[derive(Debug, Clone, Default)]
pub struct ChunkCorpus {
    files: BTreeMap<String, Vec<Chunk>>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    files: &'a BTreeMap<String, Vec<Chunk>>,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    files: BTreeMap<String, Vec<Chunk>>,
}

impl ChunkCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a snapshot written by [`ChunkCorpus::save`].
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != CORPUS_SNAPSHOT_VERSION {
            return Err(VectorStoreError::IndexError(format!(
                "{} has snapshot version {}, expected {CORPUS_SNAPSHOT_VERSION}",
                path.display(),
                snapshot.version
            )));
        }
        Ok(Self {
            files: snapshot.files,
        })
    }

    /// Write to a staging file beside `path`, then rename it into place.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&SnapshotRef {
            version: CORPUS_SNAPSHOT_VERSION,
            files: &self.files,
        })?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, path).await?;
        Ok(())
    }

    /// Replace whatever was indexed for `relative_path`.
    pub fn set_file_chunks(&mut self, relative_path: String, chunks: Vec<Chunk>) {
        self.files.insert(relative_path, chunks);
    }

    /// Returns whether the file was indexed.
    pub fn remove_file(&mut self, relative_path: &str) -> bool {
        self.files.remove(relative_path).is_some()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// All chunks, file by file in path order, each file's chunks in line order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.files.values().flatten()
    }
}

/// Stable chunk id: `relative_path:start_line:end_line`.
pub(crate) fn chunk_id(relative_path: &str, start_line: usize, end_line: usize) -> String {
    format!("{relative_path}:{start_line}:{end_line}")
}
