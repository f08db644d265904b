//! # Context Vector Store
//!
//! The boundary to the engine that holds the local project index, plus a
//! lexical in-process engine.
//!
//! ## Architecture
//!
//! ```text
//! Discovered files
//!     │
//!     ├──> VectorEngine::build_index / update_index
//!     │      └─> Chunk corpus (per file, line windows)
//!     │
//!     └──> VectorEngine::query_vector_index
//!            └─> Chunk[] (ranked)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_protocol::IndexScope;
//! use context_vector_store::{MemoryVectorEngine, VectorEngine};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> context_vector_store::Result<()> {
//!     let root = Path::new("/path/to/project");
//!     let mut engine = MemoryVectorEngine::new();
//!     engine.start("example", root).await?;
//!     engine
//!         .build_index(&[root.join("src/lib.rs")], root, IndexScope::All)
//!         .await?;
//!
//!     for chunk in engine.query_vector_index("error handling").await? {
//!         println!("{}:{:?}", chunk.file_path, chunk.start_line);
//!     }
//!     Ok(())
//! }
//! ```

mod corpus;
mod engine;
mod error;
mod memory;

pub use corpus::{ChunkCorpus, CORPUS_SNAPSHOT_VERSION};
pub use engine::VectorEngine;
pub use error::{Result, VectorStoreError};
pub use memory::{MemoryVectorEngine, DEFAULT_QUERY_LIMIT, DEFAULT_WINDOW_LINES};
