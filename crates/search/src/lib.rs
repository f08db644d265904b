//! # Context Search
//!
//! Shapes raw retrieval results for the assistant: chunks returned by the
//! vector engine are folded into one [`RelevantDocument`] per source file.
//!
//! ```
//! use context_protocol::Chunk;
//! use context_search::chunks_to_relevant_documents;
//!
//! let chunks = vec![
//!     Chunk {
//!         file_path: "/repo/src/t.js".into(),
//!         relative_path: Some("src/t.js".into()),
//!         content: "const a = 1;".into(),
//!         start_line: Some(2),
//!         ..Chunk::default()
//!     },
//!     Chunk {
//!         file_path: "/repo/src/t.js".into(),
//!         relative_path: Some("src/t.js".into()),
//!         content: "console.log(a);".into(),
//!         start_line: Some(1),
//!         ..Chunk::default()
//!     },
//! ];
//!
//! let docs = chunks_to_relevant_documents(&chunks);
//! assert_eq!(docs.len(), 1);
//! assert_eq!(docs[0].text.as_deref(), Some("console.log(a);\nconst a = 1;"));
//! ```
//!
//! [`RelevantDocument`]: context_protocol::RelevantDocument

mod aggregate;

pub use aggregate::{chunks_to_relevant_documents, ChunkAggregator};
