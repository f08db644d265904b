//! # Context Indexer
//!
//! Workspace discovery and the project context controller.
//!
//! ## Pipeline
//!
//! ```text
//! Workspace folders
//!     │
//!     ├──> Root resolver
//!     │      └─> Common workspace root
//!     │
//!     ├──> File Scanner (ignore patterns, size budget)
//!     │      └─> Absolute file paths
//!     │
//!     └──> Vector engine (build / update index)
//!            └─> Chunks ──> ChunkAggregator ──> Relevant documents
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_indexer::{DiscoveryRequest, FileScanner};
//! use context_protocol::{ContextConfiguration, WorkspaceFolder};
//!
//! let folders = vec![WorkspaceFolder::from_path("/path/to/project")];
//! let request = DiscoveryRequest::from_configuration(&folders, &ContextConfiguration::default());
//! let (files, stats) = FileScanner::new().discover_with_stats(&request);
//!
//! println!("Found {} files ({} bytes)", files.len(), stats.bytes);
//! ```

mod budget;
mod cancel;
mod controller;
mod error;
mod ignore_rules;
mod limits;
mod root;
mod scanner;
mod stats;

pub use budget::{mb_to_bytes, SizeBudgetTracker, BYTES_PER_MB};
pub use cancel::CancellationFlag;
pub use controller::ProjectContextController;
pub use error::{IndexerError, Result};
pub use ignore_rules::{ExtensionFilter, IgnoreMatcher};
pub use limits::{walk_threads_from_env, DISCOVERY_THREADS_ENV, MAX_WALK_THREADS};
pub use root::{find_common_workspace_root, workspace_folder_path};
pub use scanner::{DiscoveryRequest, FileScanner};
pub use stats::DiscoveryStats;
