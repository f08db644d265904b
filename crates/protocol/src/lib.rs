//! Boundary types shared between the editor protocol layer, the indexer and
//! the vector engine.
//!
//! Everything here is plain data: it serializes as camelCase JSON so it can be
//! passed through the editor protocol unchanged.

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod language;

pub use language::{
    default_file_extensions, is_recognized_language, language_for_path, LANGUAGE_BY_EXTENSION,
    RECOGNIZED_LANGUAGES,
};

/// Per-file cap applied when the client does not configure one.
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 10.0;
/// Aggregate cap applied when the client does not configure one.
pub const DEFAULT_MAX_INDEX_SIZE_MB: f64 = 100.0;
/// Longest `relativeFilePath` ever returned to the assistant.
pub const MAX_RELATIVE_FILE_PATH_CHARS: usize = 4000;

/// A root directory opened by the client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFolder {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WorkspaceFolder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
        }
    }

    /// Build a folder from a local path, encoding it as a `file://` URI.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match url::Url::from_file_path(path) {
            Ok(uri) => Self::new(uri.to_string()),
            Err(()) => Self::new(path.to_string_lossy().into_owned()),
        }
    }

    /// Filesystem path of this folder.
    ///
    /// `file://` URIs are percent-decoded; a string without a scheme is taken
    /// as a path as-is. Returns `None` for URIs that do not name a local path.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        let raw = self.uri.trim();
        if raw.is_empty() {
            return None;
        }
        match url::Url::parse(raw) {
            Ok(uri) if uri.scheme() == "file" => uri.to_file_path().ok(),
            Ok(uri) if uri.scheme().len() > 1 => None,
            // Single-letter schemes are Windows drive letters, not URIs.
            Ok(_) | Err(_) => Some(PathBuf::from(raw)),
        }
    }
}

/// Options the client sends to scope local indexing.
///
/// Missing fields fall back to [`ContextConfiguration::default`]. A size cap
/// of `null` (or absent after an explicit override) means unbounded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfiguration {
    pub ignore_file_patterns: Vec<String>,
    pub include_sym_links: bool,
    pub max_file_size_mb: Option<f64>,
    pub max_index_size_mb: Option<f64>,
    pub file_extensions: Vec<String>,
}

impl Default for ContextConfiguration {
    fn default() -> Self {
        Self {
            ignore_file_patterns: Vec::new(),
            include_sym_links: false,
            max_file_size_mb: Some(DEFAULT_MAX_FILE_SIZE_MB),
            max_index_size_mb: Some(DEFAULT_MAX_INDEX_SIZE_MB),
            file_extensions: default_file_extensions(),
        }
    }
}

impl ContextConfiguration {
    /// Configuration with both size caps lifted.
    pub fn unbounded() -> Self {
        Self {
            max_file_size_mb: None,
            max_index_size_mb: None,
            ..Self::default()
        }
    }
}

/// Which part of the workspace an index build covers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexScope {
    #[default]
    All,
    Default,
}

impl IndexScope {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexScope::All => "all",
            IndexScope::Default => "default",
        }
    }
}

/// Incremental change applied to an existing index.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    Add,
    Remove,
    Update,
}

/// A retrieved fragment of a source file, as returned by the vector engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    /// First source line of the fragment (1-indexed), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default)]
    pub id: String,
    /// Position of the fragment within the batch that produced it.
    #[serde(default)]
    pub index: usize,
    /// Embedding; opaque to everything outside the engine.
    #[serde(default, alias = "vec")]
    pub vector: Vec<f32>,
}

impl Chunk {
    /// Key used to group fragments of the same file: the relative path when
    /// it is known and non-empty, the file path otherwise.
    pub fn file_key(&self) -> &str {
        match self.relative_path.as_deref() {
            Some(relative) if !relative.is_empty() => relative,
            _ => &self.file_path,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammingLanguage {
    pub language_name: String,
}

/// One file's worth of retrieved context, shaped for the assistant.
///
/// Every field is independently optional and is left out of the JSON when
/// absent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelevantDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<ProgrammingLanguage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InlineProjectContext {
    pub content: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryInlineProjectContextParams {
    pub query: String,
    pub file_path: String,
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryInlineProjectContextResult {
    pub inline_project_context: Vec<InlineProjectContext>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryVectorIndexParams {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryVectorIndexResult {
    pub chunks: Vec<Chunk>,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
