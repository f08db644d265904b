use anyhow::{Context as AnyhowContext, Result};
use clap::Args;
use context_protocol::ContextConfiguration;
use std::fs;
use std::path::{Path, PathBuf};

/// Discovery settings shared by subcommands that walk the workspace.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (TOML, or JSON when the extension is .json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Gitignore-style pattern to exclude (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// File extension to include, e.g. `.rs` (repeatable; replaces the default list)
    #[arg(long = "ext", value_name = "EXT")]
    pub ext: Vec<String>,

    /// Keep symlinked paths instead of resolving them
    #[arg(long)]
    pub include_symlinks: bool,

    /// Per-file size cap in MB
    #[arg(long, value_name = "MB")]
    pub max_file_size_mb: Option<f64>,

    /// Aggregate size cap in MB
    #[arg(long, value_name = "MB")]
    pub max_index_size_mb: Option<f64>,

    /// Drop both size caps
    #[arg(long, conflicts_with_all = ["max_file_size_mb", "max_index_size_mb"])]
    pub unbounded: bool,
}

impl ConfigArgs {
    /// Configuration file (or defaults) with command-line flags applied on top.
    pub fn resolve(&self) -> Result<ContextConfiguration> {
        let mut config = match &self.config {
            Some(path) => load_configuration(path)?,
            None => ContextConfiguration::default(),
        };

        config.ignore_file_patterns.extend(self.ignore.iter().cloned());
        if !self.ext.is_empty() {
            config.file_extensions = self.ext.clone();
        }
        if self.include_symlinks {
            config.include_sym_links = true;
        }
        if self.unbounded {
            config.max_file_size_mb = None;
            config.max_index_size_mb = None;
        }
        if let Some(mb) = self.max_file_size_mb {
            config.max_file_size_mb = Some(mb);
        }
        if let Some(mb) = self.max_index_size_mb {
            config.max_index_size_mb = Some(mb);
        }
        Ok(config)
    }
}

pub fn load_configuration(path: &Path) -> Result<ContextConfiguration> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?
    } else {
        toml::from_str(&raw).with_context(|| format!("Invalid TOML config {}", path.display()))?
    };
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
