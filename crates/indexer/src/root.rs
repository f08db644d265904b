use crate::error::{IndexerError, Result};
use context_protocol::WorkspaceFolder;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Absolute filesystem path named by a workspace folder URI. Bare relative
/// paths are taken against the current directory.
pub fn workspace_folder_path(folder: &WorkspaceFolder) -> Result<PathBuf> {
    let path = folder
        .to_file_path()
        .ok_or_else(|| IndexerError::InvalidUri(folder.uri.clone()))?;
    Ok(std::path::absolute(path)?)
}

/// Deepest directory that contains every workspace folder.
///
/// A single folder is its own root. When the folders share no leading
/// segment at all, the first folder is used as the root.
pub fn find_common_workspace_root(folders: &[WorkspaceFolder]) -> Result<PathBuf> {
    let Some(first) = folders.first() else {
        return Err(IndexerError::NoWorkspace);
    };
    if folders.len() == 1 {
        return workspace_folder_path(first);
    }

    let paths = folders
        .iter()
        .map(workspace_folder_path)
        .collect::<Result<Vec<_>>>()?;
    let segments: Vec<Vec<&OsStr>> = paths.iter().map(|path| normal_segments(path)).collect();
    let min_len = segments.iter().map(Vec::len).min().unwrap_or(0);

    let head = &segments[0];
    let common = (0..min_len)
        .take_while(|&i| segments.iter().all(|other| other[i] == head[i]))
        .count();

    if common == 0 {
        return Ok(paths[0].clone());
    }

    let mut root: PathBuf = paths[0]
        .components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    root.extend(&head[..common]);
    Ok(root)
}

fn normal_segments(path: &Path) -> Vec<&OsStr> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect()
}
