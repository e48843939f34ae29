//! Discovery of tool output files by name prefix.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::error::ToolError;

/// Suffixes of files a tool may leave behind while still writing.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".download", ".ytdl", ".tmp"];

/// Finds the output file in `dir` whose name starts with `prefix`.
///
/// Only regular files directly inside `dir` are considered and partial
/// download artifacts are skipped. When several files match, the most
/// recently modified wins; ties go to the smallest name.
///
/// Returns the path and its extension with a leading dot (empty if none).
pub async fn resolve_output(dir: &Path, prefix: &str) -> Result<(PathBuf, String), ToolError> {
    scan(dir, prefix, None).await
}

/// Like [`resolve_output`], but never picks `exclude`.
///
/// Used when the tool's input sits in the same directory and may share
/// the prefix.
pub async fn resolve_output_excluding(
    dir: &Path,
    prefix: &str,
    exclude: &Path,
) -> Result<(PathBuf, String), ToolError> {
    scan(dir, prefix, Some(exclude)).await
}

async fn scan(
    dir: &Path,
    prefix: &str,
    exclude: Option<&Path>,
) -> Result<(PathBuf, String), ToolError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut best: Option<(SystemTime, String, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) || PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }

        if exclude.is_some_and(|excluded| entry.path() == excluded) {
            continue;
        }

        let meta = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let better = match &best {
            None => true,
            Some((best_time, best_name, _)) => {
                modified > *best_time || (modified == *best_time && name < *best_name)
            }
        };
        if better {
            best = Some((modified, name, entry.path()));
        }
    }

    match best {
        Some((_, name, path)) => {
            debug!(dir = %dir.display(), prefix, file = %name, "Resolved tool output");
            let extension = extension_of(&path);
            Ok((path, extension))
        }
        None => Err(ToolError::OutputNotFound {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }),
    }
}

/// File extension with leading dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
