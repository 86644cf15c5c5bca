//! File classification and directory scanning

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct FileScanner;

impl FileScanner {
    /// Lower-cased extension of a path, without the dot
    pub fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Check if a file's extension is one of `extensions` (case-insensitive)
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        Self::extension(path)
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }

    /// Recursively collect files under `root` with one of `extensions`,
    /// sorted by path so scans are deterministic
    pub fn scan_recursive(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {root:?}: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| Self::has_extension(path, extensions))
            .collect()
    }
}
