//! Enumeration of the files an organize run should look at.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::classify::OutputLayout;

/// Every regular file under `root`, sorted by path.
///
/// Skips hidden (dot-prefixed) entries, the category folders of `layout`
/// and any directory whose name is listed in `exclude_folders`.
pub fn collect_candidates(
    root: &Path,
    layout: &OutputLayout,
    exclude_folders: &[String],
) -> Vec<PathBuf> {
    let keep = |entry: &DirEntry| {
        if entry.depth() == 0 {
            return true;
        }
        if is_hidden(entry) {
            return false;
        }
        if entry.file_type().is_dir() {
            if layout.is_category_folder(entry.path()) {
                debug!(path = %entry.path().display(), "Skipping output folder");
                return false;
            }
            let name = entry.file_name().to_string_lossy();
            if exclude_folders.iter().any(|ex| *ex == name) {
                debug!(path = %entry.path().display(), "Skipping excluded folder");
                return false;
            }
        }
        true
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep)
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read directory entry"),
        }
    }
    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
