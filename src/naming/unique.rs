//! Collision-free destination paths.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Hands out destination paths that neither exist on disk nor were handed
/// out earlier by the same instance.
///
/// One instance lives for a whole run, so two attachments with the same
/// name resolve to `name.ext` and `name_1.ext` even before either is written.
#[derive(Debug, Default)]
pub struct UniquePaths {
    reserved: HashSet<PathBuf>,
}

impl UniquePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `path` if it is free, otherwise the first free
    /// `stem_N.ext` with `N = 1, 2, …`. The result is reserved.
    pub fn resolve(&mut self, path: &Path) -> PathBuf {
        if self.is_free(path) {
            self.reserved.insert(path.to_path_buf());
            return path.to_path_buf();
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| OsString::from("file"));
        let ext = path.extension();
        let parent = path.parent().unwrap_or(Path::new("."));

        let mut counter: u64 = 0;
        loop {
            counter += 1;
            let mut name = stem.clone();
            name.push(format!("_{counter}"));
            if let Some(ext) = ext {
                name.push(".");
                name.push(ext);
            }
            let candidate = parent.join(name);
            if self.is_free(&candidate) {
                self.reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }

    fn is_free(&self, path: &Path) -> bool {
        !self.reserved.contains(path) && !path.exists()
    }
}
