//! On-disk ledger document.
//!
//! ```text
//! {
//!   "last_run":        "2024-03-15 10:00:00",
//!   "root_folder":     "/case",
//!   "stats":           { total_files, total_emails, ... },
//!   "processed_files": [ ProcessedFileRecord, ... ]
//! }
//! ```
//!
//! Every field defaults when missing and unknown fields are ignored, so
//! older and newer ledgers stay readable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::record::ProcessedFileRecord;
use crate::model::stats::RunStatistics;

/// Hidden file written at the root of the organized folder.
pub const LEDGER_FILE_NAME: &str = ".casesort_ledger.json";

/// Subdirectory of the user cache used when the root is read-only.
pub const CACHE_SUBDIR: &str = "casesort";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerDocument {
    /// `YYYY-MM-DD HH:MM:SS` of the last save, if any.
    pub last_run: Option<String>,
    pub root_folder: String,
    pub stats: RunStatistics,
    pub processed_files: Vec<ProcessedFileRecord>,
}

/// Primary ledger path: hidden file inside `root`.
///
/// Example: `/data/case` → `/data/case/.casesort_ledger.json`
pub fn ledger_path_for(root: &Path) -> PathBuf {
    root.join(LEDGER_FILE_NAME)
}

/// Fallback ledger path inside `cache_dir`, keyed by the root path hash.
///
/// Example: `~/.cache/casesort/<sha256_of_root>.json`
pub fn cache_ledger_path_for(cache_dir: &Path, root: &Path) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    cache_dir.join(format!("{hash}.json"))
}

/// Default cache directory: `<user cache>/casesort`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(CACHE_SUBDIR)
}
