//! In-memory ledger with load/save and the idempotence check.

use std::collections::BTreeMap;
use std::io::Write;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CaseError, Result};
use crate::ledger::format::{
    cache_ledger_path_for, default_cache_dir, ledger_path_for, LedgerDocument,
};
use crate::model::record::{now, timestamp, ProcessedFileRecord};
use crate::model::stats::RunStatistics;

/// Every record ever written for one root, plus live counters.
///
/// Records are append-only. When a source is reprocessed the new record
/// supersedes the old one for lookups and counters, but both are kept.
#[derive(Debug, Clone)]
pub struct Ledger {
    cache_dir: PathBuf,
    records: Vec<ProcessedFileRecord>,
    /// `original_path` → index of its latest record. Ordered, so the
    /// attachments of one source form a contiguous key range.
    latest: BTreeMap<String, usize>,
    stats: RunStatistics,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl Ledger {
    /// Empty ledger falling back to `cache_dir` when a root is read-only.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            records: Vec::new(),
            latest: BTreeMap::new(),
            stats: RunStatistics::default(),
        }
    }

    /// Replace the in-memory state with the ledger persisted for `root`.
    ///
    /// Returns `false` when there is no prior state. A corrupt ledger is
    /// logged and treated as absent.
    pub fn load(&mut self, root: &Path) -> bool {
        self.clear();

        let candidates = [
            ledger_path_for(root),
            cache_ledger_path_for(&self.cache_dir, root),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match read_document(path) {
                Ok(doc) => {
                    for record in doc.processed_files {
                        self.record(record);
                    }
                    if self.stats != doc.stats {
                        debug!(path = %path.display(), "Stored counters differ, recomputed");
                    }
                    info!(
                        path = %path.display(),
                        records = self.records.len(),
                        "Loaded ledger"
                    );
                    return true;
                }
                Err(e) => warn!(error = %e, "Ignoring unreadable ledger"),
            }
        }
        false
    }

    /// `true` if `original_path` was recorded and its output still exists.
    pub fn is_processed(&self, original_path: &str) -> bool {
        self.processed_output(original_path).is_some()
    }

    /// Output of `original_path`, if it was recorded and still exists.
    pub fn processed_output(&self, original_path: &str) -> Option<PathBuf> {
        self.latest(original_path)
            .map(ProcessedFileRecord::classified_path)
            .filter(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// `true` if an attachment recorded under `original_path`, at any
    /// nesting level, lost its output.
    pub fn has_missing_attachments(&self, original_path: &str) -> bool {
        let prefix = format!("{original_path} > ");
        self.latest
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&prefix))
            .any(|(_, &idx)| !self.records[idx].classified_path().exists())
    }

    /// Latest record for `original_path`, if any.
    pub fn latest(&self, original_path: &str) -> Option<&ProcessedFileRecord> {
        self.latest.get(original_path).map(|&idx| &self.records[idx])
    }

    /// Append a record and update the counters.
    pub fn record(&mut self, entry: ProcessedFileRecord) {
        if let Some(&idx) = self.latest.get(&entry.original_path) {
            self.stats.remove(&self.records[idx]);
        }
        self.stats.add(&entry);
        self.latest
            .insert(entry.original_path.clone(), self.records.len());
        self.records.push(entry);
    }

    /// Persist to `root`, or to the cache directory if `root` is not writable.
    ///
    /// Returns the path actually written.
    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let doc = LedgerDocument {
            last_run: Some(now().format(timestamp::FORMAT).to_string()),
            root_folder: root.to_string_lossy().into_owned(),
            stats: self.stats.clone(),
            processed_files: self.records.clone(),
        };
        let primary = ledger_path_for(root);
        let json = serde_json::to_vec_pretty(&doc).map_err(|e| CaseError::ledger(&primary, e))?;

        match write_replace(&primary, &json) {
            Ok(()) => {
                info!(path = %primary.display(), "Ledger written");
                return Ok(primary);
            }
            Err(e) => debug!(error = %e, "Cannot write ledger in root, trying cache dir"),
        }

        let cache_path = cache_ledger_path_for(&self.cache_dir, root);
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| CaseError::ledger(&cache_path, e))?;
        write_replace(&cache_path, &json).map_err(|e| CaseError::ledger(&cache_path, e))?;
        info!(path = %cache_path.display(), "Ledger written to cache");
        Ok(cache_path)
    }

    /// Every record in insertion order, superseded ones included.
    pub fn records(&self) -> &[ProcessedFileRecord] {
        &self.records
    }

    /// Latest record per source, in first-seen order.
    pub fn current_records(&self) -> Vec<&ProcessedFileRecord> {
        let mut indices: Vec<usize> = self.latest.values().copied().collect();
        indices.sort_unstable();
        indices.into_iter().map(|idx| &self.records[idx]).collect()
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn clear(&mut self) {
        self.records.clear();
        self.latest.clear();
        self.stats = RunStatistics::default();
    }
}

fn read_document(path: &Path) -> Result<LedgerDocument> {
    let data = std::fs::read(path).map_err(|e| CaseError::ledger(path, e))?;
    serde_json::from_slice(&data).map_err(|e| CaseError::ledger(path, e))
}

/// Write through a temporary sibling so a crash never leaves half a ledger.
fn write_replace(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
