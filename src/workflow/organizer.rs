//! Organize a case folder: classify, rename, extract, record.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{Category, CategoryPolicy, OutputLayout};
use crate::error::{CaseError, Result};
use crate::extract::{AttachmentWalker, WalkSettings};
use crate::ledger::Ledger;
use crate::model::email::{EmailKind, EmailRecord};
use crate::model::record::{now, size_kb, AttachmentRecord, ProcessedFileRecord};
use crate::model::stats::RunStatistics;
use crate::naming::rename::canonical_email_name;
use crate::naming::unique::UniquePaths;
use crate::parser::open_email;
use crate::workflow::scan::collect_candidates;

/// Caller-supplied knobs for one organizer.
#[derive(Debug, Clone, Default)]
pub struct OrganizerOptions {
    /// Put the category folders here instead of under the root.
    pub output_dir: Option<PathBuf>,
    /// Directory names never descended into.
    pub exclude_folders: Vec<String>,
    /// `extension → category` entries layered on the default table.
    pub category_overrides: HashMap<String, Category>,
    pub walk: WalkSettings,
    /// Where the ledger goes when the root is read-only.
    pub cache_dir: Option<PathBuf>,
}

/// Terminal state of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    /// Already recorded and its output still exists.
    Skipped,
    /// Copied into its category folder.
    Classified,
    /// Renamed into Correspondence and its attachments walked.
    EmailProcessed,
    /// Copy failed; nothing recorded.
    Failed,
}

/// What one [`Organizer::run`] did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Records created during this run, in processing order.
    pub records: Vec<ProcessedFileRecord>,
    /// Detailed view of the attachment records among `records`.
    pub attachments: Vec<AttachmentRecord>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
    /// Recoverable problems: unreadable emails, failed attachments, depth cuts.
    pub warnings: usize,
    /// Counters over `records` only.
    pub run_stats: RunStatistics,
    /// Counters over the whole ledger after the run.
    pub totals: RunStatistics,
    /// Where the ledger was written, if it could be.
    pub ledger_path: Option<PathBuf>,
}

/// Drives a run over one root folder.
pub struct Organizer {
    root: PathBuf,
    layout: OutputLayout,
    policy: CategoryPolicy,
    options: OrganizerOptions,
    ledger: Ledger,
    paths: UniquePaths,
}

impl Organizer {
    /// Validate `root` and prepare an organizer for it.
    ///
    /// Fails only when `root` is missing or is not a readable directory, or
    /// when a requested output directory cannot be created.
    pub fn new(root: &Path, options: OrganizerOptions) -> Result<Self> {
        if !root.exists() {
            return Err(CaseError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() || fs::read_dir(root).is_err() {
            return Err(CaseError::NotADirectory(root.to_path_buf()));
        }
        let root = root.canonicalize().map_err(|e| CaseError::io(root, e))?;

        let base = match &options.output_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| CaseError::io(dir, e))?;
                dir.canonicalize().map_err(|e| CaseError::io(dir, e))?
            }
            None => root.clone(),
        };

        let ledger = match &options.cache_dir {
            Some(dir) => Ledger::new(dir),
            None => Ledger::default(),
        };

        Ok(Self {
            policy: CategoryPolicy::with_overrides(&options.category_overrides),
            layout: OutputLayout::new(base),
            root,
            options,
            ledger,
            paths: UniquePaths::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Process every candidate file under the root, then persist the ledger.
    ///
    /// Individual failures are logged and reported; they never abort the run.
    pub fn run(&mut self, progress: Option<&dyn Fn(usize, usize)>) -> Result<RunReport> {
        self.paths = UniquePaths::new();
        if self.ledger.load(&self.root) {
            debug!(records = self.ledger.len(), "Resuming from ledger");
        }
        if let Err(e) = self.layout.ensure() {
            warn!(base = %self.layout.base().display(), error = %e, "Could not create category folders");
        }

        let candidates =
            collect_candidates(&self.root, &self.layout, &self.options.exclude_folders);
        info!(root = %self.root.display(), files = candidates.len(), "Organizing");

        let mut report = RunReport::default();
        let total = candidates.len();
        for (i, path) in candidates.iter().enumerate() {
            if let Some(cb) = progress {
                cb(i, total);
            }
            let outcome = self.process_file(path, &mut report);
            debug!(path = %path.display(), outcome = ?outcome, "Processed");
        }
        if let Some(cb) = progress {
            cb(total, total);
        }

        report.run_stats = RunStatistics::from_records(&report.records);
        report.totals = self.ledger.stats().clone();
        match self.ledger.save(&self.root) {
            Ok(path) => report.ledger_path = Some(path),
            Err(e) => {
                warn!(error = %e, "Ledger not saved; results of this run are not durable");
                report.warnings += 1;
            }
        }

        info!(
            new = report.records.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            warnings = report.warnings,
            "Run finished"
        );
        Ok(report)
    }

    fn process_file(&mut self, path: &Path, report: &mut RunReport) -> FileOutcome {
        let key = path.to_string_lossy().into_owned();
        if self.ledger.is_processed(&key) {
            if EmailKind::from_path(path).is_some() && self.ledger.has_missing_attachments(&key) {
                return self.rewalk_email(path, &key, report);
            }
            report.skipped.push(path.to_path_buf());
            return FileOutcome::Skipped;
        }

        let outcome = if EmailKind::from_path(path).is_some() {
            self.process_email(path, &key, report)
        } else {
            let category = self.policy.category_for_path(path);
            let name = path.file_name().map(PathBuf::from).unwrap_or_default();
            self.copy_and_record(path, &key, category, &name, false, report)
                .map(|_| FileOutcome::Classified)
        };

        outcome.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to process file");
            report.failures.push((path.to_path_buf(), e.to_string()));
            FileOutcome::Failed
        })
    }

    /// Rename into Correspondence, then walk attachments from the renamed copy.
    fn process_email(
        &mut self,
        path: &Path,
        key: &str,
        report: &mut RunReport,
    ) -> Result<FileOutcome> {
        let email = match open_email(path) {
            Ok(email) => email,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable email, copying as a plain file");
                report.warnings += 1;
                let category = self.policy.category_for_path(path);
                let name = path.file_name().map(PathBuf::from).unwrap_or_default();
                self.copy_and_record(path, key, category, &name, false, report)?;
                return Ok(FileOutcome::Classified);
            }
        };

        let name = PathBuf::from(canonical_email_name(&email, &self.options.walk.naming));
        let dest =
            self.copy_and_record(path, key, Category::Correspondence, &name, true, report)?;
        self.walk_attachments(&email, &dest, key, report);
        Ok(FileOutcome::EmailProcessed)
    }

    /// Restore the missing attachments of an email whose renamed copy survives.
    fn rewalk_email(&mut self, path: &Path, key: &str, report: &mut RunReport) -> FileOutcome {
        let Some(copy) = self.ledger.latest(key).map(|r| r.classified_path().to_path_buf()) else {
            return FileOutcome::Skipped;
        };
        match open_email(&copy) {
            Ok(email) => {
                info!(path = %path.display(), "Restoring missing attachments");
                if self.walk_attachments(&email, &copy, key, report) > 0 {
                    return FileOutcome::EmailProcessed;
                }
                report.skipped.push(path.to_path_buf());
                FileOutcome::Skipped
            }
            Err(e) => {
                warn!(path = %copy.display(), error = %e, "Cannot reopen renamed email");
                report.warnings += 1;
                report.skipped.push(path.to_path_buf());
                FileOutcome::Skipped
            }
        }
    }

    /// Walk `email` (stored at `copy`) and record every new attachment.
    ///
    /// Returns how many attachments were recorded.
    fn walk_attachments(
        &mut self,
        email: &EmailRecord,
        copy: &Path,
        key: &str,
        report: &mut RunReport,
    ) -> usize {
        let ledger = &self.ledger;
        let prior = |locator: &str| ledger.processed_output(locator);
        let mut walker = AttachmentWalker::new(
            &self.layout,
            &self.policy,
            &self.options.walk,
            &mut self.paths,
        );
        let attachments = walker.extract_parsed(email, copy, key, "", 0, &prior);
        report.warnings += walker.warnings();

        let count = attachments.len();
        for attachment in attachments {
            let record = attachment.to_processed();
            self.ledger.record(record.clone());
            report.records.push(record);
            report.attachments.push(attachment);
        }
        count
    }

    /// Copy `src` into `category` as `name`, record it and return the destination.
    fn copy_and_record(
        &mut self,
        src: &Path,
        key: &str,
        category: Category,
        name: &Path,
        renamed: bool,
        report: &mut RunReport,
    ) -> Result<PathBuf> {
        let dest = self.paths.resolve(&self.layout.folder(category).join(name));
        let bytes = fs::copy(src, &dest).map_err(|source| CaseError::DestinationWrite {
            path: dest.clone(),
            source,
        })?;

        let record = ProcessedFileRecord {
            original_path: key.to_string(),
            classified_path: dest.to_string_lossy().into_owned(),
            category,
            size_kb: size_kb(bytes),
            processed_at: now(),
            source_email: None,
            is_attachment: false,
            renamed,
        };
        debug!(src = %src.display(), dest = %dest.display(), "Copied");
        self.ledger.record(record.clone());
        report.records.push(record);
        Ok(dest)
    }
}

/// Organize `root` in one call.
pub fn organize(root: &Path, options: OrganizerOptions) -> Result<RunReport> {
    Organizer::new(root, options)?.run(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(cache: &Path) -> OrganizerOptions {
        OrganizerOptions {
            cache_dir: Some(cache.to_path_buf()),
            ..OrganizerOptions::default()
        }
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Organizer::new(&tmp.path().join("nope"), options(tmp.path())).err();
        assert!(matches!(err, Some(CaseError::RootNotFound(_))));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.pdf");
        fs::write(&file, b"x").unwrap();
        let err = Organizer::new(&file, options(tmp.path())).err();
        assert!(matches!(err, Some(CaseError::NotADirectory(_))));
    }

    #[test]
    fn test_plain_files_and_skip() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("case");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.pdf"), vec![0u8; 2048]).unwrap();
        fs::write(root.join("sub/photo.JPG"), b"jpg").unwrap();

        let mut organizer = Organizer::new(&root, options(&tmp.path().join("cache"))).unwrap();
        let report = organizer.run(None).unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.totals.count(Category::TechnicalDocument), 1);
        assert_eq!(report.totals.count(Category::Other), 1);

        let pdf = &report.records[0];
        assert_eq!(pdf.size_kb, 2.0);
        assert!(Path::new(&pdf.classified_path).ends_with("Dossier technique/a.pdf"));
        assert!(root.join("a.pdf").exists());

        let second = organizer.run(None).unwrap();
        assert!(second.records.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(second.totals, report.totals);
    }

    #[test]
    fn test_unreadable_email_is_copied_as_is() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("case");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("broken.msg"), b"not a compound file").unwrap();

        let report = organize(&root, options(&tmp.path().join("cache"))).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.warnings, 1);
        let record = &report.records[0];
        assert!(!record.renamed);
        assert_eq!(record.category, Category::Correspondence);
        assert!(record.classified_path.ends_with("broken.msg"));
    }
}
