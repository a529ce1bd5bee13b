//! Attachment extraction, with or without a ledger.

pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{CategoryPolicy, OutputLayout};
use crate::error::{CaseError, Result};
use crate::model::email::EmailKind;
use crate::model::record::AttachmentRecord;
use crate::naming::unique::UniquePaths;

pub use walker::{AttachmentWalker, WalkSettings, DEFAULT_MAX_DEPTH};

/// Totals of an [`extract_all`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Emails opened, nested ones included.
    pub emails_processed: usize,
    pub attachments_extracted: usize,
    pub total_size_bytes: u64,
    /// Recoverable problems (unreadable emails, failed writes, depth cuts).
    pub errors: usize,
}

/// Extract the attachments of every email in `paths` into the category
/// folders under `output_dir`.
///
/// Nothing is recorded in a ledger and the emails themselves are not
/// copied. Paths that are not email containers are skipped with a warning.
pub fn extract_all(
    paths: &[PathBuf],
    output_dir: &Path,
    policy: &CategoryPolicy,
    settings: &WalkSettings,
    progress: &dyn Fn(usize, usize),
) -> Result<(Vec<AttachmentRecord>, ExtractionSummary)> {
    let layout = OutputLayout::new(output_dir);
    layout.ensure().map_err(|e| CaseError::io(output_dir, e))?;

    let mut unique = UniquePaths::new();
    let mut walker = AttachmentWalker::new(&layout, policy, settings, &mut unique);
    let mut records = Vec::new();
    let mut skipped = 0;
    let total = paths.len();

    for (i, path) in paths.iter().enumerate() {
        progress(i, total);
        if EmailKind::from_path(path).is_none() {
            warn!(path = %path.display(), "Not an email container, skipping");
            skipped += 1;
            continue;
        }
        records.extend(walker.extract(path, "", 0));
    }
    progress(total, total);

    let summary = ExtractionSummary {
        emails_processed: walker.emails_opened(),
        attachments_extracted: records.len(),
        total_size_bytes: records.iter().map(|r| r.size_bytes).sum(),
        errors: walker.warnings() + skipped,
    };
    info!(
        emails = summary.emails_processed,
        attachments = summary.attachments_extracted,
        errors = summary.errors,
        "Extraction finished"
    );
    Ok((records, summary))
}
