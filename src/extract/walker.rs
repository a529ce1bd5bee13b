//! Recursive attachment extraction.
//!
//! The walker opens an email, drops decorative parts, writes every other
//! attachment into its category folder and descends into attached emails
//! until the configured depth limit.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{Category, CategoryPolicy, OutputLayout};
use crate::error::{CaseError, Result};
use crate::model::attachment::{AttachmentDescriptor, DecorativeRule};
use crate::model::email::{EmailKind, EmailRecord};
use crate::model::record::{now, AttachmentRecord};
use crate::naming::rename::{canonical_email_name, NamingLimits};
use crate::naming::sanitize::clean_file_name;
use crate::naming::unique::UniquePaths;
use crate::parser::open_email;

/// Longest file name kept for a saved attachment.
const MAX_ATTACHMENT_NAME: usize = 150;

/// Default nesting limit. Depth 0 is the top-level email.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Tunables shared by the walker and the extraction-only API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    pub max_depth: usize,
    pub decorative: DecorativeRule,
    pub naming: NamingLimits,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            decorative: DecorativeRule::default(),
            naming: NamingLimits::default(),
        }
    }
}

/// The email an attachment was found in.
struct Parent<'e> {
    display: &'e str,
    chain: &'e str,
    subject: &'e str,
    date: NaiveDate,
    depth: usize,
}

/// Walks one email tree at a time, writing into a shared [`OutputLayout`].
///
/// Destinations are reserved through the borrowed [`UniquePaths`], so two
/// attachments with the same name never overwrite each other even within a
/// single run.
pub struct AttachmentWalker<'a> {
    layout: &'a OutputLayout,
    policy: &'a CategoryPolicy,
    settings: &'a WalkSettings,
    paths: &'a mut UniquePaths,
    emails_opened: usize,
    warnings: usize,
}

impl<'a> AttachmentWalker<'a> {
    pub fn new(
        layout: &'a OutputLayout,
        policy: &'a CategoryPolicy,
        settings: &'a WalkSettings,
        paths: &'a mut UniquePaths,
    ) -> Self {
        Self {
            layout,
            policy,
            settings,
            paths,
            emails_opened: 0,
            warnings: 0,
        }
    }

    /// Number of emails successfully opened so far, nested ones included.
    pub fn emails_opened(&self) -> usize {
        self.emails_opened
    }

    /// Number of recoverable problems logged so far.
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Extract every attachment of `email_path` and of the emails it carries.
    ///
    /// `parent_chain` is the chain of email names above this one (empty at
    /// the top level). Failures never escape: they are logged and counted.
    pub fn extract(
        &mut self,
        email_path: &Path,
        parent_chain: &str,
        depth: usize,
    ) -> Vec<AttachmentRecord> {
        let origin = email_path.to_string_lossy();
        self.extract_from(email_path, &origin, parent_chain, depth, &|_| None)
    }

    /// Like [`extract`](Self::extract), with an explicit locator base and a
    /// lookup for attachments already handled by a previous run.
    ///
    /// `prior` maps a locator to the output it was saved as, when that output
    /// still exists. Such attachments are not written again, but an attached
    /// email found this way is still descended into so that its own missing
    /// attachments are restored.
    pub fn extract_from(
        &mut self,
        email_path: &Path,
        origin: &str,
        parent_chain: &str,
        depth: usize,
        prior: &dyn Fn(&str) -> Option<PathBuf>,
    ) -> Vec<AttachmentRecord> {
        if self.over_limit(email_path, depth) {
            return Vec::new();
        }
        match open_email(email_path) {
            Ok(email) => {
                self.extract_parsed(&email, email_path, origin, parent_chain, depth, prior)
            }
            Err(e) => {
                warn!(path = %email_path.display(), error = %e, "Could not open email for extraction");
                self.warnings += 1;
                Vec::new()
            }
        }
    }

    /// Walk an email the caller has already opened from `email_path`.
    pub fn extract_parsed(
        &mut self,
        email: &EmailRecord,
        email_path: &Path,
        origin: &str,
        parent_chain: &str,
        depth: usize,
        prior: &dyn Fn(&str) -> Option<PathBuf>,
    ) -> Vec<AttachmentRecord> {
        let mut out = Vec::new();
        if !self.over_limit(email_path, depth) {
            self.walk(email, email_path, origin, parent_chain, depth, prior, &mut out);
        }
        out
    }

    fn over_limit(&mut self, email_path: &Path, depth: usize) -> bool {
        if depth <= self.settings.max_depth {
            return false;
        }
        let err = CaseError::RecursionLimitExceeded {
            path: email_path.to_path_buf(),
            depth,
        };
        warn!(error = %err, "Not descending into nested email");
        self.warnings += 1;
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &mut self,
        email: &EmailRecord,
        email_path: &Path,
        origin: &str,
        parent_chain: &str,
        depth: usize,
        prior: &dyn Fn(&str) -> Option<PathBuf>,
        out: &mut Vec<AttachmentRecord>,
    ) {
        self.emails_opened += 1;
        self.warnings += email.unreadable_attachments;

        let display = email_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| origin.to_string());
        let chain = if parent_chain.is_empty() {
            display.clone()
        } else {
            format!("{parent_chain} > {display}")
        };
        let subject = email.subject.clone().unwrap_or_default();
        let parent = Parent {
            display: &display,
            chain: &chain,
            subject: &subject,
            date: email.date,
            depth,
        };

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for att in &email.attachments {
            if self.settings.decorative.is_decorative(att) {
                debug!(attachment = %att.name, size = att.size, "Skipping decorative attachment");
                continue;
            }

            let locator = locator(origin, &att.name, &mut seen);
            let saved = prior(&locator);

            if EmailKind::from_extension(&att.extension()).is_some() {
                self.place_nested(att, locator, saved, &parent, prior, out);
                continue;
            }

            if saved.is_some() {
                debug!(locator = %locator, "Attachment already processed");
                continue;
            }

            match self.place_file(att, locator, &parent) {
                Ok(record) => out.push(record),
                Err(e) => {
                    warn!(email = %parent.chain, error = %e, "Failed to save attachment");
                    self.warnings += 1;
                }
            }
        }
    }

    fn place_file(
        &mut self,
        att: &AttachmentDescriptor,
        locator: String,
        parent: &Parent<'_>,
    ) -> Result<AttachmentRecord> {
        let category = self.policy.category_for(&att.extension());
        let dest = self.reserve(att, category, &clean_file_name(&att.name, MAX_ATTACHMENT_NAME))?;
        fs::write(&dest, &att.content).map_err(|source| CaseError::AttachmentIo {
            name: att.name.clone(),
            source,
        })?;
        debug!(attachment = %att.name, dest = %dest.display(), "Saved attachment");
        Ok(self.record(att, dest, locator, category, parent, false, false))
    }

    /// Save an attached email and, if it parses, descend into it.
    ///
    /// When `saved` holds the output of a previous run the email is not
    /// written again, only descended into. The payload is probed through a
    /// temporary file that is removed when this function returns, whatever
    /// the outcome.
    fn place_nested(
        &mut self,
        att: &AttachmentDescriptor,
        locator: String,
        saved: Option<PathBuf>,
        parent: &Parent<'_>,
        prior: &dyn Fn(&str) -> Option<PathBuf>,
        out: &mut Vec<AttachmentRecord>,
    ) {
        let probe = match self.write_probe(att) {
            Ok(probe) => probe,
            Err(e) => {
                warn!(email = %parent.chain, error = %e, "Failed to stage nested email");
                self.warnings += 1;
                return;
            }
        };

        let nested = match open_email(probe.path()) {
            Ok(nested) => Some(nested),
            // Reported when it was first saved as a plain file.
            Err(_) if saved.is_some() => None,
            Err(e) => {
                warn!(
                    attachment = %att.name,
                    error = %e,
                    "Nested email unreadable, keeping it as a plain file"
                );
                self.warnings += 1;
                None
            }
        };

        if let Some(dest) = saved {
            debug!(locator = %locator, dest = %dest.display(), "Nested email already saved");
            if let Some(email) = nested {
                self.descend(&email, &dest, &locator, parent, prior, out);
            }
            return;
        }

        let (file_name, category) = match &nested {
            Some(email) => (
                canonical_email_name(email, &self.settings.naming),
                Category::Correspondence,
            ),
            None => (
                clean_file_name(&att.name, MAX_ATTACHMENT_NAME),
                self.policy.category_for(&att.extension()),
            ),
        };

        let dest = match self.reserve(att, category, &file_name).and_then(|dest| {
            fs::copy(probe.path(), &dest)
                .map(|_| dest)
                .map_err(|source| CaseError::AttachmentIo {
                    name: att.name.clone(),
                    source,
                })
        }) {
            Ok(dest) => dest,
            Err(e) => {
                warn!(email = %parent.chain, error = %e, "Failed to save nested email");
                self.warnings += 1;
                return;
            }
        };

        let renamed = nested.is_some();
        let record = self.record(att, dest.clone(), locator, category, parent, true, renamed);
        let child_origin = record.locator.clone();
        out.push(record);

        if let Some(email) = nested {
            self.descend(&email, &dest, &child_origin, parent, prior, out);
        }
    }

    /// Walk a nested email saved at `dest`, one level below `parent`.
    fn descend(
        &mut self,
        email: &EmailRecord,
        dest: &Path,
        origin: &str,
        parent: &Parent<'_>,
        prior: &dyn Fn(&str) -> Option<PathBuf>,
        out: &mut Vec<AttachmentRecord>,
    ) {
        let depth = parent.depth + 1;
        if !self.over_limit(dest, depth) {
            self.walk(email, dest, origin, parent.chain, depth, prior, out);
        }
    }

    fn write_probe(&self, att: &AttachmentDescriptor) -> Result<tempfile::NamedTempFile> {
        let io_err = |source| CaseError::AttachmentIo {
            name: att.name.clone(),
            source,
        };
        let suffix = format!(".{}", att.extension());
        let mut probe = tempfile::Builder::new()
            .prefix("casesort-nested-")
            .suffix(&suffix)
            .tempfile()
            .map_err(io_err)?;
        std::io::Write::write_all(&mut probe, &att.content).map_err(io_err)?;
        Ok(probe)
    }

    /// Create the category folder and reserve a free destination in it.
    fn reserve(
        &mut self,
        att: &AttachmentDescriptor,
        category: Category,
        file_name: &str,
    ) -> Result<PathBuf> {
        let folder = self.layout.folder(category);
        fs::create_dir_all(&folder).map_err(|source| CaseError::AttachmentIo {
            name: att.name.clone(),
            source,
        })?;
        Ok(self.paths.resolve(&folder.join(file_name)))
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        att: &AttachmentDescriptor,
        saved_path: PathBuf,
        locator: String,
        category: Category,
        parent: &Parent<'_>,
        is_email: bool,
        renamed: bool,
    ) -> AttachmentRecord {
        AttachmentRecord {
            original_filename: att.name.clone(),
            saved_filename: saved_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            saved_path,
            locator,
            size_bytes: att.size,
            category,
            email_chain: parent.chain.to_string(),
            source_email: parent.display.to_string(),
            email_subject: parent.subject.to_string(),
            email_date: parent.date,
            extracted_at: now(),
            from_nested_email: parent.depth > 0,
            is_email,
            renamed,
        }
    }
}

/// Stable key of an attachment: `<origin> > <name>`, with `#N` appended to
/// the second and later attachments sharing a name inside one email.
fn locator<'n>(origin: &str, name: &'n str, seen: &mut HashMap<&'n str, usize>) -> String {
    let count = seen.entry(name).or_insert(0);
    *count += 1;
    if *count == 1 {
        format!("{origin} > {name}")
    } else {
        format!("{origin} > {name}#{count}")
    }
}
