//! Records describing where every artifact ended up.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::classify::Category;

/// One file or attachment copied into a category folder.
///
/// Created once, never mutated, persisted in the ledger. Field aliases keep
/// ledgers written by earlier versions readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFileRecord {
    /// Source location; for attachments a `source > name` locator.
    pub original_path: String,
    /// Destination inside a category folder.
    pub classified_path: String,
    #[serde(alias = "file_type")]
    pub category: Category,
    pub size_kb: f64,
    #[serde(alias = "processed_date", with = "timestamp")]
    pub processed_at: NaiveDateTime,
    /// Display name of the email this record was extracted from.
    #[serde(default)]
    pub source_email: Option<String>,
    #[serde(default)]
    pub is_attachment: bool,
    /// `true` when the file is an email container stored under its canonical name.
    #[serde(default)]
    pub renamed: bool,
}

impl ProcessedFileRecord {
    /// `true` when the classified copy is an email container.
    pub fn is_email(&self) -> bool {
        crate::model::email::EmailKind::from_path(Path::new(&self.classified_path)).is_some()
    }

    pub fn classified_path(&self) -> &Path {
        Path::new(&self.classified_path)
    }
}

/// Everything known about one extracted attachment.
///
/// Richer than [`ProcessedFileRecord`]; returned by the attachment walker
/// and by the extraction-only API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentRecord {
    /// Name declared by the container.
    pub original_filename: String,
    /// Name actually written (may carry a `_N` suffix).
    pub saved_filename: String,
    pub saved_path: PathBuf,
    /// Stable `source > name` key used by the ledger.
    pub locator: String,
    pub size_bytes: u64,
    pub category: Category,
    /// Chain of email names, outermost first, joined by `" > "`.
    pub email_chain: String,
    /// Display name of the email that directly contained this attachment.
    pub source_email: String,
    pub email_subject: String,
    pub email_date: NaiveDate,
    #[serde(with = "timestamp")]
    pub extracted_at: NaiveDateTime,
    /// Extracted from a nested (depth > 0) email.
    pub from_nested_email: bool,
    /// The attachment is itself an email container.
    pub is_email: bool,
    /// Stored under a canonical email name.
    pub renamed: bool,
}

impl AttachmentRecord {
    /// Convert into the flat record kept by the ledger.
    pub fn to_processed(&self) -> ProcessedFileRecord {
        ProcessedFileRecord {
            original_path: self.locator.clone(),
            classified_path: self.saved_path.to_string_lossy().into_owned(),
            category: self.category,
            size_kb: size_kb(self.size_bytes),
            processed_at: self.extracted_at,
            source_email: Some(self.source_email.clone()),
            is_attachment: true,
            renamed: self.renamed,
        }
    }
}

/// Size in KiB rounded to two decimals.
pub fn size_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

/// Current local time truncated to whole seconds, as stored on disk.
pub fn now() -> NaiveDateTime {
    use chrono::Timelike;
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// `YYYY-MM-DD HH:MM:SS` timestamps, the ledger's on-disk format.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(serde::de::Error::custom)
    }
}
