//! Transient metadata for one opened email container.

use std::path::Path;

use chrono::NaiveDate;

use super::attachment::AttachmentDescriptor;

/// The two supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Outlook compound-file message (`.msg`).
    Msg,
    /// RFC 5322 text message (`.eml`).
    Eml,
}

impl EmailKind {
    /// Detect the container kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "msg" => Some(Self::Msg),
            "eml" => Some(Self::Eml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// File extension used when writing this kind, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Msg => "msg",
            Self::Eml => "eml",
        }
    }
}

/// Header fields and attachments of one email.
///
/// Lives only while the walker processes that email.
#[derive(Debug, Clone)]
pub struct EmailRecord {
    pub kind: EmailKind,
    pub subject: Option<String>,
    /// Calendar date of the message; today when the header was unusable.
    pub date: NaiveDate,
    /// Raw sender, e.g. `"Jane Doe <jane@x.com>"`.
    pub sender: Option<String>,
    /// Raw recipient list as found in the container.
    pub recipient: Option<String>,
    pub attachments: Vec<AttachmentDescriptor>,
    /// Attachments the adapter had to drop because their payload was unreadable.
    pub unreadable_attachments: usize,
}

impl EmailRecord {
    /// `YYYYMMDD` stamp used in canonical names.
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}
