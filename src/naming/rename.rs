//! Canonical email file names: `YYYYMMDD_Sender_Recipient_Subject.ext`.

use serde::{Deserialize, Serialize};

use crate::model::email::EmailRecord;

use super::sanitize::{clean, fit_bytes, name_from_address, MAX_NAME_BYTES, PLACEHOLDER};

/// Recipient component when the email has no usable recipient.
pub const NO_RECIPIENT: &str = "Tous";

/// Subject component when the email has no subject.
pub const NO_SUBJECT: &str = "SansObjet";

/// Upper bound for a whole file name, in characters and in bytes.
pub const MAX_FILE_NAME: usize = MAX_NAME_BYTES;

/// Bytes always left to the subject when sender and recipient are shortened.
const MIN_SUBJECT_BYTES: usize = 16;

/// Per-component length caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingLimits {
    pub sender_max: usize,
    pub recipient_max: usize,
    pub subject_max: usize,
}

impl Default for NamingLimits {
    fn default() -> Self {
        Self {
            sender_max: 30,
            recipient_max: 30,
            subject_max: 50,
        }
    }
}

/// Build the canonical file name for an opened email.
///
/// The container's own extension is kept. When the name would exceed
/// [`MAX_FILE_NAME`] characters or bytes the subject is shortened, and if
/// that is not enough, the sender and recipient too.
pub fn canonical_email_name(email: &EmailRecord, limits: &NamingLimits) -> String {
    let date = email.date_stamp();
    let sender = email
        .sender
        .as_deref()
        .map(name_from_address)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let recipient = email
        .recipient
        .as_deref()
        .map(name_from_address)
        .filter(|r| r != PLACEHOLDER)
        .unwrap_or_else(|| NO_RECIPIENT.to_string());
    let subject = email
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SUBJECT);

    let mut sender = clean(&sender, limits.sender_max);
    let mut recipient = clean(&recipient, limits.recipient_max);
    let ext = email.kind.extension();

    // date, three separators, the dot and extension, a short subject
    let reserved = date.len() + 3 + 1 + ext.len() + MIN_SUBJECT_BYTES;
    if sender.len() + recipient.len() + reserved > MAX_FILE_NAME {
        let each = MAX_FILE_NAME.saturating_sub(reserved) / 2;
        sender = fit_bytes(&sender, each);
        recipient = fit_bytes(&recipient, each);
    }

    let prefix = format!("{date}_{sender}_{recipient}_");
    let fixed = prefix.chars().count() + 1 + ext.len();
    let subject_max = limits
        .subject_max
        .min(MAX_FILE_NAME.saturating_sub(fixed))
        .max(1);
    let subject_bytes = MAX_FILE_NAME.saturating_sub(prefix.len() + 1 + ext.len());
    let subject = fit_bytes(&clean(subject, subject_max), subject_bytes);

    format!("{prefix}{subject}.{ext}")
}
