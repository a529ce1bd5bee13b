//! Adapter for Outlook compound-file messages (`.msg`).

use std::path::Path;

use msg_parser::Outlook;
use tracing::warn;

use crate::error::{CaseError, Result};
use crate::model::attachment::AttachmentDescriptor;
use crate::model::email::{EmailKind, EmailRecord};
use crate::parser::date::normalize_date;

/// Signature of an OLE2 compound file.
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Parse raw `.msg` bytes into an [`EmailRecord`].
///
/// `path` is only used for error context.
pub fn parse_msg(path: &Path, data: &[u8]) -> Result<EmailRecord> {
    if !data.starts_with(&CFB_MAGIC) {
        return Err(CaseError::unreadable(path, "not an OLE2 compound file"));
    }

    let outlook = Outlook::from_slice(data)
        .map_err(|e| CaseError::unreadable(path, format!("MSG parse failed: {e}")))?;

    let sender = person(&outlook.sender.name, &outlook.sender.email);
    let recipient = {
        let list: Vec<String> = outlook
            .to
            .iter()
            .filter_map(|p| person(&p.name, &p.email))
            .collect();
        (!list.is_empty()).then(|| list.join("; "))
    };
    let subject = non_empty(&outlook.subject);
    let date = normalize_date(non_empty(&outlook.headers.date).as_deref());

    let mut attachments = Vec::with_capacity(outlook.attachments.len());
    let mut unreadable = 0;
    for (idx, att) in outlook.attachments.iter().enumerate() {
        let name = if !att.file_name.is_empty() {
            att.file_name.clone()
        } else if !att.display_name.is_empty() {
            att.display_name.clone()
        } else {
            format!("attachment_{idx}{}", att.extension)
        };

        if att.payload.is_empty() {
            warn!(path = %path.display(), attachment = %name, "Attachment has no payload");
            unreadable += 1;
            continue;
        }

        match hex::decode(&att.payload) {
            Ok(content) => attachments.push(AttachmentDescriptor::new(name, content)),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    attachment = %name,
                    error = %e,
                    "Could not decode attachment payload"
                );
                unreadable += 1;
            }
        }
    }

    Ok(EmailRecord {
        kind: EmailKind::Msg,
        subject,
        date,
        sender,
        recipient,
        attachments,
        unreadable_attachments: unreadable,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Rebuild `"Name <email>"` from the two MAPI properties.
fn person(name: &str, email: &str) -> Option<String> {
    match (non_empty(name), non_empty(email)) {
        (Some(name), Some(email)) if name != email => Some(format!("{name} <{email}>")),
        (Some(name), _) => Some(name),
        (None, Some(email)) => Some(email),
        (None, None) => None,
    }
}
