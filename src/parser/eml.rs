//! Adapter for RFC 5322 text messages (`.eml`).

use std::path::Path;

use mail_parser::{MessageParser, MimeHeaders, PartType};
use tracing::debug;

use crate::error::{CaseError, Result};
use crate::model::attachment::AttachmentDescriptor;
use crate::model::email::{EmailKind, EmailRecord};
use crate::parser::date::normalize_date;

/// Parse raw `.eml` bytes into an [`EmailRecord`].
///
/// `path` is only used for error context.
pub fn parse_eml(path: &Path, data: &[u8]) -> Result<EmailRecord> {
    let data = skip_bom(data);
    let message = MessageParser::default()
        .parse(data)
        .ok_or_else(|| CaseError::unreadable(path, "not a valid RFC 5322 message"))?;

    // A blob without any header is not an email, whatever its extension says.
    if message.headers().is_empty() {
        return Err(CaseError::unreadable(path, "no message headers found"));
    }

    let subject = message.subject().map(str::to_string);
    let sender = message
        .from()
        .and_then(|from| from.first())
        .map(format_addr);
    let recipient = message.to().and_then(|to| to.first()).map(format_addr);

    let date = normalize_date(message.date().map(|dt| dt.to_rfc3339()).as_deref());

    let mut attachments = Vec::new();
    for (idx, part) in message.attachments().enumerate() {
        if matches!(part.body, PartType::Multipart(_)) {
            continue;
        }

        let is_inline = part
            .content_disposition()
            .map(|d| d.ctype().eq_ignore_ascii_case("inline"))
            .unwrap_or(false);
        if is_inline {
            debug!(index = idx, "Skipping inline part");
            continue;
        }

        let name = match (part.attachment_name(), &part.body) {
            (Some(name), _) => name.to_string(),
            // Forwarded messages frequently come without a file name.
            (None, PartType::Message(nested)) => {
                let subject = nested.subject().unwrap_or("message");
                format!("{}.eml", subject.trim())
            }
            (None, _) => continue,
        };

        attachments.push(AttachmentDescriptor::new(name, part.contents().to_vec()));
    }

    Ok(EmailRecord {
        kind: EmailKind::Eml,
        subject,
        date,
        sender,
        recipient,
        attachments,
        unreadable_attachments: 0,
    })
}

/// `"Name <address>"`, or whichever half is present.
fn format_addr(addr: &mail_parser::Addr<'_>) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{name} <{address}>"),
        (Some(name), None) => name.to_string(),
        (None, Some(address)) => address.to_string(),
        (None, None) => String::new(),
    }
}

fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}
