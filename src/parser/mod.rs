//! Email container adapters.
//!
//! Both container kinds produce the same [`EmailRecord`] shape; callers
//! never see parser internals.

pub mod date;
pub mod eml;
pub mod msg;

use std::path::Path;

use crate::error::{CaseError, Result};
use crate::model::email::{EmailKind, EmailRecord};

/// Open the email container at `path`, dispatching on its extension.
pub fn open_email(path: &Path) -> Result<EmailRecord> {
    let kind = EmailKind::from_path(path)
        .ok_or_else(|| CaseError::unreadable(path, "not an email container extension"))?;
    let data = std::fs::read(path).map_err(|e| CaseError::io(path, e))?;
    parse_email(kind, path, &data)
}

/// Parse an in-memory container of a known kind.
pub fn parse_email(kind: EmailKind, path: &Path, data: &[u8]) -> Result<EmailRecord> {
    match kind {
        EmailKind::Msg => msg::parse_msg(path, data),
        EmailKind::Eml => eml::parse_eml(path, data),
    }
}
