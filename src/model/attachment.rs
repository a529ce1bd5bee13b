//! Attachment descriptors produced by the container adapters.
//!
//! Both container kinds are reduced to the same value type so the walker
//! never touches parser internals.

use serde::{Deserialize, Serialize};

/// One attachment of an opened email container, with its decoded payload.
#[derive(Debug, Clone)]
pub struct AttachmentDescriptor {
    /// File name as declared by the container (long name preferred).
    pub name: String,
    /// Decoded size in bytes.
    pub size: u64,
    /// Decoded content.
    pub content: Vec<u8>,
}

impl AttachmentDescriptor {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// Lowercased extension of the declared name, without the dot.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default()
    }
}

/// Heuristic for inline signature/logo art.
///
/// An attachment is decorative only when its name contains one of the
/// markers **and** it is smaller than `max_size`. Both conditions are
/// required so small but legitimately named files survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorativeRule {
    /// Case-insensitive substrings of the attachment name.
    pub markers: Vec<String>,
    /// Exclusive size ceiling in bytes.
    pub max_size: u64,
}

impl Default for DecorativeRule {
    fn default() -> Self {
        Self {
            markers: vec!["image".into(), "inline".into(), "icon".into()],
            max_size: 50_000,
        }
    }
}

impl DecorativeRule {
    pub fn is_decorative(&self, attachment: &AttachmentDescriptor) -> bool {
        if attachment.size >= self.max_size {
            return false;
        }
        let name = attachment.name.to_lowercase();
        self.markers
            .iter()
            .any(|m| !m.is_empty() && name.contains(&m.to_lowercase()))
    }
}
