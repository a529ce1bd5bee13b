//! Core data model: addresses, attachments, email metadata, records and counters.

pub mod address;
pub mod attachment;
pub mod email;
pub mod record;
pub mod stats;
