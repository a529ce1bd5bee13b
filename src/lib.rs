//! `casesort`: sort case folders into documents, correspondence and
//! everything else.
//!
//! The library scans a folder, copies each file into a category folder,
//! renames emails (`.msg` and `.eml`) after their headers, extracts their
//! attachments recursively and keeps a ledger so repeated runs only handle
//! what is new or whose output has gone missing.

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod ledger;
pub mod model;
pub mod naming;
pub mod parser;
pub mod workflow;
