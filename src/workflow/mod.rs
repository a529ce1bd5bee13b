//! The organize workflow: scan a root, then classify and extract.

pub mod organizer;
pub mod scan;

pub use organizer::{organize, FileOutcome, Organizer, OrganizerOptions, RunReport};
