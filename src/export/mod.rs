//! Export for reporting tools: CSV and JSON.

pub mod csv;
pub mod json;
