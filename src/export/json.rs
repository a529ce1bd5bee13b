//! JSON report: counters plus the current record of every source.

use std::path::Path;

use serde::Serialize;

use crate::ledger::Ledger;
use crate::model::record::{now, timestamp, ProcessedFileRecord};
use crate::model::stats::RunStatistics;

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub root_folder: String,
    pub stats: &'a RunStatistics,
    pub records: Vec<&'a ProcessedFileRecord>,
}

impl<'a> JsonReport<'a> {
    pub fn from_ledger(root: &Path, ledger: &'a Ledger) -> Self {
        Self {
            generated_at: now().format(timestamp::FORMAT).to_string(),
            root_folder: root.to_string_lossy().into_owned(),
            stats: ledger.stats(),
            records: ledger.current_records(),
        }
    }
}

/// Write the report for `ledger` as pretty-printed JSON.
pub fn export_json(root: &Path, ledger: &Ledger, output_path: &Path) -> anyhow::Result<()> {
    let report = JsonReport::from_ledger(root, ledger);
    let file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    serde_json::to_writer_pretty(file, &report)?;
    Ok(())
}
