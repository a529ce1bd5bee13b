//! Aggregate counters over processed-file records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::Category;

use super::record::ProcessedFileRecord;

/// Counters persisted alongside the ledger records and handed to reporters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStatistics {
    pub total_files: u64,
    pub total_emails: u64,
    pub emails_renamed: u64,
    pub total_attachments: u64,
    #[serde(deserialize_with = "lenient_categories")]
    pub by_category: BTreeMap<Category, u64>,
    pub total_size_kb: f64,
}

impl RunStatistics {
    /// Counters for an arbitrary sequence of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProcessedFileRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.add(record);
        }
        stats
    }

    /// Account for one record.
    pub fn add(&mut self, record: &ProcessedFileRecord) {
        self.total_files += 1;
        if record.is_email() {
            self.total_emails += 1;
        }
        if record.renamed {
            self.emails_renamed += 1;
        }
        if record.is_attachment {
            self.total_attachments += 1;
        }
        *self.by_category.entry(record.category).or_insert(0) += 1;
        self.total_size_kb = round2(self.total_size_kb + record.size_kb);
    }

    /// Withdraw a record previously passed to [`add`](Self::add).
    pub fn remove(&mut self, record: &ProcessedFileRecord) {
        self.total_files = self.total_files.saturating_sub(1);
        if record.is_email() {
            self.total_emails = self.total_emails.saturating_sub(1);
        }
        if record.renamed {
            self.emails_renamed = self.emails_renamed.saturating_sub(1);
        }
        if record.is_attachment {
            self.total_attachments = self.total_attachments.saturating_sub(1);
        }
        if let Some(count) = self.by_category.get_mut(&record.category) {
            *count = count.saturating_sub(1);
        }
        self.total_size_kb = round2((self.total_size_kb - record.size_kb).max(0.0));
    }

    pub fn count(&self, category: Category) -> u64 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Accept category maps with unknown keys by dropping them.
fn lenient_categories<'de, D>(d: D) -> Result<BTreeMap<Category, u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, u64> = BTreeMap::deserialize(d)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, count)| {
            serde_json::from_value::<Category>(serde_json::Value::String(key))
                .ok()
                .map(|c| (c, count))
        })
        .collect())
}
