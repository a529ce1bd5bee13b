//! Export ledger and extraction records to CSV.
//!
//! Output is UTF-8 with BOM for Excel compatibility.

use std::io::Write;
use std::path::Path;

use crate::model::record::{timestamp, AttachmentRecord, ProcessedFileRecord};

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Export processed-file records to a CSV file.
///
/// Columns: Original_Path, Classified_Path, Category, Size_KB, Processed_At,
/// Source_Email, Is_Attachment, Renamed
pub fn export_records_csv(records: &[&ProcessedFileRecord], output_path: &Path) -> anyhow::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    write_records_csv(records, &mut file)?;
    file.flush()?;
    Ok(())
}

pub fn write_records_csv<W: Write>(records: &[&ProcessedFileRecord], out: &mut W) -> anyhow::Result<()> {
    out.write_all(&BOM)?;
    writeln!(
        out,
        "Original_Path,Classified_Path,Category,Size_KB,Processed_At,Source_Email,Is_Attachment,Renamed"
    )?;

    for record in records {
        writeln!(
            out,
            "{},{},{},{:.2},{},{},{},{}",
            csv_escape(&record.original_path),
            csv_escape(&record.classified_path),
            csv_escape(record.category.folder_name()),
            record.size_kb,
            record.processed_at.format(timestamp::FORMAT),
            csv_escape(record.source_email.as_deref().unwrap_or("")),
            record.is_attachment,
            record.renamed,
        )?;
    }
    Ok(())
}

/// Export extraction records to a CSV file.
///
/// Columns: Original_Filename, Saved_Filename, Saved_Path, Category, Size_Bytes,
/// Email_Chain, Source_Email, Email_Subject, Email_Date, Extracted_At, From_Nested_Email
pub fn export_attachments_csv(records: &[AttachmentRecord], output_path: &Path) -> anyhow::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    file.write_all(&BOM)?;
    writeln!(
        file,
        "Original_Filename,Saved_Filename,Saved_Path,Category,Size_Bytes,Email_Chain,Source_Email,Email_Subject,Email_Date,Extracted_At,From_Nested_Email"
    )?;

    for record in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{}",
            csv_escape(&record.original_filename),
            csv_escape(&record.saved_filename),
            csv_escape(&record.saved_path.to_string_lossy()),
            csv_escape(record.category.folder_name()),
            record.size_bytes,
            csv_escape(&record.email_chain),
            csv_escape(&record.source_email),
            csv_escape(&record.email_subject),
            record.email_date.format("%Y-%m-%d"),
            record.extracted_at.format(timestamp::FORMAT),
            record.from_nested_email,
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
