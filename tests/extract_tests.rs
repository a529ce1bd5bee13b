//! Extraction-only API and record exports.

mod common;

use assert_fs::prelude::*;
use predicates::prelude::*;

use casesort::classify::{Category, CategoryPolicy};
use casesort::export::csv::export_attachments_csv;
use casesort::extract::{extract_all, WalkSettings};

use common::{eml, nested_chain, Part};

// ─── Test 1: Nested email attachments carry the inner email's name ──

#[test]
fn test_nested_source_email() {
    let temp = assert_fs::TempDir::new().unwrap();
    let inner = eml(
        "Site Team <site@x.com>",
        Some("jane@x.com"),
        "Photos chantier",
        &[Part::new("releve.xls", "application/vnd.ms-excel", vec![1u8; 2048])],
    );
    let outer = eml(
        "Jane Doe <jane@x.com>",
        Some("Bob <bob@x.com>"),
        "TR: Photos chantier",
        &[
            Part::new("plan.pdf", "application/pdf", vec![2u8; 4096]),
            Part::email("fwd.eml", inner),
        ],
    );
    let email = temp.child("outer.eml");
    email.write_str(&outer).unwrap();
    let out = temp.child("out");

    let (records, summary) = extract_all(
        &[email.path().to_path_buf()],
        out.path(),
        &CategoryPolicy::default(),
        &WalkSettings::default(),
        &|_, _| {},
    )
    .unwrap();

    assert_eq!(summary.emails_processed, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(records.len(), 3);

    let nested = records.iter().find(|r| r.is_email).unwrap();
    assert!(nested.renamed);
    assert_eq!(nested.category, Category::Correspondence);
    assert_eq!(
        nested.saved_filename,
        "20240315_Site Team_Jane_Photos chantier.eml"
    );

    let xls = records
        .iter()
        .find(|r| r.original_filename == "releve.xls")
        .unwrap();
    assert_eq!(xls.source_email, nested.saved_filename);
    assert_eq!(xls.email_chain, format!("outer.eml > {}", nested.saved_filename));
    assert_eq!(xls.email_subject, "Photos chantier");
    assert!(xls.from_nested_email);
    assert_eq!(xls.locator, format!("{} > fwd.eml > releve.xls", email.path().display()));

    let pdf = records
        .iter()
        .find(|r| r.original_filename == "plan.pdf")
        .unwrap();
    assert_eq!(pdf.source_email, "outer.eml");
    assert!(!pdf.from_nested_email);

    out.child("Dossier technique/releve.xls").assert(predicate::path::is_file());
    out.child("Dossier technique/plan.pdf").assert(predicate::path::is_file());
    // The source email itself is never copied by extraction.
    out.child("Correspondance/outer.eml").assert(predicate::path::missing());
}

// ─── Test 2: Lower depth limit ──────────────────────────────────────

#[test]
fn test_custom_depth_limit() {
    let temp = assert_fs::TempDir::new().unwrap();
    let email = temp.child("chain.eml");
    email.write_str(&nested_chain(4)).unwrap();
    let out = temp.child("out");

    let settings = WalkSettings {
        max_depth: 1,
        ..WalkSettings::default()
    };
    let (records, summary) = extract_all(
        &[email.path().to_path_buf()],
        out.path(),
        &CategoryPolicy::default(),
        &settings,
        &|_, _| {},
    )
    .unwrap();

    let mut pdfs: Vec<&str> = records
        .iter()
        .filter(|r| !r.is_email)
        .map(|r| r.original_filename.as_str())
        .collect();
    pdfs.sort();
    assert_eq!(pdfs, vec!["d0.pdf", "d1.pdf"]);
    assert_eq!(summary.errors, 1);
    out.child("Dossier technique/d2.pdf").assert(predicate::path::missing());
}

// ─── Test 3: CSV export of extraction records ───────────────────────

#[test]
fn test_attachments_csv() {
    let temp = assert_fs::TempDir::new().unwrap();
    let email = temp.child("a.eml");
    email
        .write_str(&eml(
            "a@x.com",
            None,
            "Devis, version 2",
            &[Part::new("devis.docx", "application/octet-stream", vec![0u8; 10])],
        ))
        .unwrap();

    let (records, _) = extract_all(
        &[email.path().to_path_buf()],
        &temp.path().join("out"),
        &CategoryPolicy::default(),
        &WalkSettings::default(),
        &|_, _| {},
    )
    .unwrap();

    let csv = temp.child("records.csv");
    export_attachments_csv(&records, csv.path()).unwrap();
    csv.assert(predicate::str::contains("devis.docx").from_utf8().from_file_path());
    csv.assert(
        predicate::str::contains("\"Devis, version 2\"")
            .from_utf8()
            .from_file_path(),
    );
    csv.assert(predicate::str::contains("Dossier technique").from_utf8().from_file_path());
}
