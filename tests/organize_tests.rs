//! End-to-end runs of the organizer over temporary case folders.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;

use casesort::classify::Category;
use casesort::error::CaseError;
use casesort::ledger::format::LedgerDocument;
use casesort::workflow::{Organizer, OrganizerOptions, RunReport};

use common::{eml, nested_chain, Part};

const RENAMED: &str = "20240315_Jane Doe_Tous_Budget Q1.eml";

fn options(cache: &Path) -> OrganizerOptions {
    OrganizerOptions {
        cache_dir: Some(cache.to_path_buf()),
        ..OrganizerOptions::default()
    }
}

fn run(root: &Path, cache: &Path) -> RunReport {
    Organizer::new(root, options(cache))
        .unwrap()
        .run(None)
        .unwrap()
}

fn read_ledger(root: &Path) -> LedgerDocument {
    let data = fs::read(root.join(".casesort_ledger.json")).unwrap();
    serde_json::from_slice(&data).unwrap()
}

/// `a.pdf` (50 KB) and `b.eml` carrying `c.xlsx` (10 KB).
fn budget_case() -> (assert_fs::TempDir, assert_fs::TempDir) {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("a.pdf").write_binary(&vec![b'p'; 50 * 1024]).unwrap();
    root.child("b.eml")
        .write_str(&eml(
            "Jane Doe <jane@x.com>",
            None,
            "Budget Q1",
            &[Part::new(
                "c.xlsx",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                vec![b'x'; 10 * 1024],
            )],
        ))
        .unwrap();
    (root, cache)
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

// ─── Test 1: Mixed folder → classified copies and counters ──────────

#[test]
fn test_budget_scenario() {
    let (root, cache) = budget_case();
    let report = run(root.path(), cache.path());

    assert!(report.failures.is_empty());
    assert_eq!(report.records.len(), 3);

    root.child("Dossier technique/a.pdf").assert(predicate::path::is_file());
    root.child(format!("Correspondance/{RENAMED}"))
        .assert(predicate::path::is_file());
    root.child("Dossier technique/c.xlsx")
        .assert(predicate::path::is_file());
    // Originals are copied, never moved.
    root.child("a.pdf").assert(predicate::path::exists());
    root.child("b.eml").assert(predicate::path::exists());

    let pdf = report
        .records
        .iter()
        .find(|r| r.original_path.ends_with("a.pdf"))
        .unwrap();
    assert_eq!(pdf.category, Category::TechnicalDocument);
    assert_eq!(pdf.size_kb, 50.0);
    assert!(!pdf.is_attachment);

    let email = report.records.iter().find(|r| r.renamed).unwrap();
    assert_eq!(email.category, Category::Correspondence);
    assert!(email.classified_path.ends_with(RENAMED));

    let xlsx = report.records.iter().find(|r| r.is_attachment).unwrap();
    assert_eq!(xlsx.source_email.as_deref(), Some(RENAMED));
    assert_eq!(xlsx.category, Category::TechnicalDocument);
    assert_eq!(xlsx.size_kb, 10.0);
    assert!(xlsx.original_path.ends_with("b.eml > c.xlsx"));

    let totals = &report.totals;
    assert_eq!(totals.total_files, 3);
    assert_eq!(totals.total_emails, 1);
    assert_eq!(totals.emails_renamed, 1);
    assert_eq!(totals.total_attachments, 1);
    assert_eq!(totals.count(Category::TechnicalDocument), 2);
    assert_eq!(totals.count(Category::Correspondence), 1);

    let attachment = &report.attachments[0];
    assert_eq!(attachment.email_chain, RENAMED);
    assert_eq!(attachment.email_subject, "Budget Q1");
    assert!(!attachment.from_nested_email);
}

// ─── Test 2: Second run over an unchanged folder does nothing ───────

#[test]
fn test_second_run_is_idempotent() {
    let (root, cache) = budget_case();
    run(root.path(), cache.path());
    let first = read_ledger(root.path());

    let report = run(root.path(), cache.path());
    assert!(report.records.is_empty());
    assert_eq!(report.skipped.len(), 2);

    let second = read_ledger(root.path());
    assert_eq!(second.processed_files, first.processed_files);
    assert_eq!(second.stats, first.stats);
    assert_eq!(files_in(&root.path().join("Dossier technique")), vec!["a.pdf", "c.xlsx"]);
    assert_eq!(files_in(&root.path().join("Correspondance")), vec![RENAMED]);
}

// ─── Test 3: Deleted output is reprocessed, nothing else ────────────

#[test]
fn test_resume_after_deletion() {
    let (root, cache) = budget_case();
    run(root.path(), cache.path());
    let first = read_ledger(root.path());

    fs::remove_file(root.path().join("Dossier technique/a.pdf")).unwrap();
    let report = run(root.path(), cache.path());

    assert_eq!(report.records.len(), 1);
    assert!(report.records[0].original_path.ends_with("a.pdf"));
    root.child("Dossier technique/a.pdf").assert(predicate::path::is_file());

    let second = read_ledger(root.path());
    assert_eq!(second.processed_files.len(), first.processed_files.len() + 1);
    assert_eq!(&second.processed_files[..3], &first.processed_files[..]);
    assert_eq!(second.stats.total_files, 3);
}

// ─── Test 4: Deleted attachment output is restored from the copy ────

#[test]
fn test_deleted_attachment_is_restored() {
    let (root, cache) = budget_case();
    run(root.path(), cache.path());

    fs::remove_file(root.path().join("Dossier technique/c.xlsx")).unwrap();
    let report = run(root.path(), cache.path());

    assert_eq!(report.records.len(), 1);
    assert!(report.records[0].is_attachment);
    root.child("Dossier technique/c.xlsx").assert(predicate::path::is_file());
    assert_eq!(files_in(&root.path().join("Correspondance")), vec![RENAMED]);
    assert_eq!(report.totals.total_attachments, 1);
}

// ─── Test 5: Nesting deeper than the limit stops cleanly ────────────

#[test]
fn test_recursion_bound() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("chain.eml").write_str(&nested_chain(11)).unwrap();

    let report = run(root.path(), cache.path());
    assert!(report.failures.is_empty());

    let expected: Vec<String> = {
        let mut v: Vec<String> = (0..=10).map(|d| format!("d{d}.pdf")).collect();
        v.sort();
        v
    };
    assert_eq!(files_in(&root.path().join("Dossier technique")), expected);

    // The depth-11 email is kept as a file, only its content is not walked.
    let correspondence = files_in(&root.path().join("Correspondance"));
    assert_eq!(correspondence.len(), 12);
    assert!(correspondence.iter().any(|n| n.ends_with("_Level 11.eml")));
    assert!(report.warnings >= 1);

    let deepest = report
        .attachments
        .iter()
        .find(|a| a.original_filename == "d10.pdf")
        .unwrap();
    assert!(deepest.from_nested_email);
    assert!(deepest.source_email.ends_with("_Level 10.eml"));
    assert_eq!(deepest.email_chain.matches(" > ").count(), 10);
}

// ─── Test 6: Decorative images are dropped, small files kept ────────

#[test]
fn test_decorative_images_are_skipped() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("sig.eml")
        .write_str(&eml(
            "bob@x.com",
            Some("Alice <alice@x.com>"),
            "Photos",
            &[
                Part::new("image001.png", "image/png", vec![0u8; 300]),
                Part::new("site_image.jpg", "image/jpeg", vec![0u8; 60_000]),
                Part::new("tiny.jpg", "image/jpeg", vec![0u8; 300]),
            ],
        ))
        .unwrap();

    let report = run(root.path(), cache.path());
    assert_eq!(
        files_in(&root.path().join("Autres fichiers")),
        vec!["site_image.jpg", "tiny.jpg"]
    );
    assert_eq!(report.attachments.len(), 2);
    root.child("Correspondance/20240315_Bob_Alice_Photos.eml")
        .assert(predicate::path::is_file());
}

// ─── Test 7: Unreadable email falls back to a plain copy ────────────

#[test]
fn test_corrupt_msg_is_copied_unrenamed() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("broken.msg").write_binary(b"\x00\x01garbage").unwrap();
    root.child("notes.txt").write_str("plain").unwrap();

    let report = run(root.path(), cache.path());
    assert!(report.failures.is_empty());
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.warnings, 1);
    root.child("Correspondance/broken.msg").assert(predicate::path::is_file());
    root.child("Autres fichiers/notes.txt")
        .assert(predicate::str::contains("plain").from_utf8().from_file_path());
    assert_eq!(report.totals.emails_renamed, 0);
}

// ─── Test 8: Name collisions get numbered suffixes ──────────────────

#[test]
fn test_same_name_in_two_folders() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("x/report.pdf").write_str("one").unwrap();
    root.child("y/report.pdf").write_str("two").unwrap();

    let report = run(root.path(), cache.path());
    assert_eq!(report.records.len(), 2);
    assert_eq!(
        files_in(&root.path().join("Dossier technique")),
        vec!["report.pdf", "report_1.pdf"]
    );
    let dests: Vec<PathBuf> = report
        .records
        .iter()
        .map(|r| PathBuf::from(&r.classified_path))
        .collect();
    assert_ne!(dests[0], dests[1]);
}

// ─── Test 9: Separate output directory and exclusions ───────────────

#[test]
fn test_output_dir_and_exclusions() {
    let root = assert_fs::TempDir::new().unwrap();
    let out = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("plan.dwg").write_str("dwg").unwrap();
    root.child("archive/old.pdf").write_str("old").unwrap();
    root.child(".hidden.pdf").write_str("h").unwrap();

    let mut opts = options(cache.path());
    opts.output_dir = Some(out.path().to_path_buf());
    opts.exclude_folders = vec!["archive".to_string()];
    let report = Organizer::new(root.path(), opts).unwrap().run(None).unwrap();

    assert_eq!(report.records.len(), 1);
    out.child("Dossier technique/plan.dwg").assert(predicate::path::is_file());
    root.child("Dossier technique").assert(predicate::path::missing());
    // The ledger stays with the root.
    root.child(".casesort_ledger.json").assert(predicate::path::is_file());
}

// ─── Test 10: Category overrides ────────────────────────────────────

#[test]
fn test_category_overrides() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("notes.txt").write_str("t").unwrap();
    root.child("scan.pdf").write_str("p").unwrap();

    let mut opts = options(cache.path());
    opts.category_overrides
        .insert("TXT".to_string(), Category::TechnicalDocument);
    let report = Organizer::new(root.path(), opts).unwrap().run(None).unwrap();
    assert_eq!(report.totals.count(Category::TechnicalDocument), 2);
    assert_eq!(report.totals.count(Category::Other), 0);
}

// ─── Test 11: Missing root is a fatal configuration error ───────────

#[test]
fn test_missing_root() {
    let tmp = assert_fs::TempDir::new().unwrap();
    let result = Organizer::new(&tmp.path().join("absent"), options(tmp.path()));
    assert!(matches!(result, Err(CaseError::RootNotFound(_))));
}

// ─── Test 12: Deleted attachment of a nested email is restored ──────

#[test]
fn test_deleted_nested_attachment_is_restored() {
    let root = assert_fs::TempDir::new().unwrap();
    let cache = assert_fs::TempDir::new().unwrap();
    root.child("chain.eml").write_str(&nested_chain(2)).unwrap();

    let first = run(root.path(), cache.path());
    assert_eq!(first.records.len(), 6);
    let correspondence = files_in(&root.path().join("Correspondance"));
    assert_eq!(correspondence.len(), 3);

    fs::remove_file(root.path().join("Dossier technique/d2.pdf")).unwrap();
    let second = run(root.path(), cache.path());

    assert_eq!(second.records.len(), 1);
    assert!(second.skipped.is_empty());
    let restored = &second.attachments[0];
    assert_eq!(restored.original_filename, "d2.pdf");
    assert!(restored.source_email.ends_with("_Level 2.eml"));
    assert!(restored.from_nested_email);
    root.child("Dossier technique/d2.pdf").assert(predicate::path::is_file());
    // Neither the nested emails nor the other attachments were copied again.
    assert_eq!(files_in(&root.path().join("Correspondance")), correspondence);
    assert_eq!(
        files_in(&root.path().join("Dossier technique")),
        vec!["d0.pdf", "d1.pdf", "d2.pdf"]
    );
    assert_eq!(second.totals.total_files, first.totals.total_files);
    assert_eq!(second.totals.total_attachments, first.totals.total_attachments);

    let third = run(root.path(), cache.path());
    assert!(third.records.is_empty());
    assert_eq!(third.skipped.len(), 1);
}
