//! CLI entry point for `casesort`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use casesort::classify::{Category, CategoryPolicy};
use casesort::config::{self, Config};
use casesort::extract::{extract_all, ExtractionSummary};
use casesort::ledger::Ledger;
use casesort::model::stats::RunStatistics;
use casesort::workflow::{Organizer, RunReport};

#[derive(Parser)]
#[command(
    name = "casesort",
    version,
    about = "Sort a case folder into documents, correspondence and other files",
    long_about = "Copies every file of a case folder into one of three category folders, \
renames emails after their date, sender, recipient and subject, extracts their \
attachments (nested emails included) and remembers what was done so reruns only \
pick up what is new."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Organize a case folder
    Organize {
        root: PathBuf,
        /// Create the category folders here instead of inside ROOT
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Folder name to leave out of the scan (repeatable)
        #[arg(short, long = "exclude", value_name = "NAME")]
        exclude: Vec<String>,
        /// Deepest nested email to walk
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Extract attachments from emails without touching any ledger
    Extract {
        #[arg(required = true)]
        emails: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the extraction records to this CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Show what the ledger of a folder records
    Status {
        root: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Export the ledger of a folder
    Export {
        root: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Organize {
            root,
            output_dir,
            exclude,
            max_depth,
            json,
        } => cmd_organize(&config, &root, output_dir, exclude, max_depth, json),
        Commands::Extract {
            emails,
            output,
            csv,
            json,
        } => cmd_extract(&config, &emails, &output, csv.as_deref(), json),
        Commands::Status { root, json } => cmd_status(&config, &root, json),
        Commands::Export {
            root,
            format,
            output,
        } => cmd_export(&config, &root, format, &output),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = config::log_file_path(config);
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let log_name = log_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    if !log_name.is_empty() && std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {label} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}"
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}

/// Organize a folder and print what happened.
fn cmd_organize(
    config: &Config,
    root: &Path,
    output_dir: Option<PathBuf>,
    exclude: Vec<String>,
    max_depth: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let mut options = config.organizer_options();
    if output_dir.is_some() {
        options.output_dir = output_dir;
    }
    options.exclude_folders.extend(exclude);
    if let Some(depth) = max_depth {
        options.walk.max_depth = depth;
    }

    let mut organizer = Organizer::new(root, options)?;
    let pb = progress_bar("Organizing");
    let start = Instant::now();
    let report = organizer.run(Some(&|current, total| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
    }))?;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_run_table(organizer.root(), &report, start.elapsed());
    }
    Ok(())
}

/// Extract attachments from a list of emails.
fn cmd_extract(
    config: &Config,
    emails: &[PathBuf],
    output: &Path,
    csv: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    for email in emails {
        if !email.exists() {
            anyhow::bail!("File not found: {}", email.display());
        }
    }

    let policy = CategoryPolicy::with_overrides(&config.classification.overrides);
    let pb = progress_bar("Extracting");
    pb.set_length(emails.len() as u64);
    let (records, summary) = extract_all(
        emails,
        output,
        &policy,
        &config.walk_settings(),
        &|current, _total| {
            pb.set_position(current as u64);
        },
    )?;
    pb.finish_and_clear();

    if let Some(csv_path) = csv {
        casesort::export::csv::export_attachments_csv(&records, csv_path)?;
    }

    if json {
        let out = serde_json::json!({
            "summary": summary,
            "attachments": records,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_extraction_table(output, &summary);
    }
    Ok(())
}

/// Print the counters recorded for a folder.
fn cmd_status(config: &Config, root: &Path, json: bool) -> anyhow::Result<()> {
    let (root, ledger) = load_ledger(config, root)?;

    if json {
        let out = serde_json::json!({
            "root_folder": root.to_string_lossy(),
            "records": ledger.len(),
            "stats": ledger.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {:<22} {}", "Folder", root.display());
    println!("  {:<22} {}", "Ledger records", ledger.len());
    print_stats_rows(ledger.stats());
    println!();
    Ok(())
}

/// Export a folder's ledger for reporting tools.
fn cmd_export(
    config: &Config,
    root: &Path,
    format: ExportFormat,
    output: &Path,
) -> anyhow::Result<()> {
    let (root, ledger) = load_ledger(config, root)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        ExportFormat::Csv => {
            casesort::export::csv::export_records_csv(&ledger.current_records(), output)?
        }
        ExportFormat::Json => casesort::export::json::export_json(&root, &ledger, output)?,
    }
    println!(
        "  Exported {} record(s) to {}",
        ledger.current_records().len(),
        output.display()
    );
    Ok(())
}

fn load_ledger(config: &Config, root: &Path) -> anyhow::Result<(PathBuf, Ledger)> {
    if !root.is_dir() {
        anyhow::bail!("Folder not found: {}", root.display());
    }
    let root = root.canonicalize()?;
    let mut ledger = Ledger::new(config::cache_dir(config));
    if !ledger.load(&root) {
        anyhow::bail!("No ledger found for {}; run `casesort organize` first", root.display());
    }
    Ok((root, ledger))
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "casesort", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn print_run_table(root: &Path, report: &RunReport, elapsed: std::time::Duration) {
    println!();
    println!("  {:<22} {}", "Folder", root.display());
    println!("  {:<22} {}", "New records", report.records.len());
    println!("  {:<22} {}", "Already processed", report.skipped.len());
    println!("  {:<22} {}", "Failed", report.failures.len());
    println!("  {:<22} {}", "Warnings", report.warnings);
    println!("  {:<22} {:.2?}", "Time", elapsed);
    if let Some(path) = &report.ledger_path {
        println!("  {:<22} {}", "Ledger", path.display());
    } else {
        println!("  {:<22} not saved", "Ledger");
    }

    if !report.failures.is_empty() {
        println!();
        println!("  Failures:");
        for (path, error) in &report.failures {
            println!("    {}: {error}", path.display());
        }
    }

    println!();
    println!("  Totals:");
    print_stats_rows(&report.totals);
    println!();
}

fn print_stats_rows(stats: &RunStatistics) {
    use humansize::{format_size, BINARY};

    println!("  {:<22} {}", "Files", stats.total_files);
    println!("  {:<22} {}", "Emails", stats.total_emails);
    println!("  {:<22} {}", "Emails renamed", stats.emails_renamed);
    println!("  {:<22} {}", "Attachments", stats.total_attachments);
    for category in Category::ALL {
        println!("    {:<20} {:>6}", category.folder_name(), stats.count(category));
    }
    println!(
        "  {:<22} {}",
        "Total size",
        format_size((stats.total_size_kb * 1024.0) as u64, BINARY)
    );
}

fn print_extraction_table(output: &Path, summary: &ExtractionSummary) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<22} {}", "Emails processed", summary.emails_processed);
    println!("  {:<22} {}", "Attachments", summary.attachments_extracted);
    println!(
        "  {:<22} {}",
        "Total size",
        format_size(summary.total_size_bytes, BINARY)
    );
    println!("  {:<22} {}", "Errors", summary.errors);
    println!("  {:<22} {}", "Output", output.display());
    println!();
}
