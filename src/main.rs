// Entry point and interactive menu.
//
// - [1]/[2] load a metering or debt workbook and print diagnostics.
// - [3] builds the report for the loaded data: writes the document, a CSV
//   of the normalized rows, a JSON summary, and archives the document
//   under the report date.
// - [4]/[5] fetch or list archived documents.
use chrono::NaiveDate;
use clap::Parser;
use dienluc_report::archive::{JsonFileStore, ReportArchive};
use dienluc_report::output;
use dienluc_report::report::{DocumentRenderer, MarkdownRenderer};
use dienluc_report::util::format_int;
use dienluc_report::{build_report, load, RecordSet, ReportConfig, ReportError, SchemaKind};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Metering progress and overdue-debt reports from workbook exports.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML file with report settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Report date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Archive file for generated documents.
    #[arg(long)]
    archive: Option<PathBuf>,
    /// Directory for generated files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

/// The dataset loaded in this run. Owned by `main` and passed to handlers.
#[derive(Default)]
struct Session {
    records: Option<RecordSet>,
}

/// Read one trimmed line from `input`. `None` at end of input or on a read error.
fn read_answer(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf.trim().to_string()),
        Err(e) => {
            error!("stdin read failed: {e}");
            None
        }
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

/// `true` for `Y`, `false` for `N` or end of input.
fn back_to_menu(mut next: impl FnMut() -> Option<String>) -> bool {
    loop {
        match next().map(|s| s.to_uppercase()).as_deref() {
            Some("Y") => return true,
            Some("N") | None => return false,
            Some(_) => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn prompt_back_to_menu() -> bool {
    back_to_menu(|| prompt("Back to menu (Y/N): "))
}

/// A menu answer; end of input is `[0] Exit`.
fn menu_choice(answer: Option<String>) -> String {
    answer.unwrap_or_else(|| "0".to_string())
}

fn handle_load(session: &mut Session, kind: SchemaKind, config: &ReportConfig) {
    let Some(input) = prompt("Workbook path: ") else {
        return;
    };
    let path = PathBuf::from(input);
    match load(&path, kind, config) {
        Ok((records, report)) => {
            println!(
                "Loaded {} workbook: {} data rows, {} kept.",
                kind,
                format_int(report.total_rows as u64),
                format_int(report.kept_rows as u64)
            );
            if report.blank_identity_rows > 0 {
                println!("Note: {} rows without a unit name were skipped.", report.blank_identity_rows);
            }
            if report.reserved_total_rows > 0 {
                println!("Note: {} grand-total rows were excluded.", report.reserved_total_rows);
            }
            if report.missing_cells > 0 {
                println!("Note: {} numeric cells could not be read and are left out of totals.", report.missing_cells);
            }
            output::preview_records(&records, 5);
            session.records = Some(records);
        }
        Err(e) => {
            error!(path = %path.display(), "load failed: {e}");
            eprintln!("Failed to load workbook: {}\n", e);
        }
    }
}

fn handle_generate(
    session: &Session,
    config: &ReportConfig,
    archive: &mut ReportArchive<JsonFileStore>,
    out_dir: &Path,
) -> dienluc_report::Result<()> {
    let Some(records) = &session.records else {
        println!("Error: No data loaded. Please load a workbook first (option 1 or 2).\n");
        return Ok(());
    };

    let report = build_report(records, config, config.resolved_as_of())?;
    let renderer = MarkdownRenderer::default();
    let bytes = renderer.render(&report.document)?;

    let doc_path = out_dir.join(format!("{}.{}", report.file_stem(), renderer.extension()));
    std::fs::write(&doc_path, &bytes)?;
    let csv_path = out_dir.join(format!("{}_data.csv", report.file_stem()));
    output::write_records_csv(&csv_path, &report.records)?;
    let json_path = out_dir.join(format!("{}_summary.json", report.file_stem()));
    output::write_json(&json_path, &report.summary)?;
    archive.put(report.as_of, &report.label(), &bytes)?;

    println!("\n{}\n", report.document.title);
    for (key, value) in &report.document.overview {
        println!("  {}: {}", key, value);
    }
    println!("\n{}\n", report.document.commentary);
    println!("Top {}:", report.top.len());
    output::preview_records(&report.top, config.top_n);
    println!("Bottom {}:", report.bottom.len());
    output::preview_records(&report.bottom, config.top_n);
    println!("Document saved to {}", doc_path.display());
    println!("Data exported to {} and {}\n", csv_path.display(), json_path.display());
    Ok(())
}

fn handle_download(archive: &ReportArchive<JsonFileStore>, out_dir: &Path) -> dienluc_report::Result<()> {
    let Some(input) = prompt("Report date (YYYY-MM-DD): ") else {
        return Ok(());
    };
    let date = NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .map_err(|e| ReportError::Archive(format!("'{}' is not a date: {}", input, e)))?;
    match archive.get(date)? {
        Some(entry) => {
            let path = out_dir.join(format!("report_{}.md", date.format("%Y-%m-%d")));
            std::fs::write(&path, &entry.document)?;
            println!("{} saved to {}\n", entry.label, path.display());
        }
        None => println!("No archived report for {}.\n", date),
    }
    Ok(())
}

fn handle_list(archive: &ReportArchive<JsonFileStore>) -> dienluc_report::Result<()> {
    let dates = archive.dates()?;
    if dates.is_empty() {
        println!("Archive is empty.\n");
        return Ok(());
    }
    for date in dates {
        let label = archive.get(date)?.map(|e| e.label).unwrap_or_default();
        println!("  {}  {}", date, label);
    }
    println!();
    Ok(())
}

fn main() -> dienluc_report::Result<()> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_toml_file(path)?,
        None => ReportConfig::default(),
    }
    .with_env_overrides()?;
    if cli.as_of.is_some() {
        config.as_of = cli.as_of;
    }
    if let Some(path) = cli.archive {
        config.archive_path = path;
    }
    config.validate()?;
    std::fs::create_dir_all(&cli.out_dir)?;
    info!(?config, "Starting");

    let mut archive = ReportArchive::new(JsonFileStore::open(&config.archive_path)?);
    let mut session = Session::default();

    loop {
        println!("Select an action:");
        println!("[1] Load metering workbook");
        println!("[2] Load debt workbook");
        println!("[3] Generate report");
        println!("[4] Download archived report");
        println!("[5] List archived reports");
        println!("[0] Exit\n");
        let result = match menu_choice(prompt("Enter choice: ")).as_str() {
            "1" => {
                handle_load(&mut session, SchemaKind::Metering, &config);
                Ok(())
            }
            "2" => {
                handle_load(&mut session, SchemaKind::Debt, &config);
                Ok(())
            }
            "3" => {
                let result = handle_generate(&session, &config, &mut archive, &cli.out_dir);
                if result.is_ok() && !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
                result
            }
            "4" => handle_download(&archive, &cli.out_dir),
            "5" => handle_list(&archive),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-5.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("request failed: {e}");
            eprintln!("Error: {}\n", e);
        }
    }
    Ok(())
}
