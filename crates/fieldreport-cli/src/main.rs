//! Field report CLI - export JSON records as XLSX reports

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fieldreport::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fieldreport")]
#[command(author, version, about = "Field maintenance report exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every record as a general control report
    General {
        /// JSON file with `metadata` and `records`
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export the work-order checks as a work-order and to-do report
    #[command(alias = "wo")]
    WorkOrders {
        /// JSON file with `metadata` and `records`
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export a free-form template
    Template {
        /// JSON template file
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory the report is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Directory for temporary photo files (default: system temp dir)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Report title, replacing the one in the input
    #[arg(short, long)]
    title: Option<String>,

    /// Banner text merged over the top of each sheet
    #[arg(long)]
    banner: Option<String>,

    /// Longest photo side in pixels
    #[arg(long, default_value_t = 800)]
    max_dimension: u32,

    /// Soft byte budget per compressed photo
    #[arg(long, default_value_t = 500 * 1024)]
    max_bytes: usize,
}

impl OutputArgs {
    fn options(&self) -> ExportOptions {
        let mut options = ExportOptions::new(&self.output_dir).with_image_settings(ImageSettings {
            max_dimension_px: self.max_dimension,
            max_bytes: self.max_bytes,
        });
        if let Some(dir) = &self.scratch_dir {
            options = options.with_scratch_dir(dir);
        }
        if let Some(banner) = &self.banner {
            options = options.with_banner_text(banner);
        }
        options
    }
}

/// A record as it appears in the input file; photos are referenced by path
#[derive(Deserialize)]
struct RecordInput {
    #[serde(flatten)]
    record: DomainRecord,
    /// Relative paths resolve against the input file's directory
    #[serde(default)]
    photo_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct RecordsFile {
    metadata: ReportMetadata,
    #[serde(default)]
    records: Vec<RecordInput>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::General { input, output } => {
            let (records, metadata) = load_records(&input, output.title.as_deref())?;
            export_general_control(&records, &metadata, &output.options())
                .context("General control export failed")?
        }
        Commands::WorkOrders { input, output } => {
            let (records, metadata) = load_records(&input, output.title.as_deref())?;
            export_work_orders(&records, &metadata, &output.options())
                .context("Work-order export failed")?
        }
        Commands::Template { input, output } => {
            let mut template: ReportTemplate = read_json(&input)?;
            if let Some(title) = &output.title {
                template.title.clone_from(title);
            }
            export_template(&template, &output.options()).context("Template export failed")?
        }
    };

    for skipped in &outcome.skipped_images {
        eprintln!(
            "Warning: photo of record {} skipped: {}",
            skipped.record_index, skipped.reason
        );
    }
    info!(rows = outcome.rows_written, pictures = outcome.pictures_embedded, "done");
    println!("{}", outcome.path.display());

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn load_records(input: &Path, title: Option<&str>) -> Result<(Vec<DomainRecord>, ReportMetadata)> {
    let file: RecordsFile = read_json(input)?;
    let base = input.parent().unwrap_or_else(|| Path::new("."));

    let mut metadata = file.metadata;
    if let Some(title) = title {
        metadata.title = title.to_string();
    }

    let records = file
        .records
        .into_iter()
        .map(|entry| attach_photo(entry, base))
        .collect();

    Ok((records, metadata))
}

/// Load the record's photo; an unreadable photo leaves the record without one
fn attach_photo(entry: RecordInput, base: &Path) -> DomainRecord {
    let Some(photo_path) = entry.photo_path else {
        return entry.record;
    };

    let path = if photo_path.is_absolute() {
        photo_path
    } else {
        base.join(photo_path)
    };
    match fs::read(&path) {
        Ok(bytes) => entry.record.with_photo(bytes),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                title = %entry.record.title,
                "photo not readable, record exported without it"
            );
            entry.record
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"{
        "metadata": {
            "title": "Line 3",
            "machines": [{ "title": "Press", "operators": ["Ana"] }]
        },
        "records": [
            {
                "title": "Seal",
                "timestamp": "2024-06-03T10:15:00",
                "machine": "Press",
                "kind": { "type": "work_order_check", "details": "replace" },
                "photo_path": "seal.jpg"
            },
            {
                "title": "Oil",
                "timestamp": "2024-06-03T11:00:00",
                "status": "OK",
                "kind": { "type": "plain_check" }
            }
        ]
    }"#;

    #[test]
    fn test_load_records_resolves_photos() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("records.json");
        fs::write(&input, RECORDS).unwrap();
        fs::write(dir.path().join("seal.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();

        let (records, metadata) = load_records(&input, Some("Overridden")).unwrap();

        assert_eq!(metadata.title, "Overridden");
        assert_eq!(metadata.machines.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].photo.as_deref(), Some(&[0xFF, 0xD8, 0xFF][..]));
        assert_eq!(records[0].work_order_details(), Some("replace"));
        assert!(records[1].photo.is_none());
        assert_eq!(records[1].display_status(), "OK");
    }

    #[test]
    fn test_missing_photo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("records.json");
        fs::write(&input, RECORDS).unwrap();

        let (records, _) = load_records(&input, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Seal");
        assert!(records[0].photo.is_none());
    }

    #[test]
    fn test_photo_path_that_is_a_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("records.json");
        fs::write(&input, RECORDS).unwrap();
        fs::create_dir(dir.path().join("seal.jpg")).unwrap();

        let (records, _) = load_records(&input, None).unwrap();
        assert!(records[0].photo.is_none());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "fieldreport",
            "wo",
            "in.json",
            "--output-dir",
            "out",
            "--max-dimension",
            "640",
        ])
        .unwrap();
        match cli.command {
            Commands::WorkOrders { input, output } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert_eq!(output.options().image.max_dimension_px, 640);
                assert_eq!(output.options().output_dir, PathBuf::from("out"));
            }
            _ => panic!("expected work-orders"),
        }
    }
}
