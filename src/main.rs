use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

use crate::{
    processor::{
        codes::{Channel, CodeTables, CodesError},
        tables::{LookupTables, TableError},
        voucher::MonthSource,
        Pipeline,
    },
    sink::{OutputFormat, RecordSink, SinkError},
    source::{SourceError, SourceFormat},
};

mod model;
mod processor;
mod sink;
mod source;

/// Converts journal exports into freee import files.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input files, converted in the given order
    #[arg(required = true)]
    input_files: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = SourceFormat::Streamed)]
    input_format: SourceFormat,

    #[arg(long, value_enum, default_value_t = OutputFormat::Freee)]
    output_format: OutputFormat,

    /// Directory receiving the converted files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Department mapping CSV (raw name, canonical name)
    #[arg(long)]
    dept_mapping: Option<PathBuf>,

    /// Fixed partner list CSV (raw name, canonical name)
    #[arg(long)]
    partner_list: Option<PathBuf>,

    /// Partner master CSV exported from freee (name in column A, status in column Q)
    #[arg(long)]
    partner_master: Option<PathBuf>,

    /// Import channel encoded in the first voucher digit
    #[arg(long, value_enum, default_value_t = Channel::Streamed)]
    channel: Channel,

    /// Source of the voucher month digits
    #[arg(long, value_enum, default_value_t = MonthSource::TransactionDate)]
    voucher_month: MonthSource,

    /// JSON file overriding the channel and department code tables
    #[arg(long)]
    codes: Option<PathBuf>,

    /// Date of the run (yyyy-mm-dd), defaults to today
    #[arg(long)]
    run_date: Option<NaiveDate>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init()
    {
        eprintln!("Failed to create logger ({}). Continuing anyway.", err);
    }

    let args = Args::parse();
    let run_date = args.run_date.unwrap_or_else(|| Local::now().date_naive());

    let (tables, codes) = if args.input_format.needs_resolution() {
        (load_tables(&args)?, load_codes(&args)?)
    } else {
        (LookupTables::default(), CodeTables::default())
    };
    let pipeline = build_pipeline(
        args.input_format,
        &tables,
        &codes,
        args.channel,
        args.voucher_month,
        run_date,
    )?;
    let sink = RecordSink::new(args.output_format, args.output_dir.clone(), run_date);

    let summary = convert_all(&args.input_files, args.input_format, pipeline.as_ref(), &sink);

    println!(
        "Converted {} file(s), {} failed, {} record(s) need review",
        summary.outputs.len(),
        summary.failed.len(),
        summary.flagged_records
    );

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(Error::FilesFailed(summary.failed.len()).into())
    }
}

fn load_tables(args: &Args) -> Result<LookupTables, Error> {
    match (&args.dept_mapping, &args.partner_list, &args.partner_master) {
        (Some(dept_mapping), Some(partner_list), Some(partner_master)) => {
            Ok(LookupTables::load(dept_mapping, partner_list, partner_master)?)
        }
        _ => Err(Error::MissingTables),
    }
}

fn load_codes(args: &Args) -> Result<CodeTables, Error> {
    match &args.codes {
        Some(path) => Ok(CodeTables::from_path(path)?),
        None => Ok(CodeTables::default()),
    }
}

/// The resolution stages only exist for layouts that need them, so a code
/// table without the selected channel does not stop other layouts.
fn build_pipeline<'a>(
    format: SourceFormat,
    tables: &'a LookupTables,
    codes: &'a CodeTables,
    channel: Channel,
    month_source: MonthSource,
    run_date: NaiveDate,
) -> Result<Option<Pipeline<'a>>, CodesError> {
    if !format.needs_resolution() {
        return Ok(None);
    }
    Pipeline::new(tables, codes, channel, month_source, run_date).map(Some)
}

#[derive(Debug, Default)]
struct Summary {
    outputs: Vec<PathBuf>,
    failed: Vec<PathBuf>,
    flagged_records: usize,
}

/// Converts every file in order. A file that fails is logged and skipped.
fn convert_all(
    paths: &[PathBuf],
    format: SourceFormat,
    pipeline: Option<&Pipeline>,
    sink: &RecordSink,
) -> Summary {
    let mut summary = Summary::default();
    for path in paths {
        log::info!("Converting {}", path.display());

        match convert_file(path, format, pipeline, sink) {
            Ok(report) => {
                for error in &report.file_errors {
                    log::warn!("{}: {}", path.display(), error);
                }
                log::info!(
                    "Wrote {} records ({} with errors, {} with unreadable date or amount) to {}",
                    report.records,
                    report.flagged_records,
                    report.unreadable_records,
                    report.output.display()
                );
                summary.flagged_records += report.flagged_records;
                summary.outputs.push(report.output);
            }
            Err(err) => {
                log::error!("{}: {}", path.display(), err);
                summary.failed.push(path.clone());
            }
        }
    }
    summary
}

#[derive(Debug)]
struct FileReport {
    output: PathBuf,
    records: usize,
    flagged_records: usize,
    unreadable_records: usize,
    file_errors: Vec<String>,
}

/// Reads, resolves and writes one file. An `Err` means nothing was written
/// for this file; row-level problems travel inside the records instead.
fn convert_file(
    path: &Path,
    format: SourceFormat,
    pipeline: Option<&Pipeline>,
    sink: &RecordSink,
) -> Result<FileReport, Error> {
    let mut output = format.read(path)?;
    let read_count = output.records.len();

    if let Some(pipeline) = pipeline {
        pipeline.run(&mut output.records);
    }

    let original_filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let written = sink.write(&output.records, &original_filename)?;

    Ok(FileReport {
        output: written,
        records: read_count,
        flagged_records: output
            .records
            .iter()
            .filter(|record| record.has_errors())
            .count(),
        unreadable_records: output
            .records
            .iter()
            .filter(|record| record.date.is_format_error() || record.amount.is_format_error())
            .count(),
        file_errors: output.errors,
    })
}

#[derive(Debug, Error)]
enum Error {
    #[error(
        "--dept-mapping, --partner-list and --partner-master are required for this input format"
    )]
    MissingTables,
    #[error("{0} file(s) could not be converted")]
    FilesFailed(usize),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
    #[error("Code table error: {0}")]
    Codes(#[from] CodesError),
    #[error("Output error: {0}")]
    Sink(#[from] SinkError),
}
