use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{column, AccountingRecord};

/// Output layouts. Chosen once per run.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    /// Sheet name, date, amount and errors only
    Sheet,
    /// freee journal import columns plus review columns
    Freee,
}

impl OutputFormat {
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            OutputFormat::Sheet => vec![
                column::SHEET_NAME,
                column::DATE,
                column::AMOUNT,
                column::ERRORS,
            ],
            OutputFormat::Freee => column::FREEE
                .iter()
                .copied()
                .chain([
                    column::CANDIDATE,
                    column::DEBIT_PARTNER_MATCH,
                    column::CREDIT_PARTNER_MATCH,
                    column::ERRORS,
                ])
                .collect(),
        }
    }
}

/// Writes converted files into `output_dir`, one CSV per input file.
pub struct RecordSink {
    format: OutputFormat,
    output_dir: PathBuf,
    run_date: NaiveDate,
}

impl RecordSink {
    pub fn new(format: OutputFormat, output_dir: PathBuf, run_date: NaiveDate) -> Self {
        Self {
            format,
            output_dir,
            run_date,
        }
    }

    /// Writes `records` and returns the path of the new file.
    pub fn write(
        &self,
        records: &[AccountingRecord],
        original_filename: &str,
    ) -> Result<PathBuf, SinkError> {
        let path = self.output_path(original_filename);
        let file = File::create(&path).map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;

        self.render(records, file)?;
        Ok(path)
    }

    pub fn render<W: io::Write>(
        &self,
        records: &[AccountingRecord],
        output: W,
    ) -> Result<(), SinkError> {
        let columns = self.format.columns();
        let mut writer = csv::Writer::from_writer(output);

        writer.write_record(&columns)?;
        for record in records {
            writer.write_record(columns.iter().map(|name| record.column_value(name)))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// `<stem>_<yyyymmdd>.csv`, or `<stem>_<yyyymmdd>_NN.csv` when taken.
    fn output_path(&self, original_filename: &str) -> PathBuf {
        let stem = Path::new(original_filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let base = format!("{}_{}", stem, self.run_date.format("%Y%m%d"));

        let mut path = self.output_dir.join(format!("{base}.csv"));
        let mut counter = 1;
        while path.exists() {
            path = self.output_dir.join(format!("{base}_{counter:02}.csv"));
            counter += 1;
        }
        path
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Cannot create `{path}`: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("Cannot write CSV: `{0}`")]
    Csv(#[from] csv::Error),
    #[error("Cannot write output: `{0}`")]
    Io(#[from] io::Error),
}
