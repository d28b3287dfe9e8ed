use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::Trim;
use thiserror::Error;

use crate::model::{AccountingRecord, CellValue};

pub mod freee;
pub mod sheet;
pub mod streamed;
pub mod validate;
mod workbook;

/// Cells of one sheet, indexed by zero-based row then column.
pub type Grid = Vec<Vec<CellValue>>;

/// Input layouts understood by the converter. Chosen once per run.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceFormat {
    /// Headerless grid, date in B2 and amount in C3
    Sheet,
    /// CSV in the freee journal layout
    Freee,
    /// STREAMED journal export
    Streamed,
}

/// Records read from one file, plus every row-level diagnostic raised
/// while reading it.
#[derive(Debug, Default)]
pub struct SourceOutput {
    pub records: Vec<AccountingRecord>,
    pub errors: Vec<String>,
}

impl SourceOutput {
    fn append(&mut self, other: SourceOutput) {
        self.records.extend(other.records);
        self.errors.extend(other.errors);
    }
}

impl SourceFormat {
    /// Reads one input file. Workbooks (`.xlsx`, `.xls`, `.ods`, ...) are
    /// recognised by extension; anything else is read as UTF-8 CSV.
    pub fn read(&self, path: &Path) -> Result<SourceOutput, SourceError> {
        if workbook::is_workbook(path) {
            return self.read_workbook(path);
        }

        let bytes = fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let input =
            String::from_utf8(bytes).map_err(|_| SourceError::Encoding(path.to_path_buf()))?;
        let sheet_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.read_str(&sheet_name, input.strip_prefix('\u{feff}').unwrap_or(&input))
    }

    pub fn read_str(&self, sheet_name: &str, input: &str) -> Result<SourceOutput, SourceError> {
        match self {
            SourceFormat::Sheet => Ok(match parse_grid(input) {
                Ok(grid) => sheet::read(sheet_name, &grid),
                Err(err) => sheet::unreadable(sheet_name, &err),
            }),
            SourceFormat::Freee => freee::read(Table::parse(input)?),
            SourceFormat::Streamed => streamed::read(Table::parse(input)?),
        }
    }

    /// The sheet layout yields one record per worksheet; tabular layouts
    /// read the first worksheet.
    fn read_workbook(&self, path: &Path) -> Result<SourceOutput, SourceError> {
        let mut book = workbook::open(path)?;
        match self {
            SourceFormat::Sheet => Ok(workbook::read_sheets(&mut book)),
            SourceFormat::Freee => freee::read(workbook::first_table(&mut book, path)?),
            SourceFormat::Streamed => streamed::read(workbook::first_table(&mut book, path)?),
        }
    }

    /// Whether records of this layout carry raw departments, sub-accounts
    /// and voucher sequences that must go through the resolution stages.
    pub fn needs_resolution(&self) -> bool {
        matches!(self, SourceFormat::Streamed)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("File is not UTF-8 encoded: `{0}`")]
    Encoding(PathBuf),
    #[error("Cannot read workbook `{path}`: {source}")]
    Workbook {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("Workbook has no worksheets: `{0}`")]
    EmptyWorkbook(PathBuf),
    #[error("Required columns not found: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Malformed CSV: `{0}`")]
    Csv(#[from] csv::Error),
}

/// A header table flattened into one map per data row, keyed by column name.
struct Table {
    headers: Vec<String>,
    rows: Vec<HashMap<String, CellValue>>,
}

impl Table {
    fn parse(input: &str) -> Result<Self, SourceError> {
        Ok(Self::from_grid(parse_grid(input)?))
    }

    /// The first grid row names the columns. Short rows are padded with
    /// empty cells.
    fn from_grid(grid: Grid) -> Self {
        let mut lines = grid.into_iter();
        let headers: Vec<String> = lines
            .next()
            .map(|cells| cells.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();

        let rows = lines
            .map(|cells| {
                let mut values = cells.into_iter();
                headers
                    .iter()
                    .map(|header| (header.clone(), values.next().unwrap_or(CellValue::Empty)))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    fn require(&self, columns: &[&str]) -> Result<(), SourceError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SourceError::MissingColumns(missing))
        }
    }

    fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }
}

fn parse_grid(input: &str) -> Result<Grid, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input.as_bytes());

    reader
        .records()
        .map(|result| result.map(|record| record.iter().map(CellValue::from_text).collect()))
        .collect()
}

/// Columns without a typed home in the record, rendered as text.
fn text_fields(cells: HashMap<String, CellValue>) -> HashMap<String, String> {
    cells
        .into_iter()
        .map(|(name, cell)| (name, cell.to_string()))
        .collect()
}

/// Spreadsheet row of the n-th data row (the header occupies row 1).
fn row_number(index: usize) -> usize {
    index + 2
}
