use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::NaiveDateTime;

use crate::model::CellValue;

use super::{sheet, Grid, SourceError, SourceOutput, Table};

const EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub(super) type Workbook = Sheets<BufReader<File>>;

pub(super) fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

pub(super) fn open(path: &Path) -> Result<Workbook, SourceError> {
    open_workbook_auto(path).map_err(|source| SourceError::Workbook {
        path: path.to_path_buf(),
        source,
    })
}

/// One record per worksheet, in workbook order. A worksheet that cannot be
/// read still yields its flagged record.
pub(super) fn read_sheets(book: &mut Workbook) -> SourceOutput {
    let mut output = SourceOutput::default();
    for name in book.sheet_names() {
        let sheet = match book.worksheet_range(&name) {
            Ok(range) => sheet::read(&name, &grid(&range)),
            Err(err) => sheet::unreadable(&name, &err),
        };
        log::debug!("Read worksheet `{}`", name);
        output.append(sheet);
    }
    output
}

pub(super) fn first_table(book: &mut Workbook, path: &Path) -> Result<Table, SourceError> {
    let name = book
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::EmptyWorkbook(path.to_path_buf()))?;
    let range = book
        .worksheet_range(&name)
        .map_err(|source| SourceError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Table::from_grid(grid(&range)))
}

/// Lays the used range out from cell A1, so grid positions match
/// spreadsheet addresses.
fn grid(range: &Range<Data>) -> Grid {
    let Some((last_row, last_col)) = range.end() else {
        return Grid::new();
    };

    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(cell_value)
                        .unwrap_or(CellValue::Empty)
                })
                .collect()
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::from_text(text),
        Data::Int(value) => CellValue::Integer(*value),
        Data::Float(value) => CellValue::Float(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(value.as_f64())),
        Data::DateTimeIso(text) => text
            .parse::<NaiveDateTime>()
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::from_text(text)),
        other => CellValue::from_text(&other.to_string()),
    }
}
