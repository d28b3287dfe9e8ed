use std::fmt;

use crate::model::{AccountingRecord, CellValue, Validated};

use super::validate::{check_amount, check_date};
use super::SourceOutput;

/// Zero-based (row, column) of the date cell, B2.
const DATE_CELL: (usize, usize) = (1, 1);
/// Zero-based (row, column) of the amount cell, C3.
const AMOUNT_CELL: (usize, usize) = (2, 2);

/// Reads one sheet laid out as a grid. Always yields exactly one record.
pub fn read(sheet_name: &str, grid: &[Vec<CellValue>]) -> SourceOutput {
    let mut output = SourceOutput::default();
    let mut record = new_record(sheet_name);

    let date_location = format!("{sheet_name} (cell B2)");
    let amount_location = format!("{sheet_name} (cell C3)");

    record.date = check_date(&cell(grid, DATE_CELL), &date_location, "date")
        .record(&mut output.errors, &mut record.errors);
    record.amount = check_amount(&cell(grid, AMOUNT_CELL), &amount_location, "amount")
        .record(&mut output.errors, &mut record.errors);

    output.records.push(record);
    output
}

/// A sheet that could not be parsed still produces its record, with both
/// fields flagged.
pub fn unreadable(sheet_name: &str, err: &impl fmt::Display) -> SourceOutput {
    let mut record = new_record(sheet_name);
    record.date = Validated::FormatError;
    record.amount = Validated::FormatError;
    record.add_error(format!("sheet read error: {err}"));

    SourceOutput {
        records: vec![record],
        errors: vec![format!("{sheet_name}: sheet read error ({err})")],
    }
}

fn new_record(sheet_name: &str) -> AccountingRecord {
    let mut record = AccountingRecord::new(1);
    record.sheet_name = Some(sheet_name.to_string());
    record
}

fn cell(grid: &[Vec<CellValue>], (row, col): (usize, usize)) -> CellValue {
    grid.get(row)
        .and_then(|cells| cells.get(col))
        .cloned()
        .unwrap_or(CellValue::Empty)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::unreadable;
    use crate::model::Validated;
    use crate::source::{SourceFormat, SourceOutput};

    fn read(sheet_name: &str, input: &str) -> SourceOutput {
        SourceFormat::Sheet.read_str(sheet_name, input).unwrap()
    }

    #[test]
    fn test_read_sheet_cells() {
        let output = read("march", "title,,\n,20240301,\n,,4500\n");
        assert_eq!(1, output.records.len());

        let record = &output.records[0];
        assert_eq!(Some("march".to_string()), record.sheet_name);
        assert_eq!("2024-03-01", record.date.to_string());
        assert_eq!(Validated::Valid(dec!(4500)), record.amount);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_read_sheet_missing_cells() {
        let output = read("empty", "only one line\n");

        let record = &output.records[0];
        assert!(record.date.is_format_error());
        assert!(record.amount.is_format_error());
        assert_eq!(
            vec![
                "empty (cell B2): date is blank".to_string(),
                "empty (cell C3): amount is blank".to_string(),
            ],
            record.errors
        );
    }

    #[test]
    fn test_unreadable_sheet_keeps_its_record() {
        let output = unreadable("april", &"corrupt part");

        assert_eq!(1, output.records.len());
        let record = &output.records[0];
        assert_eq!(Some("april".to_string()), record.sheet_name);
        assert!(record.date.is_format_error());
        assert!(record.amount.is_format_error());
        assert_eq!(vec!["sheet read error: corrupt part".to_string()], record.errors);
        assert_eq!(
            vec!["april: sheet read error (corrupt part)".to_string()],
            output.errors
        );
    }
}
