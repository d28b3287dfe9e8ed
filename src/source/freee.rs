use crate::model::{column, AccountingRecord, CellValue};

use super::validate::{check_amount, check_date};
use super::{row_number, text_fields, SourceError, SourceOutput, Table};

const REQUIRED_COLUMNS: [&str; 2] = [column::DATE, column::AMOUNT];

/// Reads a table already laid out with freee column names. Every column is
/// carried; only date and amount are validated. When the side amount
/// columns exist they are overwritten with the validated amount.
pub(super) fn read(table: Table) -> Result<SourceOutput, SourceError> {
    table.require(&REQUIRED_COLUMNS)?;

    let has_debit_amount = table.has_column(column::DEBIT_AMOUNT);
    let has_credit_amount = table.has_column(column::CREDIT_AMOUNT);

    let mut output = SourceOutput::default();
    for (idx, mut row) in table.rows.into_iter().enumerate() {
        let row_number = row_number(idx);
        let location = format!("row {row_number}");

        let date = row.remove(column::DATE).unwrap_or(CellValue::Empty);
        let amount = row.remove(column::AMOUNT).unwrap_or(CellValue::Empty);
        row.remove(column::DEBIT_AMOUNT);
        row.remove(column::CREDIT_AMOUNT);

        let mut record = AccountingRecord::from_row(row_number, text_fields(row));
        record.date = check_date(&date, &location, "date")
            .record(&mut output.errors, &mut record.errors);
        record.amount = check_amount(&amount, &location, "amount")
            .record(&mut output.errors, &mut record.errors);

        if has_debit_amount {
            record.debit_amount = Some(record.amount.clone());
        }
        if has_credit_amount {
            record.credit_amount = Some(record.amount.clone());
        }

        output.records.push(record);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::model::{column, Validated};
    use crate::source::{SourceError, SourceFormat, SourceOutput};

    fn read(input: &str) -> Result<SourceOutput, SourceError> {
        SourceFormat::Freee.read_str("journal", input)
    }

    #[test]
    fn test_read_freee_rows() {
        let input = "日付,伝票番号,借方勘定科目,借方金額,金額,摘要\n\
                     2024/01/15,3,現金,,1200,coffee\n\
                     20240116,4,現金,,abc,tea\n";

        let output = read(input).unwrap();
        assert_eq!(2, output.records.len());

        let first = &output.records[0];
        assert_eq!(2, first.row_number);
        assert_eq!("2024-01-15", first.date.to_string());
        assert_eq!(Validated::Valid(dec!(1200)), first.amount);
        assert_eq!(Some(Validated::Valid(dec!(1200))), first.debit_amount);
        assert_eq!(None, first.credit_amount);
        assert_eq!("3", first.voucher);
        assert_eq!("coffee", first.column_value(column::SUMMARY));
        assert!(first.errors.is_empty());

        let second = &output.records[1];
        assert!(second.amount.is_format_error());
        assert_eq!(Some(Validated::FormatError), second.debit_amount);
        assert_eq!(
            vec!["row 3: amount has invalid format (value: abc)".to_string()],
            second.errors
        );
        assert_eq!(second.errors, output.errors);
    }

    #[test]
    fn test_read_freee_requires_amount() {
        let result = read("日付,摘要\n20240101,x\n");
        assert!(matches!(result, Err(SourceError::MissingColumns(_))));
    }

    #[test]
    fn test_blank_date_keeps_row() {
        let output = read("日付,金額\n,100\n").unwrap();
        assert_eq!(1, output.records.len());
        assert!(output.records[0].date.is_format_error());
        assert_eq!(vec!["row 2: date is blank".to_string()], output.records[0].errors);
    }
}
