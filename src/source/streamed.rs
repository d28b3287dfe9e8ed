use crate::model::{column, AccountingRecord, CellValue};

use super::validate::{check_amount, check_date};
use super::{row_number, text_fields, SourceError, SourceOutput, Table};

const REQUIRED_COLUMNS: [&str; 13] = [
    column::DATE,
    column::VOUCHER,
    column::DEBIT_ACCOUNT,
    column::DEBIT_SUB_ACCOUNT,
    column::DEBIT_DEPARTMENT,
    column::DEBIT_AMOUNT,
    column::DEBIT_TAX_CLASS,
    column::CREDIT_ACCOUNT,
    column::CREDIT_SUB_ACCOUNT,
    column::CREDIT_DEPARTMENT,
    column::CREDIT_AMOUNT,
    column::CREDIT_TAX_CLASS,
    column::SUMMARY,
];

/// Reads a STREAMED journal export. Sub-accounts hold the counterparty
/// names, and the journal amount is the validated debit amount.
pub(super) fn read(table: Table) -> Result<SourceOutput, SourceError> {
    table.require(&REQUIRED_COLUMNS)?;

    let mut output = SourceOutput::default();
    for (idx, mut row) in table.rows.into_iter().enumerate() {
        let row_number = row_number(idx);
        let location = format!("row {row_number}");

        let date = row.remove(column::DATE).unwrap_or(CellValue::Empty);
        let debit_amount = row.remove(column::DEBIT_AMOUNT).unwrap_or(CellValue::Empty);
        let credit_amount = row.remove(column::CREDIT_AMOUNT).unwrap_or(CellValue::Empty);

        let debit_partner = row.remove(column::DEBIT_SUB_ACCOUNT).unwrap_or(CellValue::Empty);
        let credit_partner = row.remove(column::CREDIT_SUB_ACCOUNT).unwrap_or(CellValue::Empty);
        row.insert(column::DEBIT_PARTNER.to_string(), debit_partner);
        row.insert(column::CREDIT_PARTNER.to_string(), credit_partner);

        let mut record = AccountingRecord::from_row(row_number, text_fields(row));
        record.date = check_date(&date, &location, "date")
            .record(&mut output.errors, &mut record.errors);

        let debit = check_amount(&debit_amount, &location, "debit amount")
            .record(&mut output.errors, &mut record.errors);
        let credit = check_amount(&credit_amount, &location, "credit amount")
            .record(&mut output.errors, &mut record.errors);
        record.amount = debit.clone();
        record.debit_amount = Some(debit);
        record.credit_amount = Some(credit);

        output.records.push(record);
    }

    Ok(output)
}
