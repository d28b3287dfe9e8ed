use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::model::AccountingRecord;

use super::codes::{Channel, CodeTables, CodesError};

/// Prefix put in front of the original text of a voucher that could not be
/// encoded.
pub const FAILED_PREFIX: &str = "ERR_";

const MAX_SEQUENCE: i64 = 999;

/// Where the two month digits of a voucher number come from. Fixed for a
/// whole run.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MonthSource {
    /// Month of each record's own transaction date
    #[default]
    TransactionDate,
    /// Month of the day the conversion runs
    RunDate,
}

/// Builds 7-digit voucher numbers:
/// `[channel][department][month, 2 digits][sequence, 3 digits]`.
pub struct VoucherEncoder<'a> {
    codes: &'a CodeTables,
    channel_code: u8,
    month_source: MonthSource,
    run_date: NaiveDate,
}

impl<'a> VoucherEncoder<'a> {
    pub fn new(
        codes: &'a CodeTables,
        channel: Channel,
        month_source: MonthSource,
        run_date: NaiveDate,
    ) -> Result<Self, CodesError> {
        Ok(Self {
            codes,
            channel_code: codes.channel_code(channel)?,
            month_source,
            run_date,
        })
    }

    /// Replaces every record's voucher with its encoded form. Records that
    /// cannot be encoded keep their original text behind `ERR_` and get an
    /// error appended.
    pub fn encode_all(&self, records: &mut [AccountingRecord]) {
        for record in records.iter_mut() {
            match self.encode_record(record) {
                Ok(voucher) => record.voucher = voucher,
                Err(err) => {
                    log::debug!(
                        "Row {}: voucher `{}` not encoded: {}",
                        record.row_number,
                        record.voucher,
                        err
                    );
                    record.add_error(format!("voucher number error: {err}"));
                    record.voucher = format!("{FAILED_PREFIX}{}", record.voucher);
                }
            }
        }
    }

    fn encode_record(&self, record: &AccountingRecord) -> Result<String, VoucherError> {
        let department = record.debit.department.as_str();
        let department_code = self
            .codes
            .department_code(department)
            .ok_or_else(|| VoucherError::UnknownDepartment(department.to_string()))?;

        let month = match self.month_source {
            MonthSource::RunDate => self.run_date.month(),
            MonthSource::TransactionDate => record
                .date
                .valid()
                .map(|date| date.month())
                .ok_or_else(|| VoucherError::InvalidDate(record.date.to_string()))?,
        };

        let sequence = parse_sequence(&record.voucher)?;

        Ok(encode(self.channel_code, department_code, month, sequence))
    }
}

pub fn encode(channel_code: u8, department_code: u8, month: u32, sequence: u16) -> String {
    format!("{channel_code}{department_code}{month:02}{sequence:03}")
}

fn parse_sequence(raw: &str) -> Result<u16, VoucherError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| VoucherError::NotANumber(raw.to_string()))?;

    if !(0..=MAX_SEQUENCE).contains(&value) {
        return Err(VoucherError::OutOfRange(value));
    }

    Ok(value as u16)
}

#[derive(Debug, Error, PartialEq)]
pub enum VoucherError {
    #[error("department code not found: {0}")]
    UnknownDepartment(String),
    #[error("transaction date is not usable: {0}")]
    InvalidDate(String),
    #[error("voucher sequence is not a number: {0}")]
    NotANumber(String),
    #[error("voucher sequence out of range (0-999): {0}")]
    OutOfRange(i64),
}
