use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{CellValue, Validated};

/// A validated field together with the diagnostic produced on failure.
#[derive(Debug, PartialEq)]
pub struct Checked<T> {
    pub value: Validated<T>,
    pub error: Option<String>,
}

impl<T> Checked<T> {
    fn ok(value: T) -> Self {
        Self {
            value: Validated::Valid(value),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            value: Validated::FormatError,
            error: Some(error),
        }
    }

    /// Files the diagnostic in both the file-level and the record-level
    /// lists and hands back the value.
    pub fn record(
        self,
        file_errors: &mut Vec<String>,
        record_errors: &mut Vec<String>,
    ) -> Validated<T> {
        if let Some(error) = self.error {
            file_errors.push(error.clone());
            record_errors.push(error);
        }
        self.value
    }
}

/// Normalizes a date cell. `location` prefixes the message, e.g. `row 4`.
pub fn check_date(cell: &CellValue, location: &str, field: &str) -> Checked<NaiveDate> {
    let parsed = match cell {
        CellValue::Empty => return Checked::failed(format!("{location}: {field} is blank")),
        CellValue::Integer(value) => parse_compact(&value.to_string()),
        CellValue::Float(value) if value.is_finite() => {
            parse_compact(&(value.trunc() as i64).to_string())
        }
        CellValue::Float(_) => None,
        CellValue::Text(text) => parse_date_text(text.trim()),
        CellValue::DateTime(value) => Some(value.date()),
    };

    match parsed {
        Some(date) => Checked::ok(date),
        None => Checked::failed(format!("{location}: {field} has invalid format (value: {cell})")),
    }
}

/// Validates an amount cell. Thousands separators are not accepted.
pub fn check_amount(cell: &CellValue, location: &str, field: &str) -> Checked<Decimal> {
    let parsed = match cell {
        CellValue::Empty => return Checked::failed(format!("{location}: {field} is blank")),
        CellValue::Integer(value) => Some(Decimal::from(*value)),
        CellValue::Float(value) => Decimal::try_from(*value).ok(),
        CellValue::Text(text) => Decimal::from_str(text.trim()).ok(),
        CellValue::DateTime(_) => None,
    };

    match parsed {
        Some(amount) => Checked::ok(amount),
        None => Checked::failed(format!("{location}: {field} has invalid format (value: {cell})")),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(text);
    }

    let separator = if text.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = text.split(separator).collect();
    match parts.as_slice() {
        [year, month, day] => ymd(year, month, day),
        _ => None,
    }
}

/// `yyyymmdd`
fn parse_compact(digits: &str) -> Option<NaiveDate> {
    if digits.len() != 8 {
        return None;
    }
    ymd(&digits[0..4], &digits[4..6], &digits[6..8])
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    if year < 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::{check_amount, check_date};
    use crate::model::{CellValue, Validated};

    fn date(text: &str) -> Validated<NaiveDate> {
        check_date(&CellValue::from_text(text), "row 2", "date").value
    }

    #[test]
    fn test_date_compact_text() {
        assert_eq!("2024-01-15", date("20240115").to_string());
    }

    #[test]
    fn test_date_compact_number() {
        let checked = check_date(&CellValue::Integer(20240115), "row 2", "date");
        assert_eq!("2024-01-15", checked.value.to_string());
        assert_eq!(None, checked.error);

        let checked = check_date(&CellValue::Float(20240115.0), "row 2", "date");
        assert_eq!("2024-01-15", checked.value.to_string());
    }

    #[test]
    fn test_date_slashes_are_zero_padded() {
        assert_eq!("2024-03-07", date("2024/3/7").to_string());
    }

    #[test]
    fn test_date_iso_is_idempotent() {
        assert_eq!("2023-12-31", date("2023-12-31").to_string());
    }

    #[test]
    fn test_date_native_value() {
        let value = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(
            "2024-02-29",
            check_date(&CellValue::DateTime(value), "row 2", "date").value.to_string()
        );
    }

    #[test]
    fn test_date_impossible_calendar_day() {
        let checked = check_date(&CellValue::from_text("20241301"), "row 9", "date");
        assert!(checked.value.is_format_error());
        assert_eq!(
            Some("row 9: date has invalid format (value: 20241301)".to_string()),
            checked.error
        );
        assert!(date("2023/02/29").is_format_error());
    }

    #[test]
    fn test_date_wrong_shapes() {
        assert!(date("Jan 5 2024").is_format_error());
        assert!(date("2024/01").is_format_error());
        assert!(date("240115").is_format_error());
        assert!(check_date(&CellValue::Integer(240115), "row 2", "date").value.is_format_error());
    }

    #[test]
    fn test_date_blank() {
        let checked = check_date(&CellValue::Empty, "row 4", "date");
        assert!(checked.value.is_format_error());
        assert_eq!(Some("row 4: date is blank".to_string()), checked.error);
    }

    #[test]
    fn test_amount_numeric_passes_through() {
        let checked = check_amount(&CellValue::Integer(1000), "row 2", "amount");
        assert_eq!(Validated::Valid(dec!(1000)), checked.value);
        assert_eq!("1000", checked.value.to_string());
        assert_eq!(None, checked.error);
    }

    #[test]
    fn test_amount_numeric_string() {
        let checked = check_amount(&CellValue::from_text("-1250.50"), "row 2", "amount");
        assert_eq!(Validated::Valid(dec!(-1250.50)), checked.value);
    }

    #[test]
    fn test_amount_with_separator_is_rejected_once() {
        let mut file_errors = Vec::new();
        let mut record_errors = Vec::new();

        let value = check_amount(&CellValue::from_text("1,000"), "row 3", "amount")
            .record(&mut file_errors, &mut record_errors);

        assert!(value.is_format_error());
        assert_eq!(1, record_errors.len());
        assert_eq!(file_errors, record_errors);
        assert!(record_errors[0].contains("1,000"));
    }

    #[test]
    fn test_amount_rejects_dates_and_text() {
        assert!(check_amount(&CellValue::from_text("abc"), "row 2", "amount")
            .value
            .is_format_error());
        assert!(check_amount(&CellValue::Float(f64::NAN), "row 2", "amount")
            .value
            .is_format_error());
    }
}
