use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use strum::Display;

/// Placeholder stored in a date or amount field that failed validation.
pub const FORMAT_ERROR: &str = "FORMAT_ERROR";

/// Column names of the freee journal import layout, shared by the readers
/// and the writer.
pub mod column {
    pub const TITLE: &str = "[表題行]";
    pub const DATE: &str = "日付";
    pub const VOUCHER: &str = "伝票番号";
    pub const AMOUNT: &str = "金額";
    pub const SUMMARY: &str = "摘要";
    pub const SHEET_NAME: &str = "シート名";

    pub const DEBIT_ACCOUNT: &str = "借方勘定科目";
    pub const DEBIT_SUB_ACCOUNT: &str = "借方補助科目";
    pub const DEBIT_PARTNER: &str = "借方取引先";
    pub const DEBIT_DEPARTMENT: &str = "借方部門";
    pub const DEBIT_AMOUNT: &str = "借方金額";
    pub const DEBIT_TAX_CLASS: &str = "借方税区分";

    pub const CREDIT_ACCOUNT: &str = "貸方勘定科目";
    pub const CREDIT_SUB_ACCOUNT: &str = "貸方補助科目";
    pub const CREDIT_PARTNER: &str = "貸方取引先";
    pub const CREDIT_DEPARTMENT: &str = "貸方部門";
    pub const CREDIT_AMOUNT: &str = "貸方金額";
    pub const CREDIT_TAX_CLASS: &str = "貸方税区分";

    pub const CANDIDATE: &str = "候補";
    pub const DEBIT_PARTNER_MATCH: &str = "借方取引先判定";
    pub const CREDIT_PARTNER_MATCH: &str = "貸方取引先判定";
    pub const ERRORS: &str = "エラー内容";

    pub const FREEE: [&str; 33] = [
        TITLE,
        DATE,
        VOUCHER,
        "決算整理仕訳",
        DEBIT_ACCOUNT,
        "借方科目コード",
        DEBIT_SUB_ACCOUNT,
        DEBIT_PARTNER,
        "借方取引先コード",
        DEBIT_DEPARTMENT,
        "借方品目",
        "借方メモタグ",
        "借方セグメント1",
        "借方セグメント2",
        "借方セグメント3",
        DEBIT_AMOUNT,
        DEBIT_TAX_CLASS,
        "借方税額",
        CREDIT_ACCOUNT,
        "貸方科目コード",
        CREDIT_SUB_ACCOUNT,
        CREDIT_PARTNER,
        "貸方取引先コード",
        CREDIT_DEPARTMENT,
        "貸方品目",
        "貸方メモタグ",
        "貸方セグメント1",
        "貸方セグメント2",
        "貸方セグメント3",
        CREDIT_AMOUNT,
        CREDIT_TAX_CLASS,
        "貸方税額",
        SUMMARY,
    ];
}

/// A raw cell as delivered by a source, before any validation. CSV input
/// only produces text; workbooks also deliver numbers and dates.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Text cell, or `Empty` when the text is blank.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::DateTime(value) => write!(f, "{value}"),
        }
    }
}

/// Outcome of validating a single field: the parsed value or the
/// `FORMAT_ERROR` sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validated<T> {
    Valid(T),
    FormatError,
}

impl<T> Validated<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Validated::Valid(value) => Some(value),
            Validated::FormatError => None,
        }
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self, Validated::FormatError)
    }
}

impl<T: fmt::Display> fmt::Display for Validated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validated::Valid(value) => write!(f, "{value}"),
            Validated::FormatError => f.write_str(FORMAT_ERROR),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Debit, Side::Credit];
}

/// How a counterparty name was recognised.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Display)]
pub enum MatchTier {
    #[strum(serialize = "fixed-list")]
    FixedList,
    #[strum(serialize = "dynamic-exact")]
    DynamicExact,
    #[strum(serialize = "fuzzy")]
    Fuzzy,
    #[default]
    #[strum(serialize = "none")]
    Unmatched,
}

impl MatchTier {
    /// Mark rendered next to the counterparty: exact tiers are confirmed,
    /// fuzzy ones need a human to look at the candidate.
    pub fn review_mark(&self) -> &'static str {
        match self {
            MatchTier::FixedList | MatchTier::DynamicExact => "confirmed",
            MatchTier::Fuzzy => "review",
            MatchTier::Unmatched => "",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SideEntry {
    pub department: String,
    pub partner: String,
    pub partner_match: MatchTier,
}

/// One journal line, created per input row and refined in place by every
/// processing stage.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountingRecord {
    pub row_number: usize,
    pub sheet_name: Option<String>,

    pub date: Validated<NaiveDate>,
    pub amount: Validated<Decimal>,
    pub debit_amount: Option<Validated<Decimal>>,
    pub credit_amount: Option<Validated<Decimal>>,

    pub voucher: String,
    pub debit: SideEntry,
    pub credit: SideEntry,
    pub candidate: String,

    /// Remaining input columns, carried through untouched.
    pub fields: HashMap<String, String>,

    /// Append-only, no stage ever clears it.
    pub errors: Vec<String>,
}

impl AccountingRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            sheet_name: None,
            date: Validated::FormatError,
            amount: Validated::FormatError,
            debit_amount: None,
            credit_amount: None,
            voucher: String::new(),
            debit: SideEntry::default(),
            credit: SideEntry::default(),
            candidate: String::new(),
            fields: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Builds a record from a header row, moving the columns that have a
    /// typed home out of `fields`. Date and amounts are left for the
    /// validator.
    pub fn from_row(row_number: usize, mut fields: HashMap<String, String>) -> Self {
        let mut take = |name: &str| fields.remove(name).unwrap_or_default();

        let voucher = take(column::VOUCHER);
        let debit = SideEntry {
            department: take(column::DEBIT_DEPARTMENT),
            partner: take(column::DEBIT_PARTNER),
            partner_match: MatchTier::Unmatched,
        };
        let credit = SideEntry {
            department: take(column::CREDIT_DEPARTMENT),
            partner: take(column::CREDIT_PARTNER),
            partner_match: MatchTier::Unmatched,
        };

        Self {
            voucher,
            debit,
            credit,
            fields,
            ..Self::new(row_number)
        }
    }

    pub fn side(&self, side: Side) -> &SideEntry {
        match side {
            Side::Debit => &self.debit,
            Side::Credit => &self.credit,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideEntry {
        match side {
            Side::Debit => &mut self.debit,
            Side::Credit => &mut self.credit,
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Rendered value of an output column.
    pub fn column_value(&self, name: &str) -> String {
        match name {
            column::DATE => self.date.to_string(),
            column::AMOUNT => self.amount.to_string(),
            column::DEBIT_AMOUNT => self.debit_amount.as_ref().unwrap_or(&self.amount).to_string(),
            column::CREDIT_AMOUNT => self
                .credit_amount
                .as_ref()
                .unwrap_or(&self.amount)
                .to_string(),
            column::VOUCHER => self.voucher.clone(),
            column::SHEET_NAME => self.sheet_name.clone().unwrap_or_default(),
            column::DEBIT_DEPARTMENT => self.debit.department.clone(),
            column::CREDIT_DEPARTMENT => self.credit.department.clone(),
            column::DEBIT_PARTNER => self.debit.partner.clone(),
            column::CREDIT_PARTNER => self.credit.partner.clone(),
            column::DEBIT_PARTNER_MATCH => self.debit.partner_match.review_mark().to_string(),
            column::CREDIT_PARTNER_MATCH => self.credit.partner_match.review_mark().to_string(),
            column::CANDIDATE => self.candidate.clone(),
            column::ERRORS => self.errors.join("\n"),
            other => self.fields.get(other).cloned().unwrap_or_default(),
        }
    }
}
