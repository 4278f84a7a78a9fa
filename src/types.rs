//! Common types shared by the schema, the converter and the YNAB output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One statement row, keyed by normalized header name.
pub type RawRow = BTreeMap<String, String>;

/// How a statement column carries money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionKind {
    /// Money leaving the account, never negative.
    Outflow,
    /// Money entering the account, never negative.
    Inflow,
    /// Signed value; the sign decides the side.
    Amount,
}

/// A statement column holding transaction values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionColumn {
    /// Column name as written in the bank configuration.
    pub header_key: String,

    /// What the column's values mean.
    pub kind: TransactionKind,
}

impl TransactionColumn {
    pub fn new(header_key: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            header_key: header_key.into(),
            kind,
        }
    }
}

/// A row of the YNAB import file.
///
/// Field order is the column order of the output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Payee")]
    pub payee: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Memo")]
    pub memo: String,
    #[serde(rename = "Outflow")]
    pub outflow: String,
    #[serde(rename = "Inflow")]
    pub inflow: String,
}

/// A statement row that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// 1-based line number in the statement file.
    pub line: u64,

    /// The row as read.
    pub row: RawRow,

    /// Why the row was skipped.
    pub message: String,
}

/// Outcome of one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Whether an output file was written.
    pub succeeded: bool,

    /// Rows in which every cell was empty.
    pub empty_row_count: usize,

    /// Rows excluded by the ignore list.
    pub ignored_row_count: usize,

    /// Non-empty rows kept for parsing.
    pub read_row_count: usize,

    /// Rows converted into output rows.
    pub parsed_row_count: usize,

    /// Rows that failed to parse.
    pub warnings: Vec<RowWarning>,
}

impl ConversionReport {
    /// The counters as `(succeeded, empty, ignored, read, parsed)`.
    pub fn counts(&self) -> (bool, usize, usize, usize, usize) {
        (
            self.succeeded,
            self.empty_row_count,
            self.ignored_row_count,
            self.read_row_count,
            self.parsed_row_count,
        )
    }
}
