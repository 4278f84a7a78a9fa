//! bank2ynab
//!
//! Converts bank statement CSV exports into the CSV format imported by
//! YNAB (You Need A Budget).
//!
//! Every bank lays out its export differently: column names, delimiter,
//! date format, thousands and decimal separators, and whether money moves
//! are one signed amount or separate outflow/inflow columns. A
//! [`BankSchema`] describes one such layout and the [`Converter`] turns a
//! statement in that layout into `Date,Payee,Category,Memo,Outflow,Inflow`
//! rows.
//!
//! # Examples
//!
//! ## Converting with a bundled bank configuration
//!
//! ```no_run
//! use bank2ynab::{bank2ynab, BuiltinBank, IgnoreList};
//!
//! let schema = BuiltinBank::Nordea.schema()?;
//! let ignore = IgnoreList::load("accignore.txt")?;
//! let report = bank2ynab(&schema, "export.csv", &ignore)?;
//! println!("{}/{} rows converted", report.parsed_row_count, report.read_row_count);
//! # Ok::<(), bank2ynab::Error>(())
//! ```
//!
//! ## Converting with a custom configuration
//!
//! ```no_run
//! use bank2ynab::{BankSchema, Converter, IgnoreList};
//!
//! let schema = BankSchema::from_file("banks/mybank.toml")?;
//! let converter = Converter::new(&schema)?;
//! let report = converter.convert("export.csv", &IgnoreList::empty(), "out.csv")?;
//! for warning in &report.warnings {
//!     eprintln!("line {}: {}", warning.line, warning.message);
//! }
//! # Ok::<(), bank2ynab::Error>(())
//! ```

pub mod error;
pub mod types;
pub mod currency;
pub mod schema;
pub mod ignore;
pub mod converter;
pub mod ynab_csv;
pub mod banks;

use std::path::Path;

// Re-export commonly used types
pub use banks::BuiltinBank;
pub use converter::Converter;
pub use currency::{CurrencyFormat, CurrencyParser};
pub use error::{Error, Result, Stage};
pub use ignore::IgnoreList;
pub use schema::{BankSchema, ColumnMapping};
pub use types::{ConversionReport, OutputRow, RawRow, RowWarning, TransactionColumn, TransactionKind};

/// File the YNAB rows are written to, relative to the current directory.
pub const DEFAULT_OUTPUT_FILE: &str = "ynabImport.csv";

/// Convert a statement and write [`DEFAULT_OUTPUT_FILE`] in the current directory.
///
/// Fails only on configuration or I/O errors; rows that cannot be parsed
/// are reported in the returned [`ConversionReport`].
pub fn bank2ynab(
    schema: &BankSchema,
    statement: impl AsRef<Path>,
    ignore: &IgnoreList,
) -> Result<ConversionReport> {
    Converter::new(schema)?.convert(statement, ignore, DEFAULT_OUTPUT_FILE)
}
