//! Error types for the bank2ynab library.

use rust_decimal::Decimal;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Phase of a conversion run in which a fatal I/O failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadingConfig,
    LoadingIgnoreList,
    ReadingHeader,
    ReadingRows,
    WritingOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::LoadingConfig => "loading bank configuration",
            Stage::LoadingIgnoreList => "loading ignore list",
            Stage::ReadingHeader => "reading statement header",
            Stage::ReadingRows => "reading statement rows",
            Stage::WritingOutput => "writing output",
        };
        f.write_str(s)
    }
}

/// Error types that can occur while loading a bank schema or converting a statement.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error while {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    /// Error reading or writing CSV data.
    #[error("CSV error while {stage}: {source}")]
    Csv {
        stage: Stage,
        #[source]
        source: csv::Error,
    },

    /// Malformed TOML in a bank configuration document.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Required key absent from a bank configuration document.
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// A configuration value violates its invariant.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Transaction columns that cannot be resolved to a single meaning.
    #[error("Conflicting transaction columns ({column}): {reason}")]
    ConflictingColumns { column: String, reason: String },

    /// No built-in bank matches the given name.
    #[error("Unknown bank: {0}")]
    UnknownBank(String),

    /// Date cell does not match the configured date format.
    #[error("Invalid date '{value}' for format '{format}'")]
    InvalidDate { value: String, format: String },

    /// Outflow or inflow column holding a negative value.
    #[error("Found a negative value {value} in column '{column}'")]
    NegativeValue { column: String, value: Decimal },

    /// Sum of a row's transaction columns does not fit in a decimal.
    #[error("Amount overflow while adding column '{column}'")]
    AmountOverflow { column: String },

    /// Amount in a YNAB import file that is not a plain decimal.
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    /// Missing required field in a statement row.
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    pub(crate) fn io(stage: Stage, source: io::Error) -> Self {
        Error::Io { stage, source }
    }

    pub(crate) fn csv(stage: Stage, source: csv::Error) -> Self {
        Error::Csv { stage, source }
    }

    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error only disqualifies a single statement row.
    ///
    /// Row-level errors are recorded and the run continues; everything else
    /// aborts the run.
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            Error::InvalidDate { .. }
                | Error::NegativeValue { .. }
                | Error::AmountOverflow { .. }
                | Error::MissingField(_)
        )
    }
}
