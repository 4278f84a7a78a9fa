//! Bank schema: how one bank lays out its statement CSV.
//!
//! A [`BankSchema`] is loaded once from a TOML document, validated, and then
//! shared read-only by a conversion run.

use crate::currency::CurrencyFormat;
use crate::error::{Error, Result, Stage};
use crate::types::{TransactionColumn, TransactionKind};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Maps a header or column name onto the form used for comparisons.
pub type Normalizer = fn(&str) -> String;

/// Default column-name normalization: trim whitespace and lowercase.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Statement columns mapped onto the YNAB fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: String,
    pub outflow: Vec<String>,
    pub inflow: Vec<String>,
    pub amount: Vec<String>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub category: Option<String>,
}

/// Validated description of a bank's statement format.
#[derive(Debug, Clone)]
pub struct BankSchema {
    name: String,
    date_format: String,
    csv_delimiter: u8,
    currency_format: CurrencyFormat,
    date_column: String,
    transaction_columns: Vec<TransactionColumn>,
    payee_column: Option<String>,
    memo_column: Option<String>,
    category_column: Option<String>,
    normalizer: Normalizer,
}

impl BankSchema {
    /// Build and validate a schema.
    ///
    /// Fails with [`Error::InvalidConfig`] naming the offending field, or
    /// [`Error::ConflictingColumns`] when the transaction columns do not
    /// resolve to either signed amounts or outflow/inflow pairs.
    pub fn new(
        name: &str,
        date_format: &str,
        csv_delimiter: &str,
        currency_format: CurrencyFormat,
        columns: ColumnMapping,
    ) -> Result<Self> {
        require_non_empty("name", name)?;
        require_non_empty("csv.date_format", date_format)?;
        require_non_empty("ynab_mapping.date", &columns.date)?;

        let mut delimiter = csv_delimiter.chars();
        let csv_delimiter = match (delimiter.next(), delimiter.next()) {
            (Some(c), None) if c.is_ascii() => c as u8,
            _ => {
                return Err(Error::invalid_config(
                    "csv.delimiter",
                    format!("expected a single ASCII character, got '{}'", csv_delimiter),
                ))
            }
        };

        for (field, value) in [
            ("ynab_mapping.payee", &columns.payee),
            ("ynab_mapping.memo", &columns.memo),
            ("ynab_mapping.category", &columns.category),
        ] {
            if let Some(value) = value {
                require_non_empty(field, value)?;
            }
        }

        let transaction_columns = resolve_transaction_columns(&columns)?;

        Ok(Self {
            name: name.to_string(),
            date_format: date_format.to_string(),
            csv_delimiter,
            currency_format,
            date_column: columns.date,
            transaction_columns,
            payee_column: columns.payee,
            memo_column: columns.memo,
            category_column: columns.category,
            normalizer: normalize,
        })
    }

    /// Load a schema from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading bank configuration from {}", path.display());
        let source = fs::read_to_string(path).map_err(|e| Error::io(Stage::LoadingConfig, e))?;
        Self::from_toml_str(&source)
    }

    /// Load a schema from a TOML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use bank2ynab::schema::BankSchema;
    ///
    /// let schema = BankSchema::from_toml_str(r#"
    ///     name = "Example Bank"
    ///
    ///     [csv]
    ///     date_format = "%Y-%m-%d"
    ///
    ///     [currency_format]
    ///     thousands_separator = ","
    ///     decimal_point = "."
    ///
    ///     [ynab_mapping]
    ///     date = "Date"
    ///     amount = "Amount"
    /// "#)?;
    /// assert_eq!(schema.name(), "Example Bank");
    /// assert_eq!(schema.csv_delimiter(), b',');
    /// # Ok::<(), bank2ynab::Error>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let document: SchemaDocument = toml::from_str(source)?;
        document.into_schema()
    }

    /// Replace the column-name normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Apply this schema's normalizer to a header or column name.
    pub fn normalize(&self, value: &str) -> String {
        (self.normalizer)(value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn csv_delimiter(&self) -> u8 {
        self.csv_delimiter
    }

    pub fn currency_format(&self) -> &CurrencyFormat {
        &self.currency_format
    }

    /// Normalized name of the date column.
    pub fn date_column(&self) -> String {
        self.normalize(&self.date_column)
    }

    pub fn payee_column(&self) -> Option<String> {
        self.payee_column.as_deref().map(|c| self.normalize(c))
    }

    pub fn memo_column(&self) -> Option<String> {
        self.memo_column.as_deref().map(|c| self.normalize(c))
    }

    pub fn category_column(&self) -> Option<String> {
        self.category_column.as_deref().map(|c| self.normalize(c))
    }

    /// Transaction columns with their names as configured.
    pub fn transaction_columns(&self) -> &[TransactionColumn] {
        &self.transaction_columns
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_config(field, "must not be empty"));
    }
    Ok(())
}

/// Collapse the configured column names into one [`TransactionColumn`] per
/// header key.
///
/// A key listed as both outflow and inflow carries a signed value and
/// becomes an amount column. Explicit amount columns cannot be mixed with
/// outflow/inflow columns, and outflow columns need matching inflow columns.
fn resolve_transaction_columns(columns: &ColumnMapping) -> Result<Vec<TransactionColumn>> {
    for (field, names) in [
        ("ynab_mapping.outflow", &columns.outflow),
        ("ynab_mapping.inflow", &columns.inflow),
        ("ynab_mapping.amount", &columns.amount),
    ] {
        for name in names {
            require_non_empty(field, name)?;
        }
    }

    if !columns.amount.is_empty() {
        let flows: Vec<String> = columns.outflow.iter().chain(&columns.inflow).map(|c| normalize(c)).collect();
        if let Some(column) = columns.amount.iter().find(|a| flows.contains(&normalize(a))) {
            return Err(Error::ConflictingColumns {
                column: column.clone(),
                reason: "declared both as amount and as outflow/inflow".to_string(),
            });
        }
        if !columns.outflow.is_empty() || !columns.inflow.is_empty() {
            return Err(Error::ConflictingColumns {
                column: columns.amount.join(", "),
                reason: "amount columns cannot be combined with outflow/inflow columns".to_string(),
            });
        }
    }

    // Keyed by normalized name, keeping the first configured spelling.
    let mut kinds: BTreeMap<String, (&str, TransactionKind)> = BTreeMap::new();
    for name in &columns.amount {
        kinds.entry(normalize(name)).or_insert((name.as_str(), TransactionKind::Amount));
    }
    for name in &columns.outflow {
        kinds.entry(normalize(name)).or_insert((name.as_str(), TransactionKind::Outflow));
    }
    for name in &columns.inflow {
        kinds
            .entry(normalize(name))
            .and_modify(|(_, kind)| {
                if *kind == TransactionKind::Outflow {
                    *kind = TransactionKind::Amount;
                }
            })
            .or_insert((name.as_str(), TransactionKind::Inflow));
    }

    let has = |kind: TransactionKind| kinds.values().any(|(_, k)| *k == kind);
    let (has_amount, has_outflow, has_inflow) = (
        has(TransactionKind::Amount),
        has(TransactionKind::Outflow),
        has(TransactionKind::Inflow),
    );

    if has_outflow != has_inflow {
        let (missing, present) = if has_outflow {
            ("inflow", &columns.outflow)
        } else {
            ("outflow", &columns.inflow)
        };
        return Err(Error::ConflictingColumns {
            column: present.join(", "),
            reason: format!("no matching {} column", missing),
        });
    }
    if !has_amount && !has_outflow {
        return Err(Error::invalid_config(
            "ynab_mapping",
            "either amount or both outflow and inflow columns are required",
        ));
    }

    Ok(kinds
        .into_values()
        .map(|(name, kind)| TransactionColumn::new(name, kind))
        .collect())
}

/// A column name or a list of column names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(value: Option<Self>) -> Vec<String> {
        match value {
            None => Vec::new(),
            Some(OneOrMany::One(name)) => vec![name],
            Some(OneOrMany::Many(names)) => names,
        }
    }
}

// Every key is optional here so that a missing one is reported by its path
// instead of as a generic deserialization error.
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    name: Option<String>,
    csv: Option<CsvSection>,
    currency_format: Option<CurrencySection>,
    ynab_mapping: Option<MappingSection>,
}

#[derive(Debug, Deserialize)]
struct CsvSection {
    date_format: Option<String>,
    delimiter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrencySection {
    thousands_separator: Option<String>,
    decimal_point: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MappingSection {
    date: Option<String>,
    outflow: Option<OneOrMany>,
    inflow: Option<OneOrMany>,
    amount: Option<OneOrMany>,
    payee: Option<String>,
    memo: Option<String>,
    category: Option<String>,
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| Error::MissingKey(key.to_string()))
}

impl SchemaDocument {
    fn into_schema(self) -> Result<BankSchema> {
        let name = required(self.name, "name")?;
        let csv = required(self.csv, "csv")?;
        let date_format = required(csv.date_format, "csv.date_format")?;
        let delimiter = csv.delimiter.unwrap_or_else(|| ",".to_string());

        let currency = required(self.currency_format, "currency_format")?;
        let currency_format = CurrencyFormat::new(
            &required(currency.thousands_separator, "currency_format.thousands_separator")?,
            &required(currency.decimal_point, "currency_format.decimal_point")?,
        )?;

        let mapping = required(self.ynab_mapping, "ynab_mapping")?;
        let columns = ColumnMapping {
            date: required(mapping.date, "ynab_mapping.date")?,
            outflow: OneOrMany::into_vec(mapping.outflow),
            inflow: OneOrMany::into_vec(mapping.inflow),
            amount: OneOrMany::into_vec(mapping.amount),
            payee: mapping.payee,
            memo: mapping.memo,
            category: mapping.category,
        };

        BankSchema::new(&name, &date_format, &delimiter, currency_format, columns)
    }
}
