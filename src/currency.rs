//! Locale-aware currency value parsing.
//!
//! Banks write amounts as `1.234,56`, `1 234,56`, `1,234.56`, `3.4` or
//! `1000`. [`CurrencyParser`] turns such strings into exact decimals using
//! the separators declared in the bank's [`CurrencyFormat`], never the
//! process locale.

use crate::error::{Error, Result};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Separators used by a bank when writing currency values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    thousands_separator: String,
    decimal_point: String,
}

impl CurrencyFormat {
    /// Create a currency format.
    ///
    /// `thousands_separator` may be empty or a single character,
    /// `decimal_point` must be exactly one character.
    pub fn new(thousands_separator: &str, decimal_point: &str) -> Result<Self> {
        if thousands_separator.chars().count() > 1 {
            return Err(Error::invalid_config(
                "currency_format.thousands_separator",
                format!("expected at most one character, got '{}'", thousands_separator),
            ));
        }
        if decimal_point.chars().count() != 1 {
            return Err(Error::invalid_config(
                "currency_format.decimal_point",
                format!("expected exactly one character, got '{}'", decimal_point),
            ));
        }
        if thousands_separator == decimal_point {
            return Err(Error::invalid_config(
                "currency_format.thousands_separator",
                "must differ from the decimal point",
            ));
        }

        Ok(Self {
            thousands_separator: thousands_separator.to_string(),
            decimal_point: decimal_point.to_string(),
        })
    }

    pub fn thousands_separator(&self) -> &str {
        &self.thousands_separator
    }

    pub fn decimal_point(&self) -> &str {
        &self.decimal_point
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            thousands_separator: String::new(),
            decimal_point: ".".to_string(),
        }
    }
}

/// Parses currency strings written in a given [`CurrencyFormat`].
#[derive(Debug, Clone)]
pub struct CurrencyParser {
    thousands_separator: String,
    fraction: Regex,
    number: Regex,
}

impl CurrencyParser {
    pub fn new(format: &CurrencyFormat) -> Result<Self> {
        // The fraction may have any number of digits: some banks drop
        // trailing zeros ("3.4") or the whole fraction ("1000").
        let fraction = Regex::new(&format!(
            r"{}(?P<fraction>[0-9]+)",
            regex::escape(format.decimal_point())
        ))
        .map_err(|e| Error::invalid_config("currency_format.decimal_point", e.to_string()))?;
        // A bare fraction (".50") must not lose its point or its sign.
        let number = Regex::new(r"-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)")
            .map_err(|e| Error::invalid_config("currency_format", e.to_string()))?;

        Ok(Self {
            thousands_separator: format.thousands_separator().to_string(),
            fraction,
            number,
        })
    }

    /// Parse a currency string.
    ///
    /// Returns `None` when no number can be found; absence is not zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use bank2ynab::currency::{CurrencyFormat, CurrencyParser};
    /// use rust_decimal::Decimal;
    ///
    /// let format = CurrencyFormat::new(".", ",")?;
    /// let parser = CurrencyParser::new(&format)?;
    /// assert_eq!(parser.parse("-1.234,56"), Some(Decimal::new(-123456, 2)));
    /// assert_eq!(parser.parse("n/a"), None);
    /// # Ok::<(), bank2ynab::Error>(())
    /// ```
    pub fn parse(&self, value: &str) -> Option<Decimal> {
        let without_thousands = if self.thousands_separator.is_empty() {
            value.to_string()
        } else {
            value.replace(self.thousands_separator.as_str(), "")
        };

        let normalized = self
            .fraction
            .replace(&without_thousands, ".${fraction}");

        let number = self.number.find(&normalized)?.as_str();
        let number = match number.strip_prefix('-') {
            Some(rest) if rest.starts_with('.') => format!("-0{}", rest),
            None if number.starts_with('.') => format!("0{}", number),
            _ => number.to_string(),
        };
        Decimal::from_str(&number).ok()
    }
}
