//! Bank configurations bundled with the crate.

use crate::error::{Error, Result};
use crate::schema::BankSchema;
use std::fmt;
use std::str::FromStr;

/// Banks with a bundled configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinBank {
    IcaBanken,
    Nordea,
    Revolut,
    RevolutV2,
}

impl BuiltinBank {
    pub const ALL: [BuiltinBank; 4] = [
        BuiltinBank::IcaBanken,
        BuiltinBank::Nordea,
        BuiltinBank::Revolut,
        BuiltinBank::RevolutV2,
    ];

    /// Lookup key: the bank name reduced to lowercase letters and digits.
    pub fn key(&self) -> &'static str {
        match self {
            BuiltinBank::IcaBanken => "icabanken",
            BuiltinBank::Nordea => "nordea",
            BuiltinBank::Revolut => "revolut",
            BuiltinBank::RevolutV2 => "revolutv2",
        }
    }

    /// The bundled TOML document.
    pub fn source(&self) -> &'static str {
        match self {
            BuiltinBank::IcaBanken => include_str!("../banks/icabanken.toml"),
            BuiltinBank::Nordea => include_str!("../banks/nordea.toml"),
            BuiltinBank::Revolut => include_str!("../banks/revolut.toml"),
            BuiltinBank::RevolutV2 => include_str!("../banks/revolut_v2.toml"),
        }
    }

    pub fn schema(&self) -> Result<BankSchema> {
        BankSchema::from_toml_str(self.source())
    }
}

impl FromStr for BuiltinBank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = to_key(s);
        BuiltinBank::ALL
            .into_iter()
            .find(|bank| bank.key() == key)
            .ok_or_else(|| Error::UnknownBank(s.to_string()))
    }
}

impl fmt::Display for BuiltinBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn to_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
