//! Payee ignore list.
//!
//! Rows whose payee contains one of the listed substrings are left out of
//! the conversion, e.g. transfers between the user's own accounts.

use crate::error::{Error, Result, Stage};
use log::info;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

/// Default file name of the ignore list.
pub const DEFAULT_IGNORE_FILE: &str = "accignore.txt";

/// Substrings identifying payees whose transactions are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: Vec<String>,
}

impl IgnoreList {
    /// An ignore list that ignores nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an ignore list from a file, one substring per line.
    ///
    /// A missing file yields an empty list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::File::open(path) {
            Ok(file) => {
                let list = Self::from_reader(io::BufReader::new(file))?;
                info!("Ignoring transactions from account(s): {:?}", list.entries);
                Ok(list)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No ignore list at {}, parsing all transactions", path.display());
                Ok(Self::empty())
            }
            Err(e) => Err(Error::io(Stage::LoadingIgnoreList, e)),
        }
    }

    /// Read an ignore list from any buffered source.
    ///
    /// Lines are trimmed and blank lines skipped, since an empty substring
    /// would match every payee.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(Stage::LoadingIgnoreList, e))?;
            let entry = line.trim();
            if !entry.is_empty() {
                entries.push(entry.to_string());
            }
        }
        Ok(Self { entries })
    }

    /// Whether `payee` contains any ignored substring. Case-sensitive.
    pub fn matches(&self, payee: &str) -> bool {
        self.entries.iter().any(|entry| payee.contains(entry.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(Into::into)
                .filter(|entry: &String| !entry.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_reader_skips_blank_lines() {
        let list = IgnoreList::from_reader(Cursor::new("Sparkonto\n\n  ISK 1234  \r\n")).unwrap();
        assert_eq!(list.entries(), &["Sparkonto".to_string(), "ISK 1234".to_string()]);
    }

    #[test]
    fn test_matches_any_entry() {
        let list: IgnoreList = ["Sparkonto", "Överföring"].into_iter().collect();
        assert!(list.matches("Insättning Sparkonto 1234"));
        assert!(list.matches("Överföring till ISK"));
        assert!(!list.matches("ICA Supermarket"));
    }

    #[test]
    fn test_matches_is_case_sensitive() {
        let list: IgnoreList = ["Sparkonto"].into_iter().collect();
        assert!(!list.matches("sparkonto"));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        assert!(!IgnoreList::empty().matches("anything"));
        assert!(IgnoreList::empty().is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = IgnoreList::load(dir.path().join(DEFAULT_IGNORE_FILE)).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_IGNORE_FILE);
        fs::write(&path, "Sparkonto\n").unwrap();
        let list = IgnoreList::load(&path).unwrap();
        assert_eq!(list.len(), 1);
    }
}
