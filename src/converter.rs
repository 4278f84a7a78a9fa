//! Statement to YNAB conversion.
//!
//! A run reads the statement header, reads and filters the rows, parses
//! each kept row on its own and finally writes the YNAB import file. A row
//! that fails to parse is logged and skipped; only I/O failures abort the run.

use crate::currency::CurrencyParser;
use crate::error::{Error, Result, Stage};
use crate::ignore::IgnoreList;
use crate::schema::BankSchema;
use crate::types::{ConversionReport, OutputRow, RawRow, RowWarning, TransactionColumn, TransactionKind};
use crate::ynab_csv::{self, YNAB_DATE_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

/// Outflow and inflow of a row; `None` when no column contributed.
pub type FlowPair = (Option<Decimal>, Option<Decimal>);

/// A statement row with its line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub line: u64,
    pub cells: RawRow,
}

/// Rows read from a statement, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementRows {
    /// Rows kept for parsing.
    pub read: Vec<StatementRow>,

    /// Rows whose payee matched the ignore list.
    pub ignored: Vec<StatementRow>,

    /// Number of rows without any non-empty cell.
    pub empty_count: usize,
}

/// Converts statements of one bank into YNAB import files.
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    schema: &'a BankSchema,
    parser: CurrencyParser,
}

impl<'a> Converter<'a> {
    pub fn new(schema: &'a BankSchema) -> Result<Self> {
        let parser = CurrencyParser::new(schema.currency_format())?;
        Ok(Self { schema, parser })
    }

    pub fn schema(&self) -> &BankSchema {
        self.schema
    }

    /// Convert the statement at `input` and write the result to `output`.
    ///
    /// Returns a report with `succeeded == false` when no row could be
    /// parsed; nothing is written in that case.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        ignore: &IgnoreList,
        output: impl AsRef<Path>,
    ) -> Result<ConversionReport> {
        let input = input.as_ref();
        debug!("Converting {} as {}", input.display(), self.schema.name());
        let file = File::open(input).map_err(|e| Error::io(Stage::ReadingHeader, e))?;
        self.convert_from_reader(BufReader::new(file), ignore, output)
    }

    /// Convert a statement from any source implementing `Read`.
    pub fn convert_from_reader<R: Read>(
        &self,
        reader: R,
        ignore: &IgnoreList,
        output: impl AsRef<Path>,
    ) -> Result<ConversionReport> {
        let rows = self.read_input(reader, ignore)?;
        let (parsed, warnings) = self.parse_rows(&rows.read);

        let mut report = ConversionReport {
            succeeded: false,
            empty_row_count: rows.empty_count,
            ignored_row_count: rows.ignored.len(),
            read_row_count: rows.read.len(),
            parsed_row_count: parsed.len(),
            warnings,
        };

        if parsed.is_empty() {
            info!("Nothing to convert, no output written");
            return Ok(report);
        }

        write_output(output.as_ref(), &parsed)?;
        info!("YNAB csv-file successfully written to {}", output.as_ref().display());
        report.succeeded = true;
        Ok(report)
    }

    /// Read statement rows, dropping empty rows and rows on the ignore list.
    pub fn read_input<R: Read>(&self, reader: R, ignore: &IgnoreList) -> Result<StatementRows> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.schema.csv_delimiter())
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut record = StringRecord::new();
        let has_header = csv_reader
            .read_record(&mut record)
            .map_err(|e| Error::csv(Stage::ReadingHeader, e))?;
        if !has_header {
            return Err(Error::io(
                Stage::ReadingHeader,
                io::Error::new(io::ErrorKind::UnexpectedEof, "statement has no header line"),
            ));
        }
        let header: Vec<String> = record
            .iter()
            .map(|name| self.schema.normalize(name.trim_start_matches('\u{feff}')))
            .collect();

        let payee_column = self.schema.payee_column();
        let mut rows = StatementRows::default();

        while csv_reader
            .read_record(&mut record)
            .map_err(|e| Error::csv(Stage::ReadingRows, e))?
        {
            let line = record.position().map_or(0, |p| p.line());

            if record.len() > header.len() {
                let excess: Vec<&str> = record.iter().skip(header.len()).collect();
                warn!("Excess columns found on line {}: {:?}", line, excess);
            }

            let cells: RawRow = header
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.clone(), value.trim().to_string()))
                .collect();

            if cells.values().all(|value| value.is_empty()) {
                warn!("Skipping empty row {}", line);
                rows.empty_count += 1;
                continue;
            }

            let row = StatementRow { line, cells };
            let ignored = payee_column
                .as_ref()
                .and_then(|column| row.cells.get(column))
                .is_some_and(|payee| ignore.matches(payee));

            if ignored {
                debug!("Ignoring row {}: {:?}", line, row.cells);
                rows.ignored.push(row);
            } else {
                rows.read.push(row);
            }
        }

        info!(
            "{}/{} line(s) successfully read (ignored {} blank line(s) and {} transactions found in the ignore list).",
            rows.read.len(),
            rows.read.len() + rows.ignored.len() + rows.empty_count,
            rows.empty_count,
            rows.ignored.len(),
        );

        Ok(rows)
    }

    /// Parse every row, collecting the rows that fail as warnings.
    pub fn parse_rows(&self, rows: &[StatementRow]) -> (Vec<OutputRow>, Vec<RowWarning>) {
        let mut parsed = Vec::with_capacity(rows.len());
        let mut warnings = Vec::new();

        for row in rows {
            match self.parse_row(&row.cells) {
                Ok(output) => parsed.push(output),
                Err(e) => {
                    warn!("Incorrectly formatted row {}: {:?}. Error: {}. Skipping...", row.line, row.cells, e);
                    warnings.push(RowWarning {
                        line: row.line,
                        row: row.cells.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!("{}/{} line(s) successfully parsed", parsed.len(), rows.len());
        (parsed, warnings)
    }

    /// Convert one statement row into a YNAB row.
    pub fn parse_row(&self, row: &RawRow) -> Result<OutputRow> {
        let (outflow, inflow) = self.parse_transaction_values(row)?;

        let date_column = self.schema.date_column();
        let date_value = row
            .get(&date_column)
            .ok_or_else(|| Error::MissingField(date_column.clone()))?;
        let date = parse_date(date_value, self.schema.date_format())?;

        let passthrough = |column: Option<String>| {
            column
                .and_then(|c| row.get(&c).cloned())
                .unwrap_or_default()
        };

        Ok(OutputRow {
            date: date.format(YNAB_DATE_FORMAT).to_string(),
            payee: passthrough(self.schema.payee_column()),
            category: passthrough(self.schema.category_column()),
            memo: passthrough(self.schema.memo_column()),
            outflow: decimal_to_string(outflow),
            inflow: decimal_to_string(inflow),
        })
    }

    /// Net outflow and inflow over every transaction column of the row.
    pub fn parse_transaction_values(&self, row: &RawRow) -> Result<FlowPair> {
        let mut outflow = None;
        let mut inflow = None;

        for column in self.schema.transaction_columns() {
            let key = self.schema.normalize(&column.header_key);
            let value = row.get(&key).ok_or_else(|| Error::MissingField(key.clone()))?;
            let (out, inc) = self.parse_column_value(value, column)?;
            outflow = add(outflow, out, column)?;
            inflow = add(inflow, inc, column)?;
        }

        Ok((outflow, inflow))
    }

    /// Classify one cell by the kind of its column.
    pub fn parse_column_value(&self, value: &str, column: &TransactionColumn) -> Result<FlowPair> {
        let Some(decimal) = self.parser.parse(value) else {
            return Ok((None, None));
        };
        let negative = decimal < Decimal::ZERO;

        match column.kind {
            TransactionKind::Amount if negative => Ok((Some(decimal.abs()), None)),
            TransactionKind::Amount => Ok((None, Some(decimal.abs()))),
            TransactionKind::Outflow | TransactionKind::Inflow if negative => Err(Error::NegativeValue {
                column: column.header_key.clone(),
                value: decimal,
            }),
            TransactionKind::Outflow => Ok((Some(decimal.abs()), None)),
            TransactionKind::Inflow => Ok((None, Some(decimal.abs()))),
        }
    }
}

fn add(total: Option<Decimal>, value: Option<Decimal>, column: &TransactionColumn) -> Result<Option<Decimal>> {
    match (total, value) {
        (Some(a), Some(b)) => a.checked_add(b).map(Some).ok_or_else(|| Error::AmountOverflow {
            column: column.header_key.clone(),
        }),
        (a, None) => Ok(a),
        (None, b) => Ok(b),
    }
}

fn decimal_to_string(value: Option<Decimal>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

/// Parse a statement date; formats carrying a time of day are accepted and
/// the time is dropped.
fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .or_else(|_| NaiveDateTime::parse_from_str(value, format).map(|dt| dt.date()))
        .map_err(|_| Error::InvalidDate {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Write the rows next to `path` and move them into place, so that a failed
/// write leaves no partial output behind.
fn write_output(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let partial = partial_path(path);

    let result = File::create(&partial)
        .map_err(|e| Error::io(Stage::WritingOutput, e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            ynab_csv::write_rows(&mut writer, rows)
        })
        .and_then(|()| fs::rename(&partial, path).map_err(|e| Error::io(Stage::WritingOutput, e)));

    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const NORDEA: &str = r#"
        name = "Nordea"
        [csv]
        date_format = "%Y/%m/%d"
        delimiter = ";"
        [currency_format]
        thousands_separator = ""
        decimal_point = ","
        [ynab_mapping]
        date = "Bokföringsdag"
        amount = "Belopp"
        payee = "Rubrik"
    "#;

    const REVOLUT: &str = r#"
        name = "Revolut"
        [csv]
        date_format = "%d %b %Y"
        [currency_format]
        thousands_separator = ","
        decimal_point = "."
        [ynab_mapping]
        date = "Completed Date"
        outflow = ["Paid Out", "Exchange Out"]
        inflow = ["Paid In", "Exchange In"]
        payee = "Description"
        memo = "Notes"
        category = "Category"
    "#;

    fn schema(source: &str) -> BankSchema {
        BankSchema::from_toml_str(source).unwrap()
    }

    fn raw(cells: &[(&str, &str)]) -> RawRow {
        cells.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-02-20", "%Y-%m-%d").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 20));

        let date = parse_date("2024-02-20 13:45:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());

        assert!(matches!(
            parse_date("20.02.2024", "%Y-%m-%d"),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_row_amount() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();

        let row = converter
            .parse_row(&raw(&[("bokföringsdag", "2024/01/15"), ("belopp", "-1540,00"), ("rubrik", "ICA Kvantum")]))
            .unwrap();
        assert_eq!(
            row,
            OutputRow {
                date: "2024/01/15".into(),
                payee: "ICA Kvantum".into(),
                outflow: "1540.00".into(),
                ..Default::default()
            }
        );

        let row = converter
            .parse_row(&raw(&[("bokföringsdag", "2024/01/25"), ("belopp", "25000,00")]))
            .unwrap();
        assert_eq!(row.inflow, "25000.00");
        assert_eq!(row.outflow, "");
        assert_eq!(row.payee, "");
    }

    #[test]
    fn test_amount_sets_exactly_one_side() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        for value in ["-0,01", "0,00", "12,5", "-1000", "7"] {
            let row = converter
                .parse_row(&raw(&[("bokföringsdag", "2024/01/15"), ("belopp", value)]))
                .unwrap();
            assert!(row.outflow.is_empty() != row.inflow.is_empty(), "{}", value);
        }
    }

    #[test]
    fn test_parse_transaction_values_sums_columns() {
        let schema = schema(REVOLUT);
        let converter = Converter::new(&schema).unwrap();
        let row = raw(&[
            ("paid out", "1,200.00"),
            ("paid in", ""),
            ("exchange out", "3.4"),
            ("exchange in", ""),
        ]);
        assert_eq!(
            converter.parse_transaction_values(&row).unwrap(),
            (Some(dec("1203.40")), None)
        );
    }

    #[test]
    fn test_parse_transaction_values_keeps_both_sides() {
        let schema = schema(REVOLUT);
        let converter = Converter::new(&schema).unwrap();
        let row = raw(&[
            ("paid out", "10.00"),
            ("paid in", ""),
            ("exchange out", ""),
            ("exchange in", "4.00"),
        ]);
        assert_eq!(
            converter.parse_transaction_values(&row).unwrap(),
            (Some(dec("10.00")), Some(dec("4.00")))
        );
    }

    #[test]
    fn test_negative_outflow_is_row_error() {
        let schema = schema(REVOLUT);
        let converter = Converter::new(&schema).unwrap();
        let column = TransactionColumn::new("Paid Out", TransactionKind::Outflow);
        let err = converter.parse_column_value("-5.00", &column).unwrap_err();
        assert!(matches!(err, Error::NegativeValue { .. }));
        assert!(err.is_row_level());

        let column = TransactionColumn::new("Paid In", TransactionKind::Inflow);
        assert!(converter.parse_column_value("-5.00", &column).is_err());
        assert_eq!(converter.parse_column_value("-0.00", &column).unwrap(), (None, Some(dec("0.00"))));
    }

    #[test]
    fn test_missing_transaction_cell_is_row_error() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let err = converter
            .parse_row(&raw(&[("bokföringsdag", "2024/01/15")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingField(ref c) if c == "belopp"));
    }

    #[test]
    fn test_read_input_counts() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let statement = "\u{feff}Bokföringsdag;Belopp;Rubrik\n\
                         2024/01/15;-100,00;ICA\n\
                         ;;\n\
                         2024/01/16;-200,00;Överföring Sparkonto\n\
                         2024/01/17;50,00;Swish;extra\n";
        let ignore: IgnoreList = ["Sparkonto"].into_iter().collect();
        let rows = converter.read_input(statement.as_bytes(), &ignore).unwrap();

        assert_eq!(rows.empty_count, 1);
        assert_eq!(rows.ignored.len(), 1);
        assert_eq!(rows.read.len(), 2);
        assert_eq!(rows.read[0].cells.get("bokföringsdag").map(String::as_str), Some("2024/01/15"));
        assert_eq!(rows.read[1].cells.len(), 3);
    }

    #[test]
    fn test_read_input_without_payee_column_keeps_all() {
        let schema = schema(
            r#"
            name = "N"
            [csv]
            date_format = "%Y-%m-%d"
            [currency_format]
            thousands_separator = ""
            decimal_point = "."
            [ynab_mapping]
            date = "Date"
            amount = "Amount"
        "#,
        );
        let converter = Converter::new(&schema).unwrap();
        let ignore: IgnoreList = ["ICA"].into_iter().collect();
        let rows = converter
            .read_input("Date,Amount,Text\n2024-01-01,-1.00,ICA\n".as_bytes(), &ignore)
            .unwrap();
        assert_eq!(rows.read.len(), 1);
        assert!(rows.ignored.is_empty());
    }

    #[test]
    fn test_read_input_without_header() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let err = converter.read_input("".as_bytes(), &IgnoreList::empty()).unwrap_err();
        assert!(matches!(err, Error::Io { stage: Stage::ReadingHeader, .. }));
    }

    #[test]
    fn test_parse_rows_isolates_failures() {
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let rows = vec![
            StatementRow {
                line: 2,
                cells: raw(&[("bokföringsdag", "2024/01/15"), ("belopp", "-1,00")]),
            },
            StatementRow {
                line: 3,
                cells: raw(&[("bokföringsdag", "15 jan"), ("belopp", "-2,00")]),
            },
            StatementRow {
                line: 4,
                cells: raw(&[("bokföringsdag", "2024/01/17"), ("belopp", "3,00")]),
            },
        ];
        let (parsed, warnings) = converter.parse_rows(&rows);
        assert_eq!(parsed.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
    }

    #[test]
    fn test_parse_rows_isolates_overflowing_sum() {
        let schema = schema(REVOLUT);
        let converter = Converter::new(&schema).unwrap();
        let cells = |paid_out: &str, exchange_out: &str| {
            raw(&[
                ("completed date", "01 Mar 2024"),
                ("paid out", paid_out),
                ("paid in", ""),
                ("exchange out", exchange_out),
                ("exchange in", ""),
            ])
        };
        let rows = vec![
            StatementRow {
                line: 2,
                cells: cells("79228162514264337593543950335", "1"),
            },
            StatementRow {
                line: 3,
                cells: cells("12.50", "1"),
            },
        ];

        let (parsed, warnings) = converter.parse_rows(&rows);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].outflow, "13.50");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 2);
        assert!(warnings[0].message.contains("overflow"));
    }

    #[test]
    fn test_nothing_parsed_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ynabImport.csv");
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let report = converter
            .convert_from_reader("Bokföringsdag;Belopp\nfoo;-1,00\n".as_bytes(), &IgnoreList::empty(), &output)
            .unwrap();
        assert_eq!(report.counts(), (false, 0, 0, 1, 0));
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("ynabImport.csv");
        let schema = schema(NORDEA);
        let converter = Converter::new(&schema).unwrap();
        let err = converter
            .convert_from_reader("Bokföringsdag;Belopp\n2024/01/15;-1,00\n".as_bytes(), &IgnoreList::empty(), &output)
            .unwrap_err();
        assert!(matches!(err, Error::Io { stage: Stage::WritingOutput, .. }));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("out/ynabImport.csv")), PathBuf::from("out/ynabImport.csv.part"));
    }
}
