//! The YNAB import file.
//!
//! YNAB expects a comma-separated file with the header
//! `Date,Payee,Category,Memo,Outflow,Inflow`, dates as `YYYY/MM/DD` and
//! unsigned outflow/inflow amounts. Categories only import when they match
//! an existing `Master: Sub` category exactly; any other field except the
//! date may be left blank.

use crate::error::{Error, Result, Stage};
use crate::types::OutputRow;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::str::FromStr;

/// Header row of the YNAB import file.
pub const YNAB_HEADER: [&str; 6] = ["Date", "Payee", "Category", "Memo", "Outflow", "Inflow"];

/// Output date format.
pub const YNAB_DATE_FORMAT: &str = "%Y/%m/%d";

/// Write the header followed by `rows` in order.
///
/// # Examples
///
/// ```
/// use bank2ynab::types::OutputRow;
/// use bank2ynab::ynab_csv::write_rows;
///
/// let row = OutputRow {
///     date: "2024/01/15".into(),
///     payee: "ICA Kvantum".into(),
///     outflow: "125.50".into(),
///     ..Default::default()
/// };
/// let mut out = Vec::new();
/// write_rows(&mut out, &[row])?;
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "Date,Payee,Category,Memo,Outflow,Inflow\n2024/01/15,ICA Kvantum,,,125.50,\n"
/// );
/// # Ok::<(), bank2ynab::Error>(())
/// ```
pub fn write_rows<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    csv_writer
        .write_record(YNAB_HEADER)
        .map_err(|e| Error::csv(Stage::WritingOutput, e))?;
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| Error::csv(Stage::WritingOutput, e))?;
    }

    csv_writer.flush().map_err(|e| Error::io(Stage::WritingOutput, e))?;
    Ok(())
}

/// Read the rows of a YNAB import file.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<OutputRow>> {
    let mut csv_reader = ReaderBuilder::new().from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: OutputRow = result.map_err(|e| Error::csv(Stage::ReadingRows, e))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Sum of inflows minus sum of outflows.
pub fn net_flow(rows: &[OutputRow]) -> Result<Decimal> {
    let mut net = Decimal::ZERO;
    for row in rows {
        net += parse_amount(&row.inflow)?;
        net -= parse_amount(&row.outflow)?;
    }
    Ok(net)
}

fn parse_amount(value: &str) -> Result<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(value).map_err(|_| Error::InvalidAmount(value.to_string()))
}
