//! ynab_netflow - CLI tool for checking the net flow of a YNAB import file.

use bank2ynab::{ynab_csv, Error, Result, Stage};
use clap::Parser;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ynab_netflow")]
#[command(about = "Print the net flow (inflow minus outflow) of a YNAB import file", long_about = None)]
struct Cli {
    /// YNAB import file
    #[arg(long, default_value = bank2ynab::DEFAULT_OUTPUT_FILE)]
    file: PathBuf,

    /// Expected net flow; exit with an error if the file differs
    #[arg(long, allow_hyphen_values = true)]
    expect: Option<Decimal>,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let file = File::open(&cli.file).map_err(|e| Error::Io {
        stage: Stage::ReadingRows,
        source: e,
    })?;
    let rows = ynab_csv::read_rows(BufReader::new(file))?;
    let net = ynab_csv::net_flow(&rows)?;

    println!("{} row(s), net flow {}", rows.len(), net);

    match cli.expect {
        Some(expected) if expected != net => {
            println!("Net flow differs: expected {} but found {}", expected, net);
            Ok(false)
        }
        Some(_) => {
            println!("Net flow matches the expected value.");
            Ok(true)
        }
        None => Ok(true),
    }
}
