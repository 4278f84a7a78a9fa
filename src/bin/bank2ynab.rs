//! bank2ynab - CLI tool for converting bank statements into YNAB import files.

use bank2ynab::{
    ignore::DEFAULT_IGNORE_FILE, BankSchema, BuiltinBank, Converter, IgnoreList, Result,
    DEFAULT_OUTPUT_FILE,
};
use clap::{ArgGroup, Parser};
use env_logger::Env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bank2ynab")]
#[command(about = "Convert bank statement CSV files into YNAB import files", long_about = None)]
#[command(group(ArgGroup::new("schema").args(["bank", "config"])))]
struct Cli {
    /// Statement file exported from the bank
    #[arg(required_unless_present = "list_banks")]
    input: Option<PathBuf>,

    /// Bundled bank configuration (icabanken, nordea, revolut, revolutv2)
    #[arg(short, long, required_unless_present_any = ["config", "list_banks"])]
    bank: Option<String>,

    /// Bank configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File listing payees to ignore, one per line
    #[arg(long, default_value = DEFAULT_IGNORE_FILE)]
    ignore: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// List the bundled bank configurations and exit
    #[arg(long)]
    list_banks: bool,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_banks {
        for bank in BuiltinBank::ALL {
            let schema = bank.schema()?;
            println!("{:<12} {}", bank.key(), schema.name());
        }
        return Ok(());
    }

    let schema = match &cli.config {
        Some(path) => BankSchema::from_file(path)?,
        None => cli.bank.as_deref().unwrap_or_default().parse::<BuiltinBank>()?.schema()?,
    };

    // clap enforces the input unless --list-banks was given
    let Some(input) = cli.input else {
        return Ok(());
    };

    let ignore = IgnoreList::load(&cli.ignore)?;
    let converter = Converter::new(&schema)?;
    let report = converter.convert(&input, &ignore, &cli.output)?;

    println!("Bank: {}", schema.name());
    println!(
        "{}/{} row(s) converted ({} ignored, {} empty)",
        report.parsed_row_count,
        report.read_row_count,
        report.ignored_row_count,
        report.empty_row_count,
    );
    for warning in &report.warnings {
        println!("  - line {}: {}", warning.line, warning.message);
    }
    if report.succeeded {
        println!("Wrote {}", cli.output.display());
    } else {
        println!("Nothing to convert, {} was not written", cli.output.display());
    }

    Ok(())
}
