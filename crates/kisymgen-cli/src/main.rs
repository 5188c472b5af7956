use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use kisymgen_core::{column_documentation, PlacedSymbol, Run, RunSummary};
use kisymgen_kicad::{library_path, KicadLibraryWriter};
use serde::Serialize;

mod csv_source;

use csv_source::{CsvDialect, CsvRowSource, DialectPreset};

/// The library was written but some rows could not be turned into symbols.
const EXIT_INCOMPLETE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "kisymgen", version)]
#[command(about = "Generate a KiCad symbol library from CSV files", long_about = None)]
struct Cli {
    /// Input files with symbol and pin rows
    #[arg(
        value_name = "INPUTFILE",
        required_unless_present_any = ["info", "csv_info"],
        value_hint = clap::ValueHint::FilePath
    )]
    inputs: Vec<PathBuf>,

    /// Library name; the output file is <LIBNAME>.kicad_sym
    #[arg(short, long, value_name = "LIBNAME", default_value = "a")]
    output: String,

    /// Field separation and quoting of the input files
    #[arg(long, value_enum, default_value_t = DialectPreset::Unix)]
    csv_dialect: DialectPreset,

    /// Field delimiter, overriding the dialect
    #[arg(short, long, value_parser = parse_char)]
    delimiter: Option<u8>,

    /// Quote character, overriding the dialect
    #[arg(long, value_parser = parse_char, conflicts_with = "no_quoting")]
    quote_char: Option<u8>,

    /// Read quote characters as plain text
    #[arg(long)]
    no_quoting: bool,

    /// Escape character inside quoted fields; disables doubled quotes
    #[arg(long, value_parser = parse_char)]
    escape_char: Option<u8>,

    /// Print the available CSV dialects and exit
    #[arg(long)]
    csv_info: bool,

    /// Print the placed symbols as JSON instead of writing the library
    #[arg(long)]
    json: bool,

    /// More log output; repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    silent: bool,

    /// Print the documentation of all columns and exit
    #[arg(short, long)]
    info: bool,
}

fn parse_char(raw: &str) -> Result<u8, String> {
    match raw {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match raw.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("expected a single ASCII character, got {raw:?}")),
        },
    }
}

impl Cli {
    fn dialect(&self) -> CsvDialect {
        let mut dialect = CsvDialect::preset(self.csv_dialect);
        if let Some(delimiter) = self.delimiter {
            dialect.delimiter = delimiter;
        }
        if let Some(quote) = self.quote_char {
            dialect.quote = Some(quote);
        }
        if self.no_quoting {
            dialect.quote = None;
        }
        if let Some(escape) = self.escape_char {
            dialect.escape = Some(escape);
            dialect.double_quote = false;
        }
        dialect
    }
}

fn print_dialects() {
    for preset in DialectPreset::value_variants() {
        if let Some(value) = preset.to_possible_value() {
            println!("{:<10} {}", value.get_name(), CsvDialect::preset(*preset));
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    symbols: &'a [PlacedSymbol],
    summary: &'a RunSummary,
}

/// Outcome of a run that got as far as producing output.
struct Outcome {
    summary: RunSummary,
    unreadable: usize,
}

impl Outcome {
    fn is_success(&self) -> bool {
        self.unreadable == 0 && self.summary.is_success()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match (cli.silent, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_INCOMPLETE),
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            for cause in e.chain().skip(1) {
                eprintln!("  {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    if cli.info || cli.csv_info {
        if cli.info {
            print!("{}", column_documentation());
        }
        if cli.csv_info {
            print_dialects();
        }
        return Ok(Outcome {
            summary: RunSummary::default(),
            unreadable: 0,
        });
    }

    let dialect = cli.dialect();
    log::debug!("Reading input with {dialect}");

    let mut run = Run::new();
    let mut writer = KicadLibraryWriter::new();
    let mut unreadable = 0;

    for input in &cli.inputs {
        let mut source = match CsvRowSource::open(input, &dialect) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Cannot read {}: {e}", input.display());
                unreadable += 1;
                continue;
            }
        };
        log::debug!("Processing {}", input.display());
        run.process_stream(&mut source, &mut writer)
            .with_context(|| format!("Aborted while processing {}", input.display()))?;
    }

    let summary = run.summary();
    if cli.json {
        let output = JsonOutput {
            symbols: writer.symbols(),
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let path = library_path(&cli.output);
        writer
            .write_to(&path)
            .with_context(|| format!("Cannot write library {}", path.display()))?;
    }

    log::info!(
        "{} symbol(s) generated, {} failure(s), {} pin row(s) skipped, {} stream(s) aborted",
        writer.len(),
        summary.failures(),
        summary.skipped_pin_rows(),
        summary.aborted_streams() + unreadable
    );
    Ok(Outcome {
        summary,
        unreadable,
    })
}
