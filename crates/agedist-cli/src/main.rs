//! agedist CLI - population-by-age spreadsheet conversion

use std::path::{Path, PathBuf};

use agedist::prelude::*;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agedist")]
#[command(
    author,
    version,
    about = "Convert population-by-age spreadsheets into table and tuple CSV files"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert all 2019 files and write the combined per-date tables (default)
    Run(RunArgs),

    /// Convert a single spreadsheet
    Convert {
        /// Input spreadsheet (xlsx)
        input: PathBuf,

        /// Reference date of the data (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Sex category: B, M or F
        #[arg(short, long)]
        sex: Sex,

        /// Output prefix (default: converted/<input stem>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Verify that a tuples file rebuilds its table file
    Check {
        /// Output prefix, without the _table.csv / _tuples.csv suffix
        prefix: PathBuf,

        /// Field delimiter (default: comma)
        #[arg(long, default_value = ",")]
        delimiter: char,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding <year>/<id>.xlsx inputs
    #[arg(long, default_value = "original")]
    original: PathBuf,

    /// Directory receiving <year>/<prefix>_{table,tuples}.csv outputs
    #[arg(long, default_value = "converted")]
    converted: PathBuf,

    #[command(flatten)]
    options: ConvertArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// Use the whole header text as region code when it has no line break
    #[arg(long)]
    lenient_headers: bool,

    /// Require the dropped total row to carry this label
    #[arg(long)]
    total_label: Option<String>,

    /// Field delimiter of the written CSV files (default: comma)
    #[arg(long, default_value = ",")]
    delimiter: char,
}

impl ConvertArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            header_policy: if self.lenient_headers {
                HeaderPolicy::Lenient
            } else {
                HeaderPolicy::Strict
            },
            total_label: self.total_label.clone(),
            ..LoadOptions::default()
        }
    }

    fn write_options(&self) -> Result<CsvWriteOptions> {
        Ok(CsvWriteOptions {
            delimiter: ascii_delimiter(self.delimiter)?,
            ..CsvWriteOptions::default()
        })
    }
}

fn ascii_delimiter(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("Delimiter {:?} is not an ASCII character", delimiter);
    }
    Ok(delimiter as u8)
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env).init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => run(&args),
        Commands::Convert {
            input,
            date,
            sex,
            output,
            options,
        } => convert(&input, date, sex, output, &options),
        Commands::Check { prefix, delimiter } => check(&prefix, delimiter),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let converter = Converter::new(&args.original, &args.converted)
        .with_load_options(args.options.load_options())
        .with_write_options(args.options.write_options()?);

    let summary = converter
        .run(&Manifest::default_2019())
        .context("Conversion failed")?;

    info!(
        "Wrote {} file tables and {} combined tables under '{}'",
        summary.files.len(),
        summary.combined.len(),
        args.converted.display()
    );
    Ok(())
}

fn convert(
    input: &Path,
    date: NaiveDate,
    sex: Sex,
    output: Option<PathBuf>,
    options: &ConvertArgs,
) -> Result<()> {
    let prefix = match output {
        Some(prefix) => prefix,
        None => {
            let stem = input
                .file_stem()
                .with_context(|| format!("Cannot derive an output name from '{}'", input.display()))?;
            Path::new("converted").join(stem)
        }
    };

    let converter = Converter::new(".", ".")
        .with_load_options(options.load_options())
        .with_write_options(options.write_options()?);

    let (table, saved) = converter
        .convert_file(input, date, sex, &prefix)
        .with_context(|| format!("Failed to convert '{}'", input.display()))?;

    info!(
        "Wrote {} rows to '{}' and '{}'",
        table.len(),
        saved.table.display(),
        saved.tuples.display()
    );
    Ok(())
}

fn check(prefix: &Path, delimiter: char) -> Result<()> {
    let options = CsvReadOptions {
        delimiter: ascii_delimiter(delimiter)?,
        ..CsvReadOptions::default()
    };

    let count = agedist::check(prefix, &options)
        .with_context(|| format!("Check failed for '{}'", prefix.display()))?;

    println!("OK: {} tuples", count);
    Ok(())
}
