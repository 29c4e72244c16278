//! gridcalc CLI - run scripted edits against a sheet

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use gridcalc::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Scriptable spreadsheet calculator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script of sheet commands
    ///
    /// One command per line: `set <cell> <text>`, `clear <cell>`,
    /// `get <cell>`, `deps <cell>`, `print values|texts`, `size`.
    /// Blank lines and lines starting with `#` are ignored.
    Run {
        /// Script file (default: stdin)
        script: Option<PathBuf>,

        /// Stop at the first failing line
        #[arg(long)]
        strict: bool,

        /// Number of addressable rows
        #[arg(long, default_value_t = MAX_ROWS)]
        max_rows: i32,

        /// Number of addressable columns
        #[arg(long, default_value_t = MAX_COLS)]
        max_cols: i32,

        /// Recompute formulas on every read
        #[arg(long)]
        no_cache: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            strict,
            max_rows,
            max_cols,
            no_cache,
        } => {
            let options = SheetOptions {
                max_rows,
                max_cols,
                cache_values: !no_cache,
            };
            run(script.as_deref(), options, strict)
        }
    }
}

fn run(script: Option<&std::path::Path>, options: SheetOptions, strict: bool) -> Result<()> {
    let input: Box<dyn BufRead> = match script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open '{}'", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sheet = Sheet::with_options(options);
    let mut failures = 0usize;

    for (index, line) in input.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", number))?;

        if let Err(err) = execute(&mut sheet, &line, &mut out) {
            if strict {
                return Err(err.context(format!("line {}", number)));
            }
            eprintln!("line {}: {:#}", number, err);
            failures += 1;
        }
    }

    out.flush().context("Failed to write output")?;
    if failures > 0 {
        eprintln!("{} line(s) failed", failures);
    }
    Ok(())
}

/// Run one script line against the sheet
fn execute<W: Write>(sheet: &mut Sheet, line: &str, out: &mut W) -> Result<()> {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
        return Ok(());
    }

    let (command, rest) = split_word(trimmed);
    match command {
        "set" => {
            let (cell, text) = split_word(rest);
            // Everything after one separating space is cell text, verbatim
            sheet.set_cell(address(cell)?, text)?;
        }
        "clear" => {
            sheet.clear_cell(address(single_arg(rest)?)?)?;
        }
        "get" => {
            let pos = address(single_arg(rest)?)?;
            match sheet.get_cell(pos)? {
                Some(cell) => writeln!(out, "{}\t{}\t{}", pos, cell.text(), cell.value())?,
                None => writeln!(out, "{}\t\t", pos)?,
            }
        }
        "deps" => {
            let pos = address(single_arg(rest)?)?;
            let order: Vec<String> = sheet
                .dependents_in_order(pos)?
                .iter()
                .map(|p| p.to_string())
                .collect();
            writeln!(out, "{}: {}", pos, order.join(" "))?;
        }
        "print" => match single_arg(rest)? {
            "values" => sheet.print_values(out)?,
            "texts" => sheet.print_texts(out)?,
            other => bail!("Unknown print mode '{}' (expected values or texts)", other),
        },
        "size" => {
            if !rest.trim().is_empty() {
                bail!("'size' takes no arguments");
            }
            let size = sheet.printable_size();
            writeln!(out, "{}x{}", size.rows, size.cols)?;
        }
        other => bail!("Unknown command '{}'", other),
    }
    Ok(())
}

/// Split off the first space-delimited word; the remainder keeps its text
/// after a single separating space
fn split_word(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

fn single_arg(rest: &str) -> Result<&str> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => Ok(word),
        (None, _) => Err(anyhow!("Missing argument")),
        (Some(_), Some(extra)) => Err(anyhow!("Unexpected argument '{}'", extra)),
    }
}

fn address(text: &str) -> Result<Position> {
    text.parse::<Position>()
        .with_context(|| format!("Bad cell address '{}'", text))
}
