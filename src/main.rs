//! josedb shell
//!
//! A line-oriented interactive shell over the engine's embedding
//! interface. One statement per line, plus a few dot-commands for
//! introspection. All engine logic lives in the library; this binary only
//! reads lines and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use josedb::output::render_rows;
use josedb::{ExecOutcome, Executor};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "josedb")]
#[command(about = "Small single-node relational database engine", long_about = None)]
struct Args {
    /// Database file to open. Created on the first mutation if absent;
    /// omit it for an in-memory session.
    database: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut executor =
        Executor::open(args.database.clone()).context("failed to open database")?;
    match &args.database {
        Some(path) => println!("josedb — {} (.tables, .schema NAME, .quit)", path.display()),
        None => println!("josedb — in-memory session (.tables, .schema NAME, .quit)"),
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == ".quit" {
            break;
        }
        if line == ".tables" {
            for name in executor.table_names() {
                println!("{name}");
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix(".schema") {
            print_schema(&executor, rest.trim());
            continue;
        }

        match executor.execute(line) {
            Ok(ExecOutcome::Rows(rows)) => print!("{}", render_rows(&rows)),
            Ok(ExecOutcome::Status(status)) => println!("{status}"),
            Err(e) => eprintln!("error: {e}"),
        }
        io::stdout().flush().ok();
    }

    executor.close().context("failed to save database")?;
    Ok(())
}

fn print_schema(executor: &Executor, name: &str) {
    if name.is_empty() {
        eprintln!("usage: .schema NAME");
        return;
    }
    match executor.describe(name) {
        Ok(info) => {
            for (column, column_type) in &info.columns {
                println!("{column} {column_type}");
            }
            if let Some(pk) = &info.primary_key {
                println!("primary key: {pk}");
            }
            if !info.unique_columns.is_empty() {
                println!("unique: {}", info.unique_columns.join(", "));
            }
        }
        Err(e) => eprintln!("error: {e}"),
    }
}
