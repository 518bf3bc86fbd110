use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use clio::config::{self, SourceArgs};
use clio::format::render_record;
use clio::model::{HistoricalRecord, CATEGORIES};
use clio::parser::{self, Command};
use clio::query::QueryRequest;
use clio::source::ConfiguredSource;
use clio::{Archive, LoadReport};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive browser for the historical record archive", long_about = None)]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    /// Run a single command and exit
    #[arg(short, long)]
    command: Option<String>,
}

enum Flow {
    Continue,
    Exit,
}

struct Session {
    runtime: Runtime,
    archive: Archive<ConfiguredSource>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_tracing("warn");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let session = Session {
        runtime,
        archive: Archive::new(args.source.source(), args.source.program_id),
    };

    if let Some(line) = args.command {
        session.reload()?;
        let command = parser::parse_command(&line)?;
        session.execute(command)?;
        return Ok(());
    }

    print_banner();
    println!("Program: {}", session.archive.program());
    if let Err(e) = session.reload() {
        println!("[\u{2717}] Initial load failed: {:#}", e);
        println!("    Type 'RELOAD' to try again.");
    }
    println!("Type 'HELP' for supported commands or 'EXIT' to quit.\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("clio> ");
        io::stdout().flush()?;
        buffer.clear();

        if stdin.lock().read_line(&mut buffer)? == 0 { break; }
        if buffer.trim().is_empty() { continue; }

        match parser::parse_command(&buffer) {
            Ok(cmd) => match session.execute(cmd) {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => println!("[\u{26a0}\u{fe0f} Error] {:#}", e),
            },
            Err(e) => {
                println!("[\u{2717} Syntax Error] {}", e);
                print_hint(&buffer);
            }
        }
    }
    Ok(())
}

fn print_banner() {
    println!("\n==================================================");
    println!("   Clio CLI - Archivio storico on-chain");
    println!("==================================================\n");
}

fn print_help() {
    println!("\n--- Available Commands ---");
    println!("1. LIST:        LIST [LIMIT 10]");
    println!("2. FIND:        FIND \"term\" [IN Categoria] [LIMIT 5]");
    println!("3. CATEGORY:    CATEGORY Guerra [LIMIT 5]");
    println!("4. SHOW:        SHOW <address>");
    println!("5. CATEGORIES:  CATEGORIES");
    println!("6. RELOAD:      RELOAD");
    println!("7. ERRORS:      ERRORS");
    println!("8. EXIT:        Quit");
    println!("\nCategories: {}\n", CATEGORIES.join(", "));
}

fn print_hint(line: &str) {
    let upper = line.trim().to_uppercase();
    if upper.starts_with("FIND") || upper.starts_with("SEARCH") {
        println!("    \u{2139}\u{fe0f}  Hint: Try 'FIND \"Trattato di\" IN Trattati LIMIT 5'");
    } else if upper.starts_with("SHOW") || upper.starts_with("GET") {
        println!("    \u{2139}\u{fe0f}  Hint: Addresses are 32-byte base58 strings");
    } else if upper.contains("LIMIT") {
        println!("    \u{2139}\u{fe0f}  Hint: LIMIT takes a positive number");
    }
}

impl Session {
    fn reload(&self) -> anyhow::Result<()> {
        let report = self.runtime.block_on(self.archive.reload())?;
        print_report(&report);
        Ok(())
    }

    fn execute(&self, cmd: Command) -> anyhow::Result<Flow> {
        match cmd {
            Command::Help => print_help(),
            Command::List { limit } => self.list(None, None, limit)?,
            Command::Find { term, category, limit } => self.list(category.as_deref(), Some(&term), limit)?,
            Command::Category { name, limit } => self.list(Some(&name), None, limit)?,
            Command::Show { address } => match self.archive.get(&address) {
                Some(record) => print!("{}", render_record(&record)),
                None => println!("[\u{2717}] No record at {}.", address),
            },
            Command::Categories => {
                for (name, count) in self.archive.categories() {
                    println!("  {:<14} {}", name, count);
                }
            }
            Command::Reload => self.reload()?,
            Command::Errors => match self.archive.last_report() {
                Some(report) if report.failures.is_empty() => println!("[\u{2713}] No decode failures."),
                Some(report) => {
                    for failure in &report.failures {
                        println!("  \u{2022} {}: {}", failure.address, failure.error);
                    }
                }
                None => println!("Nothing loaded yet."),
            },
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn list(&self, category: Option<&str>, search: Option<&str>, limit: Option<usize>) -> anyhow::Result<()> {
        let mut request = QueryRequest::new(category, search)?;
        if let Some(limit) = limit {
            request = request.with_limit(limit)?;
        }
        print_records(&self.archive.query(&request));
        Ok(())
    }
}

fn print_records(records: &[HistoricalRecord]) {
    println!("\nFound {} records:", records.len());
    for record in records {
        print!("{}", render_record(record));
    }
    println!();
}

fn print_report(report: &LoadReport) {
    println!(
        "[\u{2713}] Loaded {} records ({} accounts fetched, {} foreign, {} failed)",
        report.decoded,
        report.fetched,
        report.foreign,
        report.failures.len()
    );
}
