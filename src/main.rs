use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use seedsift::config::ScanConfig;
use seedsift::logging;
use seedsift::report::{Workbook, DEFAULT_OUTPUT_NAME};
use seedsift::scan::{ScanProgress, Scanner};

#[derive(Parser, Debug)]
#[command(
    name = "seedsift",
    version,
    about = "Recover Minecraft world seeds from save files and server logs"
)]
struct Args {
    /// Root directory to scan (defaults to the current directory)
    root: Option<PathBuf>,

    /// Output document path (defaults to minecraft_worlds_recovery.json
    /// under the scanned root)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit JSON-formatted logs
    #[arg(long)]
    json_logs: bool,

    /// Never prompt; a save failure exits with an error instead
    #[arg(long)]
    no_prompt: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.json_logs {
        logging::init_tracing_json();
    } else {
        logging::init_tracing();
    }

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot resolve current directory")?,
    };
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());

    let scanner = Scanner::new(ScanConfig::default()).context("scanner setup failed")?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg:>12} [{bar:40}] {pos}%")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    let session = scanner
        .scan_with_progress(&root, |progress| match progress {
            ScanProgress::Discovering {
                directories,
                scanned,
            } => {
                bar.set_message(format!("scanning {scanned}/{directories} dirs"));
            }
            ScanProgress::Processing { percent, .. } => {
                bar.set_message("processing");
                bar.set_position(percent as u64);
            }
        })
        .context("scan failed")?;
    bar.finish_and_clear();

    let counters = session.counters;
    println!("Files processed:  {}", counters.processed_files);
    println!("Unique seeds:     {}", session.registry.len());
    println!("Leads flagged:    {}", session.leads.len());
    println!("Log entries:      {}", session.log_record_count());
    println!("Errors:           {}", counters.errors_encountered);
    if counters.corrupted_files > 0 {
        println!("Corrupted files:  {}", counters.corrupted_files);
    }

    let workbook = session.finalize();
    let output = args
        .output
        .unwrap_or_else(|| root.join(DEFAULT_OUTPUT_NAME));
    save_with_retry(&workbook, &output, args.no_prompt)
}

/// Retry loop around persisting the document. Declining the retry is an
/// explicit acknowledgment that results are lost.
fn save_with_retry(workbook: &Workbook, path: &std::path::Path, no_prompt: bool) -> Result<()> {
    loop {
        match workbook.save(path) {
            Ok(()) => {
                println!("Report saved to {}", path.display());
                return Ok(());
            }
            Err(e) if no_prompt => {
                return Err(e).with_context(|| format!("cannot save {}", path.display()));
            }
            Err(e) => {
                eprintln!("Could not save {}: {e}", path.display());
                eprintln!("The file may be open in another program. Close it and retry.");
                if !confirm("Try saving again? (y/n): ")? {
                    eprintln!("Results not saved.");
                    return Ok(());
                }
            }
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
