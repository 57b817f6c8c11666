//! Command-line interface for covmap.
//!
//! `cmd_ingest` returns its output as a `String`, making it easy to test
//! without capturing stdout.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::detect::Format;
use crate::ingest::{ingest, Ingested, Report};
use crate::locator::FileLocator;
use crate::measures::FileMeasures;
use crate::sources;

/// covmap: map LCOV and Cobertura coverage reports onto a project's files.
#[derive(Parser)]
#[command(name = "covmap", version, about)]
pub struct Cli {
    /// Log debug details, including every report problem.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse coverage reports and print per-line measures for known files.
    Ingest(IngestArgs),
}

#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// Reports whose format is detected from name and content.
    pub reports: Vec<PathBuf>,

    /// LCOV reports.
    #[arg(long = "lcov", value_name = "PATH")]
    pub lcov: Vec<PathBuf>,

    /// Cobertura XML reports.
    #[arg(long = "cobertura", value_name = "PATH")]
    pub cobertura: Vec<PathBuf>,

    /// Format of the positional reports (cobertura, lcov) instead of detection.
    #[arg(long)]
    pub format: Option<String>,

    /// Project root holding the known source files.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Only index files with these extensions (repeatable).
    #[arg(long = "ext", value_name = "EXT", default_value = "rs")]
    pub extensions: Vec<String>,

    /// Print measures as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl IngestArgs {
    /// Every report with its format, explicit ones first.
    pub fn all_reports(&self) -> Result<Vec<Report>> {
        let format = self
            .format
            .as_deref()
            .map(str::parse::<Format>)
            .transpose()?;
        let lcov = self.lcov.iter().map(|p| Report::new(p, Some(Format::Lcov)));
        let cobertura = self
            .cobertura
            .iter()
            .map(|p| Report::new(p, Some(Format::Cobertura)));
        let positional = self.reports.iter().map(|p| Report::new(p, format));
        Ok(lcov.chain(cobertura).chain(positional).collect())
    }
}

pub fn cmd_ingest(args: &IngestArgs) -> Result<String> {
    let reports = args.all_reports()?;
    if reports.is_empty() {
        bail!("No coverage reports given");
    }

    if !args.root.is_dir() {
        bail!("Project root {} is not a directory", args.root.display());
    }
    let files = sources::discover(&args.root, &args.extensions);
    let root = std::fs::canonicalize(&args.root).unwrap_or_else(|_| args.root.clone());
    let locator = FileLocator::new(files).with_base_dir(root);

    let ingested = ingest(&locator, &reports);
    if ingested.parsed == 0 {
        bail!("None of the {} coverage reports could be read", reports.len());
    }

    let measures: Vec<FileMeasures> = ingested.coverages.iter().map(FileMeasures::new).collect();
    if args.json {
        let mut out = serde_json::to_string_pretty(&measures)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(render_table(&measures, &ingested))
    }
}

fn render_table(measures: &[FileMeasures], ingested: &Ingested) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>10}",
        "FILE", "LINES", "COVERED", "BRANCHES"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(89)).unwrap();
    for m in measures {
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>10}",
            m.path,
            m.lines.len(),
            m.covered_lines(),
            format!("{}/{}", m.covered_conditions(), m.conditions()),
        )
        .unwrap();
    }
    writeln!(
        out,
        "\n{} files, {} problems, {} failed reports",
        measures.len(),
        ingested.problems.len(),
        ingested.failed.len()
    )
    .unwrap();
    out
}
