//! Ingestion of a set of report files against one file index.
//!
//! Each report is read and parsed on its own. A report that cannot be read
//! or parsed is logged and skipped; the others still count. Records for the
//! same project file coming from different reports are summed.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::detect::{detect_format, Format};
use crate::error::{CovmapError, Result};
use crate::locator::FileLocator;
use crate::model::{FileCoverage, ParseProblem, ParseResult};

/// A report to ingest, with its format when known up front.
#[derive(Debug, Clone)]
pub struct Report {
    pub path: PathBuf,
    pub format: Option<Format>,
}

impl Report {
    pub fn new(path: impl Into<PathBuf>, format: Option<Format>) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// What a whole ingestion pass produced.
#[derive(Debug, Default)]
pub struct Ingested {
    /// One record per project file, sorted by path.
    pub coverages: Vec<FileCoverage>,
    /// Problems of every report, report by report.
    pub problems: Vec<ParseProblem>,
    /// Reports that could not be read or parsed, with the reason.
    pub failed: Vec<(PathBuf, CovmapError)>,
    /// Number of reports parsed successfully.
    pub parsed: usize,
}

/// Read one report file, detect its format if needed, and parse it.
pub fn ingest_report(
    locator: &FileLocator,
    path: &Path,
    format: Option<Format>,
) -> Result<(Format, ParseResult)> {
    let content = std::fs::read(path)?;
    let format = match format {
        Some(format) => format,
        None => detect_format(path, &content).ok_or(CovmapError::UnknownFormat)?,
    };
    debug!("Parsing {} report: {}", format.label(), path.display());
    let result = format.parse(locator, &path.display().to_string(), &content)?;
    Ok((format, result))
}

/// Ingest every report and merge the coverage by file.
pub fn ingest(locator: &FileLocator, reports: &[Report]) -> Ingested {
    let mut merged: BTreeMap<String, FileCoverage> = BTreeMap::new();
    let mut out = Ingested::default();

    for report in reports {
        let (format, result) = match ingest_report(locator, &report.path, report.format) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Failed to parse coverage report {}: {}", report.path.display(), e);
                out.failed.push((report.path.clone(), e));
                continue;
            }
        };
        out.parsed += 1;

        if result.problems.is_empty() {
            debug!("Successfully parsed {} report", format.label());
        } else {
            warn!(
                "Found {} problems in {} report: {}. More details in verbose mode",
                result.problems.len(),
                format.label(),
                report.path.display()
            );
            for problem in &result.problems {
                debug!("{}", problem);
            }
        }

        merge_into(&mut merged, result.coverages);
        out.problems.extend(result.problems);
    }

    out.coverages = merged.into_values().collect();
    out
}

/// Sum parsed records into `merged`, keyed by project path.
pub fn merge_into(merged: &mut BTreeMap<String, FileCoverage>, coverages: Vec<FileCoverage>) {
    for coverage in coverages {
        let key = coverage.file().relative_path.clone();
        match merged.get_mut(&key) {
            Some(existing) => existing.merge(&coverage),
            None => {
                merged.insert(key, coverage);
            }
        }
    }
}
