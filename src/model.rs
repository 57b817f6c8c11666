//! Uniform in-memory representation of coverage data, independent of the
//! report format. Both parsers resolve report paths to an [`InputFile`] and
//! accumulate hits into a [`FileCoverage`] for it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CovmapError, Result};

/// A known project source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputFile {
    /// Path relative to the project root, `/`-separated.
    pub relative_path: String,
    /// Total number of lines in the file.
    pub lines: u32,
}

impl InputFile {
    pub fn new(relative_path: impl Into<String>, lines: u32) -> Self {
        Self {
            relative_path: relative_path.into(),
            lines,
        }
    }
}

impl fmt::Display for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path)
    }
}

/// Coverage data for a single source file.
///
/// Line and branch counts are summed when the same line (or the same branch
/// of a line) is reported more than once.
#[derive(Debug, Clone)]
pub struct FileCoverage {
    file: Arc<InputFile>,
    /// line number -> execution count
    line_hits: BTreeMap<u32, u64>,
    /// line number -> branch key -> taken count
    branch_hits: BTreeMap<u32, BTreeMap<String, u64>>,
}

impl FileCoverage {
    pub fn new(file: Arc<InputFile>) -> Self {
        Self {
            file,
            line_hits: BTreeMap::new(),
            branch_hits: BTreeMap::new(),
        }
    }

    pub fn file(&self) -> &Arc<InputFile> {
        &self.file
    }

    pub fn line_hits(&self) -> &BTreeMap<u32, u64> {
        &self.line_hits
    }

    pub fn branch_hits(&self) -> &BTreeMap<u32, BTreeMap<String, u64>> {
        &self.branch_hits
    }

    pub fn is_empty(&self) -> bool {
        self.line_hits.is_empty() && self.branch_hits.is_empty()
    }

    /// Add `hits` executions to `line`. Negative counts are treated as zero.
    ///
    /// Fails when `line` is outside `1..=lines` of the file.
    pub fn add_line_hits(&mut self, line: i64, hits: i64) -> Result<()> {
        let line = self.validate_line(line)?;
        let total = self.line_hits.entry(line).or_insert(0);
        *total = total.saturating_add(clamp(hits));
        Ok(())
    }

    /// Add `taken` to the branch identified by `branch` on `line`.
    /// Negative counts are treated as zero.
    pub fn add_branch_hits(&mut self, line: i64, branch: impl Into<String>, taken: i64) -> Result<()> {
        let line = self.validate_line(line)?;
        let total = self
            .branch_hits
            .entry(line)
            .or_default()
            .entry(branch.into())
            .or_insert(0);
        *total = total.saturating_add(clamp(taken));
        Ok(())
    }

    /// Sum another record into this one. Both records are expected to
    /// describe the same file; line numbers were validated on insertion.
    pub fn merge(&mut self, other: &FileCoverage) {
        for (&line, &hits) in &other.line_hits {
            let total = self.line_hits.entry(line).or_insert(0);
            *total = total.saturating_add(hits);
        }
        for (&line, branches) in &other.branch_hits {
            let mine = self.branch_hits.entry(line).or_default();
            for (key, &taken) in branches {
                let total = mine.entry(key.clone()).or_insert(0);
                *total = total.saturating_add(taken);
            }
        }
    }

    fn validate_line(&self, line: i64) -> Result<u32> {
        match u32::try_from(line) {
            Ok(n) if n >= 1 && n <= self.file.lines => Ok(n),
            _ => Err(CovmapError::LineOutOfRange {
                path: self.file.relative_path.clone(),
                line,
                lines: self.file.lines,
            }),
        }
    }
}

fn clamp(count: i64) -> u64 {
    count.max(0) as u64
}

/// A malformed-input diagnostic, located in the report it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProblem {
    /// Path of the report, as given to the parser.
    pub report: String,
    /// 1-based line in the report.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.report, self.line, self.message)
    }
}

/// The complete result of parsing a single coverage report.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// One record per distinct file, in order of first reference.
    pub coverages: Vec<FileCoverage>,
    /// Problems in order of encounter.
    pub problems: Vec<ParseProblem>,
}

impl ParseResult {
    /// Look up the record for a file by its project-relative path.
    pub fn coverage_for(&self, relative_path: &str) -> Option<&FileCoverage> {
        self.coverages
            .iter()
            .find(|c| c.file.relative_path == relative_path)
    }
}
