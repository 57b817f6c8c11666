pub mod cobertura;
pub mod lcov;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::locator::FileLocator;
use crate::model::{FileCoverage, InputFile, ParseProblem, ParseResult};

/// Every format parser implements this trait.
pub trait Parser {
    /// Parse one report's raw content into our uniform coverage model.
    ///
    /// `report` names the report in problem messages. Malformed input is
    /// reported through [`ParseResult::problems`]; an `Err` means the rest of
    /// the report could not be processed.
    fn parse(&self, locator: &FileLocator, report: &str, input: &[u8]) -> Result<ParseResult>;
}

/// Accumulates records and problems during one report's parse.
struct Collector<'r> {
    report: &'r str,
    coverages: Vec<FileCoverage>,
    by_path: HashMap<String, usize>,
    problems: Vec<ParseProblem>,
}

impl<'r> Collector<'r> {
    fn new(report: &'r str) -> Self {
        Self {
            report,
            coverages: Vec::new(),
            by_path: HashMap::new(),
            problems: Vec::new(),
        }
    }

    fn problem(&mut self, line: usize, message: impl Into<String>) {
        self.problems.push(ParseProblem {
            report: self.report.to_string(),
            line,
            message: message.into(),
        });
    }

    /// Start a fresh record for `file`. A record already present for the
    /// same file is replaced in place; returns its index and whether it
    /// replaced one.
    fn start_fresh(&mut self, file: &Arc<InputFile>) -> (usize, bool) {
        let fresh = FileCoverage::new(Arc::clone(file));
        match self.by_path.get(&file.relative_path) {
            Some(&idx) => {
                self.coverages[idx] = fresh;
                (idx, true)
            }
            None => (self.push(fresh), false),
        }
    }

    /// The record for `file`, created on first reference.
    fn get_or_insert(&mut self, file: &Arc<InputFile>) -> usize {
        match self.by_path.get(&file.relative_path) {
            Some(&idx) => idx,
            None => self.push(FileCoverage::new(Arc::clone(file))),
        }
    }

    fn push(&mut self, coverage: FileCoverage) -> usize {
        let idx = self.coverages.len();
        self.by_path
            .insert(coverage.file().relative_path.clone(), idx);
        self.coverages.push(coverage);
        idx
    }

    fn coverage_mut(&mut self, idx: usize) -> &mut FileCoverage {
        &mut self.coverages[idx]
    }

    fn finish(self) -> ParseResult {
        ParseResult {
            coverages: self.coverages,
            problems: self.problems,
        }
    }
}
