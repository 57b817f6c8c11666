//! Per-line measures handed to whatever stores the coverage.
//!
//! A line with branches reports how many conditions it has and how many of
//! them were taken, and the covered conditions are added to the line's hit
//! count. A line that only appears in branch data therefore counts as hit
//! once any of its branches was taken.
use serde::Serialize;

use crate::model::FileCoverage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMeasure {
    pub line: u32,
    pub hits: u64,
    pub conditions: usize,
    pub covered_conditions: usize,
}

/// Measures for a whole file.
#[derive(Debug, Clone, Serialize)]
pub struct FileMeasures {
    pub path: String,
    pub lines: Vec<LineMeasure>,
}

impl FileMeasures {
    pub fn new(coverage: &FileCoverage) -> Self {
        Self {
            path: coverage.file().relative_path.clone(),
            lines: line_measures(coverage),
        }
    }

    pub fn covered_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.hits > 0).count()
    }

    pub fn conditions(&self) -> usize {
        self.lines.iter().map(|l| l.conditions).sum()
    }

    pub fn covered_conditions(&self) -> usize {
        self.lines.iter().map(|l| l.covered_conditions).sum()
    }
}

/// One measure per line present in either map, in line order.
pub fn line_measures(coverage: &FileCoverage) -> Vec<LineMeasure> {
    let mut measures: Vec<LineMeasure> = coverage
        .line_hits()
        .iter()
        .map(|(&line, &hits)| LineMeasure {
            line,
            hits,
            conditions: 0,
            covered_conditions: 0,
        })
        .collect();

    for (&line, branches) in coverage.branch_hits() {
        let conditions = branches.len();
        let covered_conditions = branches.values().filter(|&&taken| taken > 0).count();
        let hits = coverage.line_hits().get(&line).copied().unwrap_or(0);
        let measure = LineMeasure {
            line,
            hits: hits.saturating_add(covered_conditions as u64),
            conditions,
            covered_conditions,
        };
        match measures.binary_search_by_key(&line, |m| m.line) {
            Ok(pos) => measures[pos] = measure,
            Err(pos) => measures.insert(pos, measure),
        }
    }

    measures
}
