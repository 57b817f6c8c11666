/// Auto-detection of coverage report formats.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Peek at the first bytes of the file content
///   3. Fall back to an explicit format from the caller
use std::path::Path;

use crate::error::CovmapError;
use crate::locator::FileLocator;
use crate::model::ParseResult;
use crate::parsers::cobertura::CoberturaParser;
use crate::parsers::lcov::LcovParser;
use crate::parsers::Parser;

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Cobertura,
    Lcov,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cobertura => "cobertura",
            Format::Lcov => "lcov",
        }
    }

    /// Name used in log messages.
    pub fn label(&self) -> &'static str {
        match self {
            Format::Cobertura => "Cobertura",
            Format::Lcov => "LCOV",
        }
    }

    /// Parse `input` with this format's parser.
    pub fn parse(
        &self,
        locator: &FileLocator,
        report: &str,
        input: &[u8],
    ) -> crate::error::Result<ParseResult> {
        match self {
            Format::Cobertura => CoberturaParser.parse(locator, report, input),
            Format::Lcov => LcovParser.parse(locator, report, input),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovmapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cobertura" => Ok(Format::Cobertura),
            "lcov" => Ok(Format::Lcov),
            _ => Err(CovmapError::Parse(format!(
                "Unknown format: '{}'. Supported: cobertura, lcov",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the coverage format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    detect_by_extension(path).or_else(|| detect_by_content(content))
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "info" | "lcov" => Some(Format::Lcov),
        // .xml could be anything; look at the content.
        _ => None,
    }
}

fn detect_by_content(content: &[u8]) -> Option<Format> {
    // We only need to look at the first few KB
    let head_len = content.len().min(4096);
    let head = String::from_utf8_lossy(&content[..head_len]);

    // LCOV: records start at the beginning of a line.
    let has_sf = head.lines().any(|l| l.starts_with("SF:"));
    let has_data = head
        .lines()
        .any(|l| l.starts_with("DA:") || l.starts_with("FN:") || l.starts_with("BRDA:"));
    if has_sf && has_data {
        return Some(Format::Lcov);
    }

    if (head.contains("<?xml") || head.trim_start().starts_with('<')) && head.contains("<coverage") {
        return Some(Format::Cobertura);
    }

    None
}
