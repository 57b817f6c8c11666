/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Records read:
///   SF:<path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means 0)
///
/// Records recognized and ignored: TN, FN, FNDA, FNF, FNH, LF, LH, BRF, BRH
/// and end_of_record. Anything else is skipped.
use super::{Collector, Parser};
use crate::error::Result;
use crate::locator::FileLocator;
use crate::model::ParseResult;

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, locator: &FileLocator, report: &str, input: &[u8]) -> Result<ParseResult> {
        let text = std::str::from_utf8(input)?;
        parse_lines(locator, report, text.lines())
    }
}

/// Why a DA or BRDA record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalid {
    Syntax,
    NumberFormat,
}

impl Invalid {
    fn message(self) -> &'static str {
        match self {
            Invalid::Syntax => "Syntax error",
            Invalid::NumberFormat => "Number format error",
        }
    }
}

/// Parse LCOV records, one per item of `lines`.
///
/// Data records only count once an `SF` record resolved to a known file.
/// An `SF` naming a file already seen in this report starts over: the data
/// of the earlier block for that file is dropped.
pub fn parse_lines<'a, I>(locator: &FileLocator, report: &str, lines: I) -> Result<ParseResult>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Collector::new(report);
    let mut current: Option<usize> = None;

    for (i, raw_line) in lines.into_iter().enumerate() {
        let line_number = i + 1;
        let line = raw_line.trim();

        // Split on first ':'; end_of_record and blank lines have none.
        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };

        match tag {
            "SF" => {
                current = match locator.resolve(value) {
                    Some(file) => {
                        let (idx, replaced) = out.start_fresh(file);
                        if replaced {
                            out.problem(line_number, format!("Duplicate file: {value}"));
                        }
                        Some(idx)
                    }
                    None => {
                        out.problem(line_number, format!("File not found: {value}"));
                        None
                    }
                };
            }
            "DA" => {
                let Some(idx) = current else { continue };
                match parse_da(value) {
                    Ok((line, count)) => out.coverage_mut(idx).add_line_hits(line, count)?,
                    Err(invalid) => out.problem(line_number, invalid.message()),
                }
            }
            "BRDA" => {
                let Some(idx) = current else { continue };
                match parse_brda(value) {
                    Ok((line, branch, taken)) => {
                        out.coverage_mut(idx).add_branch_hits(line, branch, taken)?
                    }
                    Err(invalid) => out.problem(line_number, invalid.message()),
                }
            }
            // TN, FN, FNDA, FNF, FNH, LF, LH, BRF, BRH: derived from the data.
            _ => {}
        }
    }

    Ok(out.finish())
}

/// Comma-separated fields with trailing empty fields removed, so that
/// `1,` has a single field.
fn fields(value: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = value.split(',').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

fn number(field: &str) -> std::result::Result<i64, Invalid> {
    field.parse::<i64>().map_err(|_| Invalid::NumberFormat)
}

/// DA:<line number>,<execution count>[,<checksum>]
fn parse_da(value: &str) -> std::result::Result<(i64, i64), Invalid> {
    let parts = fields(value);
    if parts.len() < 2 {
        return Err(Invalid::Syntax);
    }
    Ok((number(parts[0])?, number(parts[1])?))
}

/// BRDA:<line>,<block>,<branch>,<taken>
fn parse_brda(value: &str) -> std::result::Result<(i64, String, i64), Invalid> {
    let parts = fields(value);
    if parts.len() < 4 {
        return Err(Invalid::Syntax);
    }
    let line = number(parts[0])?;
    let branch = format!("{}{}", parts[1], parts[2]);
    let taken = if parts[3] == "-" { 0 } else { number(parts[3])? };
    Ok((line, branch, taken))
}
