/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage>
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="..." line-rate="..." branch-rate="...">
///             <methods>...</methods>
///             <lines>
///               <line number="..." hits="..." branch="true|false"
///                     condition-coverage="50% (1/2)" />
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Only the class-level `<lines>` are read; method-level lines repeat them.
use std::sync::LazyLock;

use regex::Regex;

use super::{Collector, Parser};
use crate::error::Result;
use crate::locator::FileLocator;
use crate::model::{FileCoverage, ParseResult};
use crate::xml::Element;

/// Pre-compiled regex for condition-coverage attributes like "75% (3/4)".
static CONDITION_COVERAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)% \(([0-9]+)/([0-9]+)\)$").unwrap());

/// Upper bound on the conditions of one line. Larger totals are rejected
/// as malformed rather than expanded into that many branch entries.
pub const MAX_CONDITIONS: u32 = 10_000;

pub struct CoberturaParser;

impl Parser for CoberturaParser {
    fn parse(&self, locator: &FileLocator, report: &str, input: &[u8]) -> Result<ParseResult> {
        let document = Element::parse(input)?;
        parse_document(locator, report, &document)
    }
}

/// Walk an already-parsed Cobertura document.
///
/// Several `class` elements may name the same file; their lines accumulate
/// into one record.
pub fn parse_document(locator: &FileLocator, report: &str, document: &Element) -> Result<ParseResult> {
    let mut out = Collector::new(report);

    let classes = if document.name == "class" {
        vec![document]
    } else {
        document.descendants_named("class")
    };

    for class in classes {
        let Some(filename) = class.attribute("filename") else {
            out.problem(class.line, missing_attribute("filename", "class"));
            continue;
        };
        let Some(file) = locator.resolve(filename) else {
            out.problem(class.line, format!("Input file not found for path: {filename}"));
            continue;
        };
        let idx = out.get_or_insert(file);

        let Some(lines) = class.child("lines") else {
            continue;
        };
        for line in lines.children_named("line") {
            process_line(&mut out, idx, line)?;
        }
    }

    Ok(out.finish())
}

fn process_line(out: &mut Collector<'_>, idx: usize, line: &Element) -> Result<()> {
    let Some(number) = number_attribute(out, line, "number") else {
        return Ok(());
    };
    let Some(hits) = number_attribute(out, line, "hits") else {
        return Ok(());
    };
    out.coverage_mut(idx).add_line_hits(number, hits)?;

    if line.attribute("branch") != Some("true") {
        return Ok(());
    }
    let Some(condition) = line.attribute("condition-coverage") else {
        out.problem(line.line, missing_attribute("condition-coverage", "line"));
        return Ok(());
    };
    match parse_condition_coverage(condition) {
        Some((taken, total)) if taken > total => {
            out.problem(
                line.line,
                "Invalid condition coverage: taken count greater than total count",
            );
            Ok(())
        }
        Some((taken, total)) => add_conditions(out.coverage_mut(idx), number, taken, total),
        None => {
            out.problem(line.line, "Invalid condition coverage format");
            Ok(())
        }
    }
}

/// The format only tells how many branches were taken, not which ones:
/// synthesize `total` branches keyed `0..total`, the first `taken` of them
/// taken once.
fn add_conditions(coverage: &mut FileCoverage, line: i64, taken: u32, total: u32) -> Result<()> {
    for i in 0..total {
        let hit = if i < taken { 1 } else { 0 };
        coverage.add_branch_hits(line, i.to_string(), hit)?;
    }
    Ok(())
}

/// `(taken, total)` from a value like `50% (1/2)`, with `total` at most
/// [`MAX_CONDITIONS`].
fn parse_condition_coverage(value: &str) -> Option<(u32, u32)> {
    let caps = CONDITION_COVERAGE_RE.captures(value)?;
    let taken = caps[2].parse().ok()?;
    let total = caps[3].parse().ok().filter(|&t| t <= MAX_CONDITIONS)?;
    Some((taken, total))
}

/// Read an integer attribute of a `line` element, recording a problem when
/// it is missing or not a number.
fn number_attribute(out: &mut Collector<'_>, line: &Element, name: &str) -> Option<i64> {
    let Some(value) = line.attribute(name) else {
        out.problem(line.line, missing_attribute(name, "line"));
        return None;
    };
    match value.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            out.problem(
                line.line,
                format!("Invalid number format for attribute '{name}' on 'line' element"),
            );
            None
        }
    }
}

fn missing_attribute(name: &str, element: &str) -> String {
    format!("Attribute '{name}' not found on '{element}' element")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::CovmapError;
    use crate::model::InputFile;

    const REPORT: &str = "target/cobertura.xml";

    fn locator() -> FileLocator {
        FileLocator::new([
            InputFile::new("src/abs.rs", 10),
            InputFile::new("src/sign.rs", 10),
            InputFile::new("src/fizzbuzz.rs", 20),
            InputFile::new("src/main.rs", 40),
        ])
        .with_base_dir("/home/ci/rust-tests")
    }

    fn with_class(class: &str) -> String {
        format!(
            r#"<?xml version="1.0" ?>
<!DOCTYPE coverage SYSTEM "https://cobertura.sourceforge.net/xml/coverage-04.dtd">
<coverage>
  <sources>
    <source>/home/ci/rust-tests</source>
  </sources>
  <packages>
    <package>
      <classes>
{class}
      </classes>
    </package>
  </packages>
</coverage>
"#
        )
    }

    fn parse_class(class: &str) -> ParseResult {
        CoberturaParser
            .parse(&locator(), REPORT, with_class(class).as_bytes())
            .unwrap()
    }

    #[test]
    fn test_parse_cobertura() {
        let input = include_bytes!("../../tests/fixtures/cobertura.xml");
        let result = CoberturaParser.parse(&locator(), REPORT, input).unwrap();

        assert!(result.problems.is_empty(), "{:?}", result.problems);
        assert_eq!(result.coverages.len(), 2);

        let abs = result.coverage_for("src/abs.rs").unwrap();
        assert_eq!(
            abs.line_hits(),
            &BTreeMap::from([(1, 1), (2, 1), (3, 1), (4, 1), (5, 0), (7, 1), (9, 2)])
        );
        // Method-level lines are not counted twice.
        assert_eq!(
            abs.branch_hits(),
            &BTreeMap::from([(
                2,
                BTreeMap::from([("0".to_string(), 1), ("1".to_string(), 0)])
            )])
        );

        let sign = result.coverage_for("src/sign.rs").unwrap();
        assert_eq!(sign.line_hits().len(), 6);
        assert_eq!(sign.branch_hits()[&2]["0"], 1);
        assert_eq!(sign.branch_hits()[&2]["1"], 1);
        assert_eq!(sign.branch_hits()[&4]["0"], 1);
        assert_eq!(sign.branch_hits()[&4]["1"], 0);
    }

    #[test]
    fn test_line_without_branch() {
        let result = parse_class(
            r#"<class name="abs" filename="src/abs.rs"><lines><line number="5" hits="0"/></lines></class>"#,
        );
        assert!(result.problems.is_empty());
        let abs = result.coverage_for("src/abs.rs").unwrap();
        assert_eq!(abs.line_hits(), &BTreeMap::from([(5, 0)]));
        assert!(abs.branch_hits().is_empty());
    }

    #[test]
    fn test_branch_false_adds_no_conditions() {
        let result = parse_class(
            r#"<class filename="src/abs.rs"><lines><line number="2" hits="1" branch="false" condition-coverage="50% (1/2)"/></lines></class>"#,
        );
        assert!(result.problems.is_empty());
        assert!(result.coverages[0].branch_hits().is_empty());
    }

    #[test]
    fn test_condition_coverage_synthesizes_branches() {
        let result = parse_class(
            r#"<class filename="src/abs.rs"><lines><line number="3" hits="4" branch="true" condition-coverage="75% (3/4)"/></lines></class>"#,
        );
        let branches = &result.coverages[0].branch_hits()[&3];
        assert_eq!(branches.len(), 4);
        assert_eq!(branches.values().filter(|&&t| t > 0).count(), 3);
        assert_eq!(branches["3"], 0);
    }

    #[test]
    fn test_oversized_condition_total_is_rejected() {
        let result = parse_class(
            r#"<class filename="src/abs.rs"><lines>
<line number="1" hits="1" branch="true" condition-coverage="0% (0/3000000)"/>
<line number="2" hits="1" branch="true" condition-coverage="0% (0/4294967295)"/>
<line number="3" hits="1" branch="true" condition-coverage="1% (1/10000)"/>
</lines></class>"#,
        );
        let messages: Vec<&str> = result.problems.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Invalid condition coverage format",
                "Invalid condition coverage format"
            ]
        );
        let abs = &result.coverages[0];
        assert_eq!(abs.line_hits().len(), 3);
        assert_eq!(abs.branch_hits().len(), 1);
        assert_eq!(abs.branch_hits()[&3].len(), 10_000);
    }

    #[test]
    fn test_taken_greater_than_total() {
        let result = parse_class(
            r#"<class filename="src/abs.rs"><lines><line number="1" hits="1" branch="true" condition-coverage="100% (4/2)"/></lines></class>"#,
        );
        assert_eq!(result.problems.len(), 1);
        assert!(result.problems[0]
            .message
            .contains("taken count greater than total"));
        let abs = &result.coverages[0];
        assert_eq!(abs.line_hits()[&1], 1);
        assert!(abs.branch_hits().is_empty());
    }

    #[test]
    fn test_parsing_problems() {
        let cases = [
            (
                "Attribute 'filename' not found on 'class' element",
                r#"<class name="abs"><lines><line number="1" hits="1"/></lines></class>"#,
            ),
            (
                "Attribute 'number' not found on 'line' element",
                r#"<class filename="src/abs.rs"><lines><line hits="1"/></lines></class>"#,
            ),
            (
                "Attribute 'hits' not found on 'line' element",
                r#"<class filename="src/abs.rs"><lines><line number="1"/></lines></class>"#,
            ),
            (
                "Invalid number format for attribute 'number' on 'line' element",
                r#"<class filename="src/abs.rs"><lines><line number="foo" hits="1"/></lines></class>"#,
            ),
            (
                "Invalid number format for attribute 'hits' on 'line' element",
                r#"<class filename="src/abs.rs"><lines><line number="1" hits="foo"/></lines></class>"#,
            ),
            (
                "Attribute 'condition-coverage' not found on 'line' element",
                r#"<class filename="src/abs.rs"><lines><line number="1" hits="1" branch="true"/></lines></class>"#,
            ),
            (
                "Invalid condition coverage format",
                r#"<class filename="src/abs.rs"><lines><line number="1" hits="1" branch="true" condition-coverage="foo"/></lines></class>"#,
            ),
            (
                "Invalid condition coverage format",
                r#"<class filename="src/abs.rs"><lines><line number="1" hits="1" branch="true" condition-coverage="50% (1/2) extra"/></lines></class>"#,
            ),
        ];
        for (expected, class) in cases {
            let result = parse_class(class);
            assert_eq!(result.problems.len(), 1, "{class}");
            assert_eq!(result.problems[0].message, expected);
            assert!(result.problems[0].to_string().starts_with("target/cobertura.xml:10: "));
        }
    }

    #[test]
    fn test_unknown_input_file() {
        let result = parse_class(
            r#"<class name="abs" filename="does/not/exist/abs.rs"><lines><line number="1" hits="1"/></lines></class>"#,
        );
        assert!(result.coverages.is_empty());
        assert_eq!(result.problems.len(), 1);
        assert_eq!(
            result.problems[0].message,
            "Input file not found for path: does/not/exist/abs.rs"
        );
    }

    #[test]
    fn test_class_without_lines() {
        let result = parse_class(r#"<class name="abs" filename="src/abs.rs"></class>"#);
        assert_eq!(result.coverages.len(), 1);
        assert!(result.coverages[0].is_empty());
        assert!(result.problems.is_empty());
    }

    #[test]
    fn test_classes_for_same_file_accumulate() {
        let result = parse_class(
            r#"<class name="a" filename="src/abs.rs"><lines><line number="1" hits="1"/></lines></class>
<class name="b" filename="src/abs.rs"><lines><line number="1" hits="2"/><line number="2" hits="0"/></lines></class>"#,
        );
        assert_eq!(result.coverages.len(), 1);
        assert_eq!(
            result.coverages[0].line_hits(),
            &BTreeMap::from([(1, 3), (2, 0)])
        );
    }

    #[test]
    fn test_line_out_of_range_aborts_report() {
        let err = CoberturaParser
            .parse(
                &locator(),
                REPORT,
                with_class(r#"<class filename="src/abs.rs"><lines><line number="11" hits="1"/></lines></class>"#)
                    .as_bytes(),
            )
            .unwrap_err();
        assert!(matches!(err, CovmapError::LineOutOfRange { line: 11, .. }));
    }

    #[test]
    fn test_invalid_xml_is_an_error() {
        let input = b"<coverage>\n  <packages>\n    <package><classes></classes></package>\n";
        assert!(CoberturaParser.parse(&locator(), REPORT, input).is_err());
    }

    #[test]
    fn test_parse_prebuilt_tree() {
        let document = Element::new("coverage").with_child(
            Element::new("packages").with_child(
                Element::new("package").with_child(
                    Element::new("classes").with_child(
                        Element::new("class")
                            .with_attribute("filename", "sign.rs")
                            .with_child(
                                Element::new("lines").with_child(
                                    Element::new("line")
                                        .with_attribute("number", "2")
                                        .with_attribute("hits", "3")
                                        .with_attribute("branch", "true")
                                        .with_attribute("condition-coverage", "50% (1/2)")
                                        .at_line(12),
                                ),
                            ),
                    ),
                ),
            ),
        );
        let result = parse_document(&locator(), REPORT, &document).unwrap();
        assert!(result.problems.is_empty());
        let sign = result.coverage_for("src/sign.rs").unwrap();
        assert_eq!(sign.line_hits()[&2], 3);
        assert_eq!(sign.branch_hits()[&2].len(), 2);
        assert_eq!(sign.branch_hits()[&2].values().sum::<u64>(), 1);
    }
}
