//! A small owned XML element tree built on `quick-xml`.
//!
//! Only elements and their attributes are kept; text, comments, processing
//! instructions and the DOCTYPE are dropped. Every element remembers the line
//! of its start tag so that problems can point back into the report.
use std::borrow::Cow;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{CovmapError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// 1-based line of the start tag.
    pub line: usize,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: 1,
        }
    }

    /// Parse a whole document and return its root element.
    pub fn parse(input: &[u8]) -> Result<Element> {
        let lines = LineIndex::new(input);
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event_into(&mut buf);
            let position = reader.buffer_position();
            match event {
                Err(source) => return Err(CovmapError::Xml { source, position }),
                Ok(Event::Eof) => break,
                Ok(Event::Start(ref e)) => {
                    let element = element_from(e, lines.tag_line(input, position), position)?;
                    stack.push(element);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from(e, lines.tag_line(input, position), position)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        CovmapError::MalformedXml(format!("unexpected end tag at position {position}"))
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(CovmapError::MalformedXml(format!(
                "element '{}' opened at line {} is never closed",
                open.name, open.line
            )));
        }
        root.ok_or_else(|| CovmapError::MalformedXml("document has no root element".to_string()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Direct children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All elements below this one with the given name, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }
}

fn collect_named<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == name {
            found.push(child);
        }
        collect_named(child, name, found);
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(CovmapError::MalformedXml(format!(
            "second root element '{}' at line {}",
            element.name, element.line
        ))),
    }
}

fn element_from(e: &BytesStart, line: usize, position: usize) -> Result<Element> {
    let name = utf8(e.local_name().into_inner())?.into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            CovmapError::MalformedXml(format!("invalid attribute on '{name}' at line {line}: {err}"))
        })?;
        let key = utf8(attr.key.local_name().into_inner())?.into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| CovmapError::Xml { source, position })?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        line,
    })
}

fn utf8(bytes: &[u8]) -> Result<Cow<'_, str>> {
    Ok(Cow::Borrowed(str::from_utf8(bytes)?))
}

/// Byte offsets of line starts, for mapping reader positions to lines.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            input
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    /// Line of the `<` opening the tag that ends just before `end`.
    fn tag_line(&self, input: &[u8], end: usize) -> usize {
        let end = end.min(input.len());
        let open = input[..end].iter().rposition(|&b| b == b'<').unwrap_or(0);
        self.line_of(open)
    }
}
