use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovmapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Malformed XML document: {0}")]
    MalformedXml(String),

    #[error("Invalid UTF-8 in report: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Line number outside of file range: {line} ({path} has {lines} lines)")]
    LineOutOfRange { path: String, line: i64, lines: u32 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage format")]
    UnknownFormat,
}

pub type Result<T> = std::result::Result<T, CovmapError>;
