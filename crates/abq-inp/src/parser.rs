//! `*KEYWORD` section grammar.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::trace;

use crate::lexer::{LineKind, LineReader, RawLine, classify_line};
use crate::value::{Value, coerce_line, split_fields};

#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub sections: Vec<Section>,
}

/// One keyword line and the data lines that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Uppercase, marker removed, whitespace runs collapsed.
    pub keyword: String,
    /// Raw `name[=value]` items of the header, trimmed, in order.
    pub parameters: Vec<String>,
    pub body: SectionBody,
    pub line_start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Lines(Vec<Vec<Value>>),
    /// Body left in the source; see [`Extent`].
    Deferred(Extent),
}

/// Location of a section body in its source.
///
/// `start..end` covers every line between the keyword line and the next
/// keyword line (or end of input), comments and blanks included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub start: u64,
    pub end: u64,
    /// Number of the keyword line; body lines are numbered after it.
    pub header_line: usize,
    pub data_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Error, Debug)]
pub enum InpError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

impl Section {
    pub fn data_line_count(&self) -> usize {
        match &self.body {
            SectionBody::Lines(lines) => lines.len(),
            SectionBody::Deferred(extent) => extent.data_lines,
        }
    }

    /// Coerced data lines; empty for a deferred body.
    pub fn data_lines(&self) -> &[Vec<Value>] {
        match &self.body {
            SectionBody::Lines(lines) => lines,
            SectionBody::Deferred(_) => &[],
        }
    }

    pub fn extent(&self) -> Option<&Extent> {
        match &self.body {
            SectionBody::Deferred(extent) => Some(extent),
            SectionBody::Lines(_) => None,
        }
    }

    /// Value of a `NAME=value` parameter, name matched case-insensitively,
    /// value returned verbatim.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        parameter_value(&self.parameters, name)
    }

    /// Whether a valueless parameter such as `GENERATE` is present.
    pub fn has_flag(&self, name: &str) -> bool {
        self.parameters
            .iter()
            .any(|p| !p.contains('=') && p.trim().eq_ignore_ascii_case(name))
    }
}

/// Look up `name=value` in a raw parameter list.
pub fn parameter_value<'a>(parameters: &'a [String], name: &str) -> Option<&'a str> {
    parameters.iter().find_map(|p| {
        let (k, v) = p.split_once('=')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, InpError> {
        let file = File::open(path.as_ref())?;
        Self::parse_reader(BufReader::new(file))
    }

    pub fn parse_str(raw: &str) -> Result<Self, InpError> {
        Self::parse_reader(raw.as_bytes())
    }

    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Self, InpError> {
        let sections = SectionReader::new(reader).collect::<Result<Vec<_>, _>>()?;
        Ok(Deck { sections })
    }
}

/// Yields closed sections one at a time, in file order.
///
/// Sections whose keyword satisfies the `defer` predicate are not coerced;
/// their body is recorded as an [`Extent`] so it can be re-read from the
/// source later.
pub struct SectionReader<R, F> {
    lines: LineReader<R>,
    pending: Option<RawLine>,
    defer: F,
    done: bool,
}

impl<R: BufRead> SectionReader<R, fn(&str) -> bool> {
    pub fn new(reader: R) -> Self {
        fn never(_: &str) -> bool {
            false
        }
        Self::with_defer(reader, never as fn(&str) -> bool)
    }
}

impl<R: BufRead, F: Fn(&str) -> bool> SectionReader<R, F> {
    pub fn with_defer(reader: R, defer: F) -> Self {
        Self {
            lines: LineReader::new(reader),
            pending: None,
            defer,
            done: false,
        }
    }

    fn read_section(&mut self) -> Result<Option<Section>, InpError> {
        let header = match self.pending.take() {
            Some(line) => line,
            None => loop {
                let Some(line) = self.lines.next_line()? else {
                    return Ok(None);
                };
                match classify_line(&line.text) {
                    LineKind::Comment | LineKind::Blank => continue,
                    LineKind::Keyword(_) => break line,
                    LineKind::Data(_) => {
                        return Err(ParseError {
                            line: line.number,
                            message: "data line before the first keyword line".to_string(),
                        }
                        .into());
                    }
                }
            },
        };

        let (keyword, parameters) = parse_header(header.text.trim(), header.number)?;
        let deferred = (self.defer)(&keyword);
        let start = self.lines.offset();
        let mut end = start;
        let mut data_lines = 0usize;
        let mut lines = Vec::new();

        while let Some(line) = self.lines.next_line()? {
            match classify_line(&line.text) {
                LineKind::Comment | LineKind::Blank => {
                    end = self.lines.offset();
                    continue;
                }
                LineKind::Data(text) => {
                    data_lines += 1;
                    if !deferred {
                        lines.push(coerce_line(text));
                    }
                    end = self.lines.offset();
                    continue;
                }
                LineKind::Keyword(_) => {}
            }
            end = line.offset;
            self.pending = Some(line);
            break;
        }

        trace!(
            keyword = %keyword,
            line = header.number,
            data_lines,
            deferred,
            "closed section"
        );

        let body = if deferred {
            SectionBody::Deferred(Extent {
                start,
                end,
                header_line: header.number,
                data_lines,
            })
        } else {
            SectionBody::Lines(lines)
        };

        Ok(Some(Section {
            keyword,
            parameters,
            body,
            line_start: header.number,
        }))
    }
}

impl<R: BufRead, F: Fn(&str) -> bool> Iterator for SectionReader<R, F> {
    type Item = Result<Section, InpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_section() {
            Ok(Some(section)) => Some(Ok(section)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn parse_header(header: &str, line: usize) -> Result<(String, Vec<String>), ParseError> {
    let body = header.strip_prefix('*').unwrap_or(header);
    let fields = split_fields(body);
    let keyword = normalize_keyword(fields.first().copied().unwrap_or_default());
    if keyword.is_empty() {
        return Err(ParseError {
            line,
            message: "empty card keyword".to_string(),
        });
    }

    let parameters = fields
        .iter()
        .skip(1)
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect();

    Ok((keyword, parameters))
}

fn normalize_keyword(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}
