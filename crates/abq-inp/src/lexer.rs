//! Physical line reading and classification.
//!
//! Every physical line is one logical line; there is no continuation handling.

use std::io::{self, BufRead};

/// Classification of a single physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Starts with `**` after leading whitespace.
    Comment,
    /// Empty after trimming.
    Blank,
    /// Starts with `*`; the trimmed line, marker included.
    Keyword(&'a str),
    /// Anything else; the trimmed line.
    Data(&'a str),
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if is_comment(trimmed) {
        LineKind::Comment
    } else if trimmed.starts_with('*') {
        LineKind::Keyword(trimmed)
    } else {
        LineKind::Data(trimmed)
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

/// A line together with its 1-based number and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub offset: u64,
    pub text: String,
}

/// Reads physical lines while tracking line numbers and byte offsets.
///
/// Invalid UTF-8 is replaced lossily and `\r\n` endings are stripped, so a
/// deck written on any platform yields the same text.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    number: usize,
    offset: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::starting_at(reader, 0, 0)
    }

    /// Resume reading from a known position. `number` is the number of the
    /// line immediately before `offset`.
    pub fn starting_at(reader: R, offset: u64, number: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            number,
            offset,
        }
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of the last line returned.
    pub fn line_number(&self) -> usize {
        self.number
    }

    pub fn next_line(&mut self) -> io::Result<Option<RawLine>> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        let offset = self.offset;
        self.offset += read as u64;
        self.number += 1;

        let text = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        Ok(Some(RawLine {
            number: self.number,
            offset,
            text,
        }))
    }

    /// Next data line, skipping comments and blanks. Stops (returns `None`)
    /// at a keyword line or end of input. The returned text is trimmed.
    pub fn next_data_line(&mut self) -> io::Result<Option<RawLine>> {
        while let Some(line) = self.next_line()? {
            match classify_line(&line.text) {
                LineKind::Comment | LineKind::Blank => continue,
                LineKind::Keyword(_) => return Ok(None),
                LineKind::Data(text) => {
                    let text = text.to_string();
                    return Ok(Some(RawLine { text, ..line }));
                }
            }
        }
        Ok(None)
    }
}
