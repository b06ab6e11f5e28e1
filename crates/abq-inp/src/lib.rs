//! Abaqus/CalculiX `.inp` deck reader.
//!
//! This crate provides:
//! - **Line classification** (comment, blank, keyword, data) over any `BufRead`
//! - **Value coercion** of comma-separated tokens into `Int`, `Float` or `Text`
//! - **Section parsing** of `*KEYWORD, params` headers and their data lines,
//!   optionally recording a section body as a byte [`Extent`] instead of
//!   coercing it, so bulk geometry can be re-read later without being held in
//!   memory

pub mod lexer;
mod parser;
pub mod value;

pub use lexer::{LineKind, LineReader, RawLine, classify_line};
pub use parser::{
    Deck, Extent, InpError, ParseError, Section, SectionBody, SectionReader, parameter_value,
};
pub use value::{Value, coerce, coerce_line, split_fields};
