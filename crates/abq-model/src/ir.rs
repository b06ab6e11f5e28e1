//! Typed intermediate representation: keyword → coerced data lines.
//!
//! Keys keep the order in which each keyword first appears. Repeated sections
//! of the same keyword append to one entry in encounter order, while
//! [`SectionInfo`] remembers which lines (and which header parameters) came
//! from which section.

use std::collections::HashMap;
use std::fmt;

use abq_inp::{Section, SectionBody, Value, parameter_value};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Line stored in place of NODE/ELEMENT data that went to the mesh file.
pub const DATA_PLACEHOLDER: &str = "data";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ir {
    entries: Vec<IrEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrEntry {
    pub keyword: String,
    pub lines: Vec<Vec<Value>>,
    pub sections: Vec<SectionInfo>,
}

/// Where one source section landed inside its keyword's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub parameters: Vec<String>,
    pub line_start: usize,
    /// First index in [`IrEntry::lines`] contributed by this section.
    pub first: usize,
    pub len: usize,
    /// Data lines in the source. Differs from `len` for placeholder bodies.
    pub source_lines: usize,
}

/// Borrowed view of one source section through the IR.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    pub keyword: &'a str,
    pub parameters: &'a [String],
    pub lines: &'a [Vec<Value>],
    pub line_start: usize,
    pub source_lines: usize,
}

impl<'a> SectionView<'a> {
    pub fn parameter(&self, name: &str) -> Option<&'a str> {
        parameter_value(self.parameters, name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.parameters
            .iter()
            .any(|p| !p.contains('=') && p.trim().eq_ignore_ascii_case(name))
    }
}

impl IrEntry {
    fn view<'a>(&'a self, info: &'a SectionInfo) -> SectionView<'a> {
        SectionView {
            keyword: &self.keyword,
            parameters: &info.parameters,
            lines: &self.lines[info.first..info.first + info.len],
            line_start: info.line_start,
            source_lines: info.source_lines,
        }
    }
}

impl Ir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: &str) -> Option<&[Vec<Value>]> {
        self.entry(keyword).map(|e| e.lines.as_slice())
    }

    pub fn entry(&self, keyword: &str) -> Option<&IrEntry> {
        self.index.get(keyword).map(|&idx| &self.entries[idx])
    }

    pub fn contains_key(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.keyword.as_str())
    }

    pub fn entries(&self) -> &[IrEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<Value>])> {
        self.entries
            .iter()
            .map(|e| (e.keyword.as_str(), e.lines.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sections of one keyword, in encounter order.
    pub fn sections<'a>(
        &'a self,
        keyword: &str,
    ) -> impl Iterator<Item = SectionView<'a>> + use<'a> {
        self.entry(keyword)
            .into_iter()
            .flat_map(|entry| entry.sections.iter().map(move |info| entry.view(info)))
    }

    /// Every section of every keyword, ordered by source line.
    pub fn sections_in_file_order(&self) -> Vec<SectionView<'_>> {
        let mut views: Vec<_> = self
            .entries
            .iter()
            .flat_map(|entry| entry.sections.iter().map(move |info| entry.view(info)))
            .collect();
        views.sort_by_key(|v| v.line_start);
        views
    }

    fn entry_mut(&mut self, keyword: &str) -> &mut IrEntry {
        let idx = match self.index.get(keyword) {
            Some(&idx) => idx,
            None => {
                self.entries.push(IrEntry {
                    keyword: keyword.to_string(),
                    lines: Vec::new(),
                    sections: Vec::new(),
                });
                let idx = self.entries.len() - 1;
                self.index.insert(keyword.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }
}

/// Accumulates sections into a fresh [`Ir`]; one builder per parse call.
#[derive(Debug, Default)]
pub struct IrBuilder {
    ir: Ir,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one closed section. Coerced bodies are stored as-is; deferred
    /// bodies become placeholders (`["type = <TYPE>"]` for typed ELEMENT
    /// sections, then `["data"]` when the body has data lines).
    pub fn push(&mut self, section: Section) {
        let Section {
            keyword,
            parameters,
            body,
            line_start,
        } = section;

        let element_type = if keyword == "ELEMENT" {
            parameter_value(&parameters, "TYPE").map(str::to_string)
        } else {
            None
        };

        let entry = self.ir.entry_mut(&keyword);
        let first = entry.lines.len();
        let source_lines = match body {
            SectionBody::Lines(lines) => {
                let count = lines.len();
                entry.lines.extend(lines);
                count
            }
            SectionBody::Deferred(extent) => {
                if let Some(element_type) = element_type {
                    entry
                        .lines
                        .push(vec![Value::Text(format!("type = {element_type}"))]);
                }
                if extent.data_lines > 0 {
                    entry.lines.push(vec![Value::from(DATA_PLACEHOLDER)]);
                }
                extent.data_lines
            }
        };

        let len = entry.lines.len() - first;
        entry.sections.push(SectionInfo {
            parameters,
            line_start,
            first,
            len,
            source_lines,
        });
    }

    pub fn finish(self) -> Ir {
        debug!(keywords = self.ir.len(), "built IR");
        self.ir
    }
}

pub fn build_ir(sections: impl IntoIterator<Item = Section>) -> Ir {
    let mut builder = IrBuilder::new();
    for section in sections {
        builder.push(section);
    }
    builder.finish()
}

impl Serialize for Ir {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.keyword, &entry.lines)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ir {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IrVisitor;

        impl<'de> Visitor<'de> for IrVisitor {
            type Value = Ir;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of keyword to data lines")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Ir, A::Error> {
                let mut ir = Ir::new();
                while let Some((keyword, lines)) =
                    access.next_entry::<String, Vec<Vec<Value>>>()?
                {
                    let entry = ir.entry_mut(&keyword);
                    let first = entry.lines.len();
                    let len = lines.len();
                    entry.lines.extend(lines);
                    entry.sections.push(SectionInfo {
                        parameters: Vec::new(),
                        line_start: 0,
                        first,
                        len,
                        source_lines: len,
                    });
                }
                Ok(ir)
            }
        }

        deserializer.deserialize_map(IrVisitor)
    }
}
