//! Typed views over geometry metadata and non-geometry entries of the IR.
//!
//! Names come from the header parameters kept per section (`NSET=`, `ELSET=`,
//! `NAME=`); unnamed sections get a positional fallback such as `NSET_2`.

use abq_inp::Value;
use serde::Serialize;
use tracing::warn;

use crate::ir::{Ir, SectionView};

const MATERIAL_PROPERTIES: &[&str] = &[
    "ELASTIC",
    "PLASTIC",
    "HYPERELASTIC",
    "HYPERFOAM",
    "DEFORMATION PLASTICITY",
    "CYCLIC HARDENING",
    "CREEP",
    "DENSITY",
    "EXPANSION",
    "CONDUCTIVITY",
    "SPECIFIC HEAT",
    "ELECTRICAL CONDUCTIVITY",
    "DAMPING",
    "DEPVAR",
    "USER MATERIAL",
];

pub const LOAD_KEYWORDS: &[&str] = &["CLOAD", "DLOAD", "DSLOAD"];

/// A node or element set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSet {
    pub name: String,
    pub ids: Vec<i64>,
    /// Other sets referenced by name inside the data lines.
    pub nested: Vec<String>,
}

/// A named metadata block kept as raw lines (surfaces, instances).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name: String,
    pub parameters: Vec<String>,
    pub lines: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub line_start: usize,
    pub properties: Vec<MaterialProperty>,
}

/// A property card (`*ELASTIC`, `*DENSITY`, ...) following a `*MATERIAL`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialProperty {
    pub keyword: String,
    pub parameters: Vec<String>,
    pub lines: Vec<Vec<Value>>,
}

/// A `*SOLID SECTION`, `*SHELL SECTION`, ... card assigning a material to an
/// element set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySection {
    pub kind: String,
    pub elset: Option<String>,
    pub material: Option<String>,
    pub parameters: Vec<String>,
    pub lines: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryCondition {
    /// Node id or node set name.
    pub target: String,
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub kind: String,
    pub target: String,
    pub data: Vec<Value>,
}

pub fn node_sets(ir: &Ir) -> Vec<NamedSet> {
    named_sets(ir, "NSET")
}

pub fn element_sets(ir: &Ir) -> Vec<NamedSet> {
    named_sets(ir, "ELSET")
}

pub fn surfaces(ir: &Ir) -> Vec<Definition> {
    definitions(ir, "SURFACE")
}

pub fn instances(ir: &Ir) -> Vec<Definition> {
    definitions(ir, "INSTANCE")
}

/// Materials with the property cards that directly follow each `*MATERIAL`.
pub fn materials(ir: &Ir) -> Vec<Material> {
    let mut materials = Vec::new();
    let mut current: Option<Material> = None;

    for view in ir.sections_in_file_order() {
        if view.keyword == "MATERIAL" {
            materials.extend(current.take());
            current = Some(Material {
                name: name_of(&view, "NAME", materials.len() + 1),
                line_start: view.line_start,
                properties: Vec::new(),
            });
        } else if MATERIAL_PROPERTIES.contains(&view.keyword) {
            if let Some(material) = current.as_mut() {
                material.properties.push(MaterialProperty {
                    keyword: view.keyword.to_string(),
                    parameters: view.parameters.to_vec(),
                    lines: view.lines.to_vec(),
                });
            }
        } else {
            materials.extend(current.take());
        }
    }
    materials.extend(current);
    materials
}

/// Property sections in file order, whatever their kind.
pub fn property_sections(ir: &Ir) -> Vec<PropertySection> {
    ir.sections_in_file_order()
        .into_iter()
        .filter(|view| view.keyword.ends_with(" SECTION"))
        .map(|view| PropertySection {
            kind: view.keyword.to_string(),
            elset: view.parameter("ELSET").map(str::to_string),
            material: view.parameter("MATERIAL").map(str::to_string),
            parameters: view.parameters.to_vec(),
            lines: view.lines.to_vec(),
        })
        .collect()
}

pub fn boundary_conditions(ir: &Ir) -> Vec<BoundaryCondition> {
    ir.sections("BOUNDARY")
        .flat_map(|view| view.lines.iter())
        .filter_map(|line| split_target(line))
        .map(|(target, data)| BoundaryCondition { target, data })
        .collect()
}

pub fn loads(ir: &Ir) -> Vec<Load> {
    LOAD_KEYWORDS
        .iter()
        .flat_map(|kind| ir.sections(kind))
        .flat_map(|view| view.lines.iter().map(move |line| (view.keyword, line)))
        .filter_map(|(kind, line)| {
            let (target, data) = split_target(line)?;
            Some(Load {
                kind: kind.to_string(),
                target,
                data,
            })
        })
        .collect()
}

fn named_sets(ir: &Ir, keyword: &str) -> Vec<NamedSet> {
    ir.sections(keyword)
        .enumerate()
        .map(|(idx, view)| {
            let name = name_of(&view, keyword, idx + 1);
            let mut ids = Vec::new();
            let mut nested = Vec::new();

            if view.has_flag("GENERATE") {
                for line in view.lines {
                    ids.extend(generate(line));
                }
            } else {
                for value in view.lines.iter().flatten() {
                    match value {
                        Value::Text(name) if name.is_empty() => {}
                        Value::Text(name) => nested.push(name.clone()),
                        other => ids.extend(other.as_i64()),
                    }
                }
            }

            NamedSet { name, ids, nested }
        })
        .collect()
}

/// Most ids a single GENERATE line expands to.
pub const MAX_GENERATED_IDS: usize = 10_000_000;

/// Expand a `start, end[, step]` line of a GENERATE set, keeping at most
/// [`MAX_GENERATED_IDS`] ids.
fn generate(line: &[Value]) -> Vec<i64> {
    let start = line.first().and_then(Value::as_i64);
    let end = line.get(1).and_then(Value::as_i64);
    let step = line.get(2).and_then(Value::as_i64).unwrap_or(1);
    match (start, end) {
        (Some(start), Some(end)) if step > 0 && start <= end => {
            let count = end.abs_diff(start) / step as u64 + 1;
            if count > MAX_GENERATED_IDS as u64 {
                warn!(start, end, step, count, "GENERATE range truncated");
            }
            (start..=end)
                .step_by(step as usize)
                .take(MAX_GENERATED_IDS)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn definitions(ir: &Ir, keyword: &str) -> Vec<Definition> {
    ir.sections(keyword)
        .enumerate()
        .map(|(idx, view)| Definition {
            name: name_of(&view, "NAME", idx + 1),
            parameters: view.parameters.to_vec(),
            lines: view.lines.to_vec(),
        })
        .collect()
}

fn name_of(view: &SectionView<'_>, parameter: &str, position: usize) -> String {
    view.parameter(parameter)
        .map(|v| v.trim_matches(['"', '\'']).to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("{}_{position}", view.keyword))
}

/// First value as the target, the rest (trailing empties dropped) as data.
fn split_target(line: &[Value]) -> Option<(String, Vec<Value>)> {
    let (first, rest) = line.split_first()?;
    if first.is_empty_text() {
        return None;
    }
    let mut data = rest.to_vec();
    while data.last().is_some_and(Value::is_empty_text) {
        data.pop();
    }
    Some((first.to_string(), data))
}
