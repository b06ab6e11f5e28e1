//! Summary of a parsed deck, taken from its IR.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::accessors;
use crate::classify::{Category, classify};
use crate::ir::Ir;

const PROCEDURES: &[&str] = &[
    "STATIC",
    "DYNAMIC",
    "FREQUENCY",
    "BUCKLE",
    "HEAT TRANSFER",
    "COUPLED TEMPERATURE-DISPLACEMENT",
    "VISCO",
    "MODAL DYNAMIC",
    "STEADY STATE DYNAMICS",
];

/// Counts reported by the mesh writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MeshCounts {
    pub points: usize,
    pub cells: usize,
    pub unmapped_elements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub total_sections: usize,
    pub total_data_lines: usize,
    pub keyword_counts: BTreeMap<String, usize>,
    pub geometry_keywords: Vec<String>,
    pub metadata_keywords: Vec<String>,
    pub non_geometry_keywords: Vec<String>,
    pub node_rows: usize,
    pub element_rows: usize,
    pub node_sets: usize,
    pub element_sets: usize,
    pub surfaces: usize,
    pub instances: usize,
    pub materials: usize,
    pub property_sections: usize,
    pub boundary_conditions: usize,
    pub loads: usize,
    pub steps: usize,
    pub procedures: Vec<String>,
    pub mesh: Option<MeshCounts>,
}

impl ModelSummary {
    pub fn from_ir(ir: &Ir) -> Self {
        let mut keyword_counts = BTreeMap::<String, usize>::new();
        let mut geometry_keywords = Vec::new();
        let mut metadata_keywords = Vec::new();
        let mut non_geometry_keywords = Vec::new();
        let mut total_sections = 0usize;
        let mut total_data_lines = 0usize;
        let mut procedures = Vec::new();

        for entry in ir.entries() {
            let keyword = entry.keyword.clone();
            keyword_counts.insert(keyword.clone(), entry.sections.len());
            total_sections += entry.sections.len();
            total_data_lines += entry.sections.iter().map(|s| s.source_lines).sum::<usize>();

            if PROCEDURES.contains(&keyword.as_str()) {
                procedures.push(keyword.clone());
            }
            match classify(&keyword) {
                Category::BulkGeometry => geometry_keywords.push(keyword),
                Category::GeometryMetadata => metadata_keywords.push(keyword),
                Category::NonGeometry => non_geometry_keywords.push(keyword),
            }
        }

        let source_rows = |keyword: &str| -> usize {
            ir.sections(keyword).map(|v| v.source_lines).sum()
        };

        Self {
            total_sections,
            total_data_lines,
            node_rows: source_rows("NODE"),
            element_rows: source_rows("ELEMENT"),
            steps: keyword_counts.get("STEP").copied().unwrap_or(0),
            keyword_counts,
            geometry_keywords,
            metadata_keywords,
            non_geometry_keywords,
            node_sets: ir.sections("NSET").count(),
            element_sets: ir.sections("ELSET").count(),
            surfaces: accessors::surfaces(ir).len(),
            instances: accessors::instances(ir).len(),
            materials: accessors::materials(ir).len(),
            property_sections: accessors::property_sections(ir).len(),
            boundary_conditions: accessors::boundary_conditions(ir).len(),
            loads: accessors::loads(ir).len(),
            procedures,
            mesh: None,
        }
    }

    pub fn with_mesh(mut self, mesh: MeshCounts) -> Self {
        self.mesh = Some(mesh);
        self
    }
}
