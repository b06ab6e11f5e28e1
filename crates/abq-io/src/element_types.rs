//! Abaqus element type → VTK cell type table.
//!
//! Types missing from the table, and elements whose node count disagrees with
//! their type, fall back to inference from the node count.

/// VTK element type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VtkCellType {
    Vertex = 1,
    /// Used for node counts no shape can be inferred from.
    PolyVertex = 2,
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    QuadraticEdge = 21,
    QuadraticTriangle = 22,
    QuadraticQuad = 23,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
    QuadraticWedge = 26,
}

impl VtkCellType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

use VtkCellType::*;

const ELEMENT_TYPES: &[(&str, VtkCellType, usize)] = &[
    // 3-D continuum
    ("C3D4", Tetra, 4),
    ("C3D4H", Tetra, 4),
    ("C3D4T", Tetra, 4),
    ("DC3D4", Tetra, 4),
    ("C3D5", Pyramid, 5),
    ("C3D6", Wedge, 6),
    ("C3D6H", Wedge, 6),
    ("C3D6T", Wedge, 6),
    ("DC3D6", Wedge, 6),
    ("C3D8", Hexahedron, 8),
    ("C3D8R", Hexahedron, 8),
    ("C3D8I", Hexahedron, 8),
    ("C3D8H", Hexahedron, 8),
    ("C3D8RH", Hexahedron, 8),
    ("C3D8T", Hexahedron, 8),
    ("C3D8RT", Hexahedron, 8),
    ("DC3D8", Hexahedron, 8),
    ("C3D10", QuadraticTetra, 10),
    ("C3D10M", QuadraticTetra, 10),
    ("C3D10H", QuadraticTetra, 10),
    ("C3D10MH", QuadraticTetra, 10),
    ("C3D10T", QuadraticTetra, 10),
    ("DC3D10", QuadraticTetra, 10),
    ("C3D15", QuadraticWedge, 15),
    ("DC3D15", QuadraticWedge, 15),
    ("C3D20", QuadraticHexahedron, 20),
    ("C3D20R", QuadraticHexahedron, 20),
    ("C3D20H", QuadraticHexahedron, 20),
    ("C3D20RH", QuadraticHexahedron, 20),
    ("C3D20T", QuadraticHexahedron, 20),
    ("DC3D20", QuadraticHexahedron, 20),
    // 2-D continuum, membranes and shells
    ("CPS3", Triangle, 3),
    ("CPE3", Triangle, 3),
    ("CAX3", Triangle, 3),
    ("DC2D3", Triangle, 3),
    ("M3D3", Triangle, 3),
    ("S3", Triangle, 3),
    ("S3R", Triangle, 3),
    ("STRI3", Triangle, 3),
    ("CPS4", Quad, 4),
    ("CPS4R", Quad, 4),
    ("CPE4", Quad, 4),
    ("CPE4R", Quad, 4),
    ("CAX4", Quad, 4),
    ("CAX4R", Quad, 4),
    ("DC2D4", Quad, 4),
    ("M3D4", Quad, 4),
    ("M3D4R", Quad, 4),
    ("S4", Quad, 4),
    ("S4R", Quad, 4),
    ("CPS6", QuadraticTriangle, 6),
    ("CPE6", QuadraticTriangle, 6),
    ("CAX6", QuadraticTriangle, 6),
    ("DC2D6", QuadraticTriangle, 6),
    ("M3D6", QuadraticTriangle, 6),
    ("S6", QuadraticTriangle, 6),
    ("STRI65", QuadraticTriangle, 6),
    ("CPS8", QuadraticQuad, 8),
    ("CPS8R", QuadraticQuad, 8),
    ("CPE8", QuadraticQuad, 8),
    ("CPE8R", QuadraticQuad, 8),
    ("CAX8", QuadraticQuad, 8),
    ("CAX8R", QuadraticQuad, 8),
    ("DC2D8", QuadraticQuad, 8),
    ("M3D8", QuadraticQuad, 8),
    ("M3D8R", QuadraticQuad, 8),
    ("S8", QuadraticQuad, 8),
    ("S8R", QuadraticQuad, 8),
    // trusses and beams
    ("T2D2", Line, 2),
    ("T3D2", Line, 2),
    ("B21", Line, 2),
    ("B31", Line, 2),
    ("DC1D2", Line, 2),
    ("T3D3", QuadraticEdge, 3),
    ("B22", QuadraticEdge, 3),
    ("B32", QuadraticEdge, 3),
    ("DC1D3", QuadraticEdge, 3),
];

/// Table entry for an element type, matched case-insensitively.
pub fn lookup(element_type: &str) -> Option<(VtkCellType, usize)> {
    let element_type = element_type.trim();
    ELEMENT_TYPES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(element_type))
        .map(|&(_, cell, nodes)| (cell, nodes))
}

/// Cell type guessed from the node count alone.
pub fn infer(node_count: usize) -> VtkCellType {
    match node_count {
        1 => Vertex,
        2 => Line,
        3 => Triangle,
        4 => Quad,
        6 => Wedge,
        8 => Hexahedron,
        10 => QuadraticTetra,
        20 => QuadraticHexahedron,
        _ => PolyVertex,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub cell: VtkCellType,
    /// False when the cell type came from inference.
    pub mapped: bool,
}

/// Resolve with a table entry looked up once per section.
pub fn resolve_with(entry: Option<(VtkCellType, usize)>, node_count: usize) -> Resolution {
    match entry {
        Some((cell, expected)) if expected == node_count => Resolution { cell, mapped: true },
        _ => Resolution {
            cell: infer(node_count),
            mapped: false,
        },
    }
}

pub fn resolve(element_type: &str, node_count: usize) -> Resolution {
    resolve_with(lookup(element_type), node_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_types() {
        assert_eq!(lookup("C3D4"), Some((Tetra, 4)));
        assert_eq!(lookup("c3d8r"), Some((Hexahedron, 8)));
        assert_eq!(lookup("C3D20R"), Some((QuadraticHexahedron, 20)));
        assert_eq!(lookup("S4R"), Some((Quad, 4)));
        assert_eq!(lookup("B32"), Some((QuadraticEdge, 3)));
        assert_eq!(lookup("XYZ"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn cell_codes_match_vtk() {
        assert_eq!(Tetra.code(), 10);
        assert_eq!(Hexahedron.code(), 12);
        assert_eq!(QuadraticTetra.code(), 24);
        assert_eq!(PolyVertex.code(), 2);
    }

    #[test]
    fn resolves_mapped_types() {
        let r = resolve("C3D10", 10);
        assert_eq!(r, Resolution { cell: QuadraticTetra, mapped: true });
    }

    #[test]
    fn infers_unknown_types_from_node_count() {
        assert_eq!(resolve("", 8).cell, Hexahedron);
        assert_eq!(resolve("USER1", 4).cell, Quad);
        assert!(!resolve("USER1", 4).mapped);
        assert_eq!(resolve("", 7).cell, PolyVertex);
    }

    #[test]
    fn node_count_disagreement_falls_back_to_inference() {
        let r = resolve("C3D8", 6);
        assert_eq!(r.cell, Wedge);
        assert!(!r.mapped);
    }
}
