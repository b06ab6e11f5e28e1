//! Streaming legacy VTK writer for deferred NODE/ELEMENT sections.
//!
//! Writing happens in two passes over the source. [`MeshWriter::plan`] counts
//! points, cells and the cell list size and builds the node id lookup, so every
//! block header can be written before its rows. [`MeshWriter::emit`] then
//! re-reads the source once per block and holds one node or element at a time.
//!
//! ```rust,no_run
//! use abq_io::{FileSource, MeshWriter};
//! # fn sections() -> Vec<abq_inp::Section> { Vec::new() }
//!
//! let sections = sections();
//! let source = FileSource::new("job.inp");
//! let report = MeshWriter::new(&source, &sections).write_file("job.vtk")?;
//! println!("{} points, {} cells", report.points, report.cells);
//! # Ok::<(), abq_io::Error>(())
//! ```

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io::{BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use abq_inp::{Section, Value, coerce_line};
use abq_model::MeshCounts;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::WriterOptions;
use crate::element_types::{self, Resolution};
use crate::error::{Error, Result};
use crate::source::{GeometrySource, scan_extent};

/// Counts and node lookup produced by the count pass.
#[derive(Debug, Clone, Default)]
pub struct MeshPlan {
    node_index: FxHashMap<i64, usize>,
    pub points: usize,
    pub cells: usize,
    pub cell_list_size: usize,
    pub unmapped_elements: usize,
    pub skipped_nodes: usize,
    pub skipped_elements: usize,
}

impl MeshPlan {
    /// VTK point index of an Abaqus node id.
    pub fn point_index(&self, node_id: i64) -> Option<usize> {
        self.node_index.get(&node_id).copied()
    }

    fn report(&self, path: &Path) -> MeshReport {
        MeshReport {
            path: path.to_path_buf(),
            points: self.points,
            cells: self.cells,
            cell_list_size: self.cell_list_size,
            unmapped_elements: self.unmapped_elements,
            skipped_nodes: self.skipped_nodes,
            skipped_elements: self.skipped_elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshReport {
    pub path: PathBuf,
    pub points: usize,
    pub cells: usize,
    pub cell_list_size: usize,
    pub unmapped_elements: usize,
    pub skipped_nodes: usize,
    pub skipped_elements: usize,
}

impl From<&MeshReport> for MeshCounts {
    fn from(report: &MeshReport) -> Self {
        MeshCounts {
            points: report.points,
            cells: report.cells,
            unmapped_elements: report.unmapped_elements,
        }
    }
}

/// One element resolved against the plan.
struct Cell {
    id: i64,
    points: Vec<usize>,
    resolution: Resolution,
}

pub struct MeshWriter<'a> {
    source: &'a dyn GeometrySource,
    nodes: Vec<&'a Section>,
    elements: Vec<&'a Section>,
    options: WriterOptions,
}

impl<'a> MeshWriter<'a> {
    /// Takes the deferred NODE and ELEMENT sections among `sections`, in order.
    pub fn new(
        source: &'a dyn GeometrySource,
        sections: impl IntoIterator<Item = &'a Section>,
    ) -> Self {
        let mut nodes = Vec::new();
        let mut elements = Vec::new();
        for section in sections {
            if section.extent().is_none() {
                continue;
            }
            match section.keyword.as_str() {
                "NODE" => nodes.push(section),
                "ELEMENT" => elements.push(section),
                _ => {}
            }
        }
        Self {
            source,
            nodes,
            elements,
            options: WriterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Count pass.
    pub fn plan(&self) -> Result<MeshPlan> {
        let mut plan = MeshPlan::default();

        for section in &self.nodes {
            scan_section(self.source, section, "NODE", |line, text| {
                match parse_node(text) {
                    Some((id, _)) if plan.node_index.contains_key(&id) => {
                        debug!(line, node = id, "duplicate node id, keeping the first");
                        plan.skipped_nodes += 1;
                    }
                    Some((id, _)) => {
                        plan.node_index.insert(id, plan.points);
                        plan.points += 1;
                    }
                    None => {
                        warn!(line, "skipping malformed node line");
                        plan.skipped_nodes += 1;
                    }
                }
                Ok(())
            })?;
        }

        for section in &self.elements {
            let element_type = section.parameter("TYPE").unwrap_or("");
            let mut unmapped = 0usize;
            let mut points = 0usize;
            let mut cells = 0usize;
            let mut cell_list_size = 0usize;
            let mut skipped = 0usize;
            self.for_each_cell(section, &plan.node_index, |cell| {
                match cell {
                    Some(cell) => {
                        cells += 1;
                        points = cell.points.len();
                        cell_list_size += 1 + cell.points.len();
                        if !cell.resolution.mapped {
                            unmapped += 1;
                        }
                    }
                    None => skipped += 1,
                }
                Ok(())
            })?;
            if unmapped > 0 {
                warn!(
                    element_type,
                    line = section.line_start,
                    count = unmapped,
                    nodes = points,
                    "element type not mapped, cell type inferred from node count"
                );
            }
            if skipped > 0 {
                warn!(
                    line = section.line_start,
                    count = skipped,
                    "skipping malformed elements or elements with undefined nodes"
                );
            }
            plan.cells += cells;
            plan.cell_list_size += cell_list_size;
            plan.unmapped_elements += unmapped;
            plan.skipped_elements += skipped;
        }

        debug!(
            points = plan.points,
            cells = plan.cells,
            cell_list_size = plan.cell_list_size,
            "planned mesh"
        );
        Ok(plan)
    }

    /// Emit pass. Every block re-reads the source and must match `plan`.
    pub fn emit<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        self.write_header(out)?;
        self.write_points(plan, out)?;
        self.write_cells(plan, out)?;
        self.write_cell_types(plan, out)?;
        self.write_point_data(plan, out)?;
        self.write_cell_data(plan, out)?;
        out.flush()?;
        Ok(())
    }

    /// Plan, emit into a temporary file beside `path`, then move it into place.
    /// Nothing is left at `path` when writing fails.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<MeshReport> {
        let path = path.as_ref();
        let plan = self.plan()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut out = BufWriter::new(NamedTempFile::new_in(dir)?);
        self.emit(&plan, &mut out)?;
        let file = out.into_inner().map_err(|err| err.into_error())?;
        file.persist(path)?;

        info!(
            path = %path.display(),
            points = plan.points,
            cells = plan.cells,
            "wrote mesh"
        );
        Ok(plan.report(path))
    }

    fn write_header<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "# vtk DataFile Version 2.0")?;
        writeln!(out, "{}", self.options.header_title())?;
        writeln!(out, "ASCII")?;
        writeln!(out)?;
        writeln!(out, "DATASET UNSTRUCTURED_GRID")?;
        Ok(())
    }

    fn write_points<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        writeln!(out, "POINTS {} float", plan.points)?;
        let mut written = 0usize;
        self.for_each_point(plan, |_, [x, y, z]| {
            writeln!(out, "{} {} {}", Sci(x), Sci(y), Sci(z))?;
            written += 1;
            Ok(())
        })?;
        check("POINTS", plan.points, written)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_cells<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        writeln!(out, "CELLS {} {}", plan.cells, plan.cell_list_size)?;
        let mut written = 0usize;
        let mut size = 0usize;
        self.for_each_planned_cell(plan, |cell| {
            write!(out, "{}", cell.points.len())?;
            for index in &cell.points {
                write!(out, " {index}")?;
            }
            writeln!(out)?;
            written += 1;
            size += 1 + cell.points.len();
            Ok(())
        })?;
        check("CELLS", plan.cells, written)?;
        check("CELLS size", plan.cell_list_size, size)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_cell_types<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        writeln!(out, "CELL_TYPES {}", plan.cells)?;
        let mut written = 0usize;
        self.for_each_planned_cell(plan, |cell| {
            writeln!(out, "{}", cell.resolution.cell.code())?;
            written += 1;
            Ok(())
        })?;
        check("CELL_TYPES", plan.cells, written)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_point_data<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        writeln!(out, "POINT_DATA {}", plan.points)?;
        writeln!(out, "SCALARS {} int 1", self.options.node_id_array)?;
        writeln!(out, "LOOKUP_TABLE default")?;
        let mut written = 0usize;
        self.for_each_point(plan, |id, _| {
            writeln!(out, "{id}")?;
            written += 1;
            Ok(())
        })?;
        check("POINT_DATA", plan.points, written)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_cell_data<W: Write>(&self, plan: &MeshPlan, out: &mut W) -> Result<()> {
        writeln!(out, "CELL_DATA {}", plan.cells)?;
        writeln!(out, "SCALARS {} int 1", self.options.element_id_array)?;
        writeln!(out, "LOOKUP_TABLE default")?;
        let mut written = 0usize;
        self.for_each_planned_cell(plan, |cell| {
            writeln!(out, "{}", cell.id)?;
            written += 1;
            Ok(())
        })?;
        check("CELL_DATA", plan.cells, written)?;
        Ok(())
    }

    /// Visit the nodes that own a point in `plan`, in point order.
    fn for_each_point<F>(&self, plan: &MeshPlan, mut visit: F) -> Result<()>
    where
        F: FnMut(i64, [f64; 3]) -> Result<()>,
    {
        let mut next = 0usize;
        for section in &self.nodes {
            scan_section(self.source, section, "NODE", |_, text| {
                let Some((id, coords)) = parse_node(text) else {
                    return Ok(());
                };
                // Later duplicates of an id map to an earlier point.
                if plan.point_index(id) == Some(next) {
                    next += 1;
                    visit(id, coords)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn for_each_planned_cell<F>(&self, plan: &MeshPlan, mut visit: F) -> Result<()>
    where
        F: FnMut(&Cell) -> Result<()>,
    {
        for section in &self.elements {
            self.for_each_cell(section, &plan.node_index, |cell| match cell {
                Some(cell) => visit(cell),
                None => Ok(()),
            })?;
        }
        Ok(())
    }

    /// Visit each element line of one section; `None` for lines that are
    /// skipped. A line ending in a comma continues on the next physical line,
    /// which is not joined: both are skipped.
    fn for_each_cell<F>(
        &self,
        section: &Section,
        node_index: &FxHashMap<i64, usize>,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(Option<&Cell>) -> Result<()>,
    {
        let entry = section
            .parameter("TYPE")
            .and_then(element_types::lookup);
        let mut continued = false;
        scan_section(self.source, section, "ELEMENT", |_, text| {
            let follows_open_line =
                mem::replace(&mut continued, text.trim_end().ends_with(','));
            if follows_open_line || continued {
                return visit(None);
            }
            let cell = parse_element(text).and_then(|(id, nodes)| {
                let points = nodes
                    .iter()
                    .map(|n| node_index.get(n).copied())
                    .collect::<Option<Vec<_>>>()?;
                let resolution = element_types::resolve_with(entry, points.len());
                Some(Cell {
                    id,
                    points,
                    resolution,
                })
            });
            visit(cell.as_ref())
        })
    }
}

/// Scan a deferred section, requiring the data line count recorded when it
/// was first read.
fn scan_section<F>(
    source: &dyn GeometrySource,
    section: &Section,
    block: &'static str,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(usize, &str) -> Result<()>,
{
    let Some(extent) = section.extent() else {
        return Ok(());
    };
    let seen = scan_extent(source, extent, |line| visit(line.number, &line.text))?;
    check(block, extent.data_lines, seen)
}

fn check(block: &'static str, expected: usize, observed: usize) -> Result<()> {
    if expected == observed {
        Ok(())
    } else {
        Err(Error::SizeMismatch {
            block,
            expected,
            observed,
        })
    }
}

/// Fields before any trailing empty ones.
fn significant(values: &[Value]) -> &[Value] {
    let len = values
        .iter()
        .rposition(|v| !v.is_empty_text())
        .map_or(0, |last| last + 1);
    &values[..len]
}

/// `id, x, y[, z, ...]`; a missing z is 0, and so is a blank coordinate.
fn parse_node(text: &str) -> Option<(i64, [f64; 3])> {
    let values = coerce_line(text);
    let (id, rest) = significant(&values).split_first()?;
    let id = id.as_i64()?;
    let coords = rest
        .iter()
        .take(3)
        .map(|v| if v.is_empty_text() { Some(0.0) } else { v.as_f64() })
        .collect::<Option<Vec<_>>>()?;
    match coords[..] {
        [x, y] => Some((id, [x, y, 0.0])),
        [x, y, z] => Some((id, [x, y, z])),
        _ => None,
    }
}

/// `id, n1, n2, ...`; a blank node field rejects the line.
fn parse_element(text: &str) -> Option<(i64, Vec<i64>)> {
    let values = coerce_line(text);
    let (id, rest) = significant(&values).split_first()?;
    let id = id.as_i64()?;
    let nodes = rest.iter().map(Value::as_i64).collect::<Option<Vec<_>>>()?;
    if nodes.is_empty() {
        return None;
    }
    Some((id, nodes))
}

/// C `%.6e`: six fraction digits, signed exponent of at least two digits.
struct Sci(f64);

impl Display for Sci {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let formatted = format!("{:.6e}", self.0);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                write!(f, "{mantissa}e{sign}{digits:0>2}")
            }
            None => f.write_str(&formatted),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell as Counter;
    use std::io::{self, BufRead, Read};
    use std::rc::Rc;

    use abq_inp::{Extent, SectionReader};

    use super::*;
    use crate::source::StrSource;

    fn deferred(src: &str) -> Vec<Section> {
        SectionReader::with_defer(src.as_bytes(), |k: &str| k == "NODE" || k == "ELEMENT")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("parse")
    }

    fn render(src: &str) -> (MeshPlan, String) {
        let sections = deferred(src);
        let source = StrSource::new(src);
        let writer = MeshWriter::new(&source, &sections);
        let plan = writer.plan().expect("plan");
        let mut out = Vec::new();
        writer.emit(&plan, &mut out).expect("emit");
        (plan, String::from_utf8(out).expect("utf-8"))
    }

    const TET: &str = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=C3D4
1, 1, 2, 3, 4
";

    #[test]
    fn formats_like_c_printf() {
        assert_eq!(Sci(0.0).to_string(), "0.000000e+00");
        assert_eq!(Sci(1.0).to_string(), "1.000000e+00");
        assert_eq!(Sci(-12.5).to_string(), "-1.250000e+01");
        assert_eq!(Sci(7.85e-9).to_string(), "7.850000e-09");
        assert_eq!(Sci(1e120).to_string(), "1.000000e+120");
    }

    #[test]
    fn writes_single_tetrahedron() {
        let (plan, text) = render(TET);
        assert_eq!(plan.points, 4);
        assert_eq!(plan.cells, 1);
        assert_eq!(plan.cell_list_size, 5);

        let expected = "\
# vtk DataFile Version 2.0
Abaqus INP File - Parsed Mesh Data
ASCII

DATASET UNSTRUCTURED_GRID
POINTS 4 float
0.000000e+00 0.000000e+00 0.000000e+00
1.000000e+00 0.000000e+00 0.000000e+00
0.000000e+00 1.000000e+00 0.000000e+00
0.000000e+00 0.000000e+00 1.000000e+00

CELLS 1 5
4 0 1 2 3

CELL_TYPES 1
10

POINT_DATA 4
SCALARS AbaqusNodeID int 1
LOOKUP_TABLE default
1
2
3
4

CELL_DATA 1
SCALARS AbaqusElementID int 1
LOOKUP_TABLE default
1
";
        assert_eq!(text, expected);
    }

    #[test]
    fn header_counts_match_rows() {
        let src = "\
*NODE
10, 0, 0
20, 1, 0
30, 1, 1
40, 0, 1
** second block
*NODE
50, 2, 0
60, 2, 1
*ELEMENT, TYPE=CPS4
7, 10, 20, 30, 40
*ELEMENT, TYPE=CPS3
8, 20, 50, 60
9, 20, 60, 30
";
        let (plan, text) = render(src);
        assert_eq!((plan.points, plan.cells, plan.cell_list_size), (6, 3, 13));
        assert!(text.contains("POINTS 6 float\n"));
        assert!(text.contains("CELLS 3 13\n4 0 1 2 3\n3 1 4 5\n3 1 5 2\n"));
        assert!(text.contains("CELL_TYPES 3\n9\n5\n5\n"));
        assert!(text.ends_with("LOOKUP_TABLE default\n7\n8\n9\n"));
        // 2-D nodes get z = 0
        assert!(text.contains("2.000000e+00 1.000000e+00 0.000000e+00\n"));
    }

    #[test]
    fn skips_duplicates_and_dangling_elements() {
        let src = "\
*NODE
1, 0, 0, 0
2, 1, 0, 0
1, 9, 9, 9
bad line
*ELEMENT, TYPE=T3D2
1, 1, 2
2, 1, 99
3, x, 2
";
        let (plan, text) = render(src);
        assert_eq!(plan.points, 2);
        assert_eq!(plan.skipped_nodes, 2);
        assert_eq!(plan.cells, 1);
        assert_eq!(plan.skipped_elements, 2);
        assert!(!text.contains("9.000000e+00"));
        assert!(text.contains("POINT_DATA 2\nSCALARS AbaqusNodeID int 1\nLOOKUP_TABLE default\n1\n2\n"));
    }

    #[test]
    fn element_without_nodes_is_reported_as_skipped() {
        let (plan, text) = render("*ELEMENT, TYPE=C3D4\n1, 1, 2, 3, 4\n");
        assert_eq!((plan.points, plan.cells), (0, 0));
        assert_eq!(plan.skipped_elements, 1);
        assert!(text.contains("POINTS 0 float\n\nCELLS 0 0\n"));
    }

    #[test]
    fn blank_node_coordinates_read_as_zero() {
        let (plan, text) = render("*NODE\n1, 1.0, , 2.0\n2, 3.0, 4.0, 5.0,\n");
        assert_eq!(plan.points, 2);
        assert_eq!(plan.skipped_nodes, 0);
        assert!(text.contains("POINTS 2 float\n1.000000e+00 0.000000e+00 2.000000e+00\n"));
        assert!(text.contains("3.000000e+00 4.000000e+00 5.000000e+00\n"));
    }

    #[test]
    fn blank_element_node_rejects_the_line() {
        let src = "\
*NODE
1, 0, 0, 0
2, 1, 0, 0
*ELEMENT, TYPE=T3D2
1, 1, , 2
2, 1, 2
";
        let (plan, text) = render(src);
        assert_eq!(plan.cells, 1);
        assert_eq!(plan.skipped_elements, 1);
        assert!(text.contains("CELLS 1 3\n2 0 1\n"));
        assert!(text.ends_with("LOOKUP_TABLE default\n2\n"));
    }

    #[test]
    fn continued_element_lines_are_skipped_together() {
        let src = "\
*NODE
1, 0, 0, 0
2, 1, 0, 0
3, 0, 1, 0
4, 0, 0, 1
*ELEMENT, TYPE=C3D4
1, 1, 2,
3, 4
5, 1,
2,
3, 4
2, 1, 2, 3, 4
";
        let (plan, text) = render(src);
        assert_eq!(plan.cells, 1);
        assert_eq!(plan.skipped_elements, 5);
        assert_eq!(plan.unmapped_elements, 0);
        assert!(text.contains("CELLS 1 5\n4 0 1 2 3\n"));
        assert!(text.ends_with("LOOKUP_TABLE default\n2\n"));
    }

    #[test]
    fn unknown_types_are_inferred_and_counted() {
        let src = "\
*NODE
1, 0, 0
2, 1, 0
3, 1, 1
4, 0, 1
*ELEMENT, TYPE=USER4
1, 1, 2, 3, 4
*ELEMENT
2, 1, 2, 3
";
        let (plan, text) = render(src);
        assert_eq!(plan.unmapped_elements, 2);
        assert!(text.contains("CELL_TYPES 2\n9\n5\n"));
    }

    #[test]
    fn custom_options_rename_arrays_and_title() {
        let sections = deferred(TET);
        let source = StrSource::new(TET);
        let writer = MeshWriter::new(&source, &sections).with_options(WriterOptions {
            title: "Bracket".to_string(),
            node_id_array: "NodeId".to_string(),
            element_id_array: "ElemId".to_string(),
        });
        let plan = writer.plan().expect("plan");
        let mut out = Vec::new();
        writer.emit(&plan, &mut out).expect("emit");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.starts_with("# vtk DataFile Version 2.0\nBracket\n"));
        assert!(text.contains("SCALARS NodeId int 1"));
        assert!(text.contains("SCALARS ElemId int 1"));
    }

    /// Returns the planned text on the first open and a longer body afterwards.
    struct ChangingSource {
        opens: Counter<usize>,
    }

    impl GeometrySource for ChangingSource {
        fn open(&self, _extent: &Extent) -> io::Result<Box<dyn BufRead + '_>> {
            let n = self.opens.get();
            self.opens.set(n + 1);
            let body: &'static [u8] = if n == 0 {
                b"1, 0, 0, 0\n2, 1, 0, 0\n"
            } else {
                b"1, 0, 0, 0\n2, 1, 0, 0\n3, 2, 0, 0\n"
            };
            Ok(Box::new(body))
        }
    }

    #[test]
    fn changed_source_is_a_size_mismatch() {
        let sections = deferred("*NODE\n1, 0, 0, 0\n2, 1, 0, 0\n");
        let source = ChangingSource {
            opens: Counter::new(0),
        };
        let writer = MeshWriter::new(&source, &sections);
        let plan = writer.plan().expect("plan");
        let err = writer.emit(&plan, &mut Vec::new()).expect_err("mismatch");
        assert!(matches!(
            err,
            Error::SizeMismatch {
                block: "NODE",
                expected: 2,
                observed: 3
            }
        ));
    }

    /// Serves one line per `fill_buf` and counts the lines handed out.
    struct Paced<'a> {
        rest: &'a [u8],
        in_line: bool,
        reads: Rc<Counter<usize>>,
    }

    impl Read for Paced<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = {
                let available = self.fill_buf()?;
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                n
            };
            self.consume(n);
            Ok(n)
        }
    }

    impl BufRead for Paced<'_> {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if !self.in_line && !self.rest.is_empty() {
                self.in_line = true;
                self.reads.set(self.reads.get() + 1);
            }
            let end = self
                .rest
                .iter()
                .position(|&b| b == b'\n')
                .map_or(self.rest.len(), |i| i + 1);
            Ok(&self.rest[..end])
        }

        fn consume(&mut self, amt: usize) {
            if amt > 0 && self.rest[amt - 1] == b'\n' {
                self.in_line = false;
            }
            self.rest = &self.rest[amt..];
        }
    }

    struct PacedSource<'a> {
        text: &'a str,
        reads: Rc<Counter<usize>>,
    }

    impl GeometrySource for PacedSource<'_> {
        fn open(&self, extent: &Extent) -> io::Result<Box<dyn BufRead + '_>> {
            let rest = self
                .text
                .as_bytes()
                .get(extent.start as usize..extent.end as usize)
                .unwrap_or_default();
            Ok(Box::new(Paced {
                rest,
                in_line: false,
                reads: Rc::clone(&self.reads),
            }))
        }
    }

    /// Records, for every output line, how many source lines had been read
    /// when it was completed.
    struct Recorder {
        reads: Rc<Counter<usize>>,
        line: Vec<u8>,
        rows: Vec<(usize, String)>,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            for &b in buf {
                if b == b'\n' {
                    let text = String::from_utf8_lossy(&self.line).into_owned();
                    self.rows.push((self.reads.get(), text));
                    self.line.clear();
                } else {
                    self.line.push(b);
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rows_are_written_before_the_next_line_is_read() {
        let src = "\
*NODE
1, 0, 0
2, 1, 0
3, 1, 1
4, 0, 1
*ELEMENT, TYPE=CPS3
1, 1, 2, 3
2, 1, 3, 4
";
        let sections = deferred(src);
        let reads = Rc::new(Counter::new(0));
        let source = PacedSource {
            text: src,
            reads: Rc::clone(&reads),
        };
        let writer = MeshWriter::new(&source, &sections);
        let plan = writer.plan().expect("plan");
        let mut sink = Recorder {
            reads: Rc::clone(&reads),
            line: Vec::new(),
            rows: Vec::new(),
        };
        writer.emit(&plan, &mut sink).expect("emit");

        for (header, rows) in [("POINTS 4 float", 4), ("CELLS 2 8", 2)] {
            let at = sink
                .rows
                .iter()
                .position(|(_, text)| text == header)
                .expect(header);
            let base = sink.rows[at].0;
            for k in 0..rows {
                assert_eq!(sink.rows[at + 1 + k].0, base + k + 1, "{header} row {k}");
            }
        }
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("mesh.vtk");
        let sections = deferred("*NODE\n1, 0, 0, 0\n2, 1, 0, 0\n");
        let source = ChangingSource {
            opens: Counter::new(0),
        };
        let err = MeshWriter::new(&source, &sections)
            .write_file(&target)
            .expect_err("mismatch");
        assert!(matches!(err, Error::SizeMismatch { .. }));
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn write_file_reports_counts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("nested").join("tet.vtk");
        let sections = deferred(TET);
        let source = StrSource::new(TET);
        let report = MeshWriter::new(&source, &sections)
            .write_file(&target)
            .expect("write");
        assert_eq!(report.points, 4);
        assert_eq!(report.cells, 1);
        assert_eq!(report.cell_list_size, 5);
        assert_eq!(report.path, target);
        let text = fs::read_to_string(&target).expect("read back");
        assert!(text.starts_with("# vtk DataFile Version 2.0\n"));
        assert_eq!(MeshCounts::from(&report).points, 4);
    }

    #[test]
    fn empty_geometry_writes_empty_blocks() {
        let (plan, text) = render("*HEADING\nonly a title\n");
        assert_eq!(plan.points, 0);
        assert!(text.contains("POINTS 0 float\n\nCELLS 0 0\n\nCELL_TYPES 0\n\n"));
    }
}
