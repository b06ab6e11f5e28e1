//! Parse entry points: in-memory, or streaming geometry to a mesh file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use abq_inp::{Section, SectionReader};
use abq_model::{Category, Ir, MeshCounts, ModelSummary, Partition, build_ir, classify};
use tracing::debug;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::source::{FileSource, GeometrySource, StrSource};
use crate::vtk_writer::{MeshReport, MeshWriter};

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ir: Ir,
    /// Present when the parse streamed its geometry to a mesh file.
    pub mesh: Option<MeshReport>,
}

impl ParseOutput {
    pub fn summary(&self) -> ModelSummary {
        let summary = ModelSummary::from_ir(&self.ir);
        match &self.mesh {
            Some(report) => summary.with_mesh(MeshCounts::from(report)),
            None => summary,
        }
    }
}

/// One parser per configuration; every call starts from a fresh IR.
#[derive(Debug, Clone, Default)]
pub struct InpParser {
    options: ParseOptions,
}

impl InpParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn parse_str(&self, text: &str) -> Result<ParseOutput> {
        let source = StrSource::new(text);
        self.run(text.as_bytes(), &source)
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParseOutput> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let source = FileSource::new(path);
        self.run(reader, &source)
    }

    fn run<R: BufRead>(&self, reader: R, source: &dyn GeometrySource) -> Result<ParseOutput> {
        let streaming = self.options.is_streaming();
        let defer = |keyword: &str| streaming && classify(keyword) == Category::BulkGeometry;
        let sections = SectionReader::with_defer(reader, defer)
            .collect::<std::result::Result<Vec<Section>, _>>()?;

        let mesh = {
            let partition = Partition::new(&sections);
            debug!(
                bulk_geometry = partition.bulk_geometry.len(),
                geometry_metadata = partition.geometry_metadata.len(),
                non_geometry = partition.non_geometry.len(),
                streaming,
                "partitioned sections"
            );
            match &self.options.mesh_output {
                Some(path) => Some(
                    MeshWriter::new(source, partition.bulk_geometry.iter().copied())
                        .with_options(self.options.writer.clone())
                        .write_file(path)?,
                ),
                None => None,
            }
        };

        let ir = build_ir(sections);
        Ok(ParseOutput { ir, mesh })
    }
}
