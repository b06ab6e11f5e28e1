//! Routing of sections into bulk geometry, geometry metadata and everything
//! else.
//!
//! Membership is a fixed table on the normalized keyword. Supporting another
//! keyword means extending the table.

use abq_inp::Section;
use serde::Serialize;

const BULK_GEOMETRY: &[&str] = &["NODE", "ELEMENT"];
const GEOMETRY_METADATA: &[&str] = &["NSET", "ELSET", "SURFACE", "INSTANCE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Node coordinates and element connectivity.
    BulkGeometry,
    /// Sets, surfaces and instances.
    GeometryMetadata,
    NonGeometry,
}

pub fn classify(keyword: &str) -> Category {
    if BULK_GEOMETRY.contains(&keyword) {
        Category::BulkGeometry
    } else if GEOMETRY_METADATA.contains(&keyword) {
        Category::GeometryMetadata
    } else {
        Category::NonGeometry
    }
}

/// The three disjoint sub-sequences of a section list, each in file order.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub bulk_geometry: Vec<&'a Section>,
    pub geometry_metadata: Vec<&'a Section>,
    pub non_geometry: Vec<&'a Section>,
}

impl<'a> Partition<'a> {
    pub fn new(sections: &'a [Section]) -> Self {
        let mut partition = Self::default();
        for section in sections {
            match classify(&section.keyword) {
                Category::BulkGeometry => partition.bulk_geometry.push(section),
                Category::GeometryMetadata => partition.geometry_metadata.push(section),
                Category::NonGeometry => partition.non_geometry.push(section),
            }
        }
        partition
    }

    pub fn len(&self) -> usize {
        self.bulk_geometry.len() + self.geometry_metadata.len() + self.non_geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
