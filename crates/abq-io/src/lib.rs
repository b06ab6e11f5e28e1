//! I/O side of the Abaqus `.inp` reader.
//!
//! This crate provides:
//! - **Parse pipeline** switching between in-memory and streaming geometry
//! - **Legacy VTK export** of node and element sections, written in two passes
//! - **Element type mapping** from Abaqus element names to VTK cell types
//! - **JSON export** of the intermediate representation

pub mod config;
pub mod element_types;
mod error;
mod export;
mod pipeline;
pub mod source;
pub mod vtk_writer;

pub use config::{ParseOptions, WriterOptions};
pub use element_types::{Resolution, VtkCellType};
pub use error::{Error, Result};
pub use export::{ir_to_json_string, load_ir_json, save_ir_json};
pub use pipeline::{InpParser, ParseOutput};
pub use source::{FileSource, GeometrySource, StrSource};
pub use vtk_writer::{MeshPlan, MeshReport, MeshWriter};
