//! Keyword classification and the typed intermediate representation built
//! from parsed deck sections.

pub mod accessors;
pub mod classify;
pub mod ir;
mod summary;

pub use classify::{Category, Partition, classify};
pub use ir::{Ir, IrBuilder, IrEntry, SectionInfo, SectionView, build_ir};
pub use summary::{MeshCounts, ModelSummary};
