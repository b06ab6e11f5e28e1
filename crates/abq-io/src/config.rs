//! Parse and mesh writer options.

use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "Abaqus INP File - Parsed Mesh Data";
pub const DEFAULT_NODE_ID_ARRAY: &str = "AbaqusNodeID";
pub const DEFAULT_ELEMENT_ID_ARRAY: &str = "AbaqusElementID";

/// Legacy VTK limits the title line to 256 characters.
const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Second line of the mesh file.
    pub title: String,
    /// Name of the POINT_DATA array carrying the original node ids.
    pub node_id_array: String,
    /// Name of the CELL_DATA array carrying the original element ids.
    pub element_id_array: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            node_id_array: DEFAULT_NODE_ID_ARRAY.to_string(),
            element_id_array: DEFAULT_ELEMENT_ID_ARRAY.to_string(),
        }
    }
}

impl WriterOptions {
    /// Title as written: one line, at most 255 characters.
    pub fn header_title(&self) -> String {
        let line = self.title.lines().next().unwrap_or("").trim();
        let title: String = line.chars().take(MAX_TITLE_LEN).collect();
        if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Where to stream the mesh. `None` parses everything into memory.
    pub mesh_output: Option<PathBuf>,
    pub writer: WriterOptions,
}

impl ParseOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn streaming(mesh_output: impl Into<PathBuf>) -> Self {
        Self {
            mesh_output: Some(mesh_output.into()),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `ABQ_VTK_OUTPUT` and `ABQ_VTK_TITLE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(path) = lookup("ABQ_VTK_OUTPUT").filter(|p| !p.trim().is_empty()) {
            options.mesh_output = Some(PathBuf::from(path.trim()));
        }
        if let Some(title) = lookup("ABQ_VTK_TITLE").filter(|t| !t.trim().is_empty()) {
            options.writer.title = title;
        }
        options
    }

    pub fn is_streaming(&self) -> bool {
        self.mesh_output.is_some()
    }
}
