//! IR as JSON: an object mapping each keyword to its list of data lines.

use std::fs;
use std::path::Path;

use abq_model::Ir;

use crate::error::Result;

pub fn ir_to_json_string(ir: &Ir) -> Result<String> {
    Ok(serde_json::to_string_pretty(ir)?)
}

pub fn save_ir_json(path: impl AsRef<Path>, ir: &Ir) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(ir)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_ir_json(path: impl AsRef<Path>) -> Result<Ir> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
