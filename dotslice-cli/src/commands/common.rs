use std::path::Path;

use anyhow::Context;
use dotslice::{file, metadata::module::CompiledModule};

/// Load a module file.
pub fn load_module(path: &Path) -> anyhow::Result<CompiledModule> {
    file::load(path).with_context(|| format!("failed to load module: {}", path.display()))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().to_string(),
    )
}
