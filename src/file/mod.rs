//! Module persistence and external module resolution.
//!
//! Modules are stored as a JSON container. Loading maps the file into memory and decodes it
//! in place; saving validates the module first so a dangling reference never reaches disk.
//!
//! # Key Components
//!
//! - [`load`] / [`save`] - Read and write a module file
//! - [`resolver::ModuleResolver`] - Locates the modules a source module depends on
//! - [`resolver::DirectoryResolver`] - Resolves dependencies next to the source module
//! - [`resolver::MemoryResolver`] - Resolves dependencies from modules held in memory
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotslice::file;
//!
//! let module = file::load("Game.dll")?;
//! println!("{} declares {} types", module.name, module.type_def_count());
//! file::save(&module, "Game-copy.dll")?;
//! # Ok::<(), dotslice::Error>(())
//! ```

pub mod resolver;

use std::{fs, io::Write, path::Path};

use memmap2::Mmap;
use tempfile::NamedTempFile;

use crate::{
    metadata::{module::CompiledModule, validation::validate_module},
    Error::{self, FileError, StructuralWriteFailure},
    Result,
};

/// Decodes a module from its container bytes
///
/// # Errors
/// Returns [`Error::Serialization`] if the bytes are not a module container.
pub fn from_slice(data: &[u8]) -> Result<CompiledModule> {
    if data.is_empty() {
        return Err(malformed_error!("Module container is empty"));
    }
    Ok(serde_json::from_slice(data)?)
}

/// Encodes a module into its container bytes
///
/// # Errors
/// Returns [`Error::Serialization`] if encoding fails.
pub fn to_vec(module: &CompiledModule) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(module)?)
}

/// Loads a module file by memory-mapping it
///
/// # Errors
/// Returns [`Error::FileError`] if the file cannot be opened, or a decoding error.
pub fn load(path: impl AsRef<Path>) -> Result<CompiledModule> {
    let file = fs::File::open(path.as_ref()).map_err(FileError)?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|error| Error::Error(error.to_string()))?;
    from_slice(&mmap)
}

/// Validates and writes a module file.
///
/// The container is staged in a temporary file next to `path` and moved over it once
/// completely written, so a failed save leaves any previous file at `path` untouched.
///
/// # Errors
/// Returns [`Error::StructuralWriteFailure`] if validation, encoding or I/O fails.
pub fn save(module: &CompiledModule, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    validate_module(module).map_err(|error| StructuralWriteFailure(error.to_string()))?;
    let data = to_vec(module).map_err(|error| StructuralWriteFailure(error.to_string()))?;

    let failed =
        |error: std::io::Error| StructuralWriteFailure(format!("{}: {error}", path.display()));
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(failed)?;
    staged
        .write_all(&data)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(failed)?;
    staged.persist(path).map_err(|error| failed(error.error))?;

    log::debug!("Wrote module '{}' to {}", module.name, path.display());
    Ok(())
}
