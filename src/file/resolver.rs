//! Resolution of the external modules a source module depends on.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use rustc_hash::FxHashMap;

use crate::{file::load, metadata::module::CompiledModule};

/// File extensions probed for a dependency, in order
pub const MODULE_EXTENSIONS: [&str; 2] = ["dll", "exe"];

/// Locates an external module by assembly name.
///
/// Implementations must be cheap to call repeatedly with the same name; the extractor asks
/// once per imported type or member.
pub trait ModuleResolver {
    /// Returns the module declaring assembly `name`, if it can be located
    fn resolve(&self, name: &str) -> Option<Arc<CompiledModule>>;
}

/// Resolves dependencies as `<dir>/<name>.dll`, then `<dir>/<name>.exe`.
///
/// Loaded modules, and names that could not be found, are cached in a concurrent map so a
/// resolver can be shared between threads.
pub struct DirectoryResolver {
    dir: PathBuf,
    cache: DashMap<String, Option<Arc<CompiledModule>>>,
}

impl DirectoryResolver {
    /// Creates a resolver searching `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryResolver {
            dir: dir.into(),
            cache: DashMap::new(),
        }
    }

    /// Creates a resolver searching the directory that contains `module_path`
    pub fn for_module(module_path: &Path) -> Self {
        let dir = module_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir)
    }

    /// The directory being searched
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn probe(&self, name: &str) -> Option<Arc<CompiledModule>> {
        for extension in MODULE_EXTENSIONS {
            let candidate = self.dir.join(format!("{name}.{extension}"));
            if !candidate.is_file() {
                continue;
            }
            match load(&candidate) {
                Ok(module) => {
                    log::debug!("Resolved '{}' to {}", name, candidate.display());
                    return Some(Arc::new(module));
                }
                Err(error) => {
                    log::warn!("Failed to load {}: {}", candidate.display(), error);
                }
            }
        }
        log::debug!("No module found for '{}' in {}", name, self.dir.display());
        None
    }
}

impl ModuleResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Option<Arc<CompiledModule>> {
        if let Some(cached) = self.cache.get(name) {
            return cached.value().clone();
        }
        let resolved = self.probe(name);
        self.cache.insert(name.to_string(), resolved.clone());
        resolved
    }
}

/// Resolves dependencies from modules registered in memory
#[derive(Default)]
pub struct MemoryResolver {
    modules: FxHashMap<String, Arc<CompiledModule>>,
}

impl MemoryResolver {
    /// Creates an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module under its own name
    pub fn insert(&mut self, module: CompiledModule) {
        self.modules.insert(module.name.clone(), Arc::new(module));
    }

    /// Registers a module, builder style
    #[must_use]
    pub fn with(mut self, module: CompiledModule) -> Self {
        self.insert(module);
        self
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Option<Arc<CompiledModule>> {
        self.modules.get(name).cloned()
    }
}
