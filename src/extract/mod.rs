//! Extraction of the closure of entry methods into a new module.
//!
//! The [`Extractor`] walks everything an entry method needs, depth first: the types, fields
//! and methods of the source module are cloned into a fresh destination module, while
//! everything other modules provide is imported. Every entity is memoized by its source token
//! the moment its destination shell exists, so shared callees are cloned once and cycles end.
//!
//! # Degradation
//!
//! A closure that hits an unresolvable external symbol cannot be emitted. When a read and a
//! write entry were requested and only one of them fails, the extraction is retried from
//! scratch with the surviving entry and the result carries a [`PartialCapabilityWarning`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotslice::{
//!     entry::resolve_entry_points,
//!     extract::{ExtractOptions, Extractor},
//!     file::{self, resolver::DirectoryResolver},
//! };
//! use std::path::Path;
//!
//! let path = Path::new("Game.dll");
//! let module = file::load(path)?;
//! let resolver = DirectoryResolver::for_module(path);
//! let options = ExtractOptions::default();
//! let entries = resolve_entry_points(&module, "SaveFile", Some("Read"), Some("Write"), &options)?;
//!
//! let extraction = Extractor::new(&module, &resolver, &options).extract(&entries)?;
//! for warning in &extraction.warnings {
//!     println!("{warning}");
//! }
//! file::save(&extraction.module, Path::new("SaveFile-schema.dll"))?;
//! # Ok::<(), dotslice::Error>(())
//! ```

mod fields;
mod finalize;
mod methods;
mod options;
mod rewriter;
mod state;
mod stubs;
mod types;

use std::{fmt, sync::Arc};

use sha1::{Digest, Sha1};
use strum::Display;

pub use finalize::{finalize, FinalizeReport};
pub use options::{ExtractOptions, DEFAULT_READER_TYPE, DEFAULT_WRITER_TYPE};
pub use stubs::{StubPolicy, StubTarget};

use crate::{
    extract::state::{ClosureState, DerivedTypeIndex},
    file::resolver::ModuleResolver,
    metadata::{
        module::{CompiledModule, EntryMarkers, Version},
        token::{TableId, Token},
    },
    Error, Result,
};

/// Version given to every extracted module
pub const SCHEMA_VERSION: Version = Version::new(1, 0, 0, 0);

/// Which capability an entry method provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// Deserialization from an input cursor
    Read,
    /// Serialization to an output cursor
    Write,
}

/// The `MethodDef` tokens of the requested entry methods in the source module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryPoints {
    /// The read entry
    pub read: Option<Token>,
    /// The write entry
    pub write: Option<Token>,
}

impl EntryPoints {
    /// Present entries, read first
    fn present(&self) -> Vec<(EntryKind, Token)> {
        [(EntryKind::Read, self.read), (EntryKind::Write, self.write)]
            .into_iter()
            .filter_map(|(kind, token)| token.map(|token| (kind, token)))
            .collect()
    }
}

/// An entry that was dropped so the remaining ones could be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialCapabilityWarning {
    /// The capability that is missing from the result
    pub dropped: EntryKind,
    /// Why its closure could not be extracted
    pub reason: String,
}

impl fmt::Display for PartialCapabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the {} entry was dropped, its closure references an unresolvable {}",
            self.dropped, self.reason
        )
    }
}

/// The result of a successful extraction
#[derive(Debug)]
pub struct Extraction {
    /// The finalized destination module
    pub module: CompiledModule,
    /// One warning per dropped entry
    pub warnings: Vec<PartialCapabilityWarning>,
    /// What the finalizer changed
    pub report: FinalizeReport,
}

impl Extraction {
    /// True if every requested entry made it into the module
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// State of one extraction attempt: the source, the destination under construction and the
/// memo tables linking them
pub(crate) struct Closure<'a> {
    source: &'a CompiledModule,
    resolver: &'a dyn ModuleResolver,
    options: &'a ExtractOptions,
    derived: Arc<DerivedTypeIndex>,
    dest: CompiledModule,
    state: ClosureState,
}

impl<'a> Closure<'a> {
    fn new(
        source: &'a CompiledModule,
        resolver: &'a dyn ModuleResolver,
        options: &'a ExtractOptions,
        derived: Arc<DerivedTypeIndex>,
        name: &str,
    ) -> Self {
        Closure {
            source,
            resolver,
            options,
            derived,
            dest: CompiledModule::new(name, SCHEMA_VERSION),
            state: ClosureState::default(),
        }
    }

    /// Clones every entry, stopping at the first failing one
    fn run(&mut self, entries: &[(EntryKind, Token)]) -> std::result::Result<(), (EntryKind, Error)> {
        for (kind, entry) in entries {
            log::debug!(
                "Resolving {} entry {}",
                kind,
                self.source.method_full_name(*entry).unwrap_or_default()
            );
            self.find_or_clone_method(*entry).map_err(|error| (*kind, error))?;
        }
        Ok(())
    }

    /// Records the entry markers and hands over the destination module
    fn into_module(mut self, entries: &[(EntryKind, Token)]) -> CompiledModule {
        let mut markers = EntryMarkers::default();
        for (kind, entry) in entries {
            let Some(cloned) = self.state.methods.get(entry).copied() else {
                continue;
            };
            markers.entry_type = self.dest.method(cloned).map(|m| m.declaring_type);
            match kind {
                EntryKind::Read => markers.read = Some(cloned),
                EntryKind::Write => markers.write = Some(cloned),
            }
        }
        self.dest.markers = markers;
        self.dest
    }
}

/// Extracts the closure of entry methods from a source module
pub struct Extractor<'a> {
    source: &'a CompiledModule,
    resolver: &'a dyn ModuleResolver,
    options: &'a ExtractOptions,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor; external modules are located through `resolver`
    pub fn new(
        source: &'a CompiledModule,
        resolver: &'a dyn ModuleResolver,
        options: &'a ExtractOptions,
    ) -> Self {
        Extractor {
            source,
            resolver,
            options,
        }
    }

    /// Name of the destination module
    fn module_name(&self, entry: Token) -> Result<String> {
        if let Some(name) = &self.options.module_name {
            return Ok(name.clone());
        }
        let owner = self
            .source
            .method(entry)
            .and_then(|m| self.source.type_def(m.declaring_type))
            .ok_or_else(|| malformed_error!("Entry {} is not a declared method", entry))?;
        Ok(format!("{}-schema", owner.name))
    }

    /// Derives the module version id from the destination name and the source identity
    fn module_id(&self, name: &str) -> uguid::Guid {
        let mut hasher = Sha1::new();
        hasher.update(name.as_bytes());
        hasher.update(self.source.mvid().to_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        uguid::Guid::from_bytes(bytes)
    }

    /// Extracts the closure of `entries` into a new, finalized module.
    ///
    /// Entries whose closure references an unresolvable symbol are dropped as long as another
    /// entry survives; each drop is reported in [`Extraction::warnings`].
    ///
    /// # Errors
    /// - [`Error::MissingEntryPoint`] if neither entry is given
    /// - [`Error::Unrecoverable`] if no entry could be extracted
    /// - [`Error::Malformed`] if an entry is not a method declared by the source module, or
    ///   the source module itself is inconsistent
    pub fn extract(&self, entries: &EntryPoints) -> Result<Extraction> {
        let mut remaining = entries.present();
        let Some((_, first)) = remaining.first().copied() else {
            return Err(Error::MissingEntryPoint);
        };
        for (kind, entry) in &remaining {
            if !entry.is_table(TableId::MethodDef) || self.source.method(*entry).is_none() {
                return Err(malformed_error!("The {} entry {} is not a declared method", kind, entry));
            }
        }
        let name = self.module_name(first)?;
        let derived = Arc::new(DerivedTypeIndex::build(self.source));

        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        let module = loop {
            if remaining.is_empty() {
                return Err(Error::Unrecoverable { failures });
            }
            let mut closure = Closure::new(
                self.source,
                self.resolver,
                self.options,
                Arc::clone(&derived),
                &name,
            );
            match closure.run(&remaining) {
                Ok(()) => break closure.into_module(&remaining),
                Err((kind, Error::SymbolUnresolved(reason))) => {
                    remaining.retain(|(k, _)| *k != kind);
                    failures.push(format!("{kind}: {reason}"));
                    if remaining.is_empty() {
                        log::debug!("The {} entry failed, no entry left", kind);
                    } else {
                        log::warn!("Dropping the {} entry: unresolvable {}", kind, reason);
                        warnings.push(PartialCapabilityWarning {
                            dropped: kind,
                            reason,
                        });
                    }
                }
                Err((_, error)) => return Err(error),
            }
        };

        let mut module = module;
        module.set_mvid(self.module_id(&name));
        let report = finalize(&mut module, &self.source.name, &self.options.tool_name)?;
        log::info!(
            "Extracted '{}' from '{}': {} types, {} methods, {} fields",
            module.name,
            self.source.name,
            module.type_def_count(),
            module.method_count(),
            module.fields().count()
        );
        Ok(Extraction {
            module,
            warnings,
            report,
        })
    }
}
