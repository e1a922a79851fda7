//! # dotslice Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the
//! dotslice library. Import it to get quick access to everything an extraction needs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotslice operations
pub use crate::Error;

/// The result type used throughout dotslice
pub use crate::Result;

// ================================================================================================
// Module Model
// ================================================================================================

/// The module container and its dependency entries
pub use crate::metadata::module::{AssemblyRef, CompiledModule, EntryMarkers, Version};

/// Programmatic module construction
pub use crate::metadata::builder::ModuleBuilder;

/// Table row references
pub use crate::metadata::token::{TableId, Token};

/// Type signatures
pub use crate::metadata::signatures::{SignatureMethod, TypeSignature};

// ================================================================================================
// Extraction
// ================================================================================================

/// The extraction engine, its configuration and results
pub use crate::extract::{
    EntryKind, EntryPoints, ExtractOptions, Extraction, Extractor, FinalizeReport,
    PartialCapabilityWarning, StubPolicy, StubTarget,
};

/// Entry point selection
pub use crate::entry::{find_entry_method, find_entry_type, resolve_entry_points};

// ================================================================================================
// Persistence
// ================================================================================================

/// External module resolution
pub use crate::file::resolver::{DirectoryResolver, MemoryResolver, ModuleResolver};
