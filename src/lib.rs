// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
// - 'file/mod.rs' uses mmap to map a module file into memory

//! # dotslice
//!
//! Extracts the minimal, self-contained slice of a compiled .NET-style module that a few
//! designated entry methods need, and emits it as a new, independent module.
//!
//! Third party modules are large; a consumer that only wants to run a serialization routine
//! of one type should not have to ship, load, or trust all of it. `dotslice` walks the
//! transitive closure of the entry methods (the types they mention, the methods they call,
//! the fields they touch), clones what the source module declares and imports what other
//! modules provide. The result is then made loadable by an unrelated consumer: every
//! concrete type gets a public parameterless constructor, fields become public and the
//! dependencies on the source module and on this tool are dropped.
//!
//! ## Features
//!
//! - **Memoized closure walk** - every entity is cloned once, cycles terminate
//! - **Generics** - generic type and method instantiations are rebuilt around cloned types
//! - **Virtual dispatch** - overrides and interface implementations of reachable virtual
//!   methods are pulled in, both for local and external base methods
//! - **Exception regions** - try/catch/finally boundaries are carried over exactly
//! - **Graceful degradation** - a read or write entry whose closure cannot be resolved is
//!   dropped with a warning instead of failing the whole extraction
//! - **Logging stubs** - unresolvable logging calls can be redirected to a print routine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotslice::prelude::*;
//! use std::path::Path;
//!
//! let path = Path::new("Game.dll");
//! let module = dotslice::file::load(path)?;
//! let resolver = DirectoryResolver::for_module(path);
//! let options = ExtractOptions::default();
//!
//! let entries = resolve_entry_points(&module, "SaveFile", Some("Read"), Some("Write"), &options)?;
//! let extraction = Extractor::new(&module, &resolver, &options).extract(&entries)?;
//! dotslice::file::save(&extraction.module, "SaveFile-schema.dll")?;
//! # Ok::<(), dotslice::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The module model: token addressed tables, signatures, a builder and a
//!   structural validator
//! - [`assembly`] - Instructions and their operands
//! - [`extract`] - The closure walk, override discovery, degradation and finalization
//! - [`entry`] - Selection of the entry type and its read/write methods
//! - [`file`] - Module persistence and resolution of external modules
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use dotslice::{file, Error};
//!
//! match file::load("Game.dll") {
//!     Ok(module) => println!("Loaded {}", module.name),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use dotslice::prelude::*;
///
/// let module = dotslice::file::load("Game.dll")?;
/// let owner = find_entry_type(&module, "SaveFile")?;
/// println!("{}", module.type_full_name(owner).unwrap_or_default());
/// # Ok::<(), dotslice::Error>(())
/// ```
pub mod prelude;

/// Instructions of method bodies
///
/// Bodies are stored as decoded instruction sequences. Branch targets and exception region
/// boundaries are instruction positions rather than byte offsets, so a body copied one to
/// one keeps all of them valid.
///
/// # Key Types
///
/// - [`assembly::Instruction`] - An opcode and its operand
/// - [`assembly::Operand`] - Immediates, branch targets and metadata references
/// - [`assembly::OpCode`] - The opcode set
pub mod assembly;

/// The module model
///
/// A [`metadata::module::CompiledModule`] holds type declarations, type imports, fields,
/// methods, properties, member references, generic method instantiations and the dependency
/// table. Rows are addressed by [`metadata::token::Token`]s.
///
/// # Examples
///
/// ```rust
/// use dotslice::metadata::{builder::ModuleBuilder, signatures::TypeSignature};
///
/// let mut builder = ModuleBuilder::new("Game");
/// let object = builder.platform_type("System", "Object");
/// let save = builder.class("Game", "SaveFile", Some(object));
/// builder.field(save, "version", TypeSignature::I4)?;
///
/// let module = builder.build();
/// assert_eq!(module.find_type_def("Game.SaveFile"), Some(save));
/// # Ok::<(), dotslice::Error>(())
/// ```
pub mod metadata;

/// Closure extraction
pub mod extract;

/// Entry point selection
pub mod entry;

/// Module persistence and external module resolution
pub mod file;

/// `dotslice` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotslice` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust,no_run
/// use dotslice::{entry::find_entry_type, file, Error};
///
/// let module = file::load("Game.dll")?;
/// match find_entry_type(&module, "Save") {
///     Ok(token) => println!("Found {}", token),
///     Err(Error::AmbiguousEntryName { candidates, .. }) => {
///         println!("Did you mean one of {}?", candidates.join(", "))
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// # Ok::<(), dotslice::Error>(())
/// ```
pub use error::Error;
