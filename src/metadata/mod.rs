//! The compiled module model.
//!
//! A [`module::CompiledModule`] is a set of token-addressed tables, modelled after the
//! ECMA-335 metadata tables that matter for extraction.
//!
//! # Key Components
//!
//! - [`module`] - The module container, its dependency table and entry markers
//! - [`token`] - Table row references used throughout the crate
//! - [`typesystem`] - Type declarations and type imports
//! - [`method`] - Method declarations, bodies and exception regions
//! - [`signatures`] - Structural type and member signatures
//! - [`builder`] - Programmatic construction of modules
//! - [`validation`] - Structural checks run before a module is written
//!
//! # Examples
//!
//! ```rust
//! use dotslice::metadata::builder::ModuleBuilder;
//! use dotslice::metadata::signatures::TypeSignature;
//!
//! let mut builder = ModuleBuilder::new("Game");
//! let object = builder.platform_type("System", "Object");
//! let save = builder.class("Game", "Save", Some(object));
//! builder.field(save, "slot", TypeSignature::I4)?;
//! let module = builder.build();
//! assert_eq!(module.type_def_count(), 1);
//! # Ok::<(), dotslice::Error>(())
//! ```

/// Fluent construction of modules
pub mod builder;
/// Compile-time constants of parameters and literal fields
pub mod constant;
/// Field declarations
pub mod field;
/// Member references and generic method instantiations
pub mod memberref;
/// Method declarations and bodies
pub mod method;
/// The module container
pub mod module;
/// Property declarations
pub mod property;
/// Type and member signatures
pub mod signatures;
/// Table row references
pub mod token;
/// Type declarations and imports
pub mod typesystem;
/// Structural validation of modules
pub mod validation;
