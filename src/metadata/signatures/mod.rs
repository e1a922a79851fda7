//! Type and member signatures.
//!
//! Signatures describe types structurally. Named types are referenced by [`crate::metadata::token::Token`],
//! so a signature is only meaningful together with the module whose tables the tokens point into.
//! Use [`types_equivalent`] to compare signatures of different modules.

mod compare;
mod types;

pub use compare::{methods_equivalent, types_equivalent};
pub use types::{MemberSignature, SignatureMethod, TypeSignature};
