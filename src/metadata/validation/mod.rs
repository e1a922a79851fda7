//! Structural validation of modules
//!
//! Validation runs before a module is written. It does not verify the semantics of the code,
//! only that every reference inside the module resolves.

mod method;
mod token;

pub use method::MethodValidator;
pub use token::TokenValidator;

use crate::{metadata::module::CompiledModule, Result};

/// Collects every structural problem of `module`
#[must_use]
pub fn collect_issues(module: &CompiledModule) -> Vec<String> {
    let mut issues = TokenValidator::validate_references(module);
    issues.extend(MethodValidator::validate_bodies(module));
    issues
}

/// Validates `module`
///
/// # Errors
/// Returns [`crate::Error::Malformed`] listing every problem found.
pub fn validate_module(module: &CompiledModule) -> Result<()> {
    let issues = collect_issues(module);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(malformed_error!(
            "Module '{}' failed validation: {}",
            module.name,
            issues.join("; ")
        ))
    }
}
