//! Selection of the entry type and its read and write methods.
//!
//! The entry type is named by a designator: its full name, or any suffix of it that only
//! one declared type ends with. Entry methods are named on that type and must take the
//! configured cursor type first; every further parameter needs a default value so the
//! method can be invoked with the cursor alone.

use crate::{
    extract::{EntryPoints, ExtractOptions},
    metadata::{module::CompiledModule, token::Token},
    Error, Result,
};

/// Finds the declared type named by `designator`
///
/// # Errors
/// - [`Error::EntryNotFound`] if neither the full name nor any suffix matches
/// - [`Error::AmbiguousEntryName`] if the designator is a suffix of several full names
pub fn find_entry_type(module: &CompiledModule, designator: &str) -> Result<Token> {
    if let Some(exact) = module.find_type_def(designator) {
        return Ok(exact);
    }

    let candidates: Vec<(Token, String)> = module
        .type_defs()
        .filter_map(|(token, _)| module.type_full_name(token).map(|name| (token, name)))
        .filter(|(_, name)| name.ends_with(designator))
        .collect();
    match candidates.as_slice() {
        [] => Err(Error::EntryNotFound(format!("type {designator}"))),
        [(token, name)] => {
            log::info!("Type {} was not found, assuming {}", designator, name);
            Ok(*token)
        }
        _ => Err(Error::AmbiguousEntryName {
            name: designator.to_string(),
            candidates: candidates.into_iter().map(|(_, name)| name).collect(),
        }),
    }
}

/// Finds the method `name` of `owner` taking a `cursor_type` first.
///
/// When several overloads qualify, the one with the fewest parameters wins.
///
/// # Errors
/// Returns [`Error::EntryNotFound`] if no method of that name qualifies.
pub fn find_entry_method(
    module: &CompiledModule,
    owner: Token,
    name: &str,
    cursor_type: &str,
) -> Result<Token> {
    let mut candidates: Vec<(Token, usize)> = module
        .find_methods(owner, name)
        .into_iter()
        .filter_map(|token| module.method(token).map(|method| (token, method)))
        .filter(|(_, method)| {
            let Some((cursor, rest)) = method.params.split_first() else {
                return false;
            };
            module.signature_type_name(&cursor.ty).as_deref() == Some(cursor_type)
                && rest.iter().all(|param| param.default.is_some())
        })
        .map(|(token, method)| (token, method.params.len()))
        .collect();

    let type_name = module.type_full_name(owner).unwrap_or_default();
    if candidates.len() > 1 {
        log::warn!(
            "{} methods {}::{} take a {} first, using the one with the fewest parameters",
            candidates.len(),
            type_name,
            name,
            cursor_type
        );
    }
    candidates.sort_by_key(|(_, count)| *count);
    candidates
        .first()
        .map(|(token, _)| *token)
        .ok_or_else(|| {
            Error::EntryNotFound(format!("method {type_name}::{name}({cursor_type}, ...)"))
        })
}

/// Resolves the entry type and the named read and write methods of `module`
///
/// # Errors
/// - [`Error::MissingEntryPoint`] if neither `read` nor `write` is given
/// - [`Error::EntryNotFound`] or [`Error::AmbiguousEntryName`] if a name cannot be resolved
pub fn resolve_entry_points(
    module: &CompiledModule,
    designator: &str,
    read: Option<&str>,
    write: Option<&str>,
    options: &ExtractOptions,
) -> Result<EntryPoints> {
    if read.is_none() && write.is_none() {
        return Err(Error::MissingEntryPoint);
    }
    let owner = find_entry_type(module, designator)?;
    Ok(EntryPoints {
        read: read
            .map(|name| find_entry_method(module, owner, name, &options.reader_type))
            .transpose()?,
        write: write
            .map(|name| find_entry_method(module, owner, name, &options.writer_type))
            .transpose()?,
    })
}
