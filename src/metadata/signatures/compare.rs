//! Structural comparison of signatures that may belong to different modules.
//!
//! Tokens are only meaningful inside their own module, so named types are compared by full
//! name. `System.Object` and `System.String` compare equal to their primitive shorthand.

use crate::metadata::{
    module::CompiledModule,
    signatures::{SignatureMethod, TypeSignature},
    token::Token,
};

fn shorthand_matches(module: &CompiledModule, token: Token, full_name: &str) -> bool {
    module.type_full_name(token).as_deref() == Some(full_name)
}

/// Returns true if `a` (in `a_module`) and `b` (in `b_module`) denote the same type
#[must_use]
pub fn types_equivalent(
    a_module: &CompiledModule,
    a: &TypeSignature,
    b_module: &CompiledModule,
    b: &TypeSignature,
) -> bool {
    match (a, b) {
        (TypeSignature::Class(x), TypeSignature::Class(y))
        | (TypeSignature::ValueType(x), TypeSignature::ValueType(y)) => {
            let left = a_module.type_full_name(*x);
            left.is_some() && left == b_module.type_full_name(*y)
        }
        (TypeSignature::Object, TypeSignature::Class(y)) => {
            shorthand_matches(b_module, *y, "System.Object")
        }
        (TypeSignature::Class(x), TypeSignature::Object) => {
            shorthand_matches(a_module, *x, "System.Object")
        }
        (TypeSignature::String, TypeSignature::Class(y)) => {
            shorthand_matches(b_module, *y, "System.String")
        }
        (TypeSignature::Class(x), TypeSignature::String) => {
            shorthand_matches(a_module, *x, "System.String")
        }
        (TypeSignature::GenericInst(a_base, a_args), TypeSignature::GenericInst(b_base, b_args)) => {
            a_args.len() == b_args.len()
                && types_equivalent(a_module, a_base, b_module, b_base)
                && a_args
                    .iter()
                    .zip(b_args)
                    .all(|(x, y)| types_equivalent(a_module, x, b_module, y))
        }
        (TypeSignature::SzArray(x), TypeSignature::SzArray(y))
        | (TypeSignature::ByRef(x), TypeSignature::ByRef(y))
        | (TypeSignature::Ptr(x), TypeSignature::Ptr(y)) => {
            types_equivalent(a_module, x, b_module, y)
        }
        _ => a == b,
    }
}

/// Returns true if two method signatures have the same shape and equivalent types
#[must_use]
pub fn methods_equivalent(
    a_module: &CompiledModule,
    a: &SignatureMethod,
    b_module: &CompiledModule,
    b: &SignatureMethod,
) -> bool {
    a.has_this == b.has_this
        && a.param_count_generic == b.param_count_generic
        && a.params.len() == b.params.len()
        && types_equivalent(a_module, &a.return_type, b_module, &b.return_type)
        && a.params
            .iter()
            .zip(&b.params)
            .all(|(x, y)| types_equivalent(a_module, x, b_module, y))
}
