//! # Method Body Validation
//!
//! Checks the parts of a method that a loader touches first:
//!
//! - **Operands**: method operands point at `MethodDef`, method `MemberRef` or `MethodSpec`
//!   rows, field operands at `Field` or field `MemberRef` rows, type operands resolve
//! - **Labels**: branch and switch targets lie inside the instruction stream
//! - **Exception Regions**: boundaries are ordered and lie within the body (an end boundary
//!   may equal the instruction count)
//! - **Abstract Methods**: abstract methods carry no body

use crate::{
    assembly::Operand,
    metadata::{
        memberref::MemberRef,
        method::{MethodAttributes, MethodBody, MethodDecl},
        module::CompiledModule,
        token::{TableId, Token},
        validation::TokenValidator,
    },
};

/// Validator for method bodies
pub struct MethodValidator;

impl MethodValidator {
    /// Validates the bodies of every method in `module`
    ///
    /// # Returns
    /// Vector of validation errors found
    pub fn validate_bodies(module: &CompiledModule) -> Vec<String> {
        let mut errors = Vec::new();

        for (token, method) in module.methods() {
            let context = match module.method_full_name(token) {
                Some(name) => format!("Method '{name}'"),
                None => format!("Method {token}"),
            };
            Self::validate_abstract(method, &context, &mut errors);
            if let Some(body) = &method.body {
                Self::validate_operands(module, body, &context, &mut errors);
                Self::validate_labels(body, &context, &mut errors);
                Self::validate_regions(module, body, &context, &mut errors);
            }
        }

        errors
    }

    fn validate_abstract(method: &MethodDecl, context: &str, errors: &mut Vec<String>) {
        if method.flags.contains(MethodAttributes::ABSTRACT) && method.body.is_some() {
            errors.push(format!("{context} is abstract but has a body"));
        }
    }

    fn is_method_token(module: &CompiledModule, token: Token) -> bool {
        match token.table_id() {
            Some(TableId::MethodDef) => module.method(token).is_some(),
            Some(TableId::MemberRef) => module.member_ref(token).is_some_and(MemberRef::is_method),
            Some(TableId::MethodSpec) => module.method_spec(token).is_some(),
            _ => false,
        }
    }

    fn is_field_token(module: &CompiledModule, token: Token) -> bool {
        match token.table_id() {
            Some(TableId::Field) => module.field(token).is_some(),
            Some(TableId::MemberRef) => module.member_ref(token).is_some_and(|m| !m.is_method()),
            _ => false,
        }
    }

    fn validate_operands(
        module: &CompiledModule,
        body: &MethodBody,
        context: &str,
        errors: &mut Vec<String>,
    ) {
        for local in &body.locals {
            TokenValidator::check_signature(module, local, context, errors);
        }
        for (position, instruction) in body.instructions.iter().enumerate() {
            match &instruction.operand {
                Operand::Method(token) if !Self::is_method_token(module, *token) => {
                    errors.push(format!(
                        "{context} IL_{position:04} calls missing method {token}"
                    ));
                }
                Operand::Field(token) if !Self::is_field_token(module, *token) => {
                    errors.push(format!(
                        "{context} IL_{position:04} accesses missing field {token}"
                    ));
                }
                Operand::Type(sig) => {
                    let at = format!("{context} IL_{position:04}");
                    TokenValidator::check_signature(module, sig, &at, errors);
                }
                _ => {}
            }
        }
    }

    fn validate_labels(body: &MethodBody, context: &str, errors: &mut Vec<String>) {
        let len = body.len() as u32;
        for (position, instruction) in body.instructions.iter().enumerate() {
            for target in instruction.branch_targets() {
                if target >= len {
                    errors.push(format!(
                        "{context} IL_{position:04} branches outside the body to IL_{target:04}"
                    ));
                }
            }
        }
    }

    fn validate_regions(
        module: &CompiledModule,
        body: &MethodBody,
        context: &str,
        errors: &mut Vec<String>,
    ) {
        let len = body.len() as u32;
        for region in &body.exception_regions {
            if region.positions().iter().any(|p| *p > len) {
                errors.push(format!("{context} has an exception region outside the body"));
            }
            if region.try_start > region.try_end || region.handler_start > region.handler_end {
                errors.push(format!("{context} has an exception region with reversed bounds"));
            }
            if let Some(catch_type) = &region.catch_type {
                TokenValidator::check_signature(module, catch_type, context, errors);
            }
        }
    }
}
