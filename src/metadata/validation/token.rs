//! Reference validation for module tables
//!
//! Every token stored in a table has to point at an existing row of the right table, and
//! every imported type has to name a dependency that is listed in the module.

use crate::metadata::{
    memberref::MemberRef,
    module::CompiledModule,
    signatures::{MemberSignature, SignatureMethod, TypeSignature},
    token::{TableId, Token},
    typesystem::{GenericParam, ResolutionScope},
};

/// Validator for cross-references between tables
pub struct TokenValidator;

impl TokenValidator {
    /// Validates every table-level reference of `module`
    ///
    /// # Returns
    /// Vector of validation errors found
    pub fn validate_references(module: &CompiledModule) -> Vec<String> {
        let mut errors = Vec::new();

        Self::validate_type_defs(module, &mut errors);
        Self::validate_type_refs(module, &mut errors);
        Self::validate_members(module, &mut errors);
        Self::validate_imports(module, &mut errors);
        Self::validate_markers(module, &mut errors);

        errors
    }

    /// Checks that every type token inside `sig` resolves to a `TypeDef` or `TypeRef` row
    pub(crate) fn check_signature(
        module: &CompiledModule,
        sig: &TypeSignature,
        context: &str,
        errors: &mut Vec<String>,
    ) {
        sig.for_each_token(&mut |token| {
            let is_type = token.is_table(TableId::TypeDef) || token.is_table(TableId::TypeRef);
            if !is_type || !module.contains(token) {
                errors.push(format!("{context} references missing type {token}"));
            }
        });
    }

    fn check_generic_params(
        module: &CompiledModule,
        params: &[GenericParam],
        context: &str,
        errors: &mut Vec<String>,
    ) {
        for param in params {
            for constraint in &param.constraints {
                Self::check_signature(module, constraint, context, errors);
            }
        }
    }

    fn check_owned(
        module: &CompiledModule,
        owner: Token,
        members: &[Token],
        context: &str,
        errors: &mut Vec<String>,
    ) {
        for member in members {
            let declared_by = match member.table_id() {
                Some(TableId::Field) => module.field(*member).map(|f| f.declaring_type),
                Some(TableId::MethodDef) => module.method(*member).map(|m| m.declaring_type),
                Some(TableId::Property) => module.property(*member).map(|p| p.declaring_type),
                _ => None,
            };
            match declared_by {
                None => errors.push(format!("{context} lists missing member {member}")),
                Some(declared_by) if declared_by != owner => errors.push(format!(
                    "{context} lists member {member} declared by {declared_by}"
                )),
                Some(_) => {}
            }
        }
    }

    /// Two methods of one type may not share name and signature, nor two fields name and type
    fn check_duplicates(
        module: &CompiledModule,
        methods: &[Token],
        fields: &[Token],
        context: &str,
        errors: &mut Vec<String>,
    ) {
        let mut seen: Vec<(&str, SignatureMethod)> = Vec::new();
        for method in methods.iter().filter_map(|token| module.method(*token)) {
            let key = (method.name.as_str(), method.signature());
            if seen.contains(&key) {
                errors.push(format!(
                    "{context} declares method '{}' twice with the same signature",
                    method.name
                ));
            } else {
                seen.push(key);
            }
        }

        let mut seen: Vec<(&str, &TypeSignature)> = Vec::new();
        for field in fields.iter().filter_map(|token| module.field(*token)) {
            let key = (field.name.as_str(), &field.ty);
            if seen.contains(&key) {
                errors.push(format!("{context} declares field '{}' twice", field.name));
            } else {
                seen.push(key);
            }
        }
    }

    fn validate_type_defs(module: &CompiledModule, errors: &mut Vec<String>) {
        for (token, decl) in module.type_defs() {
            let context = format!("Type '{}'", decl.qualified_name());
            if let Some(base) = &decl.base {
                Self::check_signature(module, base, &context, errors);
            }
            if let Some(outer) = decl.enclosing {
                if module.type_def(outer).is_none() {
                    errors.push(format!("{context} is nested in missing type {outer}"));
                }
            }
            for interface in &decl.interfaces {
                Self::check_signature(module, interface, &context, errors);
            }
            Self::check_generic_params(module, &decl.generic_params, &context, errors);
            Self::check_owned(module, token, &decl.fields, &context, errors);
            Self::check_owned(module, token, &decl.methods, &context, errors);
            Self::check_owned(module, token, &decl.properties, &context, errors);
            Self::check_duplicates(module, &decl.methods, &decl.fields, &context, errors);
        }
    }

    fn validate_type_refs(module: &CompiledModule, errors: &mut Vec<String>) {
        for (token, entry) in module.type_refs() {
            match &entry.scope {
                ResolutionScope::Assembly(name) => {
                    if module.assembly_ref(name).is_none() {
                        errors.push(format!(
                            "Imported type '{}' ({token}) names unlisted dependency '{name}'",
                            entry.name
                        ));
                    }
                }
                ResolutionScope::Nested(outer) => {
                    if module.type_ref(*outer).is_none() {
                        errors.push(format!(
                            "Imported type '{}' ({token}) is nested in missing import {outer}",
                            entry.name
                        ));
                    }
                }
            }
        }
    }

    fn validate_members(module: &CompiledModule, errors: &mut Vec<String>) {
        for (_, field) in module.fields() {
            let context = format!("Field '{}'", field.name);
            if module.type_def(field.declaring_type).is_none() {
                errors.push(format!("{context} has missing declaring type"));
            }
            Self::check_signature(module, &field.ty, &context, errors);
        }

        for (_, method) in module.methods() {
            let context = format!("Method '{}'", method.name);
            if module.type_def(method.declaring_type).is_none() {
                errors.push(format!("{context} has missing declaring type"));
            }
            Self::check_signature(module, &method.return_type, &context, errors);
            for param in &method.params {
                Self::check_signature(module, &param.ty, &context, errors);
            }
            Self::check_generic_params(module, &method.generic_params, &context, errors);
        }

        for (_, property) in module.properties() {
            let context = format!("Property '{}'", property.name);
            Self::check_signature(module, &property.ty, &context, errors);
            for accessor in property.getter.iter().chain(property.setter.iter()) {
                if module.method(*accessor).is_none() {
                    errors.push(format!("{context} links missing accessor {accessor}"));
                }
            }
        }
    }

    fn check_member_ref(module: &CompiledModule, member: &MemberRef, errors: &mut Vec<String>) {
        let context = format!("Member reference '{}'", member.name);
        Self::check_signature(module, &member.parent, &context, errors);
        match &member.signature {
            MemberSignature::Method(sig) => {
                Self::check_signature(module, &sig.return_type, &context, errors);
                for param in &sig.params {
                    Self::check_signature(module, param, &context, errors);
                }
            }
            MemberSignature::Field(ty) => Self::check_signature(module, ty, &context, errors),
        }
    }

    fn validate_imports(module: &CompiledModule, errors: &mut Vec<String>) {
        for (_, member) in module.member_refs() {
            Self::check_member_ref(module, member, errors);
        }
        for (token, spec) in module.method_specs() {
            let context = format!("Method instantiation {token}");
            let is_method = spec.method.is_table(TableId::MethodDef)
                || module.member_ref(spec.method).is_some_and(MemberRef::is_method);
            if !is_method || !module.contains(spec.method) {
                errors.push(format!("{context} instantiates missing method {}", spec.method));
            }
            for arg in &spec.args {
                Self::check_signature(module, arg, &context, errors);
            }
        }
    }

    fn validate_markers(module: &CompiledModule, errors: &mut Vec<String>) {
        let markers = module.markers;
        if let Some(entry_type) = markers.entry_type {
            if module.type_def(entry_type).is_none() {
                errors.push(format!("Entry type marker points at missing type {entry_type}"));
            }
        }
        for (label, marker) in [("read", markers.read), ("write", markers.write)] {
            if let Some(method) = marker {
                if module.method(method).is_none() {
                    errors.push(format!("The {label} marker points at missing method {method}"));
                }
            }
        }
    }
}
