//! Clone-or-import resolution of types.
//!
//! Types declared in the source module are cloned into the destination as shells: name,
//! flags, nesting, base, interfaces and generic parameters. Members are never copied along
//! with a type, except the constants of an enum. Types imported by the source module are
//! imported by the destination as well, after checking that the declaring module really
//! declares them.

use std::sync::Arc;

use crate::{
    extract::{state::ExternalModule, Closure},
    metadata::{
        builder::DEFAULT_REFERENCE_VERSION,
        module::{AssemblyRef, CompiledModule},
        signatures::{SignatureMethod, TypeSignature},
        token::{TableId, Token},
        typesystem::{GenericParam, ResolutionScope, TypeDecl, TypeRefEntry},
    },
    Error::SymbolUnresolved,
    Result,
};

/// Bound on base-type chains followed across external modules
const MAX_CHAIN_DEPTH: usize = 64;

/// Where a member named through a module-local type is declared
pub(crate) enum Inherited<T> {
    /// Declared by a local type, seen from the referencing type as `via`
    Local { via: TypeSignature, found: T },
    /// No local type declares it; the base chain leaves the module at `via`
    External { via: TypeSignature },
    /// The chain ends without a declaration
    Missing,
}

impl Closure<'_> {
    /// Returns the external module for `assembly`, loading and indexing it on first use
    pub(crate) fn external(&mut self, assembly: &str) -> Option<Arc<ExternalModule>> {
        if let Some(cached) = self.state.externals.get(assembly) {
            return cached.clone();
        }
        let resolved = self
            .resolver
            .resolve(assembly)
            .map(|module| Arc::new(ExternalModule::new(module)));
        if resolved.is_none() {
            log::debug!("External module '{}' could not be located", assembly);
        }
        self.state
            .externals
            .insert(assembly.to_string(), resolved.clone());
        resolved
    }

    /// If `token` names a type of the source module, directly or through an import of the
    /// source module itself, returns its `TypeDef`
    pub(crate) fn local_definition(&self, token: Token) -> Option<Token> {
        let source = self.source;
        if token.is_table(TableId::TypeDef) {
            return Some(token);
        }
        if source.type_ref_assembly(token)? != source.name {
            return None;
        }
        source.find_type_def(&source.type_full_name(token)?)
    }

    /// Follows the base chain of the module-local type `start` until `find` accepts a member
    /// of one of the visited types. Generic arguments are carried down the chain, so `via`
    /// is the declaring type instantiated the way the referencing type sees it.
    pub(crate) fn search_local_chain<T>(
        &self,
        start: &TypeSignature,
        mut find: impl FnMut(Token) -> Option<T>,
    ) -> Inherited<T> {
        let source = self.source;
        let mut current = start.clone();
        for _ in 0..MAX_CHAIN_DEPTH {
            let Some(token) = current.type_token() else {
                return Inherited::Missing;
            };
            let Some(local) = self.local_definition(token) else {
                return Inherited::External { via: current };
            };
            if let Some(found) = find(local) {
                return Inherited::Local { via: current, found };
            }
            let Some(base) = source.type_def(local).and_then(|t| t.base.as_ref()) else {
                return Inherited::Missing;
            };
            let args = match &current {
                TypeSignature::GenericInst(_, args) => args.clone(),
                _ => Vec::new(),
            };
            current = base.substitute(&args);
        }
        Inherited::Missing
    }

    /// Locates the declaration of a type the source module imports
    pub(crate) fn locate_external_type(
        &mut self,
        type_ref: Token,
    ) -> Result<(Arc<ExternalModule>, Token)> {
        let source = self.source;
        let Some(full_name) = source.type_full_name(type_ref) else {
            return Err(malformed_error!("Imported type {} does not exist", type_ref));
        };
        let Some(assembly) = source.type_ref_assembly(type_ref) else {
            return Err(malformed_error!("Imported type {} has no assembly", full_name));
        };
        let Some(external) = self.external(assembly) else {
            return Err(SymbolUnresolved(format!(
                "type {full_name} (assembly '{assembly}' not found)"
            )));
        };
        match external.types.get(&full_name) {
            Some(token) => Ok((external.clone(), *token)),
            None => Err(SymbolUnresolved(format!(
                "type {full_name} (not declared by '{assembly}')"
            ))),
        }
    }

    /// Follows the base chain of an external type until `find` accepts a member of one of
    /// the visited types. The chain may cross into other external modules.
    pub(crate) fn search_external_chain<T>(
        &mut self,
        start: (Arc<ExternalModule>, Token),
        mut find: impl FnMut(&CompiledModule, Token) -> Option<T>,
    ) -> Option<(Arc<ExternalModule>, T)> {
        let (mut external, mut current) = start;
        for _ in 0..MAX_CHAIN_DEPTH {
            if let Some(found) = find(&*external.module, current) {
                return Some((external, found));
            }
            let base = external.module.type_def(current)?.base.as_ref()?.type_token()?;
            if base.is_table(TableId::TypeDef) {
                current = base;
                continue;
            }
            let assembly = external.module.type_ref_assembly(base)?.to_string();
            let name = external.module.type_full_name(base)?;
            let next = self.external(&assembly)?;
            current = *next.types.get(&name)?;
            external = next;
        }
        None
    }

    fn copy_assembly_ref(&mut self, assembly: &str) {
        let reference = self
            .source
            .assembly_ref(assembly)
            .cloned()
            .unwrap_or_else(|| AssemblyRef::new(assembly, DEFAULT_REFERENCE_VERSION));
        self.dest.add_assembly_ref(reference);
    }

    /// Returns the destination type for a source `TypeDef` or `TypeRef`, creating it on
    /// first use
    pub(crate) fn find_or_create_type(&mut self, source_type: Token) -> Result<Token> {
        if let Some(done) = self.state.types.get(&source_type) {
            return Ok(*done);
        }
        match source_type.table_id() {
            Some(TableId::TypeDef) => self.clone_type(source_type),
            Some(TableId::TypeRef) => self.import_type(source_type),
            _ => Err(malformed_error!("Token {} is not a type", source_type)),
        }
    }

    fn clone_type(&mut self, source_type: Token) -> Result<Token> {
        let source = self.source;
        let Some(decl) = source.type_def(source_type) else {
            return Err(malformed_error!("Type {} does not exist", source_type));
        };

        let mut shell = TypeDecl::new(&decl.namespace, &decl.name, decl.flags);
        shell.generic_params = decl
            .generic_params
            .iter()
            .map(|param| GenericParam::new(&param.name))
            .collect();
        let token = self.dest.add_type_def(shell);
        self.state.types.insert(source_type, token);
        log::debug!("Cloned type {} as {}", decl.qualified_name(), token);

        let enclosing = match decl.enclosing {
            Some(outer) => Some(self.find_or_create_type(outer)?),
            None => None,
        };
        let base = decl
            .base
            .as_ref()
            .map(|base| self.resolve_sig(base))
            .transpose()?;
        let interfaces = decl
            .interfaces
            .iter()
            .map(|interface| self.resolve_sig(interface))
            .collect::<Result<Vec<_>>>()?;
        let generic_params = self.resolve_generic_params(&decl.generic_params)?;

        if let Some(target) = self.dest.type_def_mut(token) {
            target.enclosing = enclosing;
            target.base = base;
            target.interfaces = interfaces;
            target.generic_params = generic_params;
        }

        if source.is_enum(source_type) {
            for field in &decl.fields {
                self.find_or_add_field(*field)?;
            }
        }
        Ok(token)
    }

    fn import_type(&mut self, source_type: Token) -> Result<Token> {
        let source = self.source;
        let Some(entry) = source.type_ref(source_type) else {
            return Err(malformed_error!("Imported type {} does not exist", source_type));
        };

        if let Some(local) = self.local_definition(source_type) {
            let token = self.find_or_create_type(local)?;
            self.state.types.insert(source_type, token);
            return Ok(token);
        }

        self.locate_external_type(source_type)?;
        let scope = match &entry.scope {
            ResolutionScope::Assembly(assembly) => {
                self.copy_assembly_ref(assembly);
                ResolutionScope::Assembly(assembly.clone())
            }
            ResolutionScope::Nested(outer) => ResolutionScope::Nested(self.find_or_create_type(*outer)?),
        };
        let token = self.dest.add_type_ref(TypeRefEntry {
            scope,
            namespace: entry.namespace.clone(),
            name: entry.name.clone(),
        });
        self.state.types.insert(source_type, token);
        log::debug!(
            "Imported type {}",
            source.type_full_name(source_type).unwrap_or_default()
        );
        Ok(token)
    }

    pub(crate) fn resolve_generic_params(&mut self, params: &[GenericParam]) -> Result<Vec<GenericParam>> {
        params
            .iter()
            .map(|param| {
                Ok(GenericParam {
                    name: param.name.clone(),
                    constraints: param
                        .constraints
                        .iter()
                        .map(|constraint| self.resolve_sig(constraint))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect()
    }

    /// Translates a source signature into the destination, resolving every named type.
    ///
    /// An imported type that cannot be located becomes `System.Object` unless strict type
    /// resolution is configured.
    pub(crate) fn resolve_sig(&mut self, sig: &TypeSignature) -> Result<TypeSignature> {
        Ok(match sig {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                match self.find_or_create_type(*token) {
                    Ok(resolved) if matches!(sig, TypeSignature::Class(_)) => {
                        TypeSignature::Class(resolved)
                    }
                    Ok(resolved) => TypeSignature::ValueType(resolved),
                    Err(SymbolUnresolved(reason))
                        if !self.options.strict_types && token.is_table(TableId::TypeRef) =>
                    {
                        if self.state.fallbacks.insert(*token) {
                            log::warn!("Using System.Object in place of unresolvable {}", reason);
                        }
                        TypeSignature::Object
                    }
                    Err(error) => return Err(error),
                }
            }
            TypeSignature::GenericInst(base, args) => TypeSignature::GenericInst(
                Box::new(self.resolve_sig(base)?),
                args.iter()
                    .map(|arg| self.resolve_sig(arg))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeSignature::SzArray(inner) => TypeSignature::SzArray(Box::new(self.resolve_sig(inner)?)),
            TypeSignature::ByRef(inner) => TypeSignature::ByRef(Box::new(self.resolve_sig(inner)?)),
            TypeSignature::Ptr(inner) => TypeSignature::Ptr(Box::new(self.resolve_sig(inner)?)),
            other => other.clone(),
        })
    }

    /// Translates every type of a method signature into the destination
    pub(crate) fn resolve_method_sig(&mut self, sig: &SignatureMethod) -> Result<SignatureMethod> {
        Ok(SignatureMethod {
            has_this: sig.has_this,
            param_count_generic: sig.param_count_generic,
            return_type: self.resolve_sig(&sig.return_type)?,
            params: sig
                .params
                .iter()
                .map(|param| self.resolve_sig(param))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}
