//! Per-attempt memo tables and the derived-type index.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::metadata::{
    module::CompiledModule,
    signatures::TypeSignature,
    token::Token,
};

/// How a derived type is attached to its base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    /// `extends`
    Base,
    /// `implements`
    Interface,
}

/// A direct subtype within the source module
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DerivedEdge {
    /// The deriving `TypeDef` of the source module
    pub child: Token,
    /// Generic arguments the child passes to its base, in the child's context
    pub args: Vec<TypeSignature>,
    /// Whether the base is extended or implemented
    pub kind: EdgeKind,
}

/// Maps every base type and interface, by full name, to its direct subtypes in the source
/// module. Bases may be external. Only declared bases are indexed: a type without a base
/// is nobody's child, not even `System.Object`'s.
#[derive(Debug, Default)]
pub(crate) struct DerivedTypeIndex {
    children: FxHashMap<String, Vec<DerivedEdge>>,
}

impl DerivedTypeIndex {
    pub(crate) fn build(source: &CompiledModule) -> Self {
        let mut index = DerivedTypeIndex::default();
        for (token, decl) in source.type_defs() {
            if let Some(base) = &decl.base {
                index.insert(source, token, base, EdgeKind::Base);
            }
            for interface in &decl.interfaces {
                index.insert(source, token, interface, EdgeKind::Interface);
            }
        }
        log::debug!(
            "Indexed {} base types of '{}'",
            index.children.len(),
            source.name
        );
        index
    }

    fn insert(
        &mut self,
        source: &CompiledModule,
        child: Token,
        base: &TypeSignature,
        kind: EdgeKind,
    ) {
        let Some(name) = source.signature_type_name(base) else {
            return;
        };
        let args = match base {
            TypeSignature::GenericInst(_, args) => args.clone(),
            _ => Vec::new(),
        };
        self.children
            .entry(name)
            .or_default()
            .push(DerivedEdge { child, args, kind });
    }

    /// Direct subtypes of the type with the given full name
    pub(crate) fn children(&self, base: &str) -> &[DerivedEdge] {
        self.children.get(base).map(Vec::as_slice).unwrap_or_default()
    }
}

/// An external module with a name index over its types
pub(crate) struct ExternalModule {
    pub module: Arc<CompiledModule>,
    pub types: FxHashMap<String, Token>,
}

impl ExternalModule {
    pub(crate) fn new(module: Arc<CompiledModule>) -> Self {
        let types = module
            .type_defs()
            .filter_map(|(token, _)| module.type_full_name(token).map(|name| (name, token)))
            .collect();
        ExternalModule { module, types }
    }
}

/// Memo tables of one extraction attempt, keyed by source token.
///
/// An entry is inserted as soon as the destination shell exists, before anything the
/// entity refers to is resolved; a cycle therefore ends at the memo lookup.
#[derive(Default)]
pub(crate) struct ClosureState {
    pub types: FxHashMap<Token, Token>,
    pub methods: FxHashMap<Token, Token>,
    pub fields: FxHashMap<Token, Token>,
    /// External types already reported as replaced by `System.Object`
    pub fallbacks: FxHashSet<Token>,
    /// External modules by assembly name, `None` if the resolver could not locate one
    pub externals: FxHashMap<String, Option<Arc<ExternalModule>>>,
}
