//! Substitution of unresolvable logging calls.
//!
//! Third party modules often call into logging helpers that live in assemblies nobody ships
//! along with them. An unresolvable static call that takes a single reference and returns
//! nothing can be redirected to a print routine without changing the stack shape. Instance
//! calls leave their receiver behind and value arguments would reach it unboxed, so neither
//! qualifies.

use crate::{
    extract::Closure,
    metadata::{
        builder::DEFAULT_REFERENCE_VERSION,
        memberref::MemberRef,
        module::AssemblyRef,
        signatures::{MemberSignature, SignatureMethod, TypeSignature},
        token::Token,
        typesystem::TypeRefEntry,
    },
};

/// Decides which unresolvable calls may be replaced by the stub target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StubPolicy {
    /// Replace calls whose method or declaring type name contains `Log`
    #[default]
    Heuristic,
    /// Replace only the listed methods, written `Namespace.Type::Method`
    AllowList(Vec<String>),
    /// Never replace anything
    Disabled,
}

impl StubPolicy {
    /// Returns true if a call to `type_name::method_name` with `signature` may be stubbed.
    ///
    /// `type_name` is the full name of the declaring type. Only static methods taking one
    /// reference and returning void qualify, whatever the policy.
    #[must_use]
    pub fn permits(&self, type_name: &str, method_name: &str, signature: &SignatureMethod) -> bool {
        let [param] = signature.params.as_slice() else {
            return false;
        };
        if signature.has_this
            || signature.return_type != TypeSignature::Void
            || !is_reference(param)
        {
            return false;
        }
        match self {
            StubPolicy::Heuristic => {
                let simple_type = type_name.rsplit(['.', '/']).next().unwrap_or(type_name);
                method_name.contains("Log") || simple_type.contains("Log")
            }
            StubPolicy::AllowList(names) => {
                let qualified = format!("{type_name}::{method_name}");
                names.iter().any(|name| *name == qualified)
            }
            StubPolicy::Disabled => false,
        }
    }
}

/// True if values of `ty` can be passed where an `object` is expected without boxing
fn is_reference(ty: &TypeSignature) -> bool {
    match ty {
        TypeSignature::String
        | TypeSignature::Object
        | TypeSignature::Class(_)
        | TypeSignature::SzArray(_) => true,
        TypeSignature::GenericInst(definition, _) => {
            matches!(**definition, TypeSignature::Class(_))
        }
        _ => false,
    }
}

/// The static method unresolvable logging calls are redirected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubTarget {
    /// Assembly declaring the target
    pub assembly: String,
    /// Namespace of the declaring type
    pub namespace: String,
    /// Name of the declaring type
    pub type_name: String,
    /// Method name; the method takes one `object` and returns void
    pub method: String,
}

impl Default for StubTarget {
    fn default() -> Self {
        StubTarget {
            assembly: "System.Console".to_string(),
            namespace: "System".to_string(),
            type_name: "Console".to_string(),
            method: "WriteLine".to_string(),
        }
    }
}

impl Closure<'_> {
    /// Imports the stub target into the destination, returning its member reference
    pub(crate) fn import_stub(&mut self) -> Token {
        let target = &self.options.stub_target;
        self.dest
            .add_assembly_ref(AssemblyRef::new(&target.assembly, DEFAULT_REFERENCE_VERSION));
        let console = self.dest.add_type_ref(TypeRefEntry::new(
            &target.assembly,
            &target.namespace,
            &target.type_name,
        ));
        self.dest.add_member_ref(MemberRef {
            parent: TypeSignature::Class(console),
            name: target.method.clone(),
            signature: MemberSignature::Method(SignatureMethod {
                has_this: false,
                param_count_generic: 0,
                return_type: TypeSignature::Void,
                params: vec![TypeSignature::Object],
            }),
        })
    }

    /// Replaces the unresolvable method reference `source_ref` with the stub target if the
    /// configured policy allows it
    pub(crate) fn try_stub(&mut self, source_ref: Token) -> Option<Token> {
        let source = self.source;
        let member = source.member_ref(source_ref)?;
        let MemberSignature::Method(signature) = &member.signature else {
            return None;
        };
        let type_name = source.signature_type_name(&member.parent)?;
        if !self
            .options
            .stub_policy
            .permits(&type_name, &member.name, signature)
        {
            return None;
        }

        let stub = self.import_stub();
        log::warn!(
            "Replacing unresolvable call to {}::{} with {}.{}::{}",
            type_name,
            member.name,
            self.options.stub_target.namespace,
            self.options.stub_target.type_name,
            self.options.stub_target.method
        );
        Some(stub)
    }
}
