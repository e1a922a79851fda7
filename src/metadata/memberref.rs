//! Member references and generic method instantiations.

use serde::{Deserialize, Serialize};

use crate::metadata::{
    signatures::{MemberSignature, TypeSignature},
    token::Token,
};

/// A reference to a method or field by parent type, name and signature.
///
/// Used for members of other modules, and for members of the module's own generic types
/// when they are accessed through an instantiation (`Box<int>::Value`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// The type the member is looked up on
    pub parent: TypeSignature,
    /// Member name
    pub name: String,
    /// Member signature
    pub signature: MemberSignature,
}

impl MemberRef {
    /// True if this references a method
    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(self.signature, MemberSignature::Method(_))
    }
}

/// An instantiation of a generic method with concrete type arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSpec {
    /// The open generic method (`MethodDef` or `MemberRef`)
    pub method: Token,
    /// Type arguments, in generic parameter order
    pub args: Vec<TypeSignature>,
}
