use serde::{Deserialize, Serialize};

use crate::metadata::token::Token;

/// Represents a type as it appears in signatures, operands and declarations.
///
/// Named types are referenced through a [`Token`] that points either at a `TypeDef`
/// (declared in the same module) or a `TypeRef` (imported from another module).
/// Primitive element types need no token; they are provided by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSignature {
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// CIL Class
    // TypeDef | TypeRef
    Class(Token),
    /// CIL value-type
    // TypeDef | TypeRef
    ValueType(Token),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Generic type parameter
    GenericParamType(u32),
    /// Generic method parameter
    GenericParamMethod(u32),
    /// Single dimension array
    SzArray(Box<TypeSignature>),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// A pointer to a type
    Ptr(Box<TypeSignature>),
}

impl TypeSignature {
    /// Returns the token of the named type this signature is built around, if any.
    ///
    /// For `Class`/`ValueType` this is the referenced type, for a generic instantiation it is
    /// the open generic definition. Arrays, pointers and by-refs are not unwrapped.
    #[must_use]
    pub fn type_token(&self) -> Option<Token> {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => Some(*token),
            TypeSignature::GenericInst(base, _) => base.type_token(),
            _ => None,
        }
    }

    /// Returns true for the element types that need no token to be resolved
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSignature::Void
                | TypeSignature::Boolean
                | TypeSignature::Char
                | TypeSignature::I1
                | TypeSignature::U1
                | TypeSignature::I2
                | TypeSignature::U2
                | TypeSignature::I4
                | TypeSignature::U4
                | TypeSignature::I8
                | TypeSignature::U8
                | TypeSignature::R4
                | TypeSignature::R8
                | TypeSignature::I
                | TypeSignature::U
                | TypeSignature::String
                | TypeSignature::Object
        )
    }

    /// Replaces generic type parameters (`!n`) with the matching entry of `args`.
    ///
    /// Parameters without a matching argument are kept as they are.
    #[must_use]
    pub fn substitute(&self, args: &[TypeSignature]) -> TypeSignature {
        match self {
            TypeSignature::GenericParamType(index) => args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSignature::GenericInst(base, inner) => TypeSignature::GenericInst(
                Box::new(base.substitute(args)),
                inner.iter().map(|arg| arg.substitute(args)).collect(),
            ),
            TypeSignature::SzArray(inner) => TypeSignature::SzArray(Box::new(inner.substitute(args))),
            TypeSignature::ByRef(inner) => TypeSignature::ByRef(Box::new(inner.substitute(args))),
            TypeSignature::Ptr(inner) => TypeSignature::Ptr(Box::new(inner.substitute(args))),
            _ => self.clone(),
        }
    }

    /// Visits every token referenced by this signature, depth first
    pub fn for_each_token(&self, f: &mut impl FnMut(Token)) {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => f(*token),
            TypeSignature::GenericInst(base, args) => {
                base.for_each_token(f);
                for arg in args {
                    arg.for_each_token(f);
                }
            }
            TypeSignature::SzArray(inner) | TypeSignature::ByRef(inner) | TypeSignature::Ptr(inner) => {
                inner.for_each_token(f);
            }
            _ => {}
        }
    }
}

/// A method signature as carried by member references and method declarations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureMethod {
    /// Used to encode the keyword instance in the calling convention
    pub has_this: bool,
    /// Number of generic parameters of the method
    pub param_count_generic: u32,
    /// The return type
    pub return_type: TypeSignature,
    /// The parameter types, in order
    pub params: Vec<TypeSignature>,
}

impl SignatureMethod {
    /// Replaces generic type parameters in the return and parameter types
    #[must_use]
    pub fn substitute(&self, args: &[TypeSignature]) -> SignatureMethod {
        SignatureMethod {
            has_this: self.has_this,
            param_count_generic: self.param_count_generic,
            return_type: self.return_type.substitute(args),
            params: self.params.iter().map(|p| p.substitute(args)).collect(),
        }
    }
}

/// The signature stored with a member reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberSignature {
    /// The member is a method
    Method(SignatureMethod),
    /// The member is a field of the given type
    Field(TypeSignature),
}
