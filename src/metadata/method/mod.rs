//! Method declarations.
//!
//! # Key Types
//! - [`MethodDecl`]: A method declared in a module (`MethodDef` table)
//! - [`Parameter`]: A named, typed parameter with optional default value
//! - [`MethodBody`]: Locals, instructions and [`ExceptionRegion`]s

mod body;
mod exceptions;
mod types;

use serde::{Deserialize, Serialize};

pub use body::MethodBody;
pub use exceptions::{ExceptionHandlerFlags, ExceptionRegion};
pub use types::{MethodAttributes, MethodImplAttributes};

use crate::metadata::{
    constant::Constant,
    signatures::{SignatureMethod, TypeSignature},
    token::Token,
    typesystem::GenericParam,
};

/// Name of instance constructors
pub const CTOR_NAME: &str = ".ctor";
/// Name of type initializers
pub const CCTOR_NAME: &str = ".cctor";

/// A method parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeSignature,
    /// Default value, for optional parameters
    pub default: Option<Constant>,
}

impl Parameter {
    /// Creates a required parameter
    pub fn new(name: impl Into<String>, ty: TypeSignature) -> Self {
        Parameter {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Creates an optional parameter carrying a default value
    pub fn optional(name: impl Into<String>, ty: TypeSignature, default: Constant) -> Self {
        Parameter {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }
}

/// A method declared in a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// The declaring type (`TypeDef` token)
    pub declaring_type: Token,
    /// Attribute flags
    pub flags: MethodAttributes,
    /// Implementation flags
    pub impl_flags: MethodImplAttributes,
    /// Return type
    pub return_type: TypeSignature,
    /// Parameters, in order, excluding `this`
    pub params: Vec<Parameter>,
    /// Generic parameters of the method definition
    pub generic_params: Vec<GenericParam>,
    /// The implementation, absent for abstract and external methods
    pub body: Option<MethodBody>,
    /// Marks methods synthesized by the compiler that produced the module
    pub compiler_generated: bool,
}

impl MethodDecl {
    /// Creates a method without parameters, returning void, without body
    pub fn new(name: impl Into<String>, declaring_type: Token, flags: MethodAttributes) -> Self {
        MethodDecl {
            name: name.into(),
            declaring_type,
            flags,
            impl_flags: MethodImplAttributes::empty(),
            return_type: TypeSignature::Void,
            params: Vec::new(),
            generic_params: Vec::new(),
            body: None,
            compiler_generated: false,
        }
    }

    /// Builds the call signature of this method
    #[must_use]
    pub fn signature(&self) -> SignatureMethod {
        SignatureMethod {
            has_this: self.flags.has_this(),
            param_count_generic: self.generic_params.len() as u32,
            return_type: self.return_type.clone(),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }

    /// True for instance constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == CTOR_NAME && self.flags.has_this()
    }

    /// True if the method looks like a property getter or setter
    #[must_use]
    pub fn is_accessor(&self) -> bool {
        self.flags.contains(MethodAttributes::SPECIAL_NAME)
            && (self.name.starts_with("get_") || self.name.starts_with("set_"))
    }
}
