//! Property declarations.

use serde::{Deserialize, Serialize};

use crate::metadata::{signatures::TypeSignature, token::Token};

/// A property declared in a module.
///
/// Accessors are back-references into the `MethodDef` table; the methods are owned by the
/// declaring type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Property name
    pub name: String,
    /// The declaring type (`TypeDef` token)
    pub declaring_type: Token,
    /// Property type
    pub ty: TypeSignature,
    /// The getter, if any
    pub getter: Option<Token>,
    /// The setter, if any
    pub setter: Option<Token>,
}
