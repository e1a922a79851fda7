//! Field declarations.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::{constant::Constant, signatures::TypeSignature, token::Token};

bitflags! {
    /// Field attribute flags (ECMA-335 `FieldAttributes`).
    ///
    /// The low three bits are an access enumeration; compare [`FieldAttributes::access`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FieldAttributes: u16 {
        /// These 3 bits contain the access level
        const FIELD_ACCESS_MASK = 0x0007;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is compile time constant
        const LITERAL = 0x0040;
        /// Field should not be serialized when type is remoted
        const NOT_SERIALIZED = 0x0080;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
        /// CLI provides 'special' behavior, depending upon the name of the field
        const RT_SPECIAL_NAME = 0x0400;
        /// Field has default
        const HAS_DEFAULT = 0x8000;
    }
}

impl FieldAttributes {
    /// Extract the access enumeration
    #[must_use]
    pub fn access(self) -> FieldAttributes {
        self & FieldAttributes::FIELD_ACCESS_MASK
    }

    /// True if the access is public
    #[must_use]
    pub fn is_public(self) -> bool {
        self.access() == FieldAttributes::PUBLIC
    }

    /// Returns the flags with the access enumeration replaced by `access`
    #[must_use]
    pub fn with_access(self, access: FieldAttributes) -> FieldAttributes {
        (self - FieldAttributes::FIELD_ACCESS_MASK) | access.access()
    }
}

/// A field declared in a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// The declaring type (`TypeDef` token)
    pub declaring_type: Token,
    /// Attribute flags
    pub flags: FieldAttributes,
    /// Field type
    pub ty: TypeSignature,
    /// Value of literal fields
    pub constant: Option<Constant>,
    /// Marks synthesized storage, such as the backing field of an auto-property
    pub compiler_generated: bool,
}

impl FieldDecl {
    /// Creates a field without constant value
    pub fn new(
        name: impl Into<String>,
        declaring_type: Token,
        flags: FieldAttributes,
        ty: TypeSignature,
    ) -> Self {
        FieldDecl {
            name: name.into(),
            declaring_type,
            flags,
            ty,
            constant: None,
            compiler_generated: false,
        }
    }
}
