//! Type declarations and type imports.
//!
//! # Key Components
//!
//! - [`TypeDecl`]: A type declared in a module (`TypeDef` table)
//! - [`TypeRefEntry`]: A type imported from another module (`TypeRef` table)
//! - [`TypeAttributes`]: Visibility, layout and semantics flags of a declared type
//! - [`GenericParam`]: A generic parameter of a type or method

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::{signatures::TypeSignature, token::Token};

bitflags! {
    /// Flags of a type declaration (ECMA-335 `TypeAttributes`).
    ///
    /// The visibility bits form an enumeration rather than independent flags, use
    /// [`TypeAttributes::visibility`] to compare them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TypeAttributes: u32 {
        /// Mask for extracting type visibility information
        const VISIBILITY_MASK = 0x0000_0007;
        /// Type has public scope (visible outside assembly)
        const PUBLIC = 0x0000_0001;
        /// Nested type with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// Nested type with private visibility
        const NESTED_PRIVATE = 0x0000_0003;
        /// Nested type with family (protected) visibility
        const NESTED_FAMILY = 0x0000_0004;
        /// Nested type with assembly (internal) visibility
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Nested type with family AND assembly visibility
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Nested type with family OR assembly visibility
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;
        /// Class fields are laid out sequentially in declaration order
        const SEQUENTIAL_LAYOUT = 0x0000_0008;
        /// Field layout is explicitly specified
        const EXPLICIT_LAYOUT = 0x0000_0010;
        /// Type is an interface definition
        const INTERFACE = 0x0000_0020;
        /// Class is abstract and cannot be instantiated directly
        const ABSTRACT = 0x0000_0080;
        /// Class is sealed and cannot be inherited from
        const SEALED = 0x0000_0100;
        /// Type name has special meaning
        const SPECIAL_NAME = 0x0000_0400;
        /// Type is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Initialize the type before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
    }
}

impl TypeAttributes {
    /// Returns only the visibility bits
    #[must_use]
    pub fn visibility(self) -> TypeAttributes {
        self & TypeAttributes::VISIBILITY_MASK
    }

    /// True if the type is an interface
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.contains(TypeAttributes::INTERFACE)
    }

    /// True if the type is abstract (this includes static classes)
    #[must_use]
    pub fn is_abstract(self) -> bool {
        self.contains(TypeAttributes::ABSTRACT)
    }
}

/// A generic parameter of a type or method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParam {
    /// Parameter name, e.g. `T`
    pub name: String,
    /// Type constraints the argument has to satisfy
    pub constraints: Vec<TypeSignature>,
}

impl GenericParam {
    /// Creates an unconstrained generic parameter
    pub fn new(name: impl Into<String>) -> Self {
        GenericParam {
            name: name.into(),
            constraints: Vec::new(),
        }
    }
}

/// A type declared in a module.
///
/// Member lists hold tokens into the owning module's `Field`, `MethodDef` and `Property`
/// tables; the declaration itself does not own the members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// `TypeNamespace` (empty for nested types and the `<Module>` type)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Flags
    pub flags: TypeAttributes,
    /// This types base aka 'extends'
    pub base: Option<TypeSignature>,
    /// The enclosing type, for nested types
    pub enclosing: Option<Token>,
    /// Generic parameters of the type definition
    pub generic_params: Vec<GenericParam>,
    /// All interfaces this type implements
    pub interfaces: Vec<TypeSignature>,
    /// All fields this type has
    pub fields: Vec<Token>,
    /// All methods this type has
    pub methods: Vec<Token>,
    /// All properties this type has
    pub properties: Vec<Token>,
}

impl TypeDecl {
    /// Creates an empty type declaration with the given name and flags
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, flags: TypeAttributes) -> Self {
        TypeDecl {
            namespace: namespace.into(),
            name: name.into(),
            flags,
            base: None,
            enclosing: None,
            generic_params: Vec::new(),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Returns the name as written in a qualified reference (Namespace.Name)
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// Where an imported type lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionScope {
    /// Declared at the top level of the named assembly
    Assembly(String),
    /// Nested inside another imported type (`TypeRef` token)
    Nested(Token),
}

/// A type imported from another module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRefEntry {
    /// Where the type is declared
    pub scope: ResolutionScope,
    /// `TypeNamespace`
    pub namespace: String,
    /// `TypeName`
    pub name: String,
}

impl TypeRefEntry {
    /// Creates a reference to a top-level type of `assembly`
    pub fn new(
        assembly: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeRefEntry {
            scope: ResolutionScope::Assembly(assembly.into()),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}
