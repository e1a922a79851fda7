//! The compiled module container.
//!
//! [`CompiledModule`] is an arena of metadata tables addressed by [`Token`]. Rows are never
//! removed, so a token handed out by one of the `add_*` methods stays valid for the lifetime
//! of the module. Imports (`TypeRef`, `MemberRef`, `MethodSpec`, assembly references) are
//! deduplicated structurally when added.

use std::fmt;

use serde::{Deserialize, Serialize};
use uguid::Guid;

use crate::{
    metadata::{
        field::FieldDecl,
        memberref::{MemberRef, MethodSpec},
        method::MethodDecl,
        property::PropertyDecl,
        signatures::TypeSignature,
        token::{TableId, Token},
        typesystem::{ResolutionScope, TypeDecl, TypeRefEntry},
    },
    Result,
};

/// Name of the pseudo type that holds module-level globals
pub const MODULE_TYPE_NAME: &str = "<Module>";

/// Nesting chains are short, a longer one is a cycle
const MAX_NESTING_DEPTH: usize = 64;

/// A four part version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Version {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl Version {
    /// Creates a version from its four parts
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Version {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// An entry of the dependency table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssemblyRef {
    /// Simple assembly name
    pub name: String,
    /// Referenced version
    pub version: Version,
}

impl AssemblyRef {
    /// Creates a dependency entry
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        AssemblyRef {
            name: name.into(),
            version,
        }
    }
}

/// The facts a consumer of an extracted module needs to find its entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryMarkers {
    /// The type holding the entry methods (`TypeDef`)
    pub entry_type: Option<Token>,
    /// The method that reads from an input cursor (`MethodDef`)
    pub read: Option<Token>,
    /// The method that writes to an output cursor (`MethodDef`)
    pub write: Option<Token>,
}

/// A container of type, method and field declarations plus the imports they use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledModule {
    /// Simple name of the module's assembly
    pub name: String,
    /// Assembly version
    pub version: Version,
    mvid: [u8; 16],
    /// The dependency table
    pub assembly_refs: Vec<AssemblyRef>,
    /// Entry point markers
    pub markers: EntryMarkers,
    type_defs: Vec<TypeDecl>,
    type_refs: Vec<TypeRefEntry>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    member_refs: Vec<MemberRef>,
    properties: Vec<PropertyDecl>,
    method_specs: Vec<MethodSpec>,
}

fn row_index(token: Token, table: TableId) -> Option<usize> {
    if token.is_table(table) && token.row() > 0 {
        Some(token.row() as usize - 1)
    } else {
        None
    }
}

fn next_token(table: TableId, len: usize) -> Token {
    Token::from_parts(table, len as u32 + 1)
}

impl CompiledModule {
    /// Creates an empty module
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        CompiledModule {
            name: name.into(),
            version,
            mvid: [0; 16],
            assembly_refs: Vec::new(),
            markers: EntryMarkers::default(),
            type_defs: Vec::new(),
            type_refs: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            member_refs: Vec::new(),
            properties: Vec::new(),
            method_specs: Vec::new(),
        }
    }

    /// The module version id
    #[must_use]
    pub fn mvid(&self) -> Guid {
        Guid::from_bytes(self.mvid)
    }

    /// Replaces the module version id
    pub fn set_mvid(&mut self, mvid: Guid) {
        self.mvid = mvid.to_bytes();
    }

    /// Returns true if `token` points at an existing row of a modelled table
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        let len = match token.table_id() {
            Some(TableId::TypeDef) => self.type_defs.len(),
            Some(TableId::TypeRef) => self.type_refs.len(),
            Some(TableId::Field) => self.fields.len(),
            Some(TableId::MethodDef) => self.methods.len(),
            Some(TableId::MemberRef) => self.member_refs.len(),
            Some(TableId::Property) => self.properties.len(),
            Some(TableId::MethodSpec) => self.method_specs.len(),
            None => return false,
        };
        token.row() > 0 && token.row() as usize <= len
    }

    // Type definitions

    /// Looks up a declared type
    #[must_use]
    pub fn type_def(&self, token: Token) -> Option<&TypeDecl> {
        row_index(token, TableId::TypeDef).and_then(|i| self.type_defs.get(i))
    }

    /// Looks up a declared type for modification
    pub fn type_def_mut(&mut self, token: Token) -> Option<&mut TypeDecl> {
        row_index(token, TableId::TypeDef).and_then(|i| self.type_defs.get_mut(i))
    }

    /// Iterates all declared types with their tokens
    pub fn type_defs(&self) -> impl Iterator<Item = (Token, &TypeDecl)> {
        self.type_defs
            .iter()
            .enumerate()
            .map(|(i, t)| (Token::from_parts(TableId::TypeDef, i as u32 + 1), t))
    }

    /// Number of declared types
    #[must_use]
    pub fn type_def_count(&self) -> usize {
        self.type_defs.len()
    }

    /// Appends a type declaration and returns its token
    pub fn add_type_def(&mut self, decl: TypeDecl) -> Token {
        let token = next_token(TableId::TypeDef, self.type_defs.len());
        self.type_defs.push(decl);
        token
    }

    // Type references

    /// Looks up an imported type
    #[must_use]
    pub fn type_ref(&self, token: Token) -> Option<&TypeRefEntry> {
        row_index(token, TableId::TypeRef).and_then(|i| self.type_refs.get(i))
    }

    /// Iterates all imported types with their tokens
    pub fn type_refs(&self) -> impl Iterator<Item = (Token, &TypeRefEntry)> {
        self.type_refs
            .iter()
            .enumerate()
            .map(|(i, t)| (Token::from_parts(TableId::TypeRef, i as u32 + 1), t))
    }

    /// Adds a type import, reusing an identical existing one
    pub fn add_type_ref(&mut self, entry: TypeRefEntry) -> Token {
        if let Some(pos) = self.type_refs.iter().position(|e| *e == entry) {
            return Token::from_parts(TableId::TypeRef, pos as u32 + 1);
        }
        let token = next_token(TableId::TypeRef, self.type_refs.len());
        self.type_refs.push(entry);
        token
    }

    // Fields

    /// Looks up a declared field
    #[must_use]
    pub fn field(&self, token: Token) -> Option<&FieldDecl> {
        row_index(token, TableId::Field).and_then(|i| self.fields.get(i))
    }

    /// Looks up a declared field for modification
    pub fn field_mut(&mut self, token: Token) -> Option<&mut FieldDecl> {
        row_index(token, TableId::Field).and_then(|i| self.fields.get_mut(i))
    }

    /// Iterates all declared fields with their tokens
    pub fn fields(&self) -> impl Iterator<Item = (Token, &FieldDecl)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| (Token::from_parts(TableId::Field, i as u32 + 1), f))
    }

    /// Appends a field and registers it with its declaring type
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declaring type does not exist.
    pub fn add_field(&mut self, decl: FieldDecl) -> Result<Token> {
        let token = next_token(TableId::Field, self.fields.len());
        let owner = decl.declaring_type;
        let Some(parent) = self.type_def_mut(owner) else {
            return Err(malformed_error!("Field declared on unknown type {}", owner));
        };
        parent.fields.push(token);
        self.fields.push(decl);
        Ok(token)
    }

    // Methods

    /// Looks up a declared method
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodDecl> {
        row_index(token, TableId::MethodDef).and_then(|i| self.methods.get(i))
    }

    /// Looks up a declared method for modification
    pub fn method_mut(&mut self, token: Token) -> Option<&mut MethodDecl> {
        row_index(token, TableId::MethodDef).and_then(|i| self.methods.get_mut(i))
    }

    /// Iterates all declared methods with their tokens
    pub fn methods(&self) -> impl Iterator<Item = (Token, &MethodDecl)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (Token::from_parts(TableId::MethodDef, i as u32 + 1), m))
    }

    /// Number of declared methods
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Appends a method and registers it with its declaring type
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declaring type does not exist.
    pub fn add_method(&mut self, decl: MethodDecl) -> Result<Token> {
        let token = next_token(TableId::MethodDef, self.methods.len());
        let owner = decl.declaring_type;
        let Some(parent) = self.type_def_mut(owner) else {
            return Err(malformed_error!("Method declared on unknown type {}", owner));
        };
        parent.methods.push(token);
        self.methods.push(decl);
        Ok(token)
    }

    // Properties

    /// Looks up a declared property
    #[must_use]
    pub fn property(&self, token: Token) -> Option<&PropertyDecl> {
        row_index(token, TableId::Property).and_then(|i| self.properties.get(i))
    }

    /// Looks up a declared property for modification
    pub fn property_mut(&mut self, token: Token) -> Option<&mut PropertyDecl> {
        row_index(token, TableId::Property).and_then(|i| self.properties.get_mut(i))
    }

    /// Iterates all declared properties with their tokens
    pub fn properties(&self) -> impl Iterator<Item = (Token, &PropertyDecl)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(i, p)| (Token::from_parts(TableId::Property, i as u32 + 1), p))
    }

    /// Appends a property and registers it with its declaring type
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declaring type does not exist.
    pub fn add_property(&mut self, decl: PropertyDecl) -> Result<Token> {
        let token = next_token(TableId::Property, self.properties.len());
        let owner = decl.declaring_type;
        let Some(parent) = self.type_def_mut(owner) else {
            return Err(malformed_error!("Property declared on unknown type {}", owner));
        };
        parent.properties.push(token);
        self.properties.push(decl);
        Ok(token)
    }

    // Member references

    /// Looks up a member reference
    #[must_use]
    pub fn member_ref(&self, token: Token) -> Option<&MemberRef> {
        row_index(token, TableId::MemberRef).and_then(|i| self.member_refs.get(i))
    }

    /// Iterates all member references with their tokens
    pub fn member_refs(&self) -> impl Iterator<Item = (Token, &MemberRef)> {
        self.member_refs
            .iter()
            .enumerate()
            .map(|(i, m)| (Token::from_parts(TableId::MemberRef, i as u32 + 1), m))
    }

    /// Adds a member reference, reusing an identical existing one
    pub fn add_member_ref(&mut self, member: MemberRef) -> Token {
        if let Some(pos) = self.member_refs.iter().position(|m| *m == member) {
            return Token::from_parts(TableId::MemberRef, pos as u32 + 1);
        }
        let token = next_token(TableId::MemberRef, self.member_refs.len());
        self.member_refs.push(member);
        token
    }

    // Method instantiations

    /// Looks up a generic method instantiation
    #[must_use]
    pub fn method_spec(&self, token: Token) -> Option<&MethodSpec> {
        row_index(token, TableId::MethodSpec).and_then(|i| self.method_specs.get(i))
    }

    /// Iterates all generic method instantiations with their tokens
    pub fn method_specs(&self) -> impl Iterator<Item = (Token, &MethodSpec)> {
        self.method_specs
            .iter()
            .enumerate()
            .map(|(i, m)| (Token::from_parts(TableId::MethodSpec, i as u32 + 1), m))
    }

    /// Adds a generic method instantiation, reusing an identical existing one
    pub fn add_method_spec(&mut self, spec: MethodSpec) -> Token {
        if let Some(pos) = self.method_specs.iter().position(|m| *m == spec) {
            return Token::from_parts(TableId::MethodSpec, pos as u32 + 1);
        }
        let token = next_token(TableId::MethodSpec, self.method_specs.len());
        self.method_specs.push(spec);
        token
    }

    // Dependency table

    /// Looks up a dependency by assembly name
    #[must_use]
    pub fn assembly_ref(&self, name: &str) -> Option<&AssemblyRef> {
        self.assembly_refs.iter().find(|a| a.name == name)
    }

    /// Adds a dependency unless one with the same name exists
    pub fn add_assembly_ref(&mut self, reference: AssemblyRef) {
        if self.assembly_ref(&reference.name).is_none() {
            self.assembly_refs.push(reference);
        }
    }

    /// Removes the dependency with the given name, returning whether one was present
    pub fn remove_assembly_ref(&mut self, name: &str) -> bool {
        let before = self.assembly_refs.len();
        self.assembly_refs.retain(|a| a.name != name);
        before != self.assembly_refs.len()
    }

    // Names and classification

    /// Returns the full name of a declared or imported type.
    ///
    /// Nested types are written `Outer/Inner`, matching the notation of other .NET tooling.
    #[must_use]
    pub fn type_full_name(&self, token: Token) -> Option<String> {
        // innermost first
        let mut segments = Vec::new();
        let mut current = token;
        for _ in 0..MAX_NESTING_DEPTH {
            let (name, outer) = match self.type_def(current) {
                Some(decl) => match decl.enclosing {
                    Some(outer) => (decl.name.clone(), Some(outer)),
                    None => (decl.qualified_name(), None),
                },
                None => {
                    let entry = self.type_ref(current)?;
                    match &entry.scope {
                        ResolutionScope::Nested(outer) => (entry.name.clone(), Some(*outer)),
                        ResolutionScope::Assembly(_) if entry.namespace.is_empty() => {
                            (entry.name.clone(), None)
                        }
                        ResolutionScope::Assembly(_) => {
                            (format!("{}.{}", entry.namespace, entry.name), None)
                        }
                    }
                }
            };
            segments.push(name);
            match outer {
                Some(outer) => current = outer,
                None => {
                    segments.reverse();
                    return Some(segments.join("/"));
                }
            }
        }
        None
    }

    /// Returns the assembly an imported type is declared in, following nesting
    #[must_use]
    pub fn type_ref_assembly(&self, token: Token) -> Option<&str> {
        let mut current = self.type_ref(token)?;
        for _ in 0..MAX_NESTING_DEPTH {
            match &current.scope {
                ResolutionScope::Assembly(name) => return Some(name),
                ResolutionScope::Nested(outer) => current = self.type_ref(*outer)?,
            }
        }
        None
    }

    /// Returns the full name of the type a signature is built around
    #[must_use]
    pub fn signature_type_name(&self, sig: &TypeSignature) -> Option<String> {
        match sig {
            TypeSignature::Object => Some("System.Object".to_string()),
            TypeSignature::String => Some("System.String".to_string()),
            other => other.type_token().and_then(|t| self.type_full_name(t)),
        }
    }

    /// Finds a declared type by full name (`Namespace.Name`, nested as `Outer/Inner`)
    #[must_use]
    pub fn find_type_def(&self, full_name: &str) -> Option<Token> {
        self.type_defs()
            .map(|(token, _)| token)
            .find(|token| self.type_full_name(*token).as_deref() == Some(full_name))
    }

    /// Finds the methods with the given name on a declared type
    #[must_use]
    pub fn find_methods(&self, owner: Token, name: &str) -> Vec<Token> {
        self.type_def(owner)
            .map(|decl| {
                decl.methods
                    .iter()
                    .copied()
                    .filter(|m| self.method(*m).is_some_and(|m| m.name == name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds a field by name on a declared type
    #[must_use]
    pub fn find_field(&self, owner: Token, name: &str) -> Option<Token> {
        self.type_def(owner)?
            .fields
            .iter()
            .copied()
            .find(|f| self.field(*f).is_some_and(|f| f.name == name))
    }

    /// Returns `Namespace.Type::Method` for a method, member reference or instantiation
    #[must_use]
    pub fn method_full_name(&self, token: Token) -> Option<String> {
        if let Some(method) = self.method(token) {
            return Some(format!(
                "{}::{}",
                self.type_full_name(method.declaring_type)?,
                method.name
            ));
        }
        if let Some(member) = self.member_ref(token) {
            return Some(format!(
                "{}::{}",
                self.signature_type_name(&member.parent)?,
                member.name
            ));
        }
        let spec = self.method_spec(token)?;
        self.method_full_name(spec.method)
    }

    /// Returns the full name of the base type of a declared type
    #[must_use]
    pub fn base_type_name(&self, token: Token) -> Option<String> {
        let base = self.type_def(token)?.base.as_ref()?;
        self.signature_type_name(base)
    }

    /// True if a declared type derives from `System.Enum`
    #[must_use]
    pub fn is_enum(&self, token: Token) -> bool {
        self.base_type_name(token).as_deref() == Some("System.Enum")
    }

    /// True if a declared type is a value type (structs and enums)
    #[must_use]
    pub fn is_value_type(&self, token: Token) -> bool {
        matches!(
            self.base_type_name(token).as_deref(),
            Some("System.ValueType" | "System.Enum")
        )
    }
}
