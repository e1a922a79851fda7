//! Fluent construction of [`CompiledModule`]s.
//!
//! The builder covers the common shapes (classes, fields, methods with bodies, imports of
//! platform types) while [`ModuleBuilder::module_mut`] gives access to the raw tables for
//! everything else.

use crate::{
    assembly::{Instruction, OpCode, Operand},
    metadata::{
        field::{FieldAttributes, FieldDecl},
        memberref::{MemberRef, MethodSpec},
        method::{MethodAttributes, MethodBody, MethodDecl, Parameter, CTOR_NAME},
        module::{AssemblyRef, CompiledModule, Version},
        property::PropertyDecl,
        signatures::{MemberSignature, SignatureMethod, TypeSignature},
        token::Token,
        typesystem::{ResolutionScope, TypeAttributes, TypeDecl, TypeRefEntry},
    },
    Result,
};

/// Assembly that declares the platform's core types (`System.Object`, `System.Enum`, ...)
pub const PLATFORM_ASSEMBLY: &str = "System.Runtime";

/// Version recorded for dependencies added without an explicit version
pub const DEFAULT_REFERENCE_VERSION: Version = Version::new(8, 0, 0, 0);

/// Builds a [`CompiledModule`] step by step
pub struct ModuleBuilder {
    module: CompiledModule,
}

impl ModuleBuilder {
    /// Starts a module with version `1.0.0.0`
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            module: CompiledModule::new(name, Version::new(1, 0, 0, 0)),
        }
    }

    /// Sets the module version id
    #[must_use]
    pub fn with_mvid(mut self, mvid: uguid::Guid) -> Self {
        self.module.set_mvid(mvid);
        self
    }

    /// Direct access to the module under construction
    pub fn module_mut(&mut self) -> &mut CompiledModule {
        &mut self.module
    }

    /// Direct read access to the module under construction
    #[must_use]
    pub fn module(&self) -> &CompiledModule {
        &self.module
    }

    /// Adds a dependency with an explicit version
    pub fn reference_assembly(&mut self, name: &str, version: Version) {
        self.module.add_assembly_ref(AssemblyRef::new(name, version));
    }

    /// Imports a top level type of `assembly`, adding the dependency if needed
    pub fn import_type(&mut self, assembly: &str, namespace: &str, name: &str) -> Token {
        self.module
            .add_assembly_ref(AssemblyRef::new(assembly, DEFAULT_REFERENCE_VERSION));
        self.module
            .add_type_ref(TypeRefEntry::new(assembly, namespace, name))
    }

    /// Imports a type nested in an already imported type
    pub fn import_nested_type(&mut self, outer: Token, name: &str) -> Token {
        self.module.add_type_ref(TypeRefEntry {
            scope: ResolutionScope::Nested(outer),
            namespace: String::new(),
            name: name.to_string(),
        })
    }

    /// Imports a class of the platform assembly
    pub fn platform_type(&mut self, namespace: &str, name: &str) -> TypeSignature {
        TypeSignature::Class(self.import_type(PLATFORM_ASSEMBLY, namespace, name))
    }

    /// Declares a type
    pub fn type_def(&mut self, decl: TypeDecl) -> Token {
        self.module.add_type_def(decl)
    }

    /// Declares a public class with the given base
    pub fn class(&mut self, namespace: &str, name: &str, base: Option<TypeSignature>) -> Token {
        let mut decl = TypeDecl::new(namespace, name, TypeAttributes::PUBLIC);
        decl.base = base;
        self.module.add_type_def(decl)
    }

    /// Declares a public class nested in `outer`
    pub fn nested_class(&mut self, outer: Token, name: &str, base: Option<TypeSignature>) -> Token {
        let mut decl = TypeDecl::new("", name, TypeAttributes::NESTED_PUBLIC);
        decl.base = base;
        decl.enclosing = Some(outer);
        self.module.add_type_def(decl)
    }

    /// Declares a private instance field
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `owner` is not a declared type.
    pub fn field(&mut self, owner: Token, name: &str, ty: TypeSignature) -> Result<Token> {
        self.module
            .add_field(FieldDecl::new(name, owner, FieldAttributes::PRIVATE, ty))
    }

    /// Declares a field from a full declaration
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declaring type does not exist.
    pub fn add_field(&mut self, decl: FieldDecl) -> Result<Token> {
        self.module.add_field(decl)
    }

    /// Declares a method from a full declaration
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declaring type does not exist.
    pub fn method(&mut self, decl: MethodDecl) -> Result<Token> {
        self.module.add_method(decl)
    }

    /// Declares a public method with the given parameters, return type and instructions
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `owner` is not a declared type.
    pub fn method_with_body(
        &mut self,
        owner: Token,
        name: &str,
        flags: MethodAttributes,
        params: Vec<Parameter>,
        return_type: TypeSignature,
        instructions: Vec<Instruction>,
    ) -> Result<Token> {
        let mut decl = MethodDecl::new(name, owner, flags);
        decl.params = params;
        decl.return_type = return_type;
        decl.body = Some(MethodBody::new(instructions));
        self.module.add_method(decl)
    }

    /// Declares a public parameterless constructor chaining to `base_ctor`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `owner` is not a declared type.
    pub fn default_ctor(&mut self, owner: Token, base_ctor: Token) -> Result<Token> {
        self.method_with_body(
            owner,
            CTOR_NAME,
            MethodAttributes::PUBLIC
                | MethodAttributes::HIDE_BY_SIG
                | MethodAttributes::SPECIAL_NAME
                | MethodAttributes::RT_SPECIAL_NAME,
            Vec::new(),
            TypeSignature::Void,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::with(OpCode::Call, Operand::Method(base_ctor)),
                Instruction::simple(OpCode::Ret),
            ],
        )
    }

    /// References a method of another type by name and signature
    pub fn method_ref(
        &mut self,
        parent: TypeSignature,
        name: &str,
        signature: SignatureMethod,
    ) -> Token {
        self.module.add_member_ref(MemberRef {
            parent,
            name: name.to_string(),
            signature: MemberSignature::Method(signature),
        })
    }

    /// References a field of another type by name and type
    pub fn field_ref(&mut self, parent: TypeSignature, name: &str, ty: TypeSignature) -> Token {
        self.module.add_member_ref(MemberRef {
            parent,
            name: name.to_string(),
            signature: MemberSignature::Field(ty),
        })
    }

    /// References the parameterless instance constructor of `parent`
    pub fn ctor_ref(&mut self, parent: TypeSignature) -> Token {
        self.method_ref(
            parent,
            CTOR_NAME,
            SignatureMethod {
                has_this: true,
                param_count_generic: 0,
                return_type: TypeSignature::Void,
                params: Vec::new(),
            },
        )
    }

    /// Instantiates a generic method
    pub fn method_spec(&mut self, method: Token, args: Vec<TypeSignature>) -> Token {
        self.module.add_method_spec(MethodSpec { method, args })
    }

    /// Declares a property and links its accessors
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `owner` is not a declared type.
    pub fn property(
        &mut self,
        owner: Token,
        name: &str,
        ty: TypeSignature,
        getter: Option<Token>,
        setter: Option<Token>,
    ) -> Result<Token> {
        self.module.add_property(PropertyDecl {
            name: name.to_string(),
            declaring_type: owner,
            ty,
            getter,
            setter,
        })
    }

    /// Finishes the module
    #[must_use]
    pub fn build(self) -> CompiledModule {
        self.module
    }
}
