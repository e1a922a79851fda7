//! Clone-or-import resolution of methods, including override discovery.
//!
//! A method declared in the source module is cloned with its body. A method of another
//! module is imported after its declaration was found, and never cloned. Whenever a virtual
//! method enters the closure, the overrides declared by module-local subtypes enter with it,
//! so a call dispatched at runtime to a subtype lands on code that exists.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::{
    extract::{state::EdgeKind, types::Inherited, Closure},
    metadata::{
        memberref::{MemberRef, MethodSpec},
        method::{MethodAttributes, MethodDecl, Parameter},
        module::CompiledModule,
        property::PropertyDecl,
        signatures::{methods_equivalent, MemberSignature, SignatureMethod, TypeSignature},
        token::{TableId, Token},
        typesystem::GenericParam,
    },
    Error::SymbolUnresolved,
    Result,
};

/// Returns true if `method` overrides (or implements) `name` with signature `expected`
fn overrides(
    source: &CompiledModule,
    method: &MethodDecl,
    name: &str,
    expected: &SignatureMethod,
    kind: EdgeKind,
) -> bool {
    if !method.flags.is_virtual() {
        return false;
    }
    let name_matches = match kind {
        EdgeKind::Base => method.name == name,
        // explicit implementations are named `Namespace.IFace.Method`
        EdgeKind::Interface => {
            method.name == name
                || method
                    .name
                    .strip_suffix(name)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
    };
    if !name_matches {
        return false;
    }
    if kind == EdgeKind::Base && method.flags.contains(MethodAttributes::NEW_SLOT) {
        return false;
    }
    methods_equivalent(source, &method.signature(), source, expected)
}

impl Closure<'_> {
    /// Returns the destination method for a source `MethodDef`, `MemberRef` or `MethodSpec`,
    /// cloning or importing it on first use
    pub(crate) fn find_or_clone_method(&mut self, source_method: Token) -> Result<Token> {
        if let Some(done) = self.state.methods.get(&source_method) {
            return Ok(*done);
        }
        match source_method.table_id() {
            Some(TableId::MethodDef) => self.clone_method(source_method),
            Some(TableId::MemberRef) => self.import_method(source_method),
            Some(TableId::MethodSpec) => self.instantiate_method(source_method),
            _ => Err(malformed_error!("Token {} is not a method", source_method)),
        }
    }

    fn clone_method(&mut self, source_method: Token) -> Result<Token> {
        let source = self.source;
        let Some(decl) = source.method(source_method) else {
            return Err(malformed_error!("Method {} does not exist", source_method));
        };

        let owner = self.find_or_create_type(decl.declaring_type)?;
        if let Some(done) = self.state.methods.get(&source_method) {
            return Ok(*done);
        }

        let mut shell = MethodDecl::new(&decl.name, owner, decl.flags);
        shell.impl_flags = decl.impl_flags;
        shell.compiler_generated = decl.compiler_generated;
        shell.generic_params = decl
            .generic_params
            .iter()
            .map(|param| GenericParam::new(&param.name))
            .collect();
        let token = self.dest.add_method(shell)?;
        self.state.methods.insert(source_method, token);
        log::debug!(
            "Cloning method {} as {}",
            source.method_full_name(source_method).unwrap_or_default(),
            token
        );

        let return_type = self.resolve_sig(&decl.return_type)?;
        let params = decl
            .params
            .iter()
            .map(|param| {
                Ok(Parameter {
                    name: param.name.clone(),
                    ty: self.resolve_sig(&param.ty)?,
                    default: param.default.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let generic_params = self.resolve_generic_params(&decl.generic_params)?;
        let body = decl
            .body
            .as_ref()
            .map(|body| self.rewrite_body(body))
            .transpose()?;

        if let Some(target) = self.dest.method_mut(token) {
            target.return_type = return_type;
            target.params = params;
            target.generic_params = generic_params;
            target.body = body;
        }

        if decl.is_accessor() {
            self.attach_accessor(source_method, token)?;
        }
        if decl.flags.is_virtual() {
            if let Some(owner_name) = source.type_full_name(decl.declaring_type) {
                self.discover_overrides(&owner_name, &decl.name, &decl.signature())?;
            }
        }
        Ok(token)
    }

    fn import_method(&mut self, source_ref: Token) -> Result<Token> {
        let source = self.source;
        let Some(member) = source.member_ref(source_ref) else {
            return Err(malformed_error!("Member reference {} does not exist", source_ref));
        };
        let MemberSignature::Method(signature) = &member.signature else {
            return Err(malformed_error!("Member reference {} is not a method", source_ref));
        };
        let parent_name = source
            .signature_type_name(&member.parent)
            .unwrap_or_default();

        // the type the destination reference names as parent
        let mut ref_parent = member.parent.clone();
        let mut external_parent = None;
        if let Some(parent) = member.parent.type_token() {
            if self.local_definition(parent).is_none() {
                external_parent = Some(parent);
            } else {
                let lookup = self.search_local_chain(&member.parent, |owner| {
                    source
                        .find_methods(owner, &member.name)
                        .into_iter()
                        .find(|candidate| {
                            source.method(*candidate).is_some_and(|decl| {
                                methods_equivalent(source, &decl.signature(), source, signature)
                            })
                        })
                });
                match lookup {
                    Inherited::Local { via, found } => {
                        let cloned = self.find_or_clone_method(found)?;
                        if !matches!(via, TypeSignature::GenericInst(..)) {
                            self.state.methods.insert(source_ref, cloned);
                            return Ok(cloned);
                        }
                        ref_parent = via;
                    }
                    Inherited::External { via } => {
                        external_parent = via.type_token();
                        ref_parent = via;
                    }
                    Inherited::Missing => {
                        return Err(SymbolUnresolved(format!(
                            "method {parent_name}::{}",
                            member.name
                        )));
                    }
                }
            }
        }

        let mut virtual_roots = Vec::new();
        if let Some(parent) = external_parent {
            let external_name = source.type_full_name(parent).unwrap_or_default();
            let found = match self.locate_external_type(parent) {
                Ok(start) => self.search_external_chain(start, |module, owner| {
                    module.find_methods(owner, &member.name).into_iter().find(|candidate| {
                        module.method(*candidate).is_some_and(|decl| {
                            methods_equivalent(source, signature, module, &decl.signature())
                        })
                    })
                }),
                Err(SymbolUnresolved(_)) => None,
                Err(error) => return Err(error),
            };
            let Some((external, method)) = found else {
                if let Some(stub) = self.try_stub(source_ref) {
                    self.state.methods.insert(source_ref, stub);
                    return Ok(stub);
                }
                return Err(SymbolUnresolved(format!(
                    "method {parent_name}::{}",
                    member.name
                )));
            };

            if let Some(decl) = external.module.method(method) {
                if decl.flags.is_virtual() {
                    if let Some(declared_on) = external.module.type_full_name(decl.declaring_type) {
                        if declared_on != external_name {
                            virtual_roots.push(declared_on);
                        }
                    }
                    virtual_roots.push(external_name);
                }
            }
            self.find_or_create_type(parent)?;
        }

        let parent = self.resolve_sig(&ref_parent)?;
        let dest_signature = self.resolve_method_sig(signature)?;
        let token = self.dest.add_member_ref(MemberRef {
            parent,
            name: member.name.clone(),
            signature: MemberSignature::Method(dest_signature),
        });
        self.state.methods.insert(source_ref, token);
        log::debug!("Imported method {}::{}", parent_name, member.name);

        for root in virtual_roots {
            self.discover_overrides(&root, &member.name, signature)?;
        }
        Ok(token)
    }

    fn instantiate_method(&mut self, source_spec: Token) -> Result<Token> {
        let source = self.source;
        let Some(spec) = source.method_spec(source_spec) else {
            return Err(malformed_error!("Method instantiation {} does not exist", source_spec));
        };
        let method = self.find_or_clone_method(spec.method)?;
        let args = spec
            .args
            .iter()
            .map(|arg| self.resolve_sig(arg))
            .collect::<Result<Vec<_>>>()?;
        let token = self.dest.add_method_spec(MethodSpec { method, args });
        self.state.methods.insert(source_spec, token);
        Ok(token)
    }

    /// Links a cloned accessor to its property, creating the property on first use
    fn attach_accessor(&mut self, source_method: Token, cloned: Token) -> Result<()> {
        let source = self.source;
        let Some(decl) = source.method(source_method) else {
            return Ok(());
        };
        let Some(owner) = source.type_def(decl.declaring_type) else {
            return Ok(());
        };
        let Some(property) = owner
            .properties
            .iter()
            .filter_map(|token| source.property(*token))
            .find(|p| p.getter == Some(source_method) || p.setter == Some(source_method))
        else {
            return Ok(());
        };

        let Some(dest_owner) = self.dest.method(cloned).map(|m| m.declaring_type) else {
            return Ok(());
        };
        let existing = self.dest.type_def(dest_owner).and_then(|t| {
            t.properties.iter().copied().find(|p| {
                self.dest
                    .property(*p)
                    .is_some_and(|found| found.name == property.name)
            })
        });
        let target = match existing {
            Some(target) => target,
            None => {
                let ty = self.resolve_sig(&property.ty)?;
                self.dest.add_property(PropertyDecl {
                    name: property.name.clone(),
                    declaring_type: dest_owner,
                    ty,
                    getter: None,
                    setter: None,
                })?
            }
        };
        if let Some(linked) = self.dest.property_mut(target) {
            if property.getter == Some(source_method) {
                linked.getter = Some(cloned);
            } else {
                linked.setter = Some(cloned);
            }
        }
        Ok(())
    }

    /// Pulls every override of `name` declared below the type `base` into the closure.
    ///
    /// `signature` is expressed in the generic context of `base`; it is re-expressed in the
    /// context of each subtype while walking down.
    fn discover_overrides(
        &mut self,
        base: &str,
        name: &str,
        signature: &SignatureMethod,
    ) -> Result<()> {
        let source = self.source;
        let derived = Arc::clone(&self.derived);
        let mut pending = vec![(base.to_string(), signature.clone())];
        let mut visited = FxHashSet::default();

        while let Some((current, expected)) = pending.pop() {
            for edge in derived.children(&current) {
                if !visited.insert(edge.child) {
                    continue;
                }
                let in_child = expected.substitute(&edge.args);
                let candidates = source
                    .type_def(edge.child)
                    .map(|t| t.methods.as_slice())
                    .unwrap_or_default();
                for candidate in candidates {
                    let Some(method) = source.method(*candidate) else {
                        continue;
                    };
                    if !overrides(source, method, name, &in_child, edge.kind) {
                        continue;
                    }
                    if !self.state.methods.contains_key(candidate) {
                        log::debug!(
                            "Including override {} of {}::{}",
                            source.method_full_name(*candidate).unwrap_or_default(),
                            current,
                            name
                        );
                    }
                    self.find_or_clone_method(*candidate)?;
                }
                if let Some(child_name) = source.type_full_name(edge.child) {
                    pending.push((child_name, in_child));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        assembly::{Instruction, OpCode},
        extract::{tests::closure_for, ExtractOptions, StubPolicy},
        metadata::{
            builder::ModuleBuilder,
            method::MethodAttributes,
            signatures::{SignatureMethod, TypeSignature},
            token::TableId,
        },
        test::factories::{platform, save_game},
        Error,
    };

    #[test]
    fn test_shared_callee_cloned_once() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        closure.find_or_clone_method(fixture.read).unwrap();
        closure.find_or_clone_method(fixture.write).unwrap();
        let touches = closure
            .dest
            .methods()
            .filter(|(_, m)| m.name == "Touch")
            .count();
        assert_eq!(touches, 1);
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let even = closure.find_or_clone_method(fixture.is_even).unwrap();
        let names: Vec<_> = closure.dest.methods().map(|(_, m)| m.name.clone()).collect();
        assert_eq!(names, vec!["IsEven".to_string(), "IsOdd".to_string()]);
        assert!(closure.dest.method(even).unwrap().body.is_some());
    }

    #[test]
    fn test_external_call_is_imported() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let imported = closure.find_or_clone_method(fixture.read_int32).unwrap();
        assert!(imported.is_table(TableId::MemberRef));
        assert_eq!(
            closure.dest.method_full_name(imported).as_deref(),
            Some("System.IO.BinaryReader::ReadInt32")
        );
        assert_eq!(closure.dest.method_count(), 0);
    }

    #[test]
    fn test_override_of_local_virtual() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        closure.find_or_clone_method(fixture.slot_describe).unwrap();
        assert!(closure.state.methods.contains_key(&fixture.weapon_describe));
        // a new slot hides instead of overriding
        assert!(!closure.state.methods.contains_key(&fixture.armor_describe));
    }

    #[test]
    fn test_override_of_external_virtual() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        closure.find_or_clone_method(fixture.object_to_string).unwrap();
        assert!(closure.state.methods.contains_key(&fixture.slot_to_string));
    }

    #[test]
    fn test_interface_implementation_discovered() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        closure.find_or_clone_method(fixture.versioned_get).unwrap();
        assert!(closure.state.methods.contains_key(&fixture.save_get_version));
    }

    #[test]
    fn test_generic_method_instantiated_with_clone() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let spec = closure.find_or_clone_method(fixture.copy_slot).unwrap();
        let instantiation = closure.dest.method_spec(spec).unwrap().clone();
        let definition = closure.dest.method(instantiation.method).unwrap();
        assert_eq!(definition.name, "Copy");
        assert_eq!(definition.generic_params.len(), 1);
        let TypeSignature::Class(arg) = instantiation.args[0] else {
            panic!("expected a class argument");
        };
        assert!(arg.is_table(TableId::TypeDef));
        assert_eq!(closure.dest.type_full_name(arg).as_deref(), Some("Game.Slot"));
    }

    #[test]
    fn test_accessor_attached_to_property() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let setter = closure.find_or_clone_method(fixture.set_name).unwrap();
        let getter = closure.find_or_clone_method(fixture.get_name).unwrap();
        let properties: Vec<_> = closure.dest.properties().collect();
        assert_eq!(properties.len(), 1);
        let (_, property) = properties[0];
        assert_eq!(property.name, "Name");
        assert_eq!(property.getter, Some(getter));
        assert_eq!(property.setter, Some(setter));
    }

    #[test]
    fn test_logging_call_is_stubbed() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let stub = closure.find_or_clone_method(fixture.log_call).unwrap();
        assert_eq!(
            closure.dest.method_full_name(stub).as_deref(),
            Some("System.Console::WriteLine")
        );
        assert!(closure.dest.assembly_ref("System.Console").is_some());

        let disabled = ExtractOptions::default().with_stub_policy(StubPolicy::Disabled);
        let mut closure = closure_for(&fixture.module, &externals, &disabled);
        assert!(matches!(
            closure.find_or_clone_method(fixture.log_call),
            Err(Error::SymbolUnresolved(_))
        ));
    }

    #[test]
    fn test_unresolvable_call_fails() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let err = closure.find_or_clone_method(fixture.read_legacy).unwrap_err();
        match err {
            Error::SymbolUnresolved(message) => assert!(message.contains("Decode")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_member_inherited_from_local_base() {
        let mut builder = ModuleBuilder::new("Game");
        let object = builder.platform_type("System", "Object");
        let base = builder.class("Game", "Base", Some(object));
        let touch = builder
            .method_with_body(
                base,
                "Touch",
                MethodAttributes::PUBLIC,
                Vec::new(),
                TypeSignature::Void,
                vec![Instruction::simple(OpCode::Ret)],
            )
            .unwrap();
        let derived = TypeSignature::Class(builder.class(
            "Game",
            "Derived",
            Some(TypeSignature::Class(base)),
        ));
        let instance = |return_type: TypeSignature| SignatureMethod {
            has_this: true,
            param_count_generic: 0,
            return_type,
            params: Vec::new(),
        };
        let touch_ref = builder.method_ref(derived.clone(), "Touch", instance(TypeSignature::Void));
        let to_string_ref =
            builder.method_ref(derived.clone(), "ToString", instance(TypeSignature::String));
        let missing_ref = builder.method_ref(derived, "Vanish", instance(TypeSignature::Void));
        let module = builder.build();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&module, &externals, &options);

        let cloned = closure.find_or_clone_method(touch_ref).unwrap();
        assert!(cloned.is_table(TableId::MethodDef));
        assert_eq!(closure.state.methods.get(&touch), Some(&cloned));
        assert_eq!(
            closure.dest.method_full_name(cloned).as_deref(),
            Some("Game.Base::Touch")
        );

        // inherited from the platform, so the reference names the declaring type
        let imported = closure.find_or_clone_method(to_string_ref).unwrap();
        assert!(imported.is_table(TableId::MemberRef));
        assert_eq!(
            closure.dest.method_full_name(imported).as_deref(),
            Some("System.Object::ToString")
        );

        assert!(matches!(
            closure.find_or_clone_method(missing_ref),
            Err(Error::SymbolUnresolved(_))
        ));
    }
}
