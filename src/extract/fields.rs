//! Clone-or-import resolution of fields.

use crate::{
    extract::{types::Inherited, Closure},
    metadata::{
        field::FieldDecl,
        memberref::MemberRef,
        signatures::{MemberSignature, TypeSignature},
        token::{TableId, Token},
    },
    Error::SymbolUnresolved,
    Result,
};

impl Closure<'_> {
    /// Returns the destination field for a source `Field` or field `MemberRef`, adding it
    /// on first use
    pub(crate) fn find_or_add_field(&mut self, source_field: Token) -> Result<Token> {
        if let Some(done) = self.state.fields.get(&source_field) {
            return Ok(*done);
        }
        let token = match source_field.table_id() {
            Some(TableId::Field) => self.clone_field(source_field)?,
            Some(TableId::MemberRef) => self.import_field(source_field)?,
            _ => return Err(malformed_error!("Token {} is not a field", source_field)),
        };
        self.state.fields.insert(source_field, token);
        Ok(token)
    }

    fn clone_field(&mut self, source_field: Token) -> Result<Token> {
        let source = self.source;
        let Some(decl) = source.field(source_field) else {
            return Err(malformed_error!("Field {} does not exist", source_field));
        };

        let owner = self.find_or_create_type(decl.declaring_type)?;
        // creating an enum owner copies all of its fields
        if let Some(done) = self.state.fields.get(&source_field) {
            return Ok(*done);
        }
        let ty = self.resolve_sig(&decl.ty)?;
        if let Some(existing) = self.dest.find_field(owner, &decl.name) {
            return Ok(existing);
        }

        let token = self.dest.add_field(FieldDecl {
            name: decl.name.clone(),
            declaring_type: owner,
            flags: decl.flags,
            ty,
            constant: decl.constant.clone(),
            compiler_generated: decl.compiler_generated,
        })?;
        log::debug!(
            "Cloned field {}::{}",
            self.dest.type_full_name(owner).unwrap_or_default(),
            decl.name
        );
        Ok(token)
    }

    fn import_field(&mut self, source_ref: Token) -> Result<Token> {
        let source = self.source;
        let Some(member) = source.member_ref(source_ref) else {
            return Err(malformed_error!("Member reference {} does not exist", source_ref));
        };
        let MemberSignature::Field(field_type) = &member.signature else {
            return Err(malformed_error!("Member reference {} is not a field", source_ref));
        };
        let parent_name = source
            .signature_type_name(&member.parent)
            .unwrap_or_default();

        let mut ref_parent = member.parent.clone();
        let mut external_parent = None;
        if let Some(parent) = member.parent.type_token() {
            if self.local_definition(parent).is_none() {
                external_parent = Some(parent);
            } else {
                match self.search_local_chain(&member.parent, |owner| {
                    source.find_field(owner, &member.name)
                }) {
                    Inherited::Local { via, found } => {
                        let cloned = self.find_or_add_field(found)?;
                        if !matches!(via, TypeSignature::GenericInst(..)) {
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
                            "field {parent_name}::{}",
                            member.name
                        )));
                    }
                }
            }
        }

        if let Some(parent) = external_parent {
            let start = self.locate_external_type(parent)?;
            let found = self.search_external_chain(start, |module, owner| {
                module.find_field(owner, &member.name)
            });
            if found.is_none() {
                return Err(SymbolUnresolved(format!(
                    "field {parent_name}::{}",
                    member.name
                )));
            }
            self.find_or_create_type(parent)?;
        }

        let parent = self.resolve_sig(&ref_parent)?;
        let ty = self.resolve_sig(field_type)?;
        let token = self.dest.add_member_ref(MemberRef {
            parent,
            name: member.name.clone(),
            signature: MemberSignature::Field(ty),
        });
        log::debug!("Imported field {}::{}", parent_name, member.name);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        extract::{tests::closure_for, ExtractOptions},
        metadata::{
            builder::ModuleBuilder,
            field::{FieldAttributes, FieldDecl},
            signatures::TypeSignature,
            token::TableId,
            typesystem::{GenericParam, TypeAttributes, TypeDecl},
        },
        test::factories::{platform, save_game},
    };

    #[test]
    fn test_field_added_once_and_preserved() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let first = closure.find_or_add_field(fixture.name_backing).unwrap();
        let second = closure.find_or_add_field(fixture.name_backing).unwrap();
        assert_eq!(first, second);

        let field = closure.dest.field(first).unwrap();
        let original = fixture.module.field(fixture.name_backing).unwrap();
        assert_eq!(field.name, original.name);
        assert_eq!(field.flags, original.flags);
        assert!(field.compiler_generated);
        let owner = closure.dest.type_def(field.declaring_type).unwrap();
        assert_eq!(owner.fields, vec![first]);
    }

    #[test]
    fn test_field_of_generic_local_instantiation() {
        let fixture = save_game();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&fixture.module, &externals, &options);

        let reference = closure.find_or_add_field(fixture.box_value_ref).unwrap();
        assert!(reference.is_table(TableId::MemberRef));
        let member = closure.dest.member_ref(reference).unwrap();
        assert_eq!(member.name, "Value");
        // the definition is cloned as well
        let boxed = closure.dest.find_type_def("Game.Box`1").unwrap();
        assert!(closure.dest.find_field(boxed, "Value").is_some());
    }

    #[test]
    fn test_field_inherited_through_generic_base() {
        let mut builder = ModuleBuilder::new("Game");
        let object = builder.platform_type("System", "Object");
        let mut pair = TypeDecl::new("Game", "Pair`1", TypeAttributes::PUBLIC);
        pair.base = Some(object);
        pair.generic_params.push(GenericParam::new("T"));
        let pair = builder.type_def(pair);
        builder
            .add_field(FieldDecl::new(
                "First",
                pair,
                FieldAttributes::PUBLIC,
                TypeSignature::GenericParamType(0),
            ))
            .unwrap();
        let named = builder.class(
            "Game",
            "Named",
            Some(TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(pair)),
                vec![TypeSignature::String],
            )),
        );
        let first_ref = builder.field_ref(
            TypeSignature::Class(named),
            "First",
            TypeSignature::GenericParamType(0),
        );
        let module = builder.build();
        let externals = platform();
        let options = ExtractOptions::default();
        let mut closure = closure_for(&module, &externals, &options);

        let reference = closure.find_or_add_field(first_ref).unwrap();
        assert!(reference.is_table(TableId::MemberRef));
        let member = closure.dest.member_ref(reference).unwrap().clone();
        let TypeSignature::GenericInst(definition, args) = member.parent else {
            panic!("expected an instantiated parent");
        };
        let cloned_pair = closure.dest.find_type_def("Game.Pair`1").unwrap();
        assert_eq!(*definition, TypeSignature::Class(cloned_pair));
        assert_eq!(args, vec![TypeSignature::String]);
        assert!(closure.dest.find_field(cloned_pair, "First").is_some());
    }
}
