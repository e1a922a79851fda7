//! Factories for in-memory modules.
//!
//! [`platform`] provides the external modules a typical third party module depends on, and
//! [`save_game`] a source module exercising every resolution path of the extractor: shared
//! callees, mutual recursion, local and external virtual dispatch, interface implementations,
//! generic methods and types, properties, enums, exception regions, logging calls and calls
//! into modules that cannot be located.

use crate::{
    assembly::{Immediate, Instruction, OpCode, Operand},
    file::resolver::MemoryResolver,
    metadata::{
        builder::{ModuleBuilder, PLATFORM_ASSEMBLY},
        constant::Constant,
        field::{FieldAttributes, FieldDecl},
        method::{
            ExceptionHandlerFlags, ExceptionRegion, MethodAttributes, MethodBody, MethodDecl,
            Parameter,
        },
        module::{CompiledModule, Version},
        signatures::{SignatureMethod, TypeSignature},
        token::Token,
        typesystem::{GenericParam, TypeAttributes, TypeDecl},
    },
};

fn op(opcode: OpCode) -> Instruction {
    Instruction::simple(opcode)
}

fn call(opcode: OpCode, method: Token) -> Instruction {
    Instruction::with(opcode, Operand::Method(method))
}

fn field(opcode: OpCode, field: Token) -> Instruction {
    Instruction::with(opcode, Operand::Field(field))
}

fn ldstr(value: &str) -> Instruction {
    Instruction::with(OpCode::Ldstr, Operand::String(value.to_string()))
}

fn ldc(value: i32) -> Instruction {
    Instruction::with(OpCode::LdcI4, Operand::Immediate(Immediate::Int32(value)))
}

fn instance_sig(return_type: TypeSignature, params: Vec<TypeSignature>) -> SignatureMethod {
    SignatureMethod {
        has_this: true,
        param_count_generic: 0,
        return_type,
        params,
    }
}

fn static_sig(return_type: TypeSignature, params: Vec<TypeSignature>) -> SignatureMethod {
    SignatureMethod {
        has_this: false,
        ..instance_sig(return_type, params)
    }
}

const CTOR: MethodAttributes = MethodAttributes::PUBLIC
    .union(MethodAttributes::HIDE_BY_SIG)
    .union(MethodAttributes::SPECIAL_NAME)
    .union(MethodAttributes::RT_SPECIAL_NAME);
const PUBLIC: MethodAttributes = MethodAttributes::PUBLIC.union(MethodAttributes::HIDE_BY_SIG);
const VIRTUAL: MethodAttributes = PUBLIC.union(MethodAttributes::VIRTUAL);
const NEW_VIRTUAL: MethodAttributes = VIRTUAL.union(MethodAttributes::NEW_SLOT);

fn virtual_method(
    builder: &mut ModuleBuilder,
    owner: Token,
    name: &str,
    params: Vec<Parameter>,
    return_type: TypeSignature,
) -> Token {
    builder
        .method_with_body(owner, name, NEW_VIRTUAL, params, return_type, vec![op(OpCode::Ldnull), op(OpCode::Ret)])
        .unwrap()
}

fn runtime() -> CompiledModule {
    let mut builder = ModuleBuilder::new(PLATFORM_ASSEMBLY);
    let object = builder.class("System", "Object", None);
    builder
        .method_with_body(object, ".ctor", CTOR, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();
    virtual_method(&mut builder, object, "ToString", Vec::new(), TypeSignature::String);
    let object = TypeSignature::Class(object);

    let value_type = builder.class("System", "ValueType", Some(object.clone()));
    builder.class("System", "Enum", Some(TypeSignature::Class(value_type)));
    builder.class("System", "String", Some(object.clone()));
    let exception = builder.class("System", "Exception", Some(object.clone()));
    builder
        .method_with_body(exception, ".ctor", CTOR, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();

    let reader = builder.class("System.IO", "BinaryReader", Some(object.clone()));
    virtual_method(&mut builder, reader, "ReadInt32", Vec::new(), TypeSignature::I4);
    virtual_method(&mut builder, reader, "ReadString", Vec::new(), TypeSignature::String);

    let writer = builder.class("System.IO", "BinaryWriter", Some(object.clone()));
    for ty in [TypeSignature::I4, TypeSignature::String] {
        virtual_method(&mut builder, writer, "Write", vec![Parameter::new("value", ty)], TypeSignature::Void);
    }

    let mut list = TypeDecl::new("System.Collections.Generic", "List`1", TypeAttributes::PUBLIC);
    list.base = Some(object);
    list.generic_params.push(GenericParam::new("T"));
    let list = builder.type_def(list);
    builder
        .method_with_body(list, ".ctor", CTOR, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();
    builder
        .method_with_body(
            list,
            "Add",
            PUBLIC,
            vec![Parameter::new("item", TypeSignature::GenericParamType(0))],
            TypeSignature::Void,
            vec![op(OpCode::Ret)],
        )
        .unwrap();
    builder.build()
}

fn console() -> CompiledModule {
    let mut builder = ModuleBuilder::new("System.Console");
    let object = builder.platform_type("System", "Object");
    let console = builder.class("System", "Console", Some(object));
    builder
        .method_with_body(
            console,
            "WriteLine",
            PUBLIC | MethodAttributes::STATIC,
            vec![Parameter::new("value", TypeSignature::Object)],
            TypeSignature::Void,
            vec![op(OpCode::Ret)],
        )
        .unwrap();
    builder.build()
}

/// The platform modules `System.Runtime` and `System.Console`
pub(crate) fn platform() -> MemoryResolver {
    MemoryResolver::new().with(runtime()).with(console())
}

/// The `Game` module and the tokens the tests refer to
pub(crate) struct SaveGame {
    pub module: CompiledModule,
    pub inventory: Token,
    pub slot_kind: Token,
    pub header: Token,
    /// `Vendor.Telemetry.Logger`, whose module cannot be located
    pub missing_type: Token,
    /// `List<Slot>`
    pub slot_list: TypeSignature,
    pub name_backing: Token,
    /// `Box<int>::Value`
    pub box_value_ref: Token,
    /// `SaveFile::Read(BinaryReader, bool = false)`
    pub read: Token,
    /// `SaveFile::Write(BinaryWriter)`
    pub write: Token,
    /// `SaveFile::ReadLegacy(BinaryReader)`, calls into an unlocatable module
    pub read_legacy: Token,
    pub is_even: Token,
    pub read_int32: Token,
    pub slot_describe: Token,
    pub weapon_describe: Token,
    pub armor_describe: Token,
    pub object_to_string: Token,
    pub slot_to_string: Token,
    pub versioned_get: Token,
    pub save_get_version: Token,
    /// `Serializer::Copy<Slot>`
    pub copy_slot: Token,
    pub get_name: Token,
    pub set_name: Token,
    pub log_call: Token,
    pub inventory_read: Token,
}

/// Builds the `Game` module
pub(crate) fn save_game() -> SaveGame {
    let mut b = ModuleBuilder::new("Game").with_mvid(uguid::Guid::from_bytes([0x5a; 16]));

    let object = b.platform_type("System", "Object");
    let enum_type = b.platform_type("System", "Enum");
    let exception = b.platform_type("System", "Exception");
    let reader = b.platform_type("System.IO", "BinaryReader");
    let writer = b.platform_type("System.IO", "BinaryWriter");
    let list = b.import_type(PLATFORM_ASSEMBLY, "System.Collections.Generic", "List`1");
    let logger = b.import_type("Vendor.Telemetry", "Vendor.Telemetry", "Logger");
    let vendor_codec = b.import_type("Vendor.Telemetry", "Vendor.Telemetry", "Codec");
    // the compiler refers to some local types through the module's own name
    let slot_import = b.import_type("Game", "Game", "Slot");
    b.reference_assembly("dotslice", Version::new(0, 1, 0, 0));

    let object_ctor = b.ctor_ref(object.clone());
    let object_to_string = b.method_ref(object.clone(), "ToString", instance_sig(TypeSignature::String, Vec::new()));
    let read_int32 = b.method_ref(reader.clone(), "ReadInt32", instance_sig(TypeSignature::I4, Vec::new()));
    let write_int32 = b.method_ref(writer.clone(), "Write", instance_sig(TypeSignature::Void, vec![TypeSignature::I4]));
    let log_call = b.method_ref(
        TypeSignature::Class(logger),
        "Log",
        static_sig(TypeSignature::Void, vec![TypeSignature::String]),
    );
    let decode = b.method_ref(
        TypeSignature::Class(vendor_codec),
        "Decode",
        static_sig(TypeSignature::I4, vec![reader.clone()]),
    );

    // interface
    let versioned = b.type_def(TypeDecl::new(
        "Game",
        "IVersioned",
        TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
    ));
    let mut get_version = MethodDecl::new("GetVersion", versioned, NEW_VIRTUAL | MethodAttributes::ABSTRACT);
    get_version.return_type = TypeSignature::I4;
    let versioned_get = b.method(get_version).unwrap();

    // slots
    let slot = b.class("Game", "Slot", Some(object.clone()));
    let slot_sig = TypeSignature::Class(slot);
    let slot_list = TypeSignature::GenericInst(Box::new(TypeSignature::Class(list)), vec![slot_sig.clone()]);
    let list_ctor = b.ctor_ref(slot_list.clone());

    let mut kind = TypeDecl::new("Game", "SlotKind", TypeAttributes::PUBLIC | TypeAttributes::SEALED);
    kind.base = Some(enum_type);
    let slot_kind = b.type_def(kind);
    b.add_field(FieldDecl::new(
        "value__",
        slot_kind,
        FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RT_SPECIAL_NAME,
        TypeSignature::I4,
    ))
    .unwrap();
    for (value, name) in ["Empty", "Weapon", "Armor"].into_iter().enumerate() {
        let mut constant = FieldDecl::new(
            name,
            slot_kind,
            FieldAttributes::PUBLIC | FieldAttributes::STATIC | FieldAttributes::LITERAL | FieldAttributes::HAS_DEFAULT,
            TypeSignature::ValueType(slot_kind),
        );
        constant.constant = Some(Constant::I4(value as i32));
        b.add_field(constant).unwrap();
    }
    let kind_field = b.field(slot, "kind", TypeSignature::ValueType(slot_kind)).unwrap();

    let slot_ctor = b.default_ctor(slot, object_ctor).unwrap();
    let slot_describe = b
        .method_with_body(slot, "Describe", NEW_VIRTUAL, Vec::new(), TypeSignature::String, vec![ldstr("slot"), op(OpCode::Ret)])
        .unwrap();
    let slot_to_string = b
        .method_with_body(
            slot,
            "ToString",
            VIRTUAL,
            Vec::new(),
            TypeSignature::String,
            vec![op(OpCode::Ldarg0), call(OpCode::Callvirt, slot_describe), op(OpCode::Ret)],
        )
        .unwrap();

    let weapon = b.class("Game", "WeaponSlot", Some(TypeSignature::Class(slot_import)));
    let weapon_describe = b
        .method_with_body(weapon, "Describe", VIRTUAL, Vec::new(), TypeSignature::String, vec![ldstr("weapon"), op(OpCode::Ret)])
        .unwrap();
    let armor = b.class("Game", "ArmorSlot", Some(slot_sig.clone()));
    let armor_describe = b
        .method_with_body(armor, "Describe", NEW_VIRTUAL, Vec::new(), TypeSignature::String, vec![ldstr("armor"), op(OpCode::Ret)])
        .unwrap();

    // generic helpers
    let mut serializer = TypeDecl::new(
        "Game",
        "Serializer",
        TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT | TypeAttributes::SEALED,
    );
    serializer.base = Some(object.clone());
    let serializer = b.type_def(serializer);
    let mut copy = MethodDecl::new("Copy", serializer, PUBLIC | MethodAttributes::STATIC);
    copy.generic_params.push(GenericParam::new("T"));
    copy.params.push(Parameter::new("value", TypeSignature::GenericParamMethod(0)));
    copy.return_type = TypeSignature::GenericParamMethod(0);
    copy.body = Some(MethodBody::new(vec![op(OpCode::Ldarg0), op(OpCode::Ret)]));
    let copy = b.method(copy).unwrap();
    let copy_slot = b.method_spec(copy, vec![slot_sig.clone()]);
    b.method_with_body(
        slot,
        "Parse",
        PUBLIC | MethodAttributes::STATIC,
        vec![Parameter::new("reader", reader.clone())],
        slot_sig.clone(),
        vec![
            call(OpCode::Newobj, slot_ctor),
            op(OpCode::Dup),
            op(OpCode::Ldarg0),
            call(OpCode::Callvirt, read_int32),
            field(OpCode::Stfld, kind_field),
            call(OpCode::Call, copy_slot),
            op(OpCode::Ret),
        ],
    )
    .unwrap();

    let mut boxed = TypeDecl::new("Game", "Box`1", TypeAttributes::PUBLIC);
    boxed.base = Some(object.clone());
    boxed.generic_params.push(GenericParam::new("T"));
    let boxed = b.type_def(boxed);
    b.add_field(FieldDecl::new(
        "Value",
        boxed,
        FieldAttributes::PUBLIC,
        TypeSignature::GenericParamType(0),
    ))
    .unwrap();
    let box_value_ref = b.field_ref(
        TypeSignature::GenericInst(Box::new(TypeSignature::Class(boxed)), vec![TypeSignature::I4]),
        "Value",
        TypeSignature::GenericParamType(0),
    );

    let codec = b.class("Game", "Codec", Some(object.clone()));
    let statics = PUBLIC | MethodAttributes::STATIC;
    let number = || vec![Parameter::new("n", TypeSignature::I4)];
    let is_even = b
        .method_with_body(codec, "IsEven", statics, number(), TypeSignature::Boolean, Vec::new())
        .unwrap();
    let is_odd = b
        .method_with_body(
            codec,
            "IsOdd",
            statics,
            number(),
            TypeSignature::Boolean,
            vec![op(OpCode::Ldarg0), ldc(1), op(OpCode::Sub), call(OpCode::Call, is_even), op(OpCode::Ret)],
        )
        .unwrap();
    if let Some(method) = b.module_mut().method_mut(is_even) {
        method.body = Some(MethodBody::new(vec![
            op(OpCode::Ldarg0),
            ldc(1),
            op(OpCode::Sub),
            call(OpCode::Call, is_odd),
            op(OpCode::Ret),
        ]));
    }

    // inventory
    let inventory = b.class("Game", "Inventory", Some(object.clone()));
    let slots = b.field(inventory, "slots", slot_list.clone()).unwrap();
    b.default_ctor(inventory, object_ctor).unwrap();
    let inventory_read = b
        .method_with_body(
            inventory,
            "Read",
            PUBLIC,
            vec![Parameter::new("reader", reader.clone())],
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg0),
                call(OpCode::Newobj, list_ctor),
                field(OpCode::Stfld, slots),
                Instruction::with(OpCode::Leave, Operand::Target(6)),
                op(OpCode::Pop),
                Instruction::with(OpCode::Leave, Operand::Target(6)),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    if let Some(body) = b.module_mut().method_mut(inventory_read).and_then(|m| m.body.as_mut()) {
        body.exception_regions.push(ExceptionRegion {
            flags: ExceptionHandlerFlags::EXCEPTION,
            try_start: 0,
            try_end: 4,
            handler_start: 4,
            handler_end: 6,
            filter_start: None,
            catch_type: Some(exception),
        });
    }
    let inventory_write = b
        .method_with_body(
            inventory,
            "Write",
            PUBLIC,
            vec![Parameter::new("writer", writer.clone())],
            TypeSignature::Void,
            vec![op(OpCode::Ldarg1), ldc(0), call(OpCode::Callvirt, write_int32), op(OpCode::Ret)],
        )
        .unwrap();

    // the entry type
    let save = b.class("Game", "SaveFile", Some(object.clone()));
    if let Some(decl) = b.module_mut().type_def_mut(save) {
        decl.interfaces.push(TypeSignature::Class(versioned));
    }
    let version = b.field(save, "version", TypeSignature::I4).unwrap();
    let inventory_field = b.field(save, "inventory", TypeSignature::Class(inventory)).unwrap();
    let mut backing = FieldDecl::new("<Name>k__BackingField", save, FieldAttributes::PRIVATE, TypeSignature::String);
    backing.compiler_generated = true;
    let name_backing = b.add_field(backing).unwrap();

    b.method_with_body(
        save,
        ".ctor",
        CTOR,
        vec![Parameter::new("version", TypeSignature::I4)],
        TypeSignature::Void,
        vec![
            op(OpCode::Ldarg0),
            call(OpCode::Call, object_ctor),
            op(OpCode::Ldarg0),
            op(OpCode::Ldarg1),
            field(OpCode::Stfld, version),
            op(OpCode::Ret),
        ],
    )
    .unwrap();
    let accessor = PUBLIC | MethodAttributes::SPECIAL_NAME;
    let get_name = b
        .method_with_body(
            save,
            "get_Name",
            accessor,
            Vec::new(),
            TypeSignature::String,
            vec![op(OpCode::Ldarg0), field(OpCode::Ldfld, name_backing), op(OpCode::Ret)],
        )
        .unwrap();
    let set_name = b
        .method_with_body(
            save,
            "set_Name",
            accessor,
            vec![Parameter::new("value", TypeSignature::String)],
            TypeSignature::Void,
            vec![op(OpCode::Ldarg0), op(OpCode::Ldarg1), field(OpCode::Stfld, name_backing), op(OpCode::Ret)],
        )
        .unwrap();
    b.property(save, "Name", TypeSignature::String, Some(get_name), Some(set_name))
        .unwrap();
    let touch = b
        .method_with_body(
            save,
            "Touch",
            MethodAttributes::PRIVATE | MethodAttributes::HIDE_BY_SIG,
            Vec::new(),
            TypeSignature::Void,
            vec![op(OpCode::Ldarg0), field(OpCode::Ldfld, version), op(OpCode::Pop), op(OpCode::Ret)],
        )
        .unwrap();
    let save_get_version = b
        .method_with_body(
            save,
            "GetVersion",
            NEW_VIRTUAL | MethodAttributes::FINAL,
            Vec::new(),
            TypeSignature::I4,
            vec![op(OpCode::Ldarg0), field(OpCode::Ldfld, version), op(OpCode::Ret)],
        )
        .unwrap();

    let read = b
        .method_with_body(
            save,
            "Read",
            PUBLIC,
            vec![
                Parameter::new("reader", reader.clone()),
                Parameter::optional("strict", TypeSignature::Boolean, Constant::Boolean(false)),
            ],
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg0),
                op(OpCode::Ldarg1),
                call(OpCode::Callvirt, read_int32),
                field(OpCode::Stfld, version),
                op(OpCode::Ldarg0),
                field(OpCode::Ldfld, inventory_field),
                op(OpCode::Ldarg1),
                call(OpCode::Callvirt, inventory_read),
                op(OpCode::Ldarg0),
                ldstr("save"),
                call(OpCode::Call, set_name),
                op(OpCode::Ldarg0),
                call(OpCode::Call, touch),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    let write = b
        .method_with_body(
            save,
            "Write",
            PUBLIC,
            vec![Parameter::new("writer", writer)],
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg1),
                op(OpCode::Ldarg0),
                field(OpCode::Ldfld, version),
                call(OpCode::Callvirt, write_int32),
                op(OpCode::Ldarg0),
                field(OpCode::Ldfld, inventory_field),
                op(OpCode::Ldarg1),
                call(OpCode::Callvirt, inventory_write),
                ldstr("saved"),
                call(OpCode::Call, log_call),
                op(OpCode::Ldarg0),
                call(OpCode::Call, touch),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    let read_legacy = b
        .method_with_body(
            save,
            "ReadLegacy",
            PUBLIC,
            vec![Parameter::new("reader", reader)],
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg0),
                op(OpCode::Ldarg1),
                call(OpCode::Call, decode),
                field(OpCode::Stfld, version),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    b.method_with_body(save, "Unused", PUBLIC, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();

    let header = b.nested_class(save, "Header", Some(object));
    b.default_ctor(header, object_ctor).unwrap();

    SaveGame {
        module: b.build(),
        inventory,
        slot_kind,
        header,
        missing_type: logger,
        slot_list,
        name_backing,
        box_value_ref,
        read,
        write,
        read_legacy,
        is_even,
        read_int32,
        slot_describe,
        weapon_describe,
        armor_describe,
        object_to_string,
        slot_to_string,
        versioned_get,
        save_get_version,
        copy_slot,
        get_name,
        set_name,
        log_call,
        inventory_read,
    }
}
