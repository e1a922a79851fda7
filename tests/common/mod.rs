//! Shared fixtures for the integration tests.
//!
//! Only the public API is used here: modules are put together with [`ModuleBuilder`] and
//! external modules are served by a [`MemoryResolver`].
#![allow(dead_code)]

use dotslice::{
    assembly::{Immediate, Instruction, OpCode, Operand},
    metadata::{
        builder::{ModuleBuilder, PLATFORM_ASSEMBLY},
        constant::Constant,
        field::{FieldAttributes, FieldDecl},
        method::{ExceptionHandlerFlags, ExceptionRegion, MethodAttributes, MethodBody, MethodDecl, Parameter},
        module::CompiledModule,
        signatures::{SignatureMethod, TypeSignature},
        token::Token,
        typesystem::{TypeAttributes, TypeDecl},
    },
    prelude::MemoryResolver,
};

pub const PUBLIC: MethodAttributes = MethodAttributes::PUBLIC.union(MethodAttributes::HIDE_BY_SIG);
pub const CTOR: MethodAttributes = PUBLIC
    .union(MethodAttributes::SPECIAL_NAME)
    .union(MethodAttributes::RT_SPECIAL_NAME);
const NEW_VIRTUAL: MethodAttributes = PUBLIC
    .union(MethodAttributes::VIRTUAL)
    .union(MethodAttributes::NEW_SLOT);

pub fn op(opcode: OpCode) -> Instruction {
    Instruction::simple(opcode)
}

pub fn call(opcode: OpCode, method: Token) -> Instruction {
    Instruction::with(opcode, Operand::Method(method))
}

pub fn field(opcode: OpCode, field: Token) -> Instruction {
    Instruction::with(opcode, Operand::Field(field))
}

pub fn ldc(value: i32) -> Instruction {
    Instruction::with(OpCode::LdcI4, Operand::Immediate(Immediate::Int32(value)))
}

pub fn ldstr(value: &str) -> Instruction {
    Instruction::with(OpCode::Ldstr, Operand::String(value.to_string()))
}

pub fn leave(target: u32) -> Instruction {
    Instruction::with(OpCode::Leave, Operand::Target(target))
}

pub fn sig(has_this: bool, return_type: TypeSignature, params: Vec<TypeSignature>) -> SignatureMethod {
    SignatureMethod {
        has_this,
        param_count_generic: 0,
        return_type,
        params,
    }
}

/// The platform module: `System.Object`, the cursor types and `System.Exception`
pub fn runtime() -> CompiledModule {
    let mut b = ModuleBuilder::new(PLATFORM_ASSEMBLY);
    let object = b.class("System", "Object", None);
    b.method_with_body(object, ".ctor", CTOR, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();
    let object = TypeSignature::Class(object);

    let value_type = b.class("System", "ValueType", Some(object.clone()));
    b.class("System", "Enum", Some(TypeSignature::Class(value_type)));
    let exception = b.class("System", "Exception", Some(object.clone()));
    b.method_with_body(exception, ".ctor", CTOR, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();

    let reader = b.class("System.IO", "BinaryReader", Some(object.clone()));
    b.method_with_body(reader, "ReadInt32", NEW_VIRTUAL, Vec::new(), TypeSignature::I4, vec![ldc(0), op(OpCode::Ret)])
        .unwrap();
    let writer = b.class("System.IO", "BinaryWriter", Some(object));
    b.method_with_body(
        writer,
        "Write",
        NEW_VIRTUAL,
        vec![Parameter::new("value", TypeSignature::I4)],
        TypeSignature::Void,
        vec![op(OpCode::Ret)],
    )
    .unwrap();
    b.build()
}

/// Resolver serving the platform module only; `Vendor` can never be located
pub fn platform() -> MemoryResolver {
    MemoryResolver::new().with(runtime())
}

/// Tokens of the `Shop` module the tests refer to
pub struct Shop {
    pub module: CompiledModule,
    pub order: Token,
    pub order_kind: Token,
    pub count: Token,
    pub total_backing: Token,
    pub read: Token,
    pub write: Token,
    pub write_audited: Token,
    pub write_encoded: Token,
}

/// A module with one serializable class, `Shop.Order`.
///
/// `Order` has no parameterless constructor and keeps its state in private fields. Its
/// methods reach the platform through member references and call three members of the
/// `Vendor` assembly, which no resolver can find:
///
/// - `Vendor.Diagnostics.Logger::Log(object)`, a logging call
/// - `Vendor.Audit.Recorder::Record(object)`, stub-shaped but not logging
/// - `Vendor.Codec::Encode(int, int)`, which no stub can replace
pub fn shop() -> Shop {
    let mut b = ModuleBuilder::new("Shop").with_mvid(uguid::Guid::from_bytes([0x42; 16]));
    let object = b.platform_type("System", "Object");
    let reader = b.platform_type("System.IO", "BinaryReader");
    let writer = b.platform_type("System.IO", "BinaryWriter");
    let exception = b.platform_type("System", "Exception");
    let enum_base = b.platform_type("System", "Enum");

    let read_int32 = b.method_ref(reader.clone(), "ReadInt32", sig(true, TypeSignature::I4, Vec::new()));
    let write_int = b.method_ref(writer.clone(), "Write", sig(true, TypeSignature::Void, vec![TypeSignature::I4]));

    let logger = b.import_type("Vendor", "Vendor.Diagnostics", "Logger");
    let log = b.method_ref(
        TypeSignature::Class(logger),
        "Log",
        sig(false, TypeSignature::Void, vec![TypeSignature::Object]),
    );
    let recorder = b.import_type("Vendor", "Vendor.Audit", "Recorder");
    let record = b.method_ref(
        TypeSignature::Class(recorder),
        "Record",
        sig(false, TypeSignature::Void, vec![TypeSignature::Object]),
    );
    let codec = b.import_type("Vendor", "Vendor", "Codec");
    let encode = b.method_ref(
        TypeSignature::Class(codec),
        "Encode",
        sig(false, TypeSignature::I4, vec![TypeSignature::I4, TypeSignature::I4]),
    );

    let mut kind = TypeDecl::new("Shop", "OrderKind", TypeAttributes::PUBLIC | TypeAttributes::SEALED);
    kind.base = Some(enum_base);
    let order_kind = b.type_def(kind);
    b.add_field(FieldDecl::new(
        "value__",
        order_kind,
        FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RT_SPECIAL_NAME,
        TypeSignature::I4,
    ))
    .unwrap();
    for (name, value) in [("Retail", 0), ("Wholesale", 1)] {
        let mut constant = FieldDecl::new(
            name,
            order_kind,
            FieldAttributes::PUBLIC | FieldAttributes::STATIC | FieldAttributes::LITERAL,
            TypeSignature::ValueType(order_kind),
        );
        constant.constant = Some(Constant::I4(value));
        b.add_field(constant).unwrap();
    }

    let order = b.class("Shop", "Order", Some(object));
    let count = b.field(order, "count", TypeSignature::I4).unwrap();
    let kind_field = b.field(order, "kind", TypeSignature::ValueType(order_kind)).unwrap();
    let mut backing = FieldDecl::new("<Total>k__BackingField", order, FieldAttributes::PRIVATE, TypeSignature::I4);
    backing.compiler_generated = true;
    let total_backing = b.add_field(backing).unwrap();

    let get_total = b
        .method_with_body(
            order,
            "get_Total",
            PUBLIC | MethodAttributes::SPECIAL_NAME,
            Vec::new(),
            TypeSignature::I4,
            vec![op(OpCode::Ldarg0), field(OpCode::Ldfld, total_backing), op(OpCode::Ret)],
        )
        .unwrap();
    b.property(order, "Total", TypeSignature::I4, Some(get_total), None).unwrap();

    let mut read = MethodDecl::new("Read", order, PUBLIC);
    read.params = vec![
        Parameter::new("reader", reader),
        Parameter::optional("strict", TypeSignature::Boolean, Constant::Boolean(false)),
    ];
    read.body = Some(MethodBody {
        exception_regions: vec![ExceptionRegion {
            flags: ExceptionHandlerFlags::EXCEPTION,
            try_start: 0,
            try_end: 5,
            handler_start: 5,
            handler_end: 7,
            filter_start: None,
            catch_type: Some(exception),
        }],
        ..MethodBody::new(vec![
            op(OpCode::Ldarg0),
            op(OpCode::Ldarg1),
            call(OpCode::Callvirt, read_int32),
            field(OpCode::Stfld, count),
            leave(7),
            op(OpCode::Pop),
            leave(7),
            op(OpCode::Ret),
        ])
    });
    let read = b.method(read).unwrap();

    let writer_param = || vec![Parameter::new("writer", writer.clone())];
    let write = b
        .method_with_body(
            order,
            "Write",
            PUBLIC,
            writer_param(),
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg1),
                op(OpCode::Ldarg0),
                field(OpCode::Ldfld, count),
                call(OpCode::Callvirt, write_int),
                op(OpCode::Ldarg1),
                op(OpCode::Ldarg0),
                call(OpCode::Call, get_total),
                call(OpCode::Callvirt, write_int),
                ldstr("order written"),
                call(OpCode::Call, log),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    let write_audited = b
        .method_with_body(
            order,
            "WriteAudited",
            PUBLIC,
            writer_param(),
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg1),
                op(OpCode::Ldarg0),
                field(OpCode::Ldfld, kind_field),
                call(OpCode::Callvirt, write_int),
                ldstr("audit"),
                call(OpCode::Call, record),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    let write_encoded = b
        .method_with_body(
            order,
            "WriteEncoded",
            PUBLIC,
            writer_param(),
            TypeSignature::Void,
            vec![
                op(OpCode::Ldarg1),
                ldc(1),
                ldc(2),
                call(OpCode::Call, encode),
                call(OpCode::Callvirt, write_int),
                op(OpCode::Ret),
            ],
        )
        .unwrap();
    b.method_with_body(order, "Unused", PUBLIC, Vec::new(), TypeSignature::Void, vec![op(OpCode::Ret)])
        .unwrap();

    Shop {
        module: b.build(),
        order,
        order_kind,
        count,
        total_backing,
        read,
        write,
        write_audited,
        write_encoded,
    }
}
