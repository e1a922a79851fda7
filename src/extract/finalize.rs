//! Compatibility edits applied once the closure is complete.
//!
//! A consumer that loads the extracted module reflectively expects to instantiate types with
//! a public parameterless constructor and to reach fields through public access. It also has
//! to load the module without the module it was extracted from, or this tool, being present.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::{
    assembly::{Instruction, OpCode, Operand},
    metadata::{
        field::FieldAttributes,
        memberref::MemberRef,
        method::{MethodAttributes, MethodBody, MethodDecl, CTOR_NAME},
        module::{CompiledModule, MODULE_TYPE_NAME},
        signatures::{MemberSignature, SignatureMethod, TypeSignature},
        token::{TableId, Token},
    },
    Result,
};

/// Summary of the edits the finalizer made
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Full names of the types that received a constructor
    pub constructors_added: Vec<String>,
    /// Full names of the types whose parameterless constructor was made public
    pub constructors_widened: Vec<String>,
    /// Number of fields made public
    pub fields_widened: usize,
    /// Names of the removed dependencies
    pub dependencies_removed: Vec<String>,
}

impl fmt::Display for FinalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constructors added, {} constructors widened, {} fields widened, {} dependencies removed",
            self.constructors_added.len(),
            self.constructors_widened.len(),
            self.fields_widened,
            self.dependencies_removed.len()
        )
    }
}

/// Applies every compatibility edit to `module`
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a constructor cannot be attached to its type.
pub fn finalize(
    module: &mut CompiledModule,
    source_name: &str,
    tool_name: &str,
) -> Result<FinalizeReport> {
    let (constructors_added, constructors_widened) = provide_constructors(module)?;
    let mut report = FinalizeReport {
        constructors_added,
        constructors_widened,
        fields_widened: widen_fields(module),
        dependencies_removed: Vec::new(),
    };
    for name in [source_name, tool_name] {
        if module.remove_assembly_ref(name) {
            report.dependencies_removed.push(name.to_string());
        }
    }
    log::info!("Finalized '{}': {}", module.name, report);
    Ok(report)
}

fn accepts_constructor(module: &CompiledModule, token: Token) -> bool {
    let Some(decl) = module.type_def(token) else {
        return false;
    };
    !(decl.flags.is_interface()
        || decl.flags.is_abstract()
        || decl.name == MODULE_TYPE_NAME
        || module.is_value_type(token))
}

/// The parameterless instance constructor `token` declares, whatever its access
fn parameterless_ctor(module: &CompiledModule, token: Token) -> Option<Token> {
    module.type_def(token)?.methods.iter().copied().find(|method| {
        module
            .method(*method)
            .is_some_and(|m| m.is_constructor() && m.params.is_empty())
    })
}

/// A parameterless instance constructor callable from a derived type
fn inheritable_ctor(module: &CompiledModule, token: Token) -> Option<Token> {
    module.type_def(token)?.methods.iter().copied().find(|method| {
        module.method(*method).is_some_and(|m| {
            m.is_constructor()
                && m.params.is_empty()
                && m.flags.access() != MethodAttributes::PRIVATE
        })
    })
}

/// Finds the constructor a synthesized constructor of `token` chains to.
///
/// Walks up the base chain to the nearest ancestor with a parameterless constructor. An
/// ancestor seen through a generic instantiation, and every external ancestor, is called
/// through a member reference.
fn base_ctor(module: &mut CompiledModule, token: Token) -> Option<Token> {
    let mut base = module.type_def(token)?.base.clone()?;
    for _ in 0..module.type_def_count() + 1 {
        let ancestor = base.type_token()?;
        if !ancestor.is_table(TableId::TypeDef) {
            return Some(ctor_ref(module, base));
        }
        if let Some(ctor) = inheritable_ctor(module, ancestor) {
            if matches!(base, TypeSignature::GenericInst(..)) {
                return Some(ctor_ref(module, base));
            }
            return Some(ctor);
        }
        let args = match &base {
            TypeSignature::GenericInst(_, args) => args.clone(),
            _ => Vec::new(),
        };
        base = module.type_def(ancestor)?.base.as_ref()?.substitute(&args);
    }
    None
}

fn ctor_ref(module: &mut CompiledModule, parent: TypeSignature) -> Token {
    module.add_member_ref(MemberRef {
        parent,
        name: CTOR_NAME.to_string(),
        signature: MemberSignature::Method(SignatureMethod {
            has_this: true,
            param_count_generic: 0,
            return_type: TypeSignature::Void,
            params: Vec::new(),
        }),
    })
}

fn synthesize_ctor(module: &mut CompiledModule, token: Token) -> Result<Token> {
    let mut instructions = vec![Instruction::simple(OpCode::Ldarg0)];
    if let Some(base) = base_ctor(module, token) {
        instructions.push(Instruction::with(OpCode::Call, Operand::Method(base)));
    }
    instructions.push(Instruction::simple(OpCode::Ret));

    let mut ctor = MethodDecl::new(
        CTOR_NAME,
        token,
        MethodAttributes::PUBLIC
            | MethodAttributes::HIDE_BY_SIG
            | MethodAttributes::SPECIAL_NAME
            | MethodAttributes::RT_SPECIAL_NAME,
    );
    ctor.body = Some(MethodBody::new(instructions));
    module.add_method(ctor)
}

/// Gives every concrete class a public parameterless constructor, either by widening the
/// one it declares or by synthesizing one. Returns the added and the widened type names.
fn provide_constructors(module: &mut CompiledModule) -> Result<(Vec<String>, Vec<String>)> {
    let mut added = Vec::new();
    let mut widened = Vec::new();
    let mut visited = FxHashSet::default();
    let tokens: Vec<Token> = module.type_defs().map(|(token, _)| token).collect();

    for token in tokens {
        // bases first, so a synthesized constructor can chain to another one
        let mut chain = Vec::new();
        let mut current = Some(token);
        while let Some(next) = current {
            if !visited.insert(next) {
                break;
            }
            chain.push(next);
            current = module
                .type_def(next)
                .and_then(|t| t.base.as_ref())
                .and_then(TypeSignature::type_token)
                .filter(|base| base.is_table(TableId::TypeDef));
        }

        for ty in chain.into_iter().rev() {
            if !accepts_constructor(module, ty) {
                continue;
            }
            let name = module.type_full_name(ty).unwrap_or_default();
            match parameterless_ctor(module, ty) {
                Some(ctor) => {
                    let Some(method) = module.method_mut(ctor) else {
                        continue;
                    };
                    if method.flags.is_public() {
                        continue;
                    }
                    method.flags = method.flags.with_access(MethodAttributes::PUBLIC);
                    log::debug!("Made the parameterless constructor of {} public", name);
                    widened.push(name);
                }
                None => {
                    synthesize_ctor(module, ty)?;
                    log::debug!("Synthesized a parameterless constructor for {}", name);
                    added.push(name);
                }
            }
        }
    }
    Ok((added, widened))
}

fn widen_fields(module: &mut CompiledModule) -> usize {
    let hidden: Vec<Token> = module
        .fields()
        .filter(|(_, f)| !f.flags.is_public() && !f.compiler_generated)
        .map(|(token, _)| token)
        .collect();
    for token in &hidden {
        if let Some(field) = module.field_mut(*token) {
            field.flags = field.flags.with_access(FieldAttributes::PUBLIC);
        }
    }
    hidden.len()
}
