//! Instruction and operand representation.
//!
//! An [`Instruction`] is an opcode paired with exactly one [`Operand`]. The operand is a
//! tagged union: references to methods, fields and types are the parts that extraction
//! rewrites, constants and labels are carried over unchanged.
//!
//! Labels are positions (indices into the owning body's instruction list). Because
//! extraction appends instructions one to one, a label stays valid in the copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    assembly::OpCode,
    metadata::{signatures::TypeSignature, token::Token},
};

/// Represents an immediate value embedded in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Immediate {
    /// Signed 32-bit immediate value
    Int32(i32),
    /// Signed 64-bit immediate value
    Int64(i64),
    /// 32-bit floating point immediate value
    Float32(f32),
    /// 64-bit floating point immediate value
    Float64(f64),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int32(value) => write!(f, "{value}"),
            Immediate::Int64(value) => write!(f, "{value}"),
            Immediate::Float32(value) => write!(f, "{value}"),
            Immediate::Float64(value) => write!(f, "{value}"),
        }
    }
}

/// The operand of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// String literal (`ldstr`)
    String(String),
    /// Local variable or argument index
    Variable(u16),
    /// Branch target, as an instruction position
    Target(u32),
    /// Switch table, as instruction positions
    Switch(Vec<u32>),
    /// Method reference (`MethodDef`, `MemberRef` or `MethodSpec`)
    Method(Token),
    /// Field reference (`Field` or `MemberRef`)
    Field(Token),
    /// Type reference
    Type(TypeSignature),
}

impl Operand {
    /// Returns true if the operand refers to metadata that has to be relinked when the
    /// instruction moves to another module
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Operand::Method(_) | Operand::Field(_) | Operand::Type(_))
    }
}

/// A single instruction of a method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The opcode
    pub opcode: OpCode,
    /// The operand data for this instruction
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction without operand
    #[must_use]
    pub fn simple(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }

    /// Creates an instruction with the given operand
    #[must_use]
    pub fn with(opcode: OpCode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }

    /// Returns every position this instruction may branch to
    #[must_use]
    pub fn branch_targets(&self) -> Vec<u32> {
        match &self.operand {
            Operand::Target(target) => vec![*target],
            Operand::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{}", self.opcode),
            Operand::Immediate(imm) => write!(f, "{} {imm}", self.opcode),
            Operand::String(value) => write!(f, "{} {value:?}", self.opcode),
            Operand::Variable(index) => write!(f, "{} V_{index}", self.opcode),
            Operand::Target(target) => write!(f, "{} IL_{target:04}", self.opcode),
            Operand::Switch(targets) => {
                let labels: Vec<String> = targets.iter().map(|t| format!("IL_{t:04}")).collect();
                write!(f, "{} ({})", self.opcode, labels.join(", "))
            }
            Operand::Method(token) | Operand::Field(token) => {
                write!(f, "{} {token}", self.opcode)
            }
            Operand::Type(sig) => write!(f, "{} {sig:?}", self.opcode),
        }
    }
}
