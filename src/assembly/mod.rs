//! Instruction model for method bodies.
//!
//! # Key Components
//!
//! - [`OpCode`] - CIL opcodes with their mnemonics
//! - [`Instruction`] - An opcode with a single operand
//! - [`Operand`] - Tagged union of method/field/type references, constants and labels

mod instruction;
mod opcodes;

pub use instruction::{Immediate, Instruction, Operand};
pub use opcodes::OpCode;
