//! Method bodies: locals, instructions and exception regions.

use serde::{Deserialize, Serialize};

use crate::{
    assembly::Instruction,
    metadata::{method::ExceptionRegion, signatures::TypeSignature},
};

/// The implementation of a method.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodBody {
    /// Maximum number of items on the operand stack
    pub max_stack: u16,
    /// Flag, indicating to call default constructor on all local variables
    pub init_locals: bool,
    /// Types of the local variables, by index
    pub locals: Vec<TypeSignature>,
    /// The instruction stream
    pub instructions: Vec<Instruction>,
    /// A list of exception handlers this method has
    pub exception_regions: Vec<ExceptionRegion>,
}

impl MethodBody {
    /// Creates a body from an instruction list, with no locals or handlers
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        MethodBody {
            max_stack: 8,
            init_locals: true,
            locals: Vec::new(),
            instructions,
            exception_regions: Vec::new(),
        }
    }

    /// Number of instructions in the body
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the body has no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
