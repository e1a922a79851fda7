//! Relinking of method bodies.
//!
//! Instructions are copied one to one and in order; only operands that refer to metadata
//! change. Exception regions are translated through the position map built during the walk.

use crate::{
    assembly::{Instruction, Operand},
    extract::Closure,
    metadata::method::{ExceptionRegion, MethodBody},
    Result,
};

impl Closure<'_> {
    /// Produces the destination copy of a source method body
    pub(crate) fn rewrite_body(&mut self, body: &MethodBody) -> Result<MethodBody> {
        let locals = body
            .locals
            .iter()
            .map(|local| self.resolve_sig(local))
            .collect::<Result<Vec<_>>>()?;

        let mut instructions = Vec::with_capacity(body.len());
        // source position -> destination position, plus the end of the body
        let mut positions = Vec::with_capacity(body.len() + 1);
        for instruction in &body.instructions {
            let operand = match &instruction.operand {
                Operand::Method(token) => Operand::Method(self.find_or_clone_method(*token)?),
                Operand::Field(token) => Operand::Field(self.find_or_add_field(*token)?),
                Operand::Type(sig) => Operand::Type(self.resolve_sig(sig)?),
                other => other.clone(),
            };
            positions.push(instructions.len() as u32);
            instructions.push(Instruction::with(instruction.opcode, operand));
        }
        positions.push(instructions.len() as u32);

        let exception_regions = body
            .exception_regions
            .iter()
            .map(|region| self.remap_region(region, &positions))
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodBody {
            max_stack: body.max_stack,
            init_locals: body.init_locals,
            locals,
            instructions,
            exception_regions,
        })
    }

    fn remap_region(
        &mut self,
        region: &ExceptionRegion,
        positions: &[u32],
    ) -> Result<ExceptionRegion> {
        let map = |position: u32| {
            positions.get(position as usize).copied().ok_or_else(|| {
                malformed_error!("Exception region boundary {} lies outside the body", position)
            })
        };
        Ok(ExceptionRegion {
            flags: region.flags,
            try_start: map(region.try_start)?,
            try_end: map(region.try_end)?,
            handler_start: map(region.handler_start)?,
            handler_end: map(region.handler_end)?,
            filter_start: region.filter_start.map(map).transpose()?,
            catch_type: region
                .catch_type
                .as_ref()
                .map(|catch_type| self.resolve_sig(catch_type))
                .transpose()?,
        })
    }
}
