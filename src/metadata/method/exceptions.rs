//! Exception handler regions of a method body.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::signatures::TypeSignature;

bitflags! {
    /// Exception handler flags defining the type of exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed exception clause; `catch_type` names the handled exception.
        const EXCEPTION = 0x0000;
        /// An exception filter and handler clause.
        const FILTER = 0x0001;
        /// A finally clause.
        const FINALLY = 0x0002;
        /// A fault clause (finally that executes only on exception).
        const FAULT = 0x0004;
    }
}

/// A protected region and its handler.
///
/// Boundaries are instruction positions in the owning body. End positions are exclusive
/// and may equal the instruction count when a region runs to the end of the body.
///
/// ```text
/// try {
///     // try_start .. try_end
/// }
/// catch (catch_type) {
///     // handler_start .. handler_end
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRegion {
    /// Flags describing the type of exception handler (catch, filter, finally, fault).
    pub flags: ExceptionHandlerFlags,
    /// First instruction of the protected block
    pub try_start: u32,
    /// First instruction after the protected block
    pub try_end: u32,
    /// First instruction of the handler
    pub handler_start: u32,
    /// First instruction after the handler
    pub handler_end: u32,
    /// First instruction of the filter block, for filter handlers
    pub filter_start: Option<u32>,
    /// If flags == EXCEPTION, then this type will handle the exception.
    pub catch_type: Option<TypeSignature>,
}

impl ExceptionRegion {
    /// Returns every boundary position of the region
    #[must_use]
    pub fn positions(&self) -> Vec<u32> {
        let mut positions = vec![
            self.try_start,
            self.try_end,
            self.handler_start,
            self.handler_end,
        ];
        positions.extend(self.filter_start);
        positions
    }
}
