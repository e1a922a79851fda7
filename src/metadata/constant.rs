//! Compile-time constant values.
//!
//! Constants appear as parameter default values and as the values of literal fields
//! (enum members). Both are copied verbatim during extraction.

use serde::{Deserialize, Serialize};

/// A constant value attached to a parameter or literal field
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Boolean(bool),
    Char(u16),
    I1(i8),
    U1(u8),
    I2(i16),
    U2(u16),
    I4(i32),
    U4(u32),
    I8(i64),
    U8(u64),
    R4(f32),
    R8(f64),
    String(String),
}
