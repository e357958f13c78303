use serde::Serialize;

use crate::instructions::{InstrForm, Op};
use crate::operand::OperandClass;

/// A resolved operand: a field index for symbolic classes, the numeric value
/// for immediates and displacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Operand {
    pub class: OperandClass,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub form: &'static InstrForm,
    pub width: u8,
    /// Operands in textual order; a field-selected mnemonic comes first.
    pub operands: Vec<Operand>,
}

impl Decoded {
    pub fn op(&self) -> Op {
        self.form.op
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum DecodeError {
    #[error("no bytes left to decode")]
    Empty,
    #[error("unrecognized opcode {opcode:#04x}")]
    UnrecognizedOpcode { opcode: u8 },
    #[error("truncated instruction: opcode {opcode:#04x} needs {needed} bytes, {available} available")]
    Truncated { opcode: u8, needed: u8, available: usize },
}

pub trait Decoder {
    /// Decode the instruction starting at `bytes[0]`.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError>;
}
