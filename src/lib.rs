pub mod asm;
pub mod decoder;
pub mod disasm;
pub mod instructions;
pub mod operand;

pub mod isa {
    pub mod sm83; // LR35902 / SM83 core
}

pub use asm::{assemble, AsmConfig, AsmError, Assembly};
pub use decoder::{DecodeError, Decoded, Decoder, Operand};
pub use disasm::{disassemble, fmt_decoded, DisasmConfig, Listing};
pub use isa::sm83::Sm83Decoder;
pub use operand::{parse_numeric, NumericError, OperandClass};
