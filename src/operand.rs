//! Operand codec shared by the assembler and the disassembler.
//!
//! Symbolic operand classes map bijectively onto small integers that are
//! packed into opcode bit fields; numeric classes travel as trailing bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandClass {
    Register8,
    RegisterPair16,
    RegisterPair16Stack,
    RegisterPair16Indirect,
    Condition,
    BitIndex,
    ResetTarget,
    AluOp,
    BitOp,
    Immediate8,
    Immediate16,
    SignedDisplacement8,
    Address16,
}

pub const R8: [&str; 8] = ["b", "c", "d", "e", "h", "l", "[hl]", "a"];
pub const R16: [&str; 4] = ["bc", "de", "hl", "sp"];
pub const R16_STK: [&str; 4] = ["bc", "de", "hl", "af"];
pub const R16_MEM: [&str; 4] = ["[bc]", "[de]", "[hl+]", "[hl-]"];
pub const COND: [&str; 4] = ["nz", "z", "nc", "c"];
pub const ALU: [&str; 8] = ["add", "adc", "sub", "sbc", "and", "xor", "or", "cp"];
pub const BOP: [&str; 8] = ["rlc", "rrc", "rl", "rr", "sla", "sra", "swap", "srl"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("invalid numeric literal `{0}`")]
    Invalid(String),
    #[error("value {value} out of range for {class}")]
    OutOfRange { value: i64, class: OperandClass },
}

impl OperandClass {
    /// Symbol table for classes that are looked up by name.
    pub fn symbols(self) -> Option<&'static [&'static str]> {
        match self {
            OperandClass::Register8 => Some(&R8),
            OperandClass::RegisterPair16 => Some(&R16),
            OperandClass::RegisterPair16Stack => Some(&R16_STK),
            OperandClass::RegisterPair16Indirect => Some(&R16_MEM),
            OperandClass::Condition => Some(&COND),
            OperandClass::AluOp => Some(&ALU),
            OperandClass::BitOp => Some(&BOP),
            _ => None,
        }
    }

    /// Width in bits of the opcode field this class occupies (0 for trailing bytes).
    pub fn field_bits(self) -> u8 {
        match self {
            OperandClass::Register8
            | OperandClass::BitIndex
            | OperandClass::ResetTarget
            | OperandClass::AluOp
            | OperandClass::BitOp => 3,
            OperandClass::RegisterPair16
            | OperandClass::RegisterPair16Stack
            | OperandClass::RegisterPair16Indirect
            | OperandClass::Condition => 2,
            _ => 0,
        }
    }

    /// Number of bytes appended after the opcode for numeric classes.
    pub fn byte_width(self) -> u8 {
        match self {
            OperandClass::Immediate8 | OperandClass::SignedDisplacement8 => 1,
            OperandClass::Immediate16 | OperandClass::Address16 => 2,
            _ => 0,
        }
    }

    /// Resolve a normalized token to the class's field index.
    ///
    /// `Ok(None)` means the token is not a member of the class. Bit indices and
    /// reset targets are written numerically, so a malformed number there is an
    /// error rather than a mismatch.
    pub fn lookup(self, token: &str) -> Result<Option<u8>, NumericError> {
        if let Some(table) = self.symbols() {
            return Ok(table
                .iter()
                .position(|s| s.eq_ignore_ascii_case(token))
                .map(|i| i as u8));
        }
        if !looks_numeric(token) {
            return Ok(None);
        }
        let value = parse_numeric(token)?;
        let out_of_range = NumericError::OutOfRange { value, class: self };
        match self {
            OperandClass::BitIndex if (0..=7).contains(&value) => Ok(Some(value as u8)),
            OperandClass::ResetTarget if (0..=0x38).contains(&value) && value % 8 == 0 => {
                Ok(Some((value / 8) as u8))
            }
            OperandClass::BitIndex | OperandClass::ResetTarget => Err(out_of_range),
            _ => Ok(None),
        }
    }

    /// Render a field index back to its lowercase symbol.
    pub fn symbol(self, index: u8) -> Option<String> {
        if let Some(table) = self.symbols() {
            return table.get(index as usize).map(|s| s.to_string());
        }
        match self {
            OperandClass::BitIndex if index < 8 => Some(index.to_string()),
            OperandClass::ResetTarget if index < 8 => Some(format!("{:#04x}", index * 8)),
            _ => None,
        }
    }

    /// Parse a numeric token and encode it as the trailing bytes of this class.
    pub fn encode_value(self, token: &str) -> Result<Vec<u8>, NumericError> {
        let value = parse_numeric(token)?;
        match self {
            OperandClass::Immediate8 => encode_u8(value).map(|b| vec![b]),
            OperandClass::SignedDisplacement8 => encode_i8(value).map(|b| vec![b]),
            OperandClass::Immediate16 | OperandClass::Address16 => {
                encode_u16(value, self).map(|b| b.to_vec())
            }
            _ => Err(NumericError::OutOfRange { value, class: self }),
        }
    }

    /// Decode the trailing bytes of a numeric class. `bytes` must hold at least
    /// `byte_width()` bytes.
    pub fn decode_value(self, bytes: &[u8]) -> i32 {
        match self {
            OperandClass::Immediate8 => bytes[0] as i32,
            OperandClass::SignedDisplacement8 => decode_i8(bytes[0]) as i32,
            OperandClass::Immediate16 | OperandClass::Address16 => {
                decode_u16(bytes[0], bytes[1]) as i32
            }
            _ => 0,
        }
    }

    /// Render a numeric value the way the disassembler prints it.
    pub fn render_value(self, value: i32) -> String {
        match self {
            OperandClass::Immediate8 => format!("{:#04x}", value),
            OperandClass::SignedDisplacement8 => format!("{:+}", value),
            _ => format!("{:#06x}", value),
        }
    }
}

impl fmt::Display for OperandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperandClass::Register8 => "8-bit register",
            OperandClass::RegisterPair16 => "register pair",
            OperandClass::RegisterPair16Stack => "stack register pair",
            OperandClass::RegisterPair16Indirect => "indirect register pair",
            OperandClass::Condition => "condition",
            OperandClass::BitIndex => "bit index",
            OperandClass::ResetTarget => "reset target",
            OperandClass::AluOp => "alu operation",
            OperandClass::BitOp => "bit operation",
            OperandClass::Immediate8 => "8-bit immediate",
            OperandClass::Immediate16 => "16-bit immediate",
            OperandClass::SignedDisplacement8 => "signed displacement",
            OperandClass::Address16 => "16-bit address",
        };
        f.write_str(name)
    }
}

/// True when a token should be treated as a numeric literal: it starts with a
/// digit or an explicit sign.
pub fn looks_numeric(token: &str) -> bool {
    matches!(token.chars().next(), Some(c) if c.is_ascii_digit() || c == '+' || c == '-')
}

/// Parse `0x`-prefixed hexadecimal (no sign) or signed decimal.
pub fn parse_numeric(token: &str) -> Result<i64, NumericError> {
    let t = token.trim();
    let invalid = || NumericError::Invalid(token.to_string());
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return i64::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    let digits = t.strip_prefix(['+', '-']).unwrap_or(t);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    t.parse::<i64>().map_err(|_| invalid())
}

pub fn encode_u8(value: i64) -> Result<u8, NumericError> {
    u8::try_from(value).map_err(|_| NumericError::OutOfRange {
        value,
        class: OperandClass::Immediate8,
    })
}

/// Two's-complement byte for a value in [-128, 127].
pub fn encode_i8(value: i64) -> Result<u8, NumericError> {
    i8::try_from(value)
        .map(|v| v as u8)
        .map_err(|_| NumericError::OutOfRange {
            value,
            class: OperandClass::SignedDisplacement8,
        })
}

pub fn decode_i8(byte: u8) -> i8 {
    byte as i8
}

/// Little-endian: low byte first.
pub fn encode_u16(value: i64, class: OperandClass) -> Result<[u8; 2], NumericError> {
    u16::try_from(value)
        .map(u16::to_le_bytes)
        .map_err(|_| NumericError::OutOfRange { value, class })
}

pub fn decode_u16(lo: u8, hi: u8) -> u16 {
    u16::from_le_bytes([lo, hi])
}
