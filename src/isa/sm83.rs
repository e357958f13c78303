use tracing::trace;

use crate::decoder::{Decoded, DecodeError, Decoder, Operand};
use crate::instructions::{self, InstrForm, Mnemonic, Slot, PREFIX_CB};
use crate::operand::OperandClass;

/// SM83 decoder over the shared instruction catalogue.
///
/// Classification order: the 0xCB escape selects the secondary page, every
/// other opcode goes through the base-page index. Bounds are checked against
/// the matched form's width before any operand byte is read.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sm83Decoder;

impl Sm83Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for Sm83Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        let &opcode = bytes.first().ok_or(DecodeError::Empty)?;

        let (form, field_byte) = if opcode == PREFIX_CB {
            let &sub = bytes.get(1).ok_or(DecodeError::Truncated {
                opcode,
                needed: 2,
                available: bytes.len(),
            })?;
            // The secondary page is fully populated.
            let form = instructions::lookup_prefixed(sub)
                .ok_or(DecodeError::UnrecognizedOpcode { opcode })?;
            (form, sub)
        } else {
            let form = instructions::lookup(opcode).ok_or(DecodeError::UnrecognizedOpcode { opcode })?;
            (form, opcode)
        };

        let width = form.width();
        if bytes.len() < width as usize {
            return Err(DecodeError::Truncated { opcode, needed: width, available: bytes.len() });
        }

        let operands = extract_operands(form, field_byte, &bytes[1 + form.prefixed as usize..]);
        trace!(opcode, op = ?form.op, width, "decoded");
        Ok(Decoded { form, width, operands })
    }
}

fn extract_operands(form: &InstrForm, byte: u8, mut trailing: &[u8]) -> Vec<Operand> {
    let field = |class: OperandClass, shift: u8| Operand {
        class,
        value: ((byte >> shift) & ((1 << class.field_bits()) - 1)) as i32,
    };

    let mut out = Vec::with_capacity(form.slots.len() + 1);
    if let Mnemonic::Field(class) = form.mnemonic {
        out.push(field(class, 3));
    }
    for slot in form.slots {
        match *slot {
            Slot::Lit(_) => {}
            Slot::Field(class, shift) => out.push(field(class, shift)),
            Slot::Imm(class) | Slot::Mem(class) => {
                let (now, rest) = trailing.split_at(class.byte_width() as usize);
                out.push(Operand { class, value: class.decode_value(now) });
                trailing = rest;
            }
            Slot::SpOffset => {
                let class = OperandClass::SignedDisplacement8;
                let (now, rest) = trailing.split_at(1);
                out.push(Operand { class, value: class.decode_value(now) });
                trailing = rest;
            }
        }
    }
    out
}
