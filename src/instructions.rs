use std::sync::OnceLock;

use serde::Serialize;

use crate::operand::OperandClass::{self, *};

/// Escape byte selecting the secondary (bit operation) opcode page.
pub const PREFIX_CB: u8 = 0xCB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    // Fixed, no operands
    Nop,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    Ret,
    Reti,
    Di,
    Ei,
    // Fixed, literal operands only
    JpHl,
    LdhCA,
    LdhAC,
    LdSpHl,
    // Fixed opcode, one trailing byte
    Stop,
    Jr,
    AddSpE8,
    LdhA8A,
    LdhAA8,
    LdHlSpE8,
    // Fixed opcode, two trailing bytes
    LdA16Sp,
    Jp,
    Call,
    LdA16A,
    LdAA16,
    // 0xCB page
    BitOp,
    Bit,
    Res,
    Set,
    // Quadrant 0
    LdR16MemA,
    IncR16,
    AddHlR16,
    LdAR16Mem,
    DecR16,
    IncR8,
    DecR8,
    LdR8Imm,
    JrCond,
    LdR16Imm,
    // Quadrant 1
    LdR8R8,
    // Quadrant 2
    AluR8,
    // Quadrant 3
    RetCond,
    Pop,
    Push,
    AluImm,
    Rst,
    JpCond,
    CallCond,
}

/// Where an operand sits in the textual form and in the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Literal token such as `a`, `hl` or `[c]`.
    Lit(&'static str),
    /// Symbolic operand packed into the opcode at the given bit shift.
    Field(OperandClass, u8),
    /// Numeric operand carried in the trailing bytes.
    Imm(OperandClass),
    /// Numeric operand carried in the trailing bytes, written as `[n]`.
    Mem(OperandClass),
    /// `sp+e8`, the stack-relative operand of `ld hl, sp+e8`.
    SpOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Fixed(&'static str),
    /// Mnemonic chosen by a mid-field class (alu and rotate/shift families).
    Field(OperandClass),
}

#[derive(Debug)]
pub struct InstrForm {
    pub op: Op,
    pub mnemonic: Mnemonic,
    pub slots: &'static [Slot],
    /// Opcode with every field cleared.
    pub opcode: u8,
    /// Lives in the 0xCB page; `opcode` is then the second byte.
    pub prefixed: bool,
    /// Values inside this form's field range that belong to another form.
    pub holes: &'static [u8],
}

impl InstrForm {
    const fn new(op: Op, mnemonic: &'static str, slots: &'static [Slot], opcode: u8) -> Self {
        Self { op, mnemonic: Mnemonic::Fixed(mnemonic), slots, opcode, prefixed: false, holes: &[] }
    }

    const fn alu(op: Op, slots: &'static [Slot], opcode: u8) -> Self {
        Self { op, mnemonic: Mnemonic::Field(AluOp), slots, opcode, prefixed: false, holes: &[] }
    }

    const fn cb(op: Op, mnemonic: Mnemonic, slots: &'static [Slot], opcode: u8) -> Self {
        Self { op, mnemonic, slots, opcode, prefixed: true, holes: &[] }
    }

    /// Bits of the opcode byte owned by operand fields.
    pub fn field_mask(&self) -> u8 {
        let mnemonic = match self.mnemonic {
            Mnemonic::Field(class) => class_mask(class) << 3,
            Mnemonic::Fixed(_) => 0,
        };
        self.slots.iter().fold(mnemonic, |m, s| match *s {
            Slot::Field(class, shift) => m | (class_mask(class) << shift),
            _ => m,
        })
    }

    /// Whether this form claims `byte` (the second byte for 0xCB-page forms).
    pub fn matches(&self, byte: u8) -> bool {
        byte & !self.field_mask() == self.opcode && !self.holes.contains(&byte)
    }

    /// Total encoded length in bytes, prefix included.
    pub fn width(&self) -> u8 {
        let trailing: u8 = self
            .slots
            .iter()
            .map(|s| match *s {
                Slot::Imm(class) | Slot::Mem(class) => class.byte_width(),
                Slot::SpOffset => 1,
                _ => 0,
            })
            .sum();
        1 + self.prefixed as u8 + trailing
    }
}

impl PartialEq for InstrForm {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
    }
}

impl Eq for InstrForm {}

fn class_mask(class: OperandClass) -> u8 {
    (1u8 << class.field_bits()) - 1
}

use Slot::{Field, Imm, Lit, Mem};

/// The instruction catalogue, in matching priority order.
///
/// The assembler tries forms top to bottom and takes the first whose shape
/// matches; the disassembler's opcode index is built from the same order with
/// first claim winning. Fixed zero-operand forms come first, then fixed forms
/// with literal operands, then fixed-opcode forms with trailing bytes, the
/// 0xCB page, and finally the field-parametrized forms quadrant by quadrant.
pub static FORMS: &[InstrForm] = &[
    InstrForm::new(Op::Nop, "nop", &[], 0x00),
    InstrForm::new(Op::Rlca, "rlca", &[], 0x07),
    InstrForm::new(Op::Rrca, "rrca", &[], 0x0F),
    InstrForm::new(Op::Rla, "rla", &[], 0x17),
    InstrForm::new(Op::Rra, "rra", &[], 0x1F),
    InstrForm::new(Op::Daa, "daa", &[], 0x27),
    InstrForm::new(Op::Cpl, "cpl", &[], 0x2F),
    InstrForm::new(Op::Scf, "scf", &[], 0x37),
    InstrForm::new(Op::Ccf, "ccf", &[], 0x3F),
    InstrForm::new(Op::Halt, "halt", &[], 0x76),
    InstrForm::new(Op::Ret, "ret", &[], 0xC9),
    InstrForm::new(Op::Reti, "reti", &[], 0xD9),
    InstrForm::new(Op::Di, "di", &[], 0xF3),
    InstrForm::new(Op::Ei, "ei", &[], 0xFB),
    InstrForm::new(Op::JpHl, "jp", &[Lit("hl")], 0xE9),
    InstrForm::new(Op::LdhCA, "ldh", &[Lit("[c]"), Lit("a")], 0xE2),
    InstrForm::new(Op::LdhAC, "ldh", &[Lit("a"), Lit("[c]")], 0xF2),
    InstrForm::new(Op::LdSpHl, "ld", &[Lit("sp"), Lit("hl")], 0xF9),
    InstrForm::new(Op::Stop, "stop", &[Imm(Immediate8)], 0x10),
    InstrForm::new(Op::Jr, "jr", &[Imm(SignedDisplacement8)], 0x18),
    InstrForm::new(Op::AddSpE8, "add", &[Lit("sp"), Imm(SignedDisplacement8)], 0xE8),
    InstrForm::new(Op::LdhA8A, "ldh", &[Mem(Immediate8), Lit("a")], 0xE0),
    InstrForm::new(Op::LdhAA8, "ldh", &[Lit("a"), Mem(Immediate8)], 0xF0),
    InstrForm::new(Op::LdHlSpE8, "ld", &[Lit("hl"), Slot::SpOffset], 0xF8),
    InstrForm::new(Op::LdA16Sp, "ld", &[Mem(Address16), Lit("sp")], 0x08),
    InstrForm::new(Op::Jp, "jp", &[Imm(Address16)], 0xC3),
    InstrForm::new(Op::Call, "call", &[Imm(Address16)], 0xCD),
    InstrForm::new(Op::LdA16A, "ld", &[Mem(Address16), Lit("a")], 0xEA),
    InstrForm::new(Op::LdAA16, "ld", &[Lit("a"), Mem(Address16)], 0xFA),
    InstrForm::cb(Op::BitOp, Mnemonic::Field(OperandClass::BitOp), &[Field(Register8, 0)], 0x00),
    InstrForm::cb(Op::Bit, Mnemonic::Fixed("bit"), &[Field(BitIndex, 3), Field(Register8, 0)], 0x40),
    InstrForm::cb(Op::Res, Mnemonic::Fixed("res"), &[Field(BitIndex, 3), Field(Register8, 0)], 0x80),
    InstrForm::cb(Op::Set, Mnemonic::Fixed("set"), &[Field(BitIndex, 3), Field(Register8, 0)], 0xC0),
    InstrForm::new(Op::LdR16MemA, "ld", &[Field(RegisterPair16Indirect, 4), Lit("a")], 0x02),
    InstrForm::new(Op::IncR16, "inc", &[Field(RegisterPair16, 4)], 0x03),
    InstrForm::new(Op::AddHlR16, "add", &[Lit("hl"), Field(RegisterPair16, 4)], 0x09),
    InstrForm::new(Op::LdAR16Mem, "ld", &[Lit("a"), Field(RegisterPair16Indirect, 4)], 0x0A),
    InstrForm::new(Op::DecR16, "dec", &[Field(RegisterPair16, 4)], 0x0B),
    InstrForm::new(Op::IncR8, "inc", &[Field(Register8, 3)], 0x04),
    InstrForm::new(Op::DecR8, "dec", &[Field(Register8, 3)], 0x05),
    // Narrower than the register-pair load below: a single register, one byte.
    InstrForm::new(Op::LdR8Imm, "ld", &[Field(Register8, 3), Imm(Immediate8)], 0x06),
    InstrForm::new(Op::JrCond, "jr", &[Field(Condition, 3), Imm(SignedDisplacement8)], 0x20),
    InstrForm::new(Op::LdR16Imm, "ld", &[Field(RegisterPair16, 4), Imm(Immediate16)], 0x01),
    InstrForm {
        op: Op::LdR8R8,
        mnemonic: Mnemonic::Fixed("ld"),
        slots: &[Field(Register8, 3), Field(Register8, 0)],
        opcode: 0x40,
        prefixed: false,
        // ld [hl], [hl] does not exist; that slot is halt.
        holes: &[0x76],
    },
    InstrForm::alu(Op::AluR8, &[Lit("a"), Field(Register8, 0)], 0x80),
    InstrForm::new(Op::RetCond, "ret", &[Field(Condition, 3)], 0xC0),
    InstrForm::new(Op::Pop, "pop", &[Field(RegisterPair16Stack, 4)], 0xC1),
    InstrForm::new(Op::Push, "push", &[Field(RegisterPair16Stack, 4)], 0xC5),
    InstrForm::alu(Op::AluImm, &[Lit("a"), Imm(Immediate8)], 0xC6),
    InstrForm::new(Op::Rst, "rst", &[Field(ResetTarget, 3)], 0xC7),
    InstrForm::new(Op::JpCond, "jp", &[Field(Condition, 3), Imm(Address16)], 0xC2),
    InstrForm::new(Op::CallCond, "call", &[Field(Condition, 3), Imm(Address16)], 0xC4),
];

struct OpcodeIndex {
    base: [Option<&'static InstrForm>; 256],
    prefixed: [Option<&'static InstrForm>; 256],
}

fn index() -> &'static OpcodeIndex {
    static INDEX: OnceLock<OpcodeIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut idx = OpcodeIndex { base: [None; 256], prefixed: [None; 256] };
        for byte in 0..=255u8 {
            if byte != PREFIX_CB {
                idx.base[byte as usize] = FORMS.iter().find(|f| !f.prefixed && f.matches(byte));
            }
            idx.prefixed[byte as usize] = FORMS.iter().find(|f| f.prefixed && f.matches(byte));
        }
        idx
    })
}

/// Form claiming a base-page opcode. `None` for undefined opcodes and for the
/// 0xCB escape itself.
pub fn lookup(opcode: u8) -> Option<&'static InstrForm> {
    index().base[opcode as usize]
}

/// Form claiming the byte that follows a 0xCB escape.
pub fn lookup_prefixed(sub: u8) -> Option<&'static InstrForm> {
    index().prefixed[sub as usize]
}

pub fn form(op: Op) -> Option<&'static InstrForm> {
    FORMS.iter().find(|f| f.op == op)
}
