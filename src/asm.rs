//! Text to bytes.
//!
//! Each source line holds at most one instruction. Lines are normalized
//! (comment stripped, uppercased, whitespace inside operands removed) and
//! then matched against [`FORMS`] in catalogue order; the first form whose
//! shape fits produces the bytes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::instructions::{InstrForm, Mnemonic, Slot, FORMS, PREFIX_CB};
use crate::operand::{encode_i8, looks_numeric, parse_numeric, NumericError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsmConfig {
    /// Fail on the first unrecognized instruction instead of collecting them.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AsmError {
    #[error("line {line}: {source}")]
    Numeric {
        line: usize,
        #[source]
        source: NumericError,
    },
    #[error("line {line}: unrecognized instruction `{text}`")]
    Unrecognized { line: usize, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecognized {
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: unrecognized instruction `{}`", self.line, self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub unrecognized: Vec<Unrecognized>,
}

impl Assembly {
    pub fn is_clean(&self) -> bool {
        self.unrecognized.is_empty()
    }
}

/// A normalized source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

/// Normalize one source line. `None` for blank and comment-only lines.
pub fn parse_statement(line: &str) -> Option<Statement> {
    let mut s = line;
    if let Some(p) = s.find(';') {
        s = &s[..p];
    }
    let s = s.trim().to_ascii_uppercase();
    if s.is_empty() {
        return None;
    }
    let (mnemonic, rest) = s.split_once(char::is_whitespace).unwrap_or((s.as_str(), ""));
    let operands = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',')
            .map(|t| t.chars().filter(|c| !c.is_whitespace()).collect())
            .collect()
    };
    Some(Statement { mnemonic: mnemonic.to_string(), operands })
}

/// Encode a normalized statement against the catalogue.
///
/// `Ok(None)` when no form matches. A numeric error is only raised by a form
/// whose non-numeric shape already fits.
pub fn encode_statement(st: &Statement) -> Result<Option<Vec<u8>>, NumericError> {
    for form in FORMS {
        if let Some(bytes) = encode_form(form, st)? {
            trace!(op = ?form.op, ?bytes, "matched");
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

/// Encode a single line. Blank lines yield an empty byte vector.
pub fn encode_line(line: &str) -> Result<Option<Vec<u8>>, NumericError> {
    match parse_statement(line) {
        Some(st) => encode_statement(&st),
        None => Ok(Some(Vec::new())),
    }
}

fn encode_form(form: &InstrForm, st: &Statement) -> Result<Option<Vec<u8>>, NumericError> {
    let mut opcode = form.opcode;
    match form.mnemonic {
        Mnemonic::Fixed(m) if m.eq_ignore_ascii_case(&st.mnemonic) => {}
        Mnemonic::Fixed(_) => return Ok(None),
        Mnemonic::Field(class) => match class.lookup(&st.mnemonic)? {
            Some(idx) => opcode |= idx << 3,
            None => return Ok(None),
        },
    }
    if form.slots.len() != st.operands.len() {
        return Ok(None);
    }

    // Shape pass: symbolic slots resolve now, numeric ones are deferred.
    let mut pending: Vec<(Slot, &str)> = Vec::new();
    for (&slot, tok) in form.slots.iter().zip(&st.operands) {
        let tok = tok.as_str();
        let fits = match slot {
            Slot::Lit(lit) => lit.eq_ignore_ascii_case(tok),
            Slot::Field(class, shift) if class.symbols().is_some() => match class.lookup(tok)? {
                Some(idx) => {
                    opcode |= idx << shift;
                    true
                }
                None => false,
            },
            Slot::Field(..) | Slot::Imm(_) => {
                pending.push((slot, tok));
                looks_numeric(tok)
            }
            Slot::Mem(_) => match tok.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                Some(inner) => {
                    pending.push((slot, inner));
                    looks_numeric(inner)
                }
                None => false,
            },
            Slot::SpOffset => match tok.strip_prefix("SP") {
                Some(off) if off.starts_with(['+', '-']) => {
                    pending.push((slot, off));
                    true
                }
                _ => false,
            },
        };
        if !fits {
            return Ok(None);
        }
    }

    let mut trailing = Vec::new();
    for (slot, tok) in pending {
        match slot {
            Slot::Field(class, shift) => {
                let idx = class
                    .lookup(tok)?
                    .ok_or_else(|| NumericError::Invalid(tok.to_string()))?;
                opcode |= idx << shift;
            }
            Slot::Imm(class) | Slot::Mem(class) => trailing.extend(class.encode_value(tok)?),
            Slot::SpOffset => trailing.push(encode_sp_offset(tok)?),
            Slot::Lit(_) => {}
        }
    }
    if form.holes.contains(&opcode) {
        return Ok(None);
    }

    let mut out = Vec::with_capacity(form.width() as usize);
    if form.prefixed {
        out.push(PREFIX_CB);
    }
    out.push(opcode);
    out.extend(trailing);
    Ok(Some(out))
}

/// `+n` / `-n` after `SP`. The sign is the operator; the magnitude may be hex.
fn encode_sp_offset(tok: &str) -> Result<u8, NumericError> {
    let (sign, magnitude) = tok.split_at(1);
    if magnitude.starts_with(['+', '-']) {
        return Err(NumericError::Invalid(tok.to_string()));
    }
    let value = parse_numeric(magnitude).map_err(|_| NumericError::Invalid(tok.to_string()))?;
    encode_i8(if sign == "-" { -value } else { value })
}

/// Assemble a whole source text.
///
/// Numeric errors abort the pass. Unrecognized lines are collected and the
/// bytes of every other line are kept, unless `cfg.strict` is set, in which
/// case the first one aborts.
pub fn assemble(source: &str, cfg: &AsmConfig) -> Result<Assembly, AsmError> {
    let mut asm = Assembly::default();
    for (i, text) in source.lines().enumerate() {
        let line = i + 1;
        let Some(st) = parse_statement(text) else { continue };
        match encode_statement(&st).map_err(|source| AsmError::Numeric { line, source })? {
            Some(bytes) => {
                trace!(line, ?bytes, "encoded");
                asm.bytes.extend(bytes);
            }
            None => {
                let text = text.trim().to_string();
                warn!(line, %text, "unrecognized instruction");
                if cfg.strict {
                    return Err(AsmError::Unrecognized { line, text });
                }
                asm.unrecognized.push(Unrecognized { line, text });
            }
        }
    }
    debug!(bytes = asm.bytes.len(), unrecognized = asm.unrecognized.len(), "assembly complete");
    Ok(asm)
}
