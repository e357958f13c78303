use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decoder::{DecodeError, Decoded, Decoder, Operand};
use crate::instructions::{Mnemonic, Slot};

/// Render a decoded instruction as lowercase assembly text.
pub fn fmt_decoded(d: &Decoded) -> String {
    let mut ops = d.operands.iter().copied();
    let mnemonic = match d.form.mnemonic {
        Mnemonic::Fixed(m) => m.to_string(),
        Mnemonic::Field(_) => ops.next().map(symbol).unwrap_or_default(),
    };
    let args: Vec<String> = d
        .form
        .slots
        .iter()
        .map(|slot| match *slot {
            Slot::Lit(lit) => lit.to_string(),
            other => ops.next().map(|o| fmt_operand(other, o)).unwrap_or_default(),
        })
        .collect();

    if args.is_empty() {
        mnemonic
    } else {
        format!("{} {}", mnemonic, args.join(", "))
    }
}

fn fmt_operand(slot: Slot, o: Operand) -> String {
    match slot {
        Slot::Mem(_) => format!("[{}]", o.class.render_value(o.value)),
        Slot::SpOffset => format!("sp{:+}", o.value),
        Slot::Field(..) => symbol(o),
        _ => o.class.render_value(o.value),
    }
}

fn symbol(o: Operand) -> String {
    o.class
        .symbol(o.value as u8)
        .unwrap_or_else(|| format!("?{}", o.value))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasmConfig {
    /// Address printed for the first byte of the image.
    pub origin: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub offset: u32,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl Line {
    fn raw(offset: u32, byte: u8) -> Self {
        Self { offset, bytes: vec![byte], text: format!(".byte {:#04x}", byte) }
    }

    pub fn render(&self, show_bytes: bool) -> String {
        if show_bytes {
            let hex: Vec<String> = self.bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{:#06x} {:<8}  {}", self.offset, hex.join(" "), self.text)
        } else {
            format!("{:#06x} {}", self.offset, self.text)
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub offset: u32,
    pub error: DecodeError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub lines: Vec<Line>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Listing {
    /// The end-of-stream truncation, if the image stopped mid-instruction.
    pub fn truncated(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| matches!(d.error, DecodeError::Truncated { .. }))
    }

    pub fn to_text(&self, show_bytes: bool) -> String {
        let mut buf = String::new();
        for line in &self.lines {
            buf.push_str(&line.render(show_bytes));
            buf.push('\n');
        }
        buf
    }
}

/// Linear sweep over `bytes`, one line per instruction.
///
/// Undefined opcodes fall back to a `.byte` line and advance by one. A form
/// that runs past the end is reported once; the remaining tail is emitted as
/// `.byte` lines and the sweep stops.
pub fn disassemble<D: Decoder>(dec: &D, bytes: &[u8], cfg: &DisasmConfig) -> Listing {
    let mut listing = Listing::default();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let at = cfg.origin.wrapping_add(pos as u32);
        match dec.decode(&bytes[pos..]) {
            Ok(d) => {
                let w = d.width as usize;
                listing.lines.push(Line { offset: at, bytes: bytes[pos..pos + w].to_vec(), text: fmt_decoded(&d) });
                pos += w;
            }
            Err(error @ DecodeError::UnrecognizedOpcode { .. }) => {
                warn!(offset = at, %error, "falling back to raw byte");
                listing.diagnostics.push(Diagnostic { offset: at, error });
                listing.lines.push(Line::raw(at, bytes[pos]));
                pos += 1;
            }
            Err(error @ DecodeError::Truncated { .. }) => {
                warn!(offset = at, %error, "image ends mid-instruction");
                listing.diagnostics.push(Diagnostic { offset: at, error });
                for (i, &b) in bytes[pos..].iter().enumerate() {
                    listing.lines.push(Line::raw(at.wrapping_add(i as u32), b));
                }
                break;
            }
            Err(DecodeError::Empty) => break,
        }
    }

    debug!(
        bytes = bytes.len(),
        lines = listing.lines.len(),
        diagnostics = listing.diagnostics.len(),
        "disassembly complete"
    );
    listing
}
