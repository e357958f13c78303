use anyhow::{Context, Result};
use std::path::Path;

/// A raw binary image placed at `base` in the target address space.
#[derive(Debug, Clone)]
pub struct Image {
    pub base: u32,
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn end(&self) -> u32 {
        self.base.wrapping_add(self.bytes.len() as u32)
    }
}

pub fn load_raw_bin(path: &Path, base: u32, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image { base, bytes: payload.to_vec() })
}

/// CLI number parser: `0x` hex or decimal, non-negative.
pub fn parse_u32(s: &str) -> Result<u32> {
    let v = sm83_rs::parse_numeric(s)?;
    u32::try_from(v).with_context(|| format!("{s} does not fit in 32 bits"))
}
