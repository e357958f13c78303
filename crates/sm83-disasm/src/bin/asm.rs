use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sm83_rs::{assemble, AsmConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "SM83 assembler (one instruction per line)")]
struct Opts {
    /// Input assembly file
    #[arg(short, long)]
    input: PathBuf,
    /// Output binary file (raw, little-endian immediates)
    #[arg(short, long)]
    output: PathBuf,
    /// Stop at the first unrecognized instruction
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("cannot read {}", opts.input.display()))?;

    let cfg = AsmConfig { strict: opts.strict };
    let asm = assemble(&text, &cfg)?;
    if !asm.is_clean() {
        for u in &asm.unrecognized {
            eprintln!("{}: {}", opts.input.display(), u);
        }
        bail!("{} unrecognized instruction(s); no output written", asm.unrecognized.len());
    }

    fs::write(&opts.output, &asm.bytes)
        .with_context(|| format!("cannot write {}", opts.output.display()))?;
    Ok(())
}
