use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use sm83_disasm::{load_raw_bin, parse_u32};
use sm83_rs::{disassemble, DisasmConfig, Sm83Decoder};

#[derive(Parser, Debug)]
#[command(author, version, about = "SM83 disassembler CLI", long_about = None)]
struct Cli {
    /// Load address for the binary in target address space
    #[arg(long, default_value = "0", value_parser = parse_u32)]
    base: u32,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Show instruction bytes
    #[arg(long)]
    show_bytes: bool,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write output to file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<String>,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.base, cli.skip, cli.len)?;
    tracing::info!(base = img.base, end = img.end(), "loaded image");

    let cfg = DisasmConfig { origin: img.base };
    let listing = disassemble(&Sm83Decoder::new(), &img.bytes, &cfg);
    for d in &listing.diagnostics {
        eprintln!("{:#06x}: {}", d.offset, d.error);
    }

    let buf = match cli.format {
        OutputFormat::Text => listing.to_text(cli.show_bytes),
        OutputFormat::Json => serde_json::to_string_pretty(&listing)?,
    };
    if let Some(path) = cli.out {
        std::fs::write(path, buf)?;
    } else {
        print!("{}", buf);
    }

    Ok(())
}
