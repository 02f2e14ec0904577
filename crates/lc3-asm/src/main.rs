use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::path::Path;

use lc3_asm::{build_listing, load_source, symbol_rows};
use lc3_rs::{AsmConfig, Validation, Word};

#[derive(Parser, Debug)]
#[command(author, version, about = "LC-3 assembler CLI", long_about=None)]
struct Cli {
    /// Origin the mandatory `ORG` header must name (hex or dec)
    #[arg(long, default_value = "0x3000")]
    origin: String,
    /// Accept the historical (masking) range checks
    #[arg(long)]
    compat: bool,
    /// Input assembly path
    #[arg(value_name = "ASMFILE")]
    input: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one line per assembled word
    Listing {
        /// Show the 16-bit binary form of each word
        #[arg(long)]
        show_bits: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Print the symbol table (Vec<{ addr, name }> in json)
    Symbols {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

fn parse_word(s: &str) -> Result<Word> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).or_else(|| s.strip_prefix('x')) {
        Ok(Word::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<Word>()?)
    }
}

fn emit(buf: String, out: Option<String>) -> Result<()> {
    if let Some(path) = out { std::fs::write(path, buf)?; } else { print!("{}", buf); }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = AsmConfig {
        origin: parse_word(&cli.origin)?,
        validation: if cli.compat { Validation::Compat } else { Validation::Strict },
    };
    let program = load_source(Path::new(&cli.input), &cfg)?;

    match cli.cmd {
        Command::Listing { show_bits, format, out } => {
            let listing = build_listing(&program);
            let buf = match format {
                OutputFormat::Text => listing.render(show_bits),
                OutputFormat::Json => serde_json::to_string_pretty(&listing)? + "\n",
            };
            emit(buf, out)?;
        }
        Command::Symbols { format, out } => {
            let rows = symbol_rows(&program);
            let buf = match format {
                OutputFormat::Text => {
                    let mut s = String::new();
                    for r in &rows {
                        s.push_str(&format!("x{:04X}  {}\n", r.addr, r.name));
                    }
                    s
                }
                OutputFormat::Json => serde_json::to_string_pretty(&rows)? + "\n",
            };
            emit(buf, out)?;
        }
    }
    Ok(())
}
