use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lc3_rs::disasm::fmt_at;
use lc3_rs::{assemble_program, AsmConfig, Program, Word};

/// One listing line per assembled word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub address: Word,
    pub bits: String,
    pub hex: String,
    pub label: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelKV {
    pub addr: Word,
    pub name: String,
}

pub fn load_source(path: &Path, cfg: &AsmConfig) -> Result<Program> {
    let src = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let program = assemble_program(&src, cfg)?;
    Ok(program)
}

pub fn build_listing(program: &Program) -> Listing {
    let rows = program
        .cells
        .iter()
        .map(|c| Row {
            address: c.address,
            bits: c.bits(),
            hex: format!("x{:04X}", c.content),
            label: program.symbols.label_at(c.address).map(str::to_string),
            text: fmt_at(c.content, c.address),
        })
        .collect();
    Listing { rows }
}

/// Labels ordered by address.
pub fn symbol_rows(program: &Program) -> Vec<LabelKV> {
    program
        .symbols
        .sorted()
        .into_iter()
        .map(|(name, addr)| LabelKV { addr, name: name.to_string() })
        .collect()
}

impl Listing {
    pub fn render(&self, show_bits: bool) -> String {
        let mut buf = String::new();
        for r in &self.rows {
            let label = r.label.as_deref().unwrap_or("");
            let _ = write!(buf, "x{:04X}  {}  ", r.address, r.hex);
            if show_bits {
                let _ = write!(buf, "{}  ", r.bits);
            }
            let _ = writeln!(buf, "{label:<12} {}", r.text);
        }
        buf
    }
}
