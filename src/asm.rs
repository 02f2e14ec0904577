//! Two-pass assembler: source text to a list of [`MemoryCell`]s.
//!
//! ```text
//! source -> normalize -> parse -> pass 1 (symbols) -> pass 2 (encode)
//! ```
//!
//! PC-relative fields hold `target - address_of_instruction`; the executor
//! applies offsets to the same reference point.

use serde::{Deserialize, Serialize};

use crate::decoder::Opcode;
use crate::memory::MemoryCell;
use crate::parse::{parse_lines, Inst, Item, Src, Stmt, Target};
use crate::source::normalize;
use crate::symbols::{self, SymbolTable};
use crate::word::{field, fits_signed, Word};

/// How strictly numeric fields and labels are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validation {
    /// Full signed range checks; duplicate labels are errors.
    #[default]
    Strict,
    /// Historical behavior: only `value >= 2^width` is rejected, negative
    /// values are masked, data words are masked to 16 bits, and a redefined
    /// label silently takes the later address.
    Compat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsmConfig {
    /// Address named by the mandatory leading `ORG` line.
    pub origin: Word,
    pub validation: Validation,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            origin: 0x3000,
            validation: Validation::Strict,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("program is empty")]
    EmptyProgram,
    #[error("line {line}: the first line must be `ORG x{origin:04X}`")]
    MissingOrigin { line: usize, origin: Word },
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },
    #[error("line {line}: invalid operands for {mnemonic}: {reason}")]
    InvalidOperands { line: usize, mnemonic: String, reason: String },
    #[error("line {line}: unexpected characters after {mnemonic}: `{rest}`")]
    UnexpectedOperands { line: usize, mnemonic: String, rest: String },
    #[error("line {line}: undefined label `{label}`")]
    UndefinedLabel { line: usize, label: String },
    #[error("line {line}: label `{label}` already defined on line {first}")]
    DuplicateLabel { line: usize, label: String, first: usize },
    #[error("line {line}: immediate {value} in {mnemonic} does not fit in {width} bits")]
    ImmediateOutOfRange { line: usize, mnemonic: String, value: i64, width: u32 },
    #[error("line {line}: offset {offset} to `{operand}` in {mnemonic} does not fit in {width} bits")]
    OffsetOutOfRange { line: usize, mnemonic: String, operand: String, offset: i64, width: u32 },
    #[error("line {line}: program runs past address xFFFF")]
    AddressOverflow { line: usize },
}

/// An assembled program image with the labels that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub cells: Vec<MemoryCell>,
    pub symbols: SymbolTable,
}

/// Assembles `src` with the default configuration.
pub fn assemble(src: &str) -> Result<Vec<MemoryCell>, AsmError> {
    assemble_program(src, &AsmConfig::default()).map(|p| p.cells)
}

pub fn assemble_program(src: &str, cfg: &AsmConfig) -> Result<Program, AsmError> {
    let lines = normalize(src, cfg.origin)?;
    let items = parse_lines(&lines)?;
    let symbols = symbols::build(&items, cfg)?;
    let cells = encode_items(&items, &symbols, cfg)?;
    if cells.is_empty() {
        return Err(AsmError::EmptyProgram);
    }
    tracing::debug!(cells = cells.len(), labels = symbols.len(), "assembled");
    Ok(Program { cells, symbols })
}

/// Pass 2: re-walks the program from the origin and encodes one word per
/// instruction or data directive.
pub fn encode_items(items: &[Item], symbols: &SymbolTable, cfg: &AsmConfig) -> Result<Vec<MemoryCell>, AsmError> {
    let mut cells = Vec::new();
    let mut addr = cfg.origin;
    for item in items {
        match &item.stmt {
            None => {}
            Some(Stmt::Org(a)) => addr = *a,
            Some(Stmt::End) => break,
            Some(Stmt::Instr(inst)) => {
                let enc = Encoder { item, addr, symbols, validation: cfg.validation };
                let word = enc.encode(inst)?;
                tracing::trace!(line = item.line, addr = format_args!("{addr:#06x}"), word = format_args!("{word:016b}"), "encoded");
                cells.push(MemoryCell::new(addr, word));
                addr = addr.wrapping_add(1);
            }
        }
    }
    Ok(cells)
}

struct Encoder<'a> {
    item: &'a Item,
    addr: Word,
    symbols: &'a SymbolTable,
    validation: Validation,
}

impl Encoder<'_> {
    fn encode(&self, inst: &Inst) -> Result<Word, AsmError> {
        let word = match inst {
            Inst::Alu { op, dr, sr1, src } => {
                let tail = match src {
                    Src::Reg(r) => Word::from(*r),
                    Src::Imm(v) => (1 << 5) | self.imm(*v, 5)?,
                };
                op.bits() | reg(*dr, 9) | reg(*sr1, 6) | tail
            }
            Inst::Not { dr, sr } => Opcode::Not.bits() | reg(*dr, 9) | reg(*sr, 6) | 0x3F,
            Inst::Br { nzp, target } => Opcode::Br.bits() | (Word::from(*nzp) << 9) | self.offset(target, 9)?,
            Inst::PcRel { op, reg: r, target } => op.bits() | reg(*r, 9) | self.offset(target, 9)?,
            Inst::BaseOff { op, reg: r, base, offset } => {
                op.bits() | reg(*r, 9) | reg(*base, 6) | self.checked(*offset, 6, &format!("#{offset}"))?
            }
            Inst::Jmp { base } => Opcode::Jmp.bits() | reg(*base, 6),
            Inst::Jsr { target } => Opcode::Jsr.bits() | (1 << 11) | self.offset(target, 11)?,
            Inst::Jsrr { base } => Opcode::Jsr.bits() | reg(*base, 6),
            Inst::Halt => Opcode::Halt.bits(),
            Inst::Dec(v) => self.data(*v, -(1 << 15), 0xFFFF)?,
            Inst::Hex(v) => self.data(*v, 0, 0xFFFF)?,
        };
        Ok(word)
    }

    fn in_range(&self, value: i64, width: u32) -> bool {
        match self.validation {
            Validation::Strict => fits_signed(value, width),
            Validation::Compat => value < (1i64 << width),
        }
    }

    fn imm(&self, value: i64, width: u32) -> Result<Word, AsmError> {
        if !self.in_range(value, width) {
            return Err(AsmError::ImmediateOutOfRange {
                line: self.item.line,
                mnemonic: self.item.mnemonic.clone(),
                value,
                width,
            });
        }
        Ok(field(value, width))
    }

    fn offset(&self, target: &Target, width: u32) -> Result<Word, AsmError> {
        match target {
            Target::Offset(off) => self.checked(*off, width, &format!("#{off}")),
            Target::Label(label) => {
                let dest = self.symbols.get(label).ok_or_else(|| AsmError::UndefinedLabel {
                    line: self.item.line,
                    label: label.clone(),
                })?;
                let off = i64::from(dest) - i64::from(self.addr);
                self.checked(off, width, label)
            }
        }
    }

    fn checked(&self, off: i64, width: u32, operand: &str) -> Result<Word, AsmError> {
        if !self.in_range(off, width) {
            return Err(AsmError::OffsetOutOfRange {
                line: self.item.line,
                mnemonic: self.item.mnemonic.clone(),
                operand: operand.to_string(),
                offset: off,
                width,
            });
        }
        Ok(field(off, width))
    }

    /// `DEC`/`HEX` payloads. Strict mode bounds them to `lo..=hi`.
    fn data(&self, value: i64, lo: i64, hi: i64) -> Result<Word, AsmError> {
        if self.validation == Validation::Strict && !(lo..=hi).contains(&value) {
            return Err(AsmError::ImmediateOutOfRange {
                line: self.item.line,
                mnemonic: self.item.mnemonic.clone(),
                value,
                width: 16,
            });
        }
        Ok(field(value, 16))
    }
}

fn reg(r: u8, shift: u32) -> Word {
    Word::from(r & 0x7) << shift
}
