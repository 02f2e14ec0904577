//! Turns normalized lines into typed statements. Numeric values are kept
//! as parsed here; range checks happen at encode time where the field width
//! and validation mode are known.

use crate::asm::AsmError;
use crate::decoder::Opcode;
use crate::instructions::{br_condition, is_reserved, lookup, AddrMode};
use crate::source::Line;
use crate::word::Word;

/// Second source operand of `ADD`/`AND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Src {
    Reg(u8),
    Imm(i64),
}

/// Operand of a PC-relative instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Label(String),
    Offset(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Alu { op: Opcode, dr: u8, sr1: u8, src: Src },
    Not { dr: u8, sr: u8 },
    Br { nzp: u8, target: Target },
    PcRel { op: Opcode, reg: u8, target: Target },
    BaseOff { op: Opcode, reg: u8, base: u8, offset: i64 },
    Jmp { base: u8 },
    Jsr { target: Target },
    Jsrr { base: u8 },
    Halt,
    Dec(i64),
    Hex(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Org(Word),
    End,
    Instr(Inst),
}

/// One source line after label extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub line: usize,
    pub label: Option<String>,
    /// Upper-cased mnemonic as written, for diagnostics.
    pub mnemonic: String,
    pub stmt: Option<Stmt>,
}

/// Parses every line up to and including `END`. Anything after `END` is
/// not part of the program.
pub fn parse_lines(lines: &[Line]) -> Result<Vec<Item>, AsmError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = parse_line(line)?;
        let end = matches!(item.stmt, Some(Stmt::End));
        items.push(item);
        if end {
            break;
        }
    }
    Ok(items)
}

pub fn parse_line(line: &Line) -> Result<Item, AsmError> {
    let (label, body) = split_label(&line.text);
    let label = label.map(str::to_string);
    if body.is_empty() {
        return Ok(Item { line: line.number, label, mnemonic: String::new(), stmt: None });
    }
    let (mn, rest) = match body.split_once(char::is_whitespace) {
        Some((mn, rest)) => (mn, rest.trim()),
        None => (body, ""),
    };
    let mnemonic = mn.to_ascii_uppercase();
    let stmt = parse_stmt(line.number, mn, &mnemonic, rest)?;
    tracing::trace!(line = line.number, label = ?label, %mnemonic, "parsed");
    Ok(Item { line: line.number, label, mnemonic, stmt: Some(stmt) })
}

/// Splits `LABEL, rest` into its parts. The prefix only counts as a label if
/// it is a single word that is not a mnemonic or directive.
pub fn split_label(text: &str) -> (Option<&str>, &str) {
    if let Some((head, tail)) = text.split_once(',') {
        let head = head.trim();
        let is_word = !head.is_empty() && head.chars().all(|c| c.is_alphanumeric() || c == '_');
        if is_word && !is_reserved(head) {
            return (Some(head), tail.trim());
        }
    }
    (None, text)
}

fn parse_stmt(line: usize, raw_mn: &str, mnemonic: &str, rest: &str) -> Result<Stmt, AsmError> {
    let invalid = |reason: String| AsmError::InvalidOperands { line, mnemonic: mnemonic.to_string(), reason };
    let no_operands = |stmt: Stmt| {
        if rest.is_empty() {
            Ok(stmt)
        } else {
            Err(AsmError::UnexpectedOperands { line, mnemonic: mnemonic.to_string(), rest: rest.to_string() })
        }
    };

    match mnemonic {
        "ORG" => {
            let addr = parse_hex(rest).ok_or_else(|| invalid(format!("expected a hex address, got `{rest}`")))?;
            let addr = Word::try_from(addr).map_err(|_| invalid(format!("address `{rest}` exceeds xFFFF")))?;
            return Ok(Stmt::Org(addr));
        }
        "END" => return no_operands(Stmt::End),
        "DEC" => {
            let digits = rest.strip_prefix('#').unwrap_or(rest);
            let v = parse_radix(digits, 10).ok_or_else(|| invalid(format!("expected a decimal value, got `{rest}`")))?;
            return Ok(Stmt::Instr(Inst::Dec(v)));
        }
        "HEX" => {
            let v = parse_hex(rest).ok_or_else(|| invalid(format!("expected a hex value, got `{rest}`")))?;
            return Ok(Stmt::Instr(Inst::Hex(v)));
        }
        _ => {}
    }

    if let Some(nzp) = br_condition(raw_mn) {
        let ops = operands(rest);
        let [target] = ops.as_slice() else {
            return Err(invalid(format!("expected 1 operand, got {}", ops.len())));
        };
        let target = parse_target(target).ok_or_else(|| invalid(format!("bad target `{target}`")))?;
        return Ok(Stmt::Instr(Inst::Br { nzp, target }));
    }

    let Some(desc) = lookup(mnemonic) else {
        return Err(glued_operands(line, raw_mn, rest)
            .unwrap_or_else(|| AsmError::UnknownMnemonic { line, mnemonic: raw_mn.to_string() }));
    };
    let ops = operands(rest);
    let expect = |n: usize| {
        if ops.len() == n {
            Ok(())
        } else {
            Err(invalid(format!("expected {n} operand{}, got {}", if n == 1 { "" } else { "s" }, ops.len())))
        }
    };
    let reg = |s: &str| parse_register(s).ok_or_else(|| invalid(format!("`{s}` is not a register R0-R7")));
    let target = |s: &str| parse_target(s).ok_or_else(|| invalid(format!("bad target `{s}`")));

    let inst = match desc.mode {
        AddrMode::Alu => {
            expect(3)?;
            let src = if starts_literal(ops[2]) {
                Src::Imm(parse_literal(ops[2]).ok_or_else(|| invalid(format!("bad immediate `{}`", ops[2])))?)
            } else {
                Src::Reg(reg(ops[2])?)
            };
            Inst::Alu { op: desc.op, dr: reg(ops[0])?, sr1: reg(ops[1])?, src }
        }
        AddrMode::Unary => {
            expect(2)?;
            Inst::Not { dr: reg(ops[0])?, sr: reg(ops[1])? }
        }
        AddrMode::PcRel => {
            expect(2)?;
            Inst::PcRel { op: desc.op, reg: reg(ops[0])?, target: target(ops[1])? }
        }
        AddrMode::BaseOff => {
            expect(3)?;
            let offset = parse_literal(ops[2]).ok_or_else(|| invalid(format!("bad offset `{}`", ops[2])))?;
            Inst::BaseOff { op: desc.op, reg: reg(ops[0])?, base: reg(ops[1])?, offset }
        }
        AddrMode::Base => {
            expect(1)?;
            let base = reg(ops[0])?;
            if desc.op == Opcode::Jsr {
                Inst::Jsrr { base }
            } else {
                Inst::Jmp { base }
            }
        }
        AddrMode::Long => {
            expect(1)?;
            Inst::Jsr { target: target(ops[0])? }
        }
        AddrMode::None => {
            return match desc.op {
                Opcode::Jmp => no_operands(Stmt::Instr(Inst::Jmp { base: 7 })),
                _ => no_operands(Stmt::Instr(Inst::Halt)),
            };
        }
    };
    Ok(Stmt::Instr(inst))
}

/// `HALTX`, `RET,` and the like: a zero-operand mnemonic with text stuck to
/// it reports the leftover text rather than an unknown mnemonic.
fn glued_operands(line: usize, raw_mn: &str, rest: &str) -> Option<AsmError> {
    let upper = raw_mn.to_ascii_uppercase();
    // HALT before HLT
    let base = ["HALT", "HLT", "RET"].into_iter().find(|m| upper.starts_with(m))?;
    let mut leftover = raw_mn[base.len()..].to_string();
    if !rest.is_empty() {
        leftover.push(' ');
        leftover.push_str(rest);
    }
    Some(AsmError::UnexpectedOperands { line, mnemonic: base.to_string(), rest: leftover })
}

fn operands(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    }
}

/// A label, or a `#` literal used as the raw offset. Only `#` is accepted
/// here so that labels such as `XA` or `B1` keep their meaning.
fn parse_target(s: &str) -> Option<Target> {
    match s.strip_prefix('#') {
        Some(d) => parse_radix(d, 10).map(Target::Offset),
        None if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            Some(Target::Label(s.to_string()))
        }
        None => None,
    }
}

fn starts_literal(s: &str) -> bool {
    s.starts_with(|c: char| matches!(c, '#' | 'x' | 'X' | 'b' | 'B'))
}

/// `R0`..`R7`, case-insensitive.
pub fn parse_register(s: &str) -> Option<u8> {
    let mut chars = s.chars();
    let (r, n) = (chars.next()?, chars.next()?);
    if chars.next().is_some() || !r.eq_ignore_ascii_case(&'R') {
        return None;
    }
    n.to_digit(10).filter(|&d| d < 8).map(|d| d as u8)
}

/// `#dec`, `xhex`, `bbin`, each with an optional sign after the prefix.
pub fn parse_literal(s: &str) -> Option<i64> {
    if let Some(d) = s.strip_prefix('#') {
        parse_radix(d, 10)
    } else if let Some(d) = s.strip_prefix(|c: char| c == 'x' || c == 'X') {
        parse_radix(d, 16)
    } else if let Some(d) = s.strip_prefix(|c: char| c == 'b' || c == 'B') {
        parse_radix(d, 2)
    } else {
        None
    }
}

/// Hex with or without the `x` prefix.
pub fn parse_hex(s: &str) -> Option<i64> {
    parse_radix(s.strip_prefix(|c: char| c == 'x' || c == 'X').unwrap_or(s), 16)
}

fn parse_radix(s: &str, radix: u32) -> Option<i64> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let v = i64::from_str_radix(digits, radix).ok()?;
    Some(if neg { -v } else { v })
}
