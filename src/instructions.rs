use crate::decoder::Opcode;

/// Operand shape of a mnemonic, as written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// `DR, SR1, SR2|imm5`
    Alu,
    /// `DR, SR`
    Unary,
    /// `R, label|offset9`
    PcRel,
    /// `R, BaseR, offset6`
    BaseOff,
    /// `BaseR`
    Base,
    /// `label|offset11`
    Long,
    /// no operands
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Opcode,
    pub mnemonic: &'static str,
    pub mode: AddrMode,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc { op: Opcode::Add, mnemonic: "ADD", mode: AddrMode::Alu },
    InstrDesc { op: Opcode::And, mnemonic: "AND", mode: AddrMode::Alu },
    InstrDesc { op: Opcode::Not, mnemonic: "NOT", mode: AddrMode::Unary },
    InstrDesc { op: Opcode::Ld, mnemonic: "LD", mode: AddrMode::PcRel },
    InstrDesc { op: Opcode::Ldi, mnemonic: "LDI", mode: AddrMode::PcRel },
    InstrDesc { op: Opcode::Lea, mnemonic: "LEA", mode: AddrMode::PcRel },
    InstrDesc { op: Opcode::St, mnemonic: "ST", mode: AddrMode::PcRel },
    InstrDesc { op: Opcode::Sti, mnemonic: "STI", mode: AddrMode::PcRel },
    InstrDesc { op: Opcode::Ldr, mnemonic: "LDR", mode: AddrMode::BaseOff },
    InstrDesc { op: Opcode::Str, mnemonic: "STR", mode: AddrMode::BaseOff },
    InstrDesc { op: Opcode::Jmp, mnemonic: "JMP", mode: AddrMode::Base },
    InstrDesc { op: Opcode::Jmp, mnemonic: "RET", mode: AddrMode::None },
    InstrDesc { op: Opcode::Jsr, mnemonic: "JSR", mode: AddrMode::Long },
    InstrDesc { op: Opcode::Jsr, mnemonic: "JSRR", mode: AddrMode::Base },
    InstrDesc { op: Opcode::Halt, mnemonic: "HALT", mode: AddrMode::None },
    InstrDesc { op: Opcode::Halt, mnemonic: "HLT", mode: AddrMode::None },
];

/// Assembler directives. They share the mnemonic namespace with [`TABLE`].
pub const DIRECTIVES: &[&str] = &["ORG", "END", "DEC", "HEX"];

/// Looks up a (case-insensitive) mnemonic. `BR` variants are handled by
/// [`br_condition`] since they carry their operand in the name.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Parses `BR`, `BRn`, `BRzp`, ... into the `nzp` bits of the instruction.
/// Letters must appear in `n`, `z`, `p` order. A bare `BR` is unconditional.
pub fn br_condition(mnemonic: &str) -> Option<u8> {
    let prefix = mnemonic.get(..2)?;
    if !prefix.eq_ignore_ascii_case("BR") {
        return None;
    }
    let suffix = &mnemonic[2..];
    if suffix.is_empty() {
        return Some(0b111);
    }
    let mut nzp = 0u8;
    let mut last = 0u8;
    for ch in suffix.chars() {
        let bit = match ch.to_ascii_lowercase() {
            'n' => 0b100,
            'z' => 0b010,
            'p' => 0b001,
            _ => return None,
        };
        // each letter once, in n-z-p order
        if last != 0 && bit >= last {
            return None;
        }
        nzp |= bit;
        last = bit;
    }
    Some(nzp)
}

/// True for any token that cannot be used as a label.
pub fn is_reserved(token: &str) -> bool {
    lookup(token).is_some()
        || br_condition(token).is_some()
        || DIRECTIVES.iter().any(|d| d.eq_ignore_ascii_case(token))
}
