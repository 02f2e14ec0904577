use serde::{Deserialize, Serialize};

use crate::word::{sign_extend, Word};

/// The 4-bit opcode field (bits 15..12). All sixteen encodings are named so
/// dispatch can match exhaustively; `Rti` and `Trap` have no handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    Jmp = 0b1100,
    Halt = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

impl Opcode {
    pub fn of(raw: Word) -> Self {
        match raw >> 12 {
            0b0000 => Opcode::Br,
            0b0001 => Opcode::Add,
            0b0010 => Opcode::Ld,
            0b0011 => Opcode::St,
            0b0100 => Opcode::Jsr,
            0b0101 => Opcode::And,
            0b0110 => Opcode::Ldr,
            0b0111 => Opcode::Str,
            0b1000 => Opcode::Rti,
            0b1001 => Opcode::Not,
            0b1010 => Opcode::Ldi,
            0b1011 => Opcode::Sti,
            0b1100 => Opcode::Jmp,
            0b1101 => Opcode::Halt,
            0b1110 => Opcode::Lea,
            _ => Opcode::Trap,
        }
    }

    /// Opcode value placed in bits 15..12.
    pub fn bits(self) -> Word {
        (self as Word) << 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Opcode,
    pub raw: Word,
    pub rd: u8,   // bits 11..9 (DR/SR, or nzp for BR)
    pub rs1: u8,  // bits 8..6 (SR1/BaseR)
    pub rs2: u8,  // bits 2..0
    pub imm: i16, // sign-extended imm5/offset6/PCoffset9/PCoffset11
    pub flag: bool, // bit 5 for ADD/AND (immediate mode), bit 11 for JSR
}

pub trait Decoder {
    fn decode(&self, raw: Word) -> Decoded;
}

/// Field extraction for the LC-3 style encodings.
pub struct Lc3Decoder;

impl Lc3Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Lc3Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for Lc3Decoder {
    fn decode(&self, raw: Word) -> Decoded {
        let op = Opcode::of(raw);
        let rd = ((raw >> 9) & 0x7) as u8;
        let rs1 = ((raw >> 6) & 0x7) as u8;
        let rs2 = (raw & 0x7) as u8;
        let (imm, flag) = match op {
            Opcode::Add | Opcode::And => {
                let imm_mode = raw & (1 << 5) != 0;
                (if imm_mode { sign_extend(raw, 5) } else { 0 }, imm_mode)
            }
            Opcode::Ldr | Opcode::Str => (sign_extend(raw, 6), false),
            Opcode::Br | Opcode::Ld | Opcode::Ldi | Opcode::Lea | Opcode::St | Opcode::Sti => {
                (sign_extend(raw, 9), false)
            }
            Opcode::Jsr => {
                let long = raw & (1 << 11) != 0;
                (if long { sign_extend(raw, 11) } else { 0 }, long)
            }
            Opcode::Not | Opcode::Jmp | Opcode::Halt | Opcode::Rti | Opcode::Trap => (0, false),
        };
        Decoded { op, raw, rd, rs1, rs2, imm, flag }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_add_immediate() {
        // ADD R1, R2, #-3
        let d = Lc3Decoder::new().decode(0b0001_001_010_1_11101);
        assert_eq!(d.op, Opcode::Add);
        assert_eq!((d.rd, d.rs1), (1, 2));
        assert!(d.flag);
        assert_eq!(d.imm, -3);
    }

    #[test]
    fn decodes_jsr_vs_jsrr() {
        let dec = Lc3Decoder::new();
        let jsr = dec.decode(0b0100_1_11111111110);
        assert!(jsr.flag);
        assert_eq!(jsr.imm, -2);
        let jsrr = dec.decode(0b0100_0_00_011_000000);
        assert!(!jsrr.flag);
        assert_eq!(jsrr.rs1, 3);
    }

    #[test]
    fn every_nibble_has_an_opcode() {
        for nibble in 0u16..16 {
            assert_eq!(Opcode::of(nibble << 12).bits(), nibble << 12);
        }
    }
}
