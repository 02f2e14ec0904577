use crate::decoder::{Decoded, Decoder, Lc3Decoder, Opcode};
use crate::word::Word;

/// Renders a decoded word as assembly, with PC-relative operands as raw
/// `#offset`s.
pub fn fmt_decoded(d: &Decoded) -> String {
    render(d, |off| format!("#{off}"))
}

/// Like [`fmt_decoded`] but resolves PC-relative operands against the
/// address the word lives at.
pub fn fmt_at(raw: Word, addr: Word) -> String {
    let d = Lc3Decoder.decode(raw);
    render(&d, |off| format!("x{:04X}", addr.wrapping_add(off as Word)))
}

fn render(d: &Decoded, target: impl Fn(i16) -> String) -> String {
    match d.op {
        Opcode::Add => alu("ADD", d),
        Opcode::And => alu("AND", d),
        Opcode::Not => format!("NOT R{}, R{}", d.rd, d.rs1),
        // no source spelling produces nzp=000
        Opcode::Br if d.rd == 0 => format!(".FILL x{:04X}", d.raw),
        Opcode::Br => {
            let mut mn = String::from("BR");
            for (bit, ch) in [(0b100, 'n'), (0b010, 'z'), (0b001, 'p')] {
                if d.rd & bit != 0 {
                    mn.push(ch);
                }
            }
            format!("{mn} {}", target(d.imm))
        }
        Opcode::Ld => pcrel("LD", d, &target),
        Opcode::Ldi => pcrel("LDI", d, &target),
        Opcode::Lea => pcrel("LEA", d, &target),
        Opcode::St => pcrel("ST", d, &target),
        Opcode::Sti => pcrel("STI", d, &target),
        Opcode::Ldr => format!("LDR R{}, R{}, #{}", d.rd, d.rs1, d.imm),
        Opcode::Str => format!("STR R{}, R{}, #{}", d.rd, d.rs1, d.imm),
        Opcode::Jmp if d.rs1 == 7 => "RET".to_string(),
        Opcode::Jmp => format!("JMP R{}", d.rs1),
        Opcode::Jsr if d.flag => format!("JSR {}", target(d.imm)),
        Opcode::Jsr => format!("JSRR R{}", d.rs1),
        Opcode::Halt => "HALT".to_string(),
        Opcode::Rti | Opcode::Trap => format!(".FILL x{:04X}", d.raw),
    }
}

fn alu(mn: &str, d: &Decoded) -> String {
    if d.flag {
        format!("{mn} R{}, R{}, #{}", d.rd, d.rs1, d.imm)
    } else {
        format!("{mn} R{}, R{}, R{}", d.rd, d.rs1, d.rs2)
    }
}

fn pcrel(mn: &str, d: &Decoded, target: &impl Fn(i16) -> String) -> String {
    format!("{mn} R{}, {}", d.rd, target(d.imm))
}
