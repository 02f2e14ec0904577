use crate::cpu::{MachineState, Trap};
use crate::decoder::{Decoded, Opcode};
use crate::word::Word;

/// Register reserved for the return address of `JSR`/`JSRR`.
pub const LINK_REG: u8 = 7;

pub trait Executor {
    /// Runs one decoded instruction against `st`. `st.pc` still holds the
    /// address of the instruction; the handler is responsible for moving it.
    fn exec(&self, st: &mut MachineState, d: Decoded) -> Result<(), Trap>;
}

pub struct IntExecutor;

impl Executor for IntExecutor {
    fn exec(&self, st: &mut MachineState, d: Decoded) -> Result<(), Trap> {
        let pc = st.pc;
        // PC-relative targets are taken from the instruction's own address.
        let rel = pc.wrapping_add(d.imm as Word);
        let next = pc.wrapping_add(1);
        match d.op {
            Opcode::Add => {
                let a = st.regs[d.rs1 as usize];
                let b = if d.flag { d.imm as Word } else { st.regs[d.rs2 as usize] };
                st.set_reg_cc(d.rd, a.wrapping_add(b));
                st.pc = next;
            }
            Opcode::And => {
                let a = st.regs[d.rs1 as usize];
                let b = if d.flag { d.imm as Word } else { st.regs[d.rs2 as usize] };
                st.set_reg_cc(d.rd, a & b);
                st.pc = next;
            }
            Opcode::Not => {
                let a = st.regs[d.rs1 as usize];
                st.set_reg_cc(d.rd, !a);
                st.pc = next;
            }
            Opcode::Ld => {
                reserve_check(pc, d.rd)?;
                let val = load(st, pc, rel)?;
                st.set_reg_cc(d.rd, val);
                st.pc = next;
            }
            Opcode::Ldi => {
                reserve_check(pc, d.rd)?;
                let ptr = load(st, pc, rel)?;
                let val = load(st, pc, ptr)?;
                st.set_reg_cc(d.rd, val);
                st.pc = next;
            }
            Opcode::Ldr => {
                reserve_check(pc, d.rd)?;
                let addr = st.regs[d.rs1 as usize].wrapping_add(d.imm as Word);
                let val = load(st, pc, addr)?;
                st.set_reg_cc(d.rd, val);
                st.pc = next;
            }
            Opcode::Lea => {
                reserve_check(pc, d.rd)?;
                st.set_reg(d.rd, rel);
                st.pc = next;
            }
            Opcode::St => {
                let val = st.regs[d.rd as usize];
                store(st, pc, rel, val)?;
                st.pc = next;
            }
            Opcode::Sti => {
                let val = st.regs[d.rd as usize];
                let ptr = load(st, pc, rel)?;
                store(st, pc, ptr, val)?;
                st.pc = next;
            }
            Opcode::Str => {
                let val = st.regs[d.rd as usize];
                let addr = st.regs[d.rs1 as usize].wrapping_add(d.imm as Word);
                store(st, pc, addr, val)?;
                st.pc = next;
            }
            Opcode::Br => {
                let nzp = d.rd;
                // flags start cleared, so BRnzp must not depend on them
                let taken = nzp == 0 || nzp == 0b111 || nzp & st.cc.bits() != 0;
                st.pc = if taken { rel } else { next };
            }
            Opcode::Jmp => {
                st.pc = st.regs[d.rs1 as usize];
            }
            Opcode::Jsr => {
                // base is read before R7 is overwritten (JSRR R7)
                let target = if d.flag { rel } else { st.regs[d.rs1 as usize] };
                st.set_reg(LINK_REG, next);
                st.pc = target;
            }
            Opcode::Halt => {
                st.halted = true;
            }
            Opcode::Rti | Opcode::Trap => {
                return Err(Trap::UnrecognizedOpcode { pc, opcode: Some(d.op) });
            }
        }
        Ok(())
    }
}

fn reserve_check(pc: Word, dr: u8) -> Result<(), Trap> {
    if dr == LINK_REG {
        return Err(Trap::ReservedRegister { pc });
    }
    Ok(())
}

/// Reads `addr` through MAR/MDR.
fn load(st: &mut MachineState, pc: Word, addr: Word) -> Result<Word, Trap> {
    st.mar = addr;
    let val = st.memory.read(addr).ok_or(Trap::AddressNotMapped { pc, addr })?;
    st.mdr = val;
    Ok(val)
}

/// Writes `val` to `addr` through MAR/MDR. Memory is never grown.
fn store(st: &mut MachineState, pc: Word, addr: Word, val: Word) -> Result<(), Trap> {
    st.mar = addr;
    st.mdr = val;
    if !st.memory.write(addr, val) {
        return Err(Trap::AddressNotMapped { pc, addr });
    }
    Ok(())
}
