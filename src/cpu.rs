use bitflags::bitflags;
use serde::Serialize;

use crate::decoder::{Decoder, Lc3Decoder, Opcode};
use crate::exec::{Executor, IntExecutor};
use crate::memory::{Memory, MemoryCell};
use crate::word::Word;

/// Origin used when an empty image is loaded.
pub const DEFAULT_ORIGIN: Word = 0x3000;

bitflags! {
    /// Condition codes. Bit positions match the `nzp` field of `BR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct Cc: u8 {
        const N = 0b100;
        const Z = 0b010;
        const P = 0b001;
    }
}

impl Cc {
    /// The single flag describing `value` as a signed 16-bit number.
    pub fn of(value: Word) -> Self {
        if value == 0 {
            Cc::Z
        } else if value & 0x8000 != 0 {
            Cc::N
        } else {
            Cc::P
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Trap {
    /// No cell at `pc`, or the fetched word has no handler.
    #[error("unrecognized opcode at {pc:#06x}{}", fmt_opcode(.opcode))]
    UnrecognizedOpcode { pc: Word, opcode: Option<Opcode> },
    #[error("R7 is reserved for subroutine linkage (load at {pc:#06x})")]
    ReservedRegister { pc: Word },
    #[error("address {addr:#06x} is not mapped (instruction at {pc:#06x})")]
    AddressNotMapped { pc: Word, addr: Word },
    #[error("machine is halted (at {pc:#06x})")]
    Halted { pc: Word },
}

fn fmt_opcode(op: &Option<Opcode>) -> String {
    match op {
        Some(op) => format!(" ({:04b})", *op as u8),
        None => " (no instruction at this address)".to_string(),
    }
}

/// Complete simulation snapshot. Only [`MachineState::step`] produces a new
/// state from an existing one; everything else is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineState {
    pub(crate) regs: [Word; 8],
    pub(crate) cc: Cc,
    pub(crate) pc: Word,
    pub(crate) ir: Word,
    pub(crate) mar: Word,
    pub(crate) mdr: Word,
    pub(crate) memory: Memory,
    pub(crate) halted: bool,
}

impl MachineState {
    /// Fresh state for a program image: registers and flags cleared, PC at the
    /// first cell of the image.
    pub fn load(image: &[MemoryCell]) -> Self {
        let pc = image.first().map_or(DEFAULT_ORIGIN, |c| c.address);
        tracing::debug!(cells = image.len(), pc = format_args!("{pc:#06x}"), "load image");
        Self {
            regs: [0; 8],
            cc: Cc::empty(),
            pc,
            ir: 0,
            mar: 0,
            mdr: 0,
            memory: Memory::from_cells(image),
            halted: false,
        }
    }

    /// Executes one instruction and returns the resulting state. On error
    /// `self` is untouched and remains the last valid state.
    pub fn step(&self) -> Result<MachineState, Trap> {
        self.step_with(&Lc3Decoder, &IntExecutor)
    }

    pub fn step_with<D: Decoder, X: Executor>(&self, dec: &D, exec: &X) -> Result<MachineState, Trap> {
        if self.halted {
            return Err(Trap::Halted { pc: self.pc });
        }
        let mut next = self.clone();
        let pc = next.pc;
        let raw = next.memory.read(pc).ok_or(Trap::UnrecognizedOpcode { pc, opcode: None })?;
        next.mar = pc;
        next.mdr = raw;
        next.ir = raw;
        let d = dec.decode(raw);
        tracing::trace!(pc = format_args!("{pc:#06x}"), ir = format_args!("{raw:#06x}"), op = ?d.op, "step");
        if let Err(trap) = exec.exec(&mut next, d) {
            tracing::debug!(%trap, "step trapped");
            return Err(trap);
        }
        Ok(next)
    }

    pub fn reg(&self, r: usize) -> Word {
        self.regs[r]
    }

    pub fn reg_signed(&self, r: usize) -> i16 {
        self.regs[r] as i16
    }

    pub fn regs(&self) -> &[Word; 8] {
        &self.regs
    }

    pub fn cc(&self) -> Cc {
        self.cc
    }

    pub fn pc(&self) -> Word {
        self.pc
    }

    pub fn ir(&self) -> Word {
        self.ir
    }

    pub fn mar(&self) -> Word {
        self.mar
    }

    pub fn mdr(&self) -> Word {
        self.mdr
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Memory contents in address order.
    pub fn cells(&self) -> Vec<MemoryCell> {
        self.memory.cells().collect()
    }

    pub(crate) fn set_reg(&mut self, r: u8, val: Word) {
        self.regs[r as usize] = val;
    }

    /// Writes a register and updates N/Z/P from the written value.
    pub(crate) fn set_reg_cc(&mut self, r: u8, val: Word) {
        self.set_reg(r, val);
        self.cc = Cc::of(val);
    }
}
