use pretty_assertions::assert_eq;

use lc3_rs::decoder::{Lc3Decoder, Opcode};
use lc3_rs::exec::IntExecutor;
use lc3_rs::{assemble, Cc, MachineState, MemoryCell, Trap};

const AND_HALT: &str = "ORG x3000\nAND R1,R1,#0\nHALT\nEND";

#[test]
fn load_resets_machine() {
    let st = MachineState::load(&assemble(AND_HALT).unwrap());
    assert_eq!(st.regs(), &[0; 8]);
    assert_eq!(st.cc(), Cc::empty());
    assert_eq!(st.pc(), 0x3000);
    assert!(!st.halted());
}

#[test]
fn and_then_halt() {
    let st0 = MachineState::load(&assemble(AND_HALT).unwrap());
    let st1 = st0.step().unwrap();
    assert_eq!(st1.reg(1), 0);
    assert_eq!(st1.cc(), Cc::Z);
    assert!(!st1.halted());
    let st2 = st1.step().unwrap();
    assert!(st2.halted());
    assert_eq!(st2.pc(), 0x3001);
    // earlier snapshots are untouched
    assert_eq!(st0.pc(), 0x3000);
    assert_eq!(st2.step(), Err(Trap::Halted { pc: 0x3001 }));
}

#[test]
fn step_with_explicit_decoder_and_executor() {
    let st = MachineState::load(&assemble(AND_HALT).unwrap());
    assert_eq!(st.step_with(&Lc3Decoder::new(), &IntExecutor), st.step());
}

#[test]
fn unmapped_pc_leaves_state_unchanged() {
    let st = MachineState::load(&[MemoryCell::new(0x3000, 0b0001_000_000_1_00001)]);
    let st = st.step().unwrap();
    let before = st.clone();
    assert_eq!(st.step(), Err(Trap::UnrecognizedOpcode { pc: 0x3001, opcode: None }));
    assert_eq!(st, before);
}

#[test]
fn reserved_opcodes_trap() {
    for (word, op) in [(0x8000, Opcode::Rti), (0xF025, Opcode::Trap)] {
        let st = MachineState::load(&[MemoryCell::new(0x3000, word)]);
        assert_eq!(st.step(), Err(Trap::UnrecognizedOpcode { pc: 0x3000, opcode: Some(op) }));
    }
}

#[test]
fn first_cell_wins_on_duplicate_address() {
    let st = MachineState::load(&[MemoryCell::new(0x3000, 0xD000), MemoryCell::new(0x3000, 0x0000)]);
    assert!(st.step().unwrap().halted());
}

#[test]
fn empty_image_uses_default_origin() {
    let st = MachineState::load(&[]);
    assert_eq!(st.pc(), 0x3000);
    assert!(matches!(st.step(), Err(Trap::UnrecognizedOpcode { opcode: None, .. })));
}

#[test]
fn state_serializes() {
    let st = MachineState::load(&assemble(AND_HALT).unwrap()).step().unwrap();
    let v = serde_json::to_value(&st).unwrap();
    assert_eq!(v["pc"], 0x3001);
    assert_eq!(v["halted"], false);
    assert_eq!(v["regs"][1], 0);
}
