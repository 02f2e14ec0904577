use pretty_assertions::assert_eq;

use lc3_rs::{assemble, Cc, MachineState, Trap};

fn load(src: &str) -> MachineState {
    MachineState::load(&assemble(src).unwrap())
}

fn run(mut st: MachineState) -> MachineState {
    for _ in 0..1000 {
        if st.halted() {
            break;
        }
        st = st.step().unwrap();
    }
    st
}

const LOADS: &str = "\
ORG x3000
LD R0, VAL
LDI R1, PTR
LEA R2, VAL
LDR R3, R2, #2
HALT
VAL, DEC -5
PTR, HEX x3007
OTHER, DEC 9
END";

#[test]
fn fetch_mirrors_into_mar_mdr_ir() {
    let st = load("ORG x3000\nNOT R0, R0\nHALT\n").step().unwrap();
    assert_eq!(st.ir(), 0b1001_000_000_111111);
    assert_eq!(st.mar(), 0x3000);
    assert_eq!(st.mdr(), st.ir());
}

#[test]
fn ld_reads_pc_relative() {
    let st = load(LOADS).step().unwrap();
    assert_eq!(st.reg_signed(0), -5);
    assert_eq!(st.cc(), Cc::N);
    assert_eq!(st.mar(), 0x3005);
    assert_eq!(st.mdr(), 0xFFFB);
}

#[test]
fn ldi_follows_pointer() {
    let st = load(LOADS).step().unwrap().step().unwrap();
    assert_eq!(st.reg(1), 9);
    assert_eq!(st.cc(), Cc::P);
    // last access wins
    assert_eq!(st.mar(), 0x3007);
    assert_eq!(st.mdr(), 9);
}

#[test]
fn lea_does_not_touch_flags() {
    let st = load(LOADS).step().unwrap().step().unwrap().step().unwrap();
    assert_eq!(st.reg(2), 0x3005);
    assert_eq!(st.cc(), Cc::P);
}

#[test]
fn ldr_uses_base_plus_offset() {
    let st = run(load(LOADS));
    assert_eq!(st.reg(3), 9);
    assert!(st.halted());
}

#[test]
fn stores_write_mapped_cells() {
    let src = "\
ORG x3000
AND R0,R0,#0
ADD R0,R0,#7
ST R0, A
STI R0, PTR
LEA R1, A
STR R0, R1, #3
HALT
A, DEC 0
PTR, HEX x3009
B, DEC 0
C, DEC 0
END";
    let mut st = load(src);
    for _ in 0..6 {
        st = st.step().unwrap();
    }
    assert_eq!(st.mar(), 0x300A);
    assert_eq!(st.mdr(), 7);
    let st = run(st);
    assert_eq!(st.memory().read(0x3007), Some(7));
    assert_eq!(st.memory().read(0x3009), Some(7));
    assert_eq!(st.memory().read(0x300A), Some(7));
    assert_eq!(st.cells().len(), 11);
}

#[test]
fn unmapped_loads_and_stores_fail() {
    let st = load("ORG x3000\nLD R0, #100\nHALT\n");
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3000, addr: 0x3064 }));

    let st = load("ORG x3000\nST R0, #50\nHALT\n");
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3000, addr: 0x3032 }));
    assert_eq!(st.memory().len(), 2);

    let st = load("ORG x3000\nLEA R1, #0\nLDR R0, R1, #20\nHALT\n").step().unwrap();
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3001, addr: 0x3014 }));

    let st = load("ORG x3000\nLEA R1, #0\nSTR R0, R1, #-1\nHALT\n").step().unwrap();
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3001, addr: 0x2FFF }));

    // pointer cell exists, its target does not
    let st = load("ORG x3000\nLDI R0, P\nHALT\nP, HEX x4000\n");
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3000, addr: 0x4000 }));

    // STI dereferences a pointer that points nowhere
    let st = load("ORG x3000\nSTI R0, P\nHALT\nP, HEX x4000\n");
    assert_eq!(st.step(), Err(Trap::AddressNotMapped { pc: 0x3000, addr: 0x4000 }));
}

#[test]
fn loads_into_r7_are_reserved() {
    for line in ["LD R7, D", "LDI R7, D", "LDR R7, R0, #0", "LEA R7, D"] {
        let st = load(&format!("ORG x3000\n{line}\nHALT\nD, HEX x3000\n"));
        assert_eq!(st.step(), Err(Trap::ReservedRegister { pc: 0x3000 }), "{line}");
    }
}
