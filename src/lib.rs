pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod parse;
pub mod source;
pub mod symbols;
pub mod word;

pub use asm::{assemble, assemble_program, AsmConfig, AsmError, Program, Validation};
pub use cpu::{Cc, MachineState, Trap};
pub use memory::{Memory, MemoryCell};
pub use symbols::SymbolTable;
pub use word::Word;
