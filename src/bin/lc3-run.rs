use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use lc3_rs::disasm::fmt_at;
use lc3_rs::{assemble_program, AsmConfig, MachineState, Validation};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble an LC-3 source file and run it one instruction at a time"
)]
struct Opts {
    /// Stop after this many instructions even if the program has not halted
    #[arg(long, default_value_t = 10_000u64)]
    max_steps: u64,
    /// Print every executed instruction
    #[arg(long)]
    trace: bool,
    /// Accept the historical (masking) range checks
    #[arg(long)]
    compat: bool,
    /// Final state output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[arg(value_name = "ASMFILE")]
    input: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let src = std::fs::read_to_string(&opts.input).with_context(|| format!("reading {}", opts.input))?;
    let cfg = AsmConfig {
        validation: if opts.compat { Validation::Compat } else { Validation::Strict },
        ..AsmConfig::default()
    };
    let program = assemble_program(&src, &cfg)?;

    let mut state = MachineState::load(&program.cells);
    let mut steps = 0u64;
    while !state.halted() && steps < opts.max_steps {
        if opts.trace {
            let text = state.memory().read(state.pc()).map(|w| fmt_at(w, state.pc()));
            eprintln!("{:#06x}: {}", state.pc(), text.as_deref().unwrap_or("<unmapped>"));
        }
        match state.step() {
            Ok(next) => state = next,
            Err(trap) => {
                eprintln!("TRAP: {trap}");
                break;
            }
        }
        steps += 1;
    }
    if !state.halted() && steps >= opts.max_steps {
        eprintln!("stopped after {steps} steps without halting");
    }

    match opts.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Text => print_state(&state, steps),
    }
    Ok(())
}

fn print_state(st: &MachineState, steps: u64) {
    println!("steps: {steps}  halted: {}", st.halted());
    for (i, r) in st.regs().iter().enumerate() {
        println!("R{i} = x{r:04X} ({})", *r as i16);
    }
    println!("PC  = x{:04X}", st.pc());
    println!("IR  = {:016b}", st.ir());
    println!("MAR = x{:04X}", st.mar());
    println!("MDR = x{:04X}", st.mdr());
    println!("CC  = {:?}", st.cc());
}
