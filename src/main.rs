use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pm0vm::config::{DEFAULT_REGISTERS, DEFAULT_STACK_HEIGHT};
use pm0vm::{simulate, MachineConfig, Operation, ReadMode};

#[derive(Parser, Debug)]
#[command(name = "pm0vm")]
#[command(about = "Run a PM/0 program and print its code listing and execution trace")]
struct Args {
  /// Program file of `op r l m` quadruples
  #[arg(required_unless_present = "opcodes")]
  program: Option<PathBuf>,

  /// Write the listing and trace here instead of stdout
  #[arg(long, short)]
  output: Option<PathBuf>,

  /// Machine input for `sio` reads (default: stdin)
  #[arg(long, short)]
  input: Option<PathBuf>,

  /// Machine output for `sio` writes (default: stdout)
  #[arg(long = "vm-output")]
  vm_output: Option<PathBuf>,

  #[arg(long, default_value_t = DEFAULT_REGISTERS)]
  registers: usize,

  #[arg(long = "stack-height", default_value_t = DEFAULT_STACK_HEIGHT)]
  stack_height: usize,

  /// Stop with a fault after this many instructions
  #[arg(long = "step-limit")]
  step_limit: Option<u64>,

  /// What the `sio` read variant does: `jump` or `input`
  #[arg(long = "read-mode", default_value = "jump")]
  read_mode: ReadMode,

  /// Print the final registers and stack to stderr
  #[arg(long = "dump-state")]
  dump_state: bool,

  /// Print the opcode table and exit
  #[arg(long)]
  opcodes: bool,
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();
}

fn print_opcodes() {
  println!("{:>3} {:>3}", "#", "OP");
  for operation in Operation::all() {
    println!("{:>3} {:>3}  {:?}", operation.code(), operation, operation);
  }
}

fn writer(path: &Option<PathBuf>) -> io::Result<Box<dyn Write>> {
  Ok(match path {
    Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    None       => Box::new(io::stdout()),
  })
}

/// Runs the simulation; returns whether the machine halted normally.
fn run(args: &Args, program: &Path) -> pm0vm::error::Result<bool> {
  let config = MachineConfig {
    registers    : args.registers,
    stack_height : args.stack_height,
    step_limit   : args.step_limit,
    read_mode    : args.read_mode,
  };

  let mut program_in = BufReader::new(File::open(program)?);
  let mut out        = writer(&args.output)?;
  let mut vm_out     = writer(&args.vm_output)?;
  let mut vm_in: Box<dyn BufRead> = match &args.input {
    Some(path) => Box::new(BufReader::new(File::open(path)?)),
    None       => Box::new(BufReader::new(io::stdin())),
  };

  let (machine, report) = simulate(config, &mut program_in, &mut out, &mut vm_in, &mut vm_out)?;
  out.flush()?;
  vm_out.flush()?;

  if args.dump_state {
    eprintln!("{}", machine);
  }
  info!(steps = report.steps, halted = report.halted(), "simulation finished");
  Ok(report.halted())
}

fn main() {
  init_logging();

  let args = Args::parse();

  if args.opcodes {
    print_opcodes();
    return;
  }

  let program = match &args.program {
    Some(program) => program,
    None => {
      error!("no program given");
      process::exit(2);
    }
  };

  match run(&args, program) {
    Ok(true)  => {}
    Ok(false) => process::exit(1),
    Err(e)    => {
      error!("{}: {}", program.display(), e);
      process::exit(1);
    }
  }
}
