//! Machine faults and the errors surfaced by loading and running a program.

use thiserror::Error;

use crate::bytecode::Word;

/// Why an address could not be resolved or a slot could not be touched.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum AddressFault {
  #[error("static link chain ended after {walked} of {level} levels (from BP {bp})")]
  StaticChainExhausted { level: Word, walked: Word, bp: Word },

  #[error("negative lexicographic level {0}")]
  NegativeLevel(Word),

  #[error("stack slot {0} is outside the stack")]
  StackSlot(i64),

  #[error("register R{0} does not exist")]
  Register(Word),

  #[error("stack overflow: SP would become {0}")]
  StackOverflow(i64),

  #[error("stack underflow: SP would become {0}")]
  StackUnderflow(i64),

  #[error("return to invalid base pointer {0}")]
  FrameUnderflow(Word),
}

/// A fault raised while executing a single instruction. Faults are not recoverable; the
/// driver stops the machine at the first one.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum Fault {
  #[error("illegal instruction (opcode {0})")]
  IllegalInstruction(Word),

  #[error("address fault: {0}")]
  Address(#[from] AddressFault),

  #[error("arithmetic fault: {0} by zero")]
  Arithmetic(&'static str),

  #[error("end of program: PC {0} is outside code memory")]
  EndOfProgram(Word),

  #[error("step limit of {0} instructions exceeded")]
  StepLimitExceeded(u64),

  #[error("input fault: {0}")]
  Input(String),

  #[error("output error: {0}")]
  Io(String),
}

/// A fault together with the index of the instruction that raised it.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{fault} at instruction {index}")]
pub struct ExecutionError {
  pub index : Word,
  /// Whether an instruction was actually fetched (and so appears in the trace).
  pub executed : bool,
  pub fault : Fault,
}

/// A malformed program text.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LoadError {
  #[error("line {line}: expected an integer, found `{found}`")]
  NotAnInteger { line: usize, found: String },

  #[error("line {line}: integer `{text}` does not fit in a machine word")]
  OutOfRange { line: usize, text: String },

  #[error("line {line}: incomplete instruction, expected 4 fields but found {fields}")]
  Incomplete { line: usize, fields: usize },
}

/// Errors of the simulation driver and the command line front end.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Load(#[from] LoadError),

  #[error(transparent)]
  Execution(#[from] ExecutionError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
