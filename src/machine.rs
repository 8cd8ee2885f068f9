//! The PM/0 virtual machine: register file, operand stack, and the fetch-advance-execute
//! cycle.

use std::collections::VecDeque;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

use prettytable::{format as TableFormat, Table};
use tracing::{debug, info};
#[cfg(feature = "trace_computation")]
use tracing::trace;

use crate::bytecode::{ArithmeticOp, Instruction, Program, Word};
use crate::config::{MachineConfig, ReadMode};
use crate::error::{AddressFault, ExecutionError, Fault};
use crate::stack::{ActivationRecord, FrameExtent, Stack, OUTERMOST_BP};

/// What the driver does after an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Signal {
  Continue,
  Halt,
}

/// The outcome of one successful step: which instruction ran, and whether to keep going.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Step {
  pub index  : Word,
  pub signal : Signal,
}

pub struct Machine {
  config : MachineConfig,

  // Memory Stores
  registers : Vec<Word>,
  stack     : Stack,

  // Registers //
  pc : Word, // Program Counter, the next instruction to fetch
  bp : Word, // Base Pointer, the current activation record
  sp : Word, // Stack Pointer, the highest live slot

  steps : u64,

  // Tokens of the last input line not yet consumed by a read.
  pending_input : VecDeque<String>,
}

impl Machine {

  // region Low-level utility methods

  pub fn new(config: MachineConfig) -> Machine {
    Machine {
      registers : vec![0; config.registers],
      stack     : Stack::new(config.stack_height),
      pc        : 0,
      bp        : OUTERMOST_BP,
      sp        : 0,
      steps     : 0,
      pending_input : VecDeque::new(),
      config,
    }
  }

  pub fn pc(&self) -> Word { self.pc }
  pub fn bp(&self) -> Word { self.bp }
  pub fn sp(&self) -> Word { self.sp }

  /// Number of instructions fetched so far.
  pub fn steps(&self) -> u64 { self.steps }

  pub fn config(&self) -> &MachineConfig {
    &self.config
  }

  pub fn registers(&self) -> &[Word] {
    &self.registers
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  /// The live frames, outermost first.
  pub fn frames(&self) -> Vec<FrameExtent> {
    self.stack.frames(self.sp, self.bp)
  }

  /// Base pointer of the frame `level` static levels out from the current one.
  pub fn base(&self, level: Word) -> Result<Word, AddressFault> {
    self.stack.base(level, self.bp)
  }

  fn register_index(&self, r: Word) -> Result<usize, AddressFault> {
    match usize::try_from(r) {
      Ok(i) if i < self.registers.len() => Ok(i),
      _                                  => Err(AddressFault::Register(r))
    }
  }

  pub fn register(&self, r: Word) -> Result<Word, AddressFault> {
    let i = self.register_index(r)?;
    Ok(self.registers[i])
  }

  fn set_register(&mut self, r: Word, value: Word) -> Result<(), AddressFault> {
    let i = self.register_index(r)?;
    self.registers[i] = value;
    Ok(())
  }

  /// Validates a new stack pointer against the stack's extent.
  fn checked_sp(&self, sp: i64) -> Result<Word, AddressFault> {
    if sp < 0 {
      return Err(AddressFault::StackUnderflow(sp));
    }
    if sp > self.stack.height() as i64 {
      return Err(AddressFault::StackOverflow(sp));
    }
    Ok(sp as Word)
  }

  // endregion

  // region Execution

  /**
    Runs one fetch-advance-execute cycle. PC is advanced before the instruction executes, so
    jump targets are absolute and everything else falls through.

    A fault carries the index of the instruction that raised it. `executed` is false when
    nothing could be fetched (PC outside code memory, or the step limit reached).
  */
  pub fn step<I, O>(&mut self, program: &Program, input: &mut I, output: &mut O)
    -> Result<Step, ExecutionError>
    where I: BufRead, O: Write
  {
    let index = self.pc;

    if let Some(limit) = self.config.step_limit {
      if self.steps >= limit {
        return Err(ExecutionError{ index, executed: false, fault: Fault::StepLimitExceeded(limit) });
      }
    }

    let instruction = match program.fetch(index) {
      Some(instruction) => instruction,
      None => {
        return Err(ExecutionError{ index, executed: false, fault: Fault::EndOfProgram(index) });
      }
    };

    self.pc = self.pc.wrapping_add(1);
    self.steps += 1;

    let signal = self.execute(instruction, input, output)
                     .map_err(|fault| ExecutionError{ index, executed: true, fault })?;

    #[cfg(feature = "trace_computation")]
    trace!("{}: {}\n{}", index, instruction, self);

    Ok(Step{ index, signal })
  }

  /// Steps until the program halts. Returns the number of instructions executed.
  pub fn run<I, O>(&mut self, program: &Program, input: &mut I, output: &mut O)
    -> Result<u64, ExecutionError>
    where I: BufRead, O: Write
  {
    loop {
      let step = self.step(program, input, output)?;
      if step.signal == Signal::Halt {
        info!(steps = self.steps, "machine halted");
        return Ok(self.steps);
      }
    }
  }

  /**
    Performs the state transition of a single instruction. This does not fetch or advance PC;
    `step` does that.
  */
  pub fn execute<I, O>(&mut self, instruction: &Instruction, input: &mut I, output: &mut O)
    -> Result<Signal, Fault>
    where I: BufRead, O: Write
  {
    match *instruction {

      Instruction::Lit{register, value} => {
        self.set_register(register, value)?;
      }

      Instruction::Rtn => {
        let header = self.stack.header(self.bp)?;
        if header.dynamic_link < OUTERMOST_BP {
          return Err(AddressFault::FrameUnderflow(header.dynamic_link).into());
        }
        debug!(from = self.bp, to = header.dynamic_link, pc = header.return_address, "return");
        self.sp = self.bp - 1;
        self.bp = header.dynamic_link;
        self.pc = header.return_address;
      }

      Instruction::Lod{register, level, offset} => {
        let base  = self.base(level)?;
        let value = self.stack.get_at(base, offset)?;
        self.set_register(register, value)?;
      }

      Instruction::Sto{register, level, offset} => {
        let base  = self.base(level)?;
        let value = self.register(register)?;
        self.stack.set_at(base, offset, value)?;
      }

      Instruction::Cal{level, target} => {
        let record = ActivationRecord {
          static_link    : self.base(level)?,
          dynamic_link   : self.bp,
          return_address : self.pc,
        };
        let new_bp = self.sp as i64 + 1;
        self.checked_sp(self.sp as i64 + ActivationRecord::SIZE as i64)?;
        self.stack.write_header(new_bp as Word, &record)?;
        debug!(bp = new_bp, static_link = record.static_link, target, "call");
        self.bp = new_bp as Word;
        self.pc = target;
      }

      Instruction::Inc{amount} => {
        self.sp = self.checked_sp(self.sp as i64 + amount as i64)?;
      }

      Instruction::Jmp{target} => {
        self.pc = target;
      }

      Instruction::Jpc{register, target} => {
        if self.register(register)? == 0 {
          self.pc = target;
        }
      }

      Instruction::Write{register} => {
        let value = self.register(register)?;
        write!(output, "{} ", value).map_err(|e| Fault::Io(e.to_string()))?;
        output.flush().map_err(|e| Fault::Io(e.to_string()))?;
      }

      Instruction::Read{register, target} => {
        match self.config.read_mode {
          ReadMode::Jump  => self.pc = target,
          ReadMode::Input => {
            // Check the register before consuming input.
            self.register_index(register)?;
            let value = self.read_word(input)?;
            self.set_register(register, value)?;
          }
        }
      }

      Instruction::Halt => return Ok(Signal::Halt),

      Instruction::Neg{dst, src} => {
        let value = self.register(src)?;
        self.set_register(dst, value.wrapping_neg())?;
      }

      Instruction::Arithmetic{op, dst, lhs, rhs} => {
        let lhs   = self.register(lhs)?;
        let rhs   = self.register(rhs)?;
        let value = arithmetic(op, lhs, rhs)?;
        self.set_register(dst, value)?;
      }

      Instruction::Odd{register} => {
        let value = self.register(register)?;
        self.set_register(register, value % 2)?;
      }

      Instruction::Comparison{op, dst, lhs, rhs} => {
        let holds = op.holds(self.register(lhs)?, self.register(rhs)?);
        self.set_register(dst, holds as Word)?;
      }

      Instruction::Illegal{opcode} => return Err(Fault::IllegalInstruction(opcode)),

    }

    Ok(Signal::Continue)
  }

  /// Reads the next whitespace-separated integer from the machine input.
  fn read_word<I: BufRead>(&mut self, input: &mut I) -> Result<Word, Fault> {
    loop {
      if let Some(token) = self.pending_input.pop_front() {
        return token.parse::<Word>()
                    .map_err(|_| Fault::Input(format!("`{}` is not an integer", token)));
      }

      let mut line = String::new();
      let read = input.read_line(&mut line).map_err(|e| Fault::Input(e.to_string()))?;
      if read == 0 {
        return Err(Fault::Input("end of input".to_string()));
      }
      self.pending_input.extend(line.split_whitespace().map(str::to_string));
    }
  }

  // endregion

  // region Display methods

  fn make_register_table<T> (
      name      : char,
      registers : &[T],
      highlight : Option<usize>,
      start     : usize
    ) -> Table
    where T: Display
  {

    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, cell) in registers.iter().enumerate() {
      match highlight == Some(i) {

        true  => {
          table.add_row(
            row![r->format!("BP --> {}[{}] =", name, i+start), format!("{}", cell)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("{}[{}] =", name, i+start), format!("{}", cell)]
          );
        }

      } // end match on highlight
    } // end for
    table
  }

  // endregion
}

/// Integer arithmetic with wrapping overflow. Division truncates toward zero and the
/// remainder takes the sign of the dividend.
fn arithmetic(op: ArithmeticOp, lhs: Word, rhs: Word) -> Result<Word, Fault> {
  match op {
    ArithmeticOp::Add => Ok(lhs.wrapping_add(rhs)),
    ArithmeticOp::Sub => Ok(lhs.wrapping_sub(rhs)),
    ArithmeticOp::Mul => Ok(lhs.wrapping_mul(rhs)),
    ArithmeticOp::Div if rhs == 0 => Err(Fault::Arithmetic("division")),
    ArithmeticOp::Div => Ok(lhs.wrapping_div(rhs)),
    ArithmeticOp::Mod if rhs == 0 => Err(Fault::Arithmetic("modulo")),
    ArithmeticOp::Mod => Ok(lhs.wrapping_rem(rhs)),
  }
}



lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let live    = self.stack.slice(1, self.sp);
    let bp_slot = match self.bp >= 1 && self.bp <= self.sp {
      true  => Some((self.bp - 1) as usize),
      false => None
    };
    let r_table = Machine::make_register_table('R', &self.registers[..], None, 0);
    let s_table = Machine::make_register_table('S', live, bp_slot, 1);

    let mut combined_table = table!([r_table, s_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Stack"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "PC: {}\tBP: {}\tSP: {}\n{}", self.pc, self.bp, self.sp, combined_table)
  }
}
