//! Text renderings of code memory and of the execution trace. Columns are right-aligned to
//! width 3 and every cell is followed by a space.

use std::io::{self, Write};

use crate::bytecode::{Program, Record, Word};
use crate::machine::Machine;
use crate::stack::{FrameExtent, Stack, OUTERMOST_BP};

pub const CODE_MEMORY_BANNER : &str = "***Code Memory***";
pub const EXECUTION_BANNER   : &str = "***Execution***";
pub const HALT_MARKER        : &str = "HLT";
pub const FRAME_SEPARATOR    : &str = "| ";

/// Writes the code memory listing: a banner, a column header, and one row per record.
pub fn write_code_listing<W: Write>(out: &mut W, program: &Program) -> io::Result<()> {
  writeln!(out, "{}", CODE_MEMORY_BANNER)?;
  writeln!(out, "{:>3} {:>3} {:>3} {:>3} {:>3} ", "#", "OP", "R", "L", "M")?;
  for (index, record) in program.records().iter().enumerate() {
    writeln!(
      out,
      "{:>3} {:>3} {:>3} {:>3} {:>3} ",
      index, record.mnemonic(), record.r, record.l, record.m
    )?;
  }
  Ok(())
}

pub fn write_trace_header<W: Write>(out: &mut W) -> io::Result<()> {
  writeln!(out)?;
  writeln!(out, "{}", EXECUTION_BANNER)?;
  writeln!(
    out,
    "{:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} ",
    "#", "OP", "R", "L", "M", "PC", "BP", "SP", "STK"
  )
}

/// One trace row: the instruction executed at `index`, then the machine's PC, BP and SP after
/// it, then the stack.
pub fn write_trace_row<W: Write>(out: &mut W, index: Word, record: &Record, machine: &Machine)
  -> io::Result<()>
{
  writeln!(
    out,
    "{:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {}",
    index, record.mnemonic(), record.r, record.l, record.m,
    machine.pc(), machine.bp(), machine.sp(),
    render_stack(machine.stack(), &machine.frames())
  )
}

pub fn write_halt<W: Write>(out: &mut W) -> io::Result<()> {
  writeln!(out, "{}", HALT_MARKER)
}

/**
  Renders the live stack, outermost frame first. The outermost frame contributes a single
  zero; every frame with at least one live slot contributes a separator followed by its slots.
*/
pub fn render_stack(stack: &Stack, frames: &[FrameExtent]) -> String {
  let mut text = String::new();
  for frame in frames {
    if frame.base == OUTERMOST_BP {
      text.push_str(&format!("{:>3} ", 0));
    }
    if frame.base <= frame.top {
      text.push_str(FRAME_SEPARATOR);
      for value in stack.slice(frame.base, frame.top) {
        text.push_str(&format!("{:>3} ", value));
      }
    }
  }
  text
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::stack::ActivationRecord;

  #[test]
  fn code_listing(){
    let program = Program::new(vec![Record::new(1, 0, 0, 5), Record::new(0, 1, 2, 3)]);
    let mut out = Vec::new();
    write_code_listing(&mut out, &program).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "***Code Memory***\n  #  OP   R   L   M \n  0 lit   0   0   5 \n  1 illegal   1   2   3 \n"
    );
  }

  #[test]
  fn trace_header(){
    let mut out = Vec::new();
    write_trace_header(&mut out).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "\n***Execution***\n  #  OP   R   L   M  PC  BP  SP STK \n"
    );
  }

  #[test]
  fn sentinel_only(){
    let stack = Stack::new(8);
    assert_eq!(render_stack(&stack, &stack.frames(0, 1)), "  0 ");
  }

  #[test]
  fn nested_frames(){
    let mut stack = Stack::new(16);
    stack.set(4, 7).unwrap();
    stack.write_header(5, &ActivationRecord{ static_link: 1, dynamic_link: 1, return_address: 2 }).unwrap();
    assert_eq!(
      render_stack(&stack, &stack.frames(6, 5)),
      "  0 |   0   0   0   7 |   0   1 "
    );
    // Callee entered but not grown yet: no separator for it.
    assert_eq!(render_stack(&stack, &stack.frames(4, 5)), "  0 |   0   0   0   7 ");
  }

}
