/*!

  The VM executes fixed-width instructions. On the wire (and in the program text) an
  instruction is a quadruple of integers:

    OP:  operation selector, 1..=24 (anything else is illegal)
    R:   register index
    L:   lexicographic level, or a register index for arithmetic
    M:   immediate, code address, stack offset, or a register index

  The meaning of R, L and M depends on the operation. Rather than carrying three
  generically-named integers through the interpreter, each `Record` is decoded once at load
  time into an `Instruction`, an enum with one variant per operation family and named
  fields. The raw `Record`s are kept next to the decoded instructions in a `Program`, since
  the code listing and the execution trace print the fields exactly as they were given.

*/

use std::convert::TryFrom;

mod instruction;
mod operation;
mod record;

pub use instruction::{ArithmeticOp, ComparisonOp, Instruction};
pub use operation::{mnemonic_of, Operation, ILLEGAL_MNEMONIC};
pub use record::{decode_record, encode_instruction, Record};

/// The machine integer. Registers, stack slots and instruction fields are all `Word`s.
pub type Word = i32;

/// Code memory: the records as loaded, and the instruction each one decodes to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
  records      : Vec<Record>,
  instructions : Vec<Instruction>,
}

impl Program {

  pub fn new(records: Vec<Record>) -> Program {
    let instructions = records.iter().map(decode_record).collect();
    Program{ records, instructions }
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  /// Fetches the decoded instruction at `pc`, or `None` if `pc` lies outside code memory.
  pub fn fetch(&self, pc: Word) -> Option<&Instruction> {
    match usize::try_from(pc) {
      Ok(index) => self.instructions.get(index),
      Err(_)    => None
    }
  }

  pub fn record(&self, index: usize) -> Option<&Record> {
    self.records.get(index)
  }
}

impl From<Vec<Record>> for Program {
  fn from(records: Vec<Record>) -> Program {
    Program::new(records)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fetch_in_and_out_of_range(){
    let program = Program::new(vec![
      Record::new(1, 0, 0, 5),
      Record::new(11, 0, 0, 3),
    ]);
    assert_eq!(program.len(), 2);
    assert_eq!(program.fetch(0), Some(&Instruction::Lit{ register: 0, value: 5 }));
    assert_eq!(program.fetch(1), Some(&Instruction::Halt));
    assert_eq!(program.fetch(2), None);
    assert_eq!(program.fetch(-1), None);
  }

  #[test]
  fn records_are_kept_verbatim(){
    // `lit` ignores L, but the listing still shows it.
    let records = vec![Record::new(1, 2, 7, 9), Record::new(99, 1, 2, 3)];
    let program = Program::from(records.clone());
    assert_eq!(program.records(), records.as_slice());
    assert_eq!(program.fetch(1), Some(&Instruction::Illegal{ opcode: 99 }));
  }

}
