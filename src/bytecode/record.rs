/*!
  This module is responsible for decoding raw instruction records into `Instruction`s and
  encoding them back.

*/
use std::fmt::{Display, Formatter};

use super::{ArithmeticOp, ComparisonOp, Instruction, Operation, Word};
use super::operation::mnemonic_of;

/// The four integer fields of an instruction as they appear in a program: `op r l m`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Record {
  pub op : Word,
  pub r  : Word,
  pub l  : Word,
  pub m  : Word,
}

impl Record {
  pub fn new(op: Word, r: Word, l: Word, m: Word) -> Record {
    Record{ op, r, l, m }
  }

  pub fn mnemonic(&self) -> &'static str {
    mnemonic_of(self.op)
  }
}

impl Display for Record {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {} {} {}", self.mnemonic(), self.r, self.l, self.m)
  }
}

/// Decodes a record into the instruction its opcode selects. Never fails: unrecognized
/// opcodes decode to `Instruction::Illegal` and fault only if executed.
pub fn decode_record(record: &Record) -> Instruction {
  let Record{ op, r, l, m } = *record;

  let operation = match Operation::from_word(op) {
    Some(operation) => operation,
    None            => return Instruction::Illegal{ opcode: op }
  };

  match operation {
    Operation::Lit      => Instruction::Lit{ register: r, value: m },
    Operation::Rtn      => Instruction::Rtn,
    Operation::Lod      => Instruction::Lod{ register: r, level: l, offset: m },
    Operation::Sto      => Instruction::Sto{ register: r, level: l, offset: m },
    Operation::Cal      => Instruction::Cal{ level: l, target: m },
    Operation::Inc      => Instruction::Inc{ amount: m },
    Operation::Jmp      => Instruction::Jmp{ target: m },
    Operation::Jpc      => Instruction::Jpc{ register: r, target: m },
    Operation::SioWrite => Instruction::Write{ register: r },
    Operation::SioRead  => Instruction::Read{ register: r, target: m },
    Operation::SioHalt  => Instruction::Halt,
    Operation::Neg      => Instruction::Neg{ dst: r, src: l },
    Operation::Add      => arithmetic(ArithmeticOp::Add, record),
    Operation::Sub      => arithmetic(ArithmeticOp::Sub, record),
    Operation::Mul      => arithmetic(ArithmeticOp::Mul, record),
    Operation::Div      => arithmetic(ArithmeticOp::Div, record),
    Operation::Mod      => arithmetic(ArithmeticOp::Mod, record),
    Operation::Odd      => Instruction::Odd{ register: r },
    Operation::Eql      => comparison(ComparisonOp::Eql, record),
    Operation::Neq      => comparison(ComparisonOp::Neq, record),
    Operation::Lss      => comparison(ComparisonOp::Lss, record),
    Operation::Leq      => comparison(ComparisonOp::Leq, record),
    Operation::Gtr      => comparison(ComparisonOp::Gtr, record),
    Operation::Geq      => comparison(ComparisonOp::Geq, record),
  }
}

fn arithmetic(op: ArithmeticOp, record: &Record) -> Instruction {
  Instruction::Arithmetic{ op, dst: record.r, lhs: record.l, rhs: record.m }
}

fn comparison(op: ComparisonOp, record: &Record) -> Instruction {
  Instruction::Comparison{ op, dst: record.r, lhs: record.l, rhs: record.m }
}

/**
  Encodes the instruction as a record. Fields the operation does not read are written as
  zero, except for the `sio` family, whose M field conventionally repeats the variant
  (1 write, 3 halt).

  This is the inverse of `decode_record` for records in that canonical form, so decoding a
  program and encoding it again reproduces its code memory.
*/
pub fn encode_instruction(instruction: &Instruction) -> Record {
  let op = |operation: Operation| operation.code() as Word;

  match *instruction {
    Instruction::Lit{register, value}        => Record::new(op(Operation::Lit), register, 0, value),
    Instruction::Rtn                         => Record::new(op(Operation::Rtn), 0, 0, 0),
    Instruction::Lod{register, level, offset} => Record::new(op(Operation::Lod), register, level, offset),
    Instruction::Sto{register, level, offset} => Record::new(op(Operation::Sto), register, level, offset),
    Instruction::Cal{level, target}          => Record::new(op(Operation::Cal), 0, level, target),
    Instruction::Inc{amount}                 => Record::new(op(Operation::Inc), 0, 0, amount),
    Instruction::Jmp{target}                 => Record::new(op(Operation::Jmp), 0, 0, target),
    Instruction::Jpc{register, target}       => Record::new(op(Operation::Jpc), register, 0, target),
    Instruction::Write{register}             => Record::new(op(Operation::SioWrite), register, 0, 1),
    Instruction::Read{register, target}      => Record::new(op(Operation::SioRead), register, 0, target),
    Instruction::Halt                        => Record::new(op(Operation::SioHalt), 0, 0, 3),
    Instruction::Neg{dst, src}               => Record::new(op(Operation::Neg), dst, src, 0),
    Instruction::Odd{register}               => Record::new(op(Operation::Odd), register, 0, 0),
    Instruction::Illegal{opcode}             => Record::new(opcode, 0, 0, 0),

    Instruction::Arithmetic{op: arith, dst, lhs, rhs} => {
      let operation = match arith {
        ArithmeticOp::Add => Operation::Add,
        ArithmeticOp::Sub => Operation::Sub,
        ArithmeticOp::Mul => Operation::Mul,
        ArithmeticOp::Div => Operation::Div,
        ArithmeticOp::Mod => Operation::Mod,
      };
      Record::new(op(operation), dst, lhs, rhs)
    }

    Instruction::Comparison{op: cmp, dst, lhs, rhs} => {
      let operation = match cmp {
        ComparisonOp::Eql => Operation::Eql,
        ComparisonOp::Neq => Operation::Neq,
        ComparisonOp::Lss => Operation::Lss,
        ComparisonOp::Leq => Operation::Leq,
        ComparisonOp::Gtr => Operation::Gtr,
        ComparisonOp::Geq => Operation::Geq,
      };
      Record::new(op(operation), dst, lhs, rhs)
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn overloaded_fields_are_named(){
    // neg reads L as a register, cal reads it as a level.
    assert_eq!(
      decode_record(&Record::new(12, 1, 3, 0)),
      Instruction::Neg{ dst: 1, src: 3 }
    );
    assert_eq!(
      decode_record(&Record::new(5, 0, 2, 17)),
      Instruction::Cal{ level: 2, target: 17 }
    );
    assert_eq!(
      decode_record(&Record::new(19, 0, 1, 2)),
      Instruction::Comparison{ op: ComparisonOp::Eql, dst: 0, lhs: 1, rhs: 2 }
    );
  }

  #[test]
  fn sio_family(){
    assert_eq!(decode_record(&Record::new(9, 4, 0, 1)), Instruction::Write{ register: 4 });
    assert_eq!(decode_record(&Record::new(10, 4, 0, 2)), Instruction::Read{ register: 4, target: 2 });
    assert_eq!(decode_record(&Record::new(11, 0, 0, 3)), Instruction::Halt);
  }

  #[test]
  fn illegal_opcode_keeps_value(){
    assert_eq!(decode_record(&Record::new(0, 0, 0, 0)), Instruction::Illegal{ opcode: 0 });
    assert_eq!(decode_record(&Record::new(42, 1, 1, 1)), Instruction::Illegal{ opcode: 42 });
  }

  #[test]
  fn encode_reverses_decode_on_used_fields(){
    let records = [
      Record::new(1, 3, 0, -7),
      Record::new(3, 1, 2, 5),
      Record::new(5, 0, 1, 12),
      Record::new(8, 2, 0, 9),
      Record::new(16, 0, 1, 2),
      Record::new(24, 3, 4, 5),
    ];
    for record in records.iter() {
      assert_eq!(encode_instruction(&decode_record(record)), *record);
    }
  }

  #[test]
  fn display_uses_mnemonic(){
    assert_eq!(Record::new(13, 2, 0, 1).to_string(), "add 2 0 1");
    assert_eq!(Record::new(0, 0, 0, 0).to_string(), "illegal 0 0 0");
  }

}
