use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumIter, IntoStaticStr};

use super::Word;

/// Mnemonic printed for any opcode outside the recognized set.
pub const ILLEGAL_MNEMONIC: &str = "illegal";

/**
  Opcodes of the virtual machine.

  The numeric values are fixed by the program format and are listed in order. Opcode `0` is
  deliberately absent: it, and anything above `Geq`, is illegal. The three `sio` variants share
  a mnemonic; they are told apart by number alone.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,       PartialEq,        Debug,         Hash
)]
#[repr(u8)]
pub enum Operation {
  // Data movement //
  #[strum(to_string = "lit")] Lit = 1,     // lit R, 0, M
  #[strum(to_string = "rtn")] Rtn = 2,     // rtn 0, 0, 0
  #[strum(to_string = "lod")] Lod = 3,     // lod R, L, M
  #[strum(to_string = "sto")] Sto = 4,     // sto R, L, M
  #[strum(to_string = "cal")] Cal = 5,     // cal 0, L, M
  #[strum(to_string = "inc")] Inc = 6,     // inc 0, 0, M

  // Control flow //
  #[strum(to_string = "jmp")] Jmp = 7,     // jmp 0, 0, M
  #[strum(to_string = "jpc")] Jpc = 8,     // jpc R, 0, M

  // I/O //
  #[strum(to_string = "sio")] SioWrite = 9, // sio R, 0, 1
  #[strum(to_string = "sio")] SioRead = 10, // sio R, 0, 2
  #[strum(to_string = "sio")] SioHalt = 11, // sio 0, 0, 3

  // Arithmetic //
  #[strum(to_string = "neg")] Neg = 12,    // neg R, L, 0
  #[strum(to_string = "add")] Add = 13,    // add R, L, M
  #[strum(to_string = "sub")] Sub = 14,
  #[strum(to_string = "mul")] Mul = 15,
  #[strum(to_string = "div")] Div = 16,
  #[strum(to_string = "odd")] Odd = 17,    // odd R, 0, 0
  #[strum(to_string = "mod")] Mod = 18,

  // Comparison //
  #[strum(to_string = "eql")] Eql = 19,
  #[strum(to_string = "neq")] Neq = 20,
  #[strum(to_string = "lss")] Lss = 21,
  #[strum(to_string = "leq")] Leq = 22,
  #[strum(to_string = "gtr")] Gtr = 23,
  #[strum(to_string = "geq")] Geq = 24,
}

impl Operation {

  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Maps a raw opcode field onto an operation, or `None` if the value is illegal.
  pub fn from_word(op: Word) -> Option<Operation> {
    let byte = u8::try_from(op).ok()?;
    Operation::try_from(byte).ok()
  }

  pub fn mnemonic(&self) -> &'static str {
    (*self).into()
  }

  /// Every recognized operation, in opcode order.
  pub fn all() -> impl Iterator<Item = Operation> {
    Operation::iter()
  }
}

/// The mnemonic of a raw opcode field, `illegal` for unrecognized values.
pub fn mnemonic_of(op: Word) -> &'static str {
  match Operation::from_word(op) {
    Some(operation) => operation.mnemonic(),
    None            => ILLEGAL_MNEMONIC
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbering_matches_program_format(){
    assert_eq!(Operation::Lit.code(), 1);
    assert_eq!(Operation::SioWrite.code(), 9);
    assert_eq!(Operation::SioHalt.code(), 11);
    assert_eq!(Operation::Neg.code(), 12);
    assert_eq!(Operation::Mod.code(), 18);
    assert_eq!(Operation::Geq.code(), 24);
  }

  #[test]
  fn opcodes_are_contiguous(){
    let codes: Vec<u8> = Operation::all().map(|operation| operation.code()).collect();
    assert_eq!(codes, (1..=24).collect::<Vec<u8>>());
    for operation in Operation::all() {
      assert_eq!(Operation::from_word(operation.code() as Word), Some(operation));
    }
  }

  #[test]
  fn illegal_opcodes(){
    assert_eq!(Operation::from_word(0), None);
    assert_eq!(Operation::from_word(25), None);
    assert_eq!(Operation::from_word(-1), None);
    assert_eq!(Operation::from_word(256 + 1), None);
    assert_eq!(mnemonic_of(0), ILLEGAL_MNEMONIC);
  }

  #[test]
  fn mnemonics(){
    assert_eq!(mnemonic_of(1), "lit");
    assert_eq!(mnemonic_of(5), "cal");
    assert_eq!(Operation::SioRead.to_string(), "sio");
    assert_eq!(mnemonic_of(11), "sio");
    assert_eq!(mnemonic_of(17), "odd");
    assert_eq!(mnemonic_of(22), "leq");
  }

}
