use std::fmt::{Display, Formatter};

use strum_macros::IntoStaticStr;

use super::Word;

/// Binary arithmetic operations: `reg[dst] := reg[lhs] <op> reg[rhs]`.
#[derive(IntoStaticStr, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArithmeticOp {
  #[strum(to_string = "add")] Add,
  #[strum(to_string = "sub")] Sub,
  #[strum(to_string = "mul")] Mul,
  #[strum(to_string = "div")] Div,
  #[strum(to_string = "mod")] Mod,
}

/// Comparisons producing `1` or `0`: `reg[dst] := reg[lhs] <cmp> reg[rhs]`.
#[derive(IntoStaticStr, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ComparisonOp {
  #[strum(to_string = "eql")] Eql,
  #[strum(to_string = "neq")] Neq,
  #[strum(to_string = "lss")] Lss,
  #[strum(to_string = "leq")] Leq,
  #[strum(to_string = "gtr")] Gtr,
  #[strum(to_string = "geq")] Geq,
}

impl ArithmeticOp {
  pub fn mnemonic(&self) -> &'static str {
    (*self).into()
  }
}

impl ComparisonOp {
  pub fn mnemonic(&self) -> &'static str {
    (*self).into()
  }

  pub fn holds(&self, lhs: Word, rhs: Word) -> bool {
    match self {
      ComparisonOp::Eql => lhs == rhs,
      ComparisonOp::Neq => lhs != rhs,
      ComparisonOp::Lss => lhs <  rhs,
      ComparisonOp::Leq => lhs <= rhs,
      ComparisonOp::Gtr => lhs >  rhs,
      ComparisonOp::Geq => lhs >= rhs,
    }
  }
}

/**
  A decoded instruction. Each variant names the operand fields its operation actually reads,
  so the overloading of R, L and M in the program format ends at decode time. Register
  indices, levels and addresses keep the raw field values; range checks happen when the
  instruction executes, because an out-of-range operand is a runtime fault, not a load error.
*/
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// `reg[register] := value`
  Lit { register: Word, value: Word },
  /// Pop the current activation record, restoring BP and PC from its header.
  Rtn,
  /// `reg[register] := stack[base(level) + offset]`
  Lod { register: Word, level: Word, offset: Word },
  /// `stack[base(level) + offset] := reg[register]`
  Sto { register: Word, level: Word, offset: Word },
  /// Push a frame header whose static link is `base(level)` and jump to `target`.
  Cal { level: Word, target: Word },
  /// `SP := SP + amount`
  Inc { amount: Word },
  Jmp { target: Word },
  /// Jump to `target` if `reg[register] == 0`.
  Jpc { register: Word, target: Word },
  /// Write `reg[register]` to the machine output.
  Write { register: Word },
  /// The reserved `sio` read variant. Its semantics depend on `ReadMode`.
  Read { register: Word, target: Word },
  Halt,
  /// `reg[dst] := -reg[src]`
  Neg { dst: Word, src: Word },
  Arithmetic { op: ArithmeticOp, dst: Word, lhs: Word, rhs: Word },
  /// `reg[register] := reg[register] mod 2`
  Odd { register: Word },
  Comparison { op: ComparisonOp, dst: Word, lhs: Word, rhs: Word },
  /// Any opcode outside the recognized set.
  Illegal { opcode: Word },
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Lit{register, value} => {
        write!(f, "lit(R{}, {})", register, value)
      }

      Instruction::Rtn => write!(f, "rtn"),

      Instruction::Lod{register, level, offset} => {
        write!(f, "lod(R{}, L{}, {})", register, level, offset)
      }

      Instruction::Sto{register, level, offset} => {
        write!(f, "sto(R{}, L{}, {})", register, level, offset)
      }

      Instruction::Cal{level, target} => write!(f, "cal(L{}, @{})", level, target),

      Instruction::Inc{amount} => write!(f, "inc({})", amount),

      Instruction::Jmp{target} => write!(f, "jmp(@{})", target),

      Instruction::Jpc{register, target} => write!(f, "jpc(R{}, @{})", register, target),

      Instruction::Write{register} => write!(f, "write(R{})", register),

      Instruction::Read{register, target} => write!(f, "read(R{}, @{})", register, target),

      Instruction::Halt => write!(f, "halt"),

      Instruction::Neg{dst, src} => write!(f, "neg(R{}, R{})", dst, src),

      Instruction::Arithmetic{op, dst, lhs, rhs} => {
        write!(f, "{}(R{}, R{}, R{})", op.mnemonic(), dst, lhs, rhs)
      }

      Instruction::Odd{register} => write!(f, "odd(R{})", register),

      Instruction::Comparison{op, dst, lhs, rhs} => {
        write!(f, "{}(R{}, R{}, R{})", op.mnemonic(), dst, lhs, rhs)
      }

      Instruction::Illegal{opcode} => write!(f, "illegal({})", opcode),

    }
  }
}
