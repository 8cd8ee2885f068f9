/*!
  A virtual machine for PM/0, the register and stack machine targeted by PL/0-style compilers
  for block-structured languages with nested lexical scopes.

  A program is a sequence of `op r l m` quadruples. The machine keeps a small register file
  and an operand stack of activation records; nonlocal variables are reached by walking
  static links. Every executed instruction can be traced.

  ```text
  text -> [`loader`] -> `Program` -> [`machine::Machine::step`]* -> [`listing`] trace
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod config;
pub mod error;
pub mod listing;
pub mod loader;
pub mod machine;
pub mod simulate;
pub mod stack;

pub use bytecode::{Instruction, Operation, Program, Record, Word};
pub use config::{MachineConfig, ReadMode};
pub use error::{AddressFault, Error, ExecutionError, Fault, LoadError};
pub use loader::{load_program, read_program};
pub use machine::{Machine, Signal, Step};
pub use simulate::{execute_traced, simulate, Report};
