//! Machine configuration. Defaults match the dimensions of the classic PM/0 machine.

use strum_macros::{Display as StrumDisplay, EnumString};

/// Number of general purpose registers.
pub const DEFAULT_REGISTERS: usize = 8;
/// Usable stack slots, addressed `1..=DEFAULT_STACK_HEIGHT`.
pub const DEFAULT_STACK_HEIGHT: usize = 2000;

/**
  What the reserved `sio` read variant (opcode 10) does.

  The classic machine reassigns PC to M here, which looks like an unfinished input operation.
  `Jump` keeps that behavior as a documented stub; `Input` reads the next integer from the
  machine's input stream into `reg[R]` instead.
*/
#[derive(StrumDisplay, EnumString, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReadMode {
  #[strum(serialize = "jump")]  Jump,
  #[strum(serialize = "input")] Input,
}

impl Default for ReadMode {
  fn default() -> ReadMode {
    ReadMode::Jump
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineConfig {
  pub registers    : usize,
  pub stack_height : usize,
  /// Fault with `StepLimitExceeded` once this many instructions have executed.
  pub step_limit   : Option<u64>,
  pub read_mode    : ReadMode,
}

impl Default for MachineConfig {
  fn default() -> MachineConfig {
    MachineConfig {
      registers    : DEFAULT_REGISTERS,
      stack_height : DEFAULT_STACK_HEIGHT,
      step_limit   : None,
      read_mode    : ReadMode::default(),
    }
  }
}

impl MachineConfig {
  pub fn with_step_limit(mut self, limit: u64) -> MachineConfig {
    self.step_limit = Some(limit);
    self
  }

  pub fn with_read_mode(mut self, read_mode: ReadMode) -> MachineConfig {
    self.read_mode = read_mode;
    self
  }

  pub fn with_stack_height(mut self, stack_height: usize) -> MachineConfig {
    self.stack_height = stack_height;
    self
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults(){
    let config = MachineConfig::default();
    assert_eq!(config.registers, 8);
    assert_eq!(config.stack_height, 2000);
    assert_eq!(config.step_limit, None);
    assert_eq!(config.read_mode, ReadMode::Jump);
  }

  #[test]
  fn parse_read_mode(){
    assert_eq!("jump".parse::<ReadMode>(), Ok(ReadMode::Jump));
    assert_eq!("input".parse::<ReadMode>(), Ok(ReadMode::Input));
    assert!("scan".parse::<ReadMode>().is_err());
    assert_eq!(ReadMode::Input.to_string(), "input");
  }

}
