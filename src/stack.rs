//! The operand stack, the activation-record header overlaid on it, and the static-link
//! resolver.
//!
//! Slots are addressed `1..=height`; slot 0 exists but is never addressable. The outermost
//! frame has its base at 1 and zeroed links.

use std::convert::TryFrom;

use crate::bytecode::Word;
use crate::error::AddressFault;

/// Offsets of the header fields relative to a frame's base pointer.
pub const RETURN_VALUE_OFFSET   : Word = 0;
pub const STATIC_LINK_OFFSET    : Word = 1;
pub const DYNAMIC_LINK_OFFSET   : Word = 2;
pub const RETURN_ADDRESS_OFFSET : Word = 3;

/// Base pointer of the outermost frame.
pub const OUTERMOST_BP: Word = 1;

/**
  The fixed four-slot header at the base of every activation record:

  ```text
    BP+0   return value (reserved, written 0)
    BP+1   static link    base of the lexically enclosing frame
    BP+2   dynamic link   caller's BP
    BP+3   return address caller's PC
  ```
*/
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ActivationRecord {
  pub static_link    : Word,
  pub dynamic_link   : Word,
  pub return_address : Word,
}

impl ActivationRecord {
  /// Slots occupied by the header.
  pub const SIZE: Word = 4;
}

/// The live extent of one frame: slots `base..=top`. `top < base` for a frame that has not
/// grown yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FrameExtent {
  pub base : Word,
  pub top  : Word,
}

pub struct Stack {
  slots: Vec<Word>,
}

impl Stack {

  /// A zeroed stack with `height` addressable slots.
  pub fn new(height: usize) -> Stack {
    Stack{ slots: vec![0; height + 1] }
  }

  pub fn height(&self) -> usize {
    self.slots.len() - 1
  }

  fn slot_index(&self, index: i64) -> Result<usize, AddressFault> {
    match usize::try_from(index) {
      Ok(i) if i >= 1 && i < self.slots.len() => Ok(i),
      _                                       => Err(AddressFault::StackSlot(index))
    }
  }

  pub fn get(&self, index: i64) -> Result<Word, AddressFault> {
    let i = self.slot_index(index)?;
    Ok(self.slots[i])
  }

  pub fn set(&mut self, index: i64, value: Word) -> Result<(), AddressFault> {
    let i = self.slot_index(index)?;
    self.slots[i] = value;
    Ok(())
  }

  /// Reads the slot at `base + offset`, the addressing form every frame access uses.
  pub fn get_at(&self, base: Word, offset: Word) -> Result<Word, AddressFault> {
    self.get(base as i64 + offset as i64)
  }

  pub fn set_at(&mut self, base: Word, offset: Word, value: Word) -> Result<(), AddressFault> {
    self.set(base as i64 + offset as i64, value)
  }

  // region Activation records

  pub fn header(&self, base: Word) -> Result<ActivationRecord, AddressFault> {
    Ok(ActivationRecord {
      static_link    : self.get_at(base, STATIC_LINK_OFFSET)?,
      dynamic_link   : self.get_at(base, DYNAMIC_LINK_OFFSET)?,
      return_address : self.get_at(base, RETURN_ADDRESS_OFFSET)?,
    })
  }

  /// Writes a complete header at `base`. Nothing is written unless all four slots exist.
  pub fn write_header(&mut self, base: Word, record: &ActivationRecord) -> Result<(), AddressFault> {
    self.slot_index(base as i64)?;
    self.slot_index(base as i64 + (ActivationRecord::SIZE - 1) as i64)?;
    self.set_at(base, RETURN_VALUE_OFFSET, 0)?;
    self.set_at(base, STATIC_LINK_OFFSET, record.static_link)?;
    self.set_at(base, DYNAMIC_LINK_OFFSET, record.dynamic_link)?;
    self.set_at(base, RETURN_ADDRESS_OFFSET, record.return_address)
  }

  /**
    Returns the base pointer of the activation record `level` static levels out from the frame
    at `bp`, following static links. Level 0 is `bp` itself.

    A static link below the outermost frame ends the chain; asking for more levels than the
    chain has is an `AddressFault` rather than a read of whatever the slot holds.
  */
  pub fn base(&self, level: Word, bp: Word) -> Result<Word, AddressFault> {
    if level < 0 {
      return Err(AddressFault::NegativeLevel(level));
    }

    let mut base = bp;
    for walked in 0..level {
      if base < OUTERMOST_BP {
        return Err(AddressFault::StaticChainExhausted{ level, walked, bp });
      }
      base = self.get_at(base, STATIC_LINK_OFFSET)?;
    }

    match base < OUTERMOST_BP {
      true  => Err(AddressFault::StaticChainExhausted{ level, walked: level, bp }),
      false => Ok(base)
    }
  }

  // endregion

  // region Frame chain

  /**
    Lists the frames reachable from the active one by following dynamic links, outermost
    first. The active frame extends to `sp`; each caller extends to just below its callee's
    base.

    The walk stops at the outermost frame, and also at any dynamic link that does not point
    strictly below the current base, so a corrupted stack cannot make it loop.
  */
  pub fn frames(&self, sp: Word, bp: Word) -> Vec<FrameExtent> {
    let mut frames = Vec::new();
    let (mut base, mut top) = (bp, sp);

    while base >= OUTERMOST_BP {
      frames.push(FrameExtent{ base, top });
      if base == OUTERMOST_BP {
        break;
      }
      let caller = match self.get_at(base, DYNAMIC_LINK_OFFSET) {
        Ok(link) if link < base => link,
        _                       => break
      };
      top  = base - 1;
      base = caller;
    }

    frames.reverse();
    frames
  }

  /// The values in slots `first..=last`, clipped to the stack.
  pub fn slice(&self, first: Word, last: Word) -> &[Word] {
    let first = (first.max(1) as usize).min(self.slots.len());
    let last  = match last < 0 {
      true  => 0,
      false => (last as usize).min(self.height())
    };
    match first <= last {
      true  => &self.slots[first..=last],
      false => &[]
    }
  }

  // endregion
}
