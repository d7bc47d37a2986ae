extern crate std;

use std::vec::Vec;

use crate::{RegisterIo, Width};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MockError;

/// In-memory register file. Each address holds one register of whatever width
/// it is accessed with.
#[derive(Clone, Debug)]
pub(crate) struct MockRegisters {
  regs: [u32; 256],
  writes: Vec<(u8, u32)>,
  commands: Vec<u8>,
  fail: bool,
  fail_after_write: bool,
}

impl Default for MockRegisters {
  fn default() -> Self {
    Self { regs: [0; 256], writes: Vec::new(), commands: Vec::new(), fail: false, fail_after_write: false }
  }
}

impl MockRegisters {
  pub(crate) fn with_reg(mut self, reg: u8, value: u32) -> Self {
    self.set_reg(reg, value);
    self
  }

  pub(crate) fn failing(mut self) -> Self {
    self.fail = true;
    self
  }

  /// Accept the next write, then fail every access until [`Self::recover`].
  pub(crate) fn fail_reads_after_write(mut self) -> Self {
    self.fail_after_write = true;
    self
  }

  pub(crate) fn recover(&mut self) {
    self.fail = false;
    self.fail_after_write = false;
  }

  pub(crate) fn set_reg(&mut self, reg: u8, value: u32) {
    self.regs[reg as usize] = value;
  }

  pub(crate) fn reg(&self, reg: u8) -> u32 {
    self.regs[reg as usize]
  }

  pub(crate) fn writes(&self) -> &[(u8, u32)] {
    &self.writes
  }

  pub(crate) fn commands(&self) -> &[u8] {
    &self.commands
  }
}

impl RegisterIo for MockRegisters {
  type Error = MockError;

  async fn read_register(&mut self, addr: u8, width: Width) -> Result<u32, MockError> {
    if self.fail {
      return Err(MockError);
    }
    Ok(self.regs[addr as usize] & width.mask())
  }

  async fn write_register(&mut self, addr: u8, width: Width, value: u32) -> Result<(), MockError> {
    if self.fail {
      return Err(MockError);
    }
    let value = value & width.mask();
    self.regs[addr as usize] = value;
    self.writes.push((addr, value));
    self.fail |= self.fail_after_write;
    Ok(())
  }

  async fn write_command(&mut self, cmd: u8) -> Result<(), MockError> {
    if self.fail {
      return Err(MockError);
    }
    self.commands.push(cmd);
    Ok(())
  }
}
