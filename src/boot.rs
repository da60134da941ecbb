//! The boot ROM: the words present in memory before the first fetch.

use crate::bytecode::Word;
use crate::machine::Machine;
use crate::memory::Address;

pub const BOOT_IMAGE: [(Address, Word); 6] = [
  (0x00, 0x10000000000000F0),
  (0x01, 0x07FFFFFFFFFFFFE0),
  (0x10, 0x10000000000000F0),
  (0x11, 0xF801400000000000),
  (0x20, 0xFC029C1400000000),
  (0x21, 0x0000000000000000),
];

/// Writes the boot image into the machine's memory.
pub fn load_roms(machine: &mut Machine) {
  machine.memory_mut().load(&BOOT_IMAGE);
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::machine::Phase;

  #[test]
  fn image_is_loaded(){
    let mut m = Machine::new();
    load_roms(&mut m);
    for &(address, value) in BOOT_IMAGE.iter() {
      assert_eq!(m.memory().peek(address), Some(value));
    }
    assert_eq!(m.memory().wrapped_accesses(), 0);
  }

  #[test]
  fn boot_program_returns_to_zero(){
    let mut m = Machine::new();
    load_roms(&mut m);

    // CALL $10, CALL $20.
    m.execute();
    assert_eq!(m.pc(), 0x10);
    m.execute();
    assert_eq!(m.pc(), 0x20);
    assert_eq!(m.r(), 0x11);

    // Unassigned opcode, NOP, LDI, PUSH, RFS.
    m.run(Some(5));
    assert_eq!(m.diagnostics(), 1);
    assert_eq!(m.pc(), 0);
    assert_eq!(m.r(), 0x11);
    assert_eq!(m.t(), 0);
    assert_eq!(m.phase(), Phase::NeedsFetch);
  }

}
