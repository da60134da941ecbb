/*!
  This module is responsible for the encoding and decoding of packed instruction words.

*/

use super::Operation;

// If you change this you must also change `SLOT_SHIFTS` and `OPERAND_MASK`.
pub type Word = u64;

pub const SLOTS_PER_WORD: usize = 10;

/// Right shift that brings each slot's opcode down to bits 0 through 5. Index 0 is a
/// dummy so that the table can be indexed by slot number directly.
pub const SLOT_SHIFTS: [u32; SLOTS_PER_WORD + 1] = [0, 58, 52, 46, 40, 34, 28, 22, 16, 10, 4];

const OPCODE_MASK: Word = 0x3F;

/// Program control flow operand mask, applied after shifting the word right by 4.
pub const OPERAND_MASK: Word = 0x003F_FFFF_FFFF_FFFF;
/// Sign bit of the (shifted) operand field.
pub const OPERAND_SIGN: Word = 0x0020_0000_0000_0000;

/// Returns the shift for the given slot, or `None` if `slot` is outside 1 through 10.
pub fn slot_shift(slot: u8) -> Option<u32> {
  match slot as usize {
    1..=SLOTS_PER_WORD => Some(SLOT_SHIFTS[slot as usize]),
    _                  => None
  }
}

/// Extracts the raw 6 bit opcode in `slot` of `instruction`.
pub fn opcode_at(instruction: Word, slot: u8) -> Option<u8> {
  slot_shift(slot).map(|shift| ((instruction >> shift) & OPCODE_MASK) as u8)
}

/**
  Extracts the branch displacement from bits 4 through 57 and sign extends it.

  The field position is fixed and independent of the slot being executed. It is only
  meaningful when the control transfer opcode sits in slot 1.
*/
pub fn operand(instruction: Word) -> i64 {
  let mut field = (instruction >> 4) & OPERAND_MASK;
  if field & OPERAND_SIGN != 0 {
    field |= !OPERAND_MASK;
  }
  field as i64
}

/**
  Packs up to ten opcodes into an instruction word, slot 1 first. Missing slots are filled
  with `Nop`, and the four low bits are left clear. Opcodes past the tenth are ignored.
*/
pub fn pack_slots(operations: &[Operation]) -> Word {
  debug_assert!(operations.len() <= SLOTS_PER_WORD, "more than ten opcodes in one word");
  operations
    .iter()
    .take(SLOTS_PER_WORD)
    .zip(SLOT_SHIFTS[1..].iter())
    .fold(0, |word, (op, shift)| word | ((op.code() as Word) << *shift))
}

/// Builds a word holding a control transfer opcode in slot 1 and its displacement.
/// Displacements are truncated to 54 bits.
pub fn pack_branch(operation: Operation, displacement: i64) -> Word {
  ((operation.code() as Word) << SLOT_SHIFTS[1]) | (((displacement as Word) & OPERAND_MASK) << 4)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slot_positions(){
    for slot in 1..=10u8 {
      assert_eq!(slot_shift(slot), Some(64 - 6 * slot as u32));
    }
    assert_eq!(slot_shift(0), None);
    assert_eq!(slot_shift(11), None);
  }

  #[test]
  fn opcode_extraction(){
    // Slot n holds the value n.
    let word: Word = (1..=10u64).fold(0, |w, n| w | (n << (64 - 6 * n)));
    for slot in 1..=10u8 {
      assert_eq!(opcode_at(word, slot), Some(slot));
    }
    assert_eq!(opcode_at(word, 0), None);
    // Bits 0..4 never reach a slot.
    assert_eq!(opcode_at(0xF, 10), Some(0));
  }

  #[test]
  fn operand_positive(){
    assert_eq!(operand(0x10000000000000F0), 15);
    assert_eq!(operand(pack_branch(Operation::Bra, 0x1F_FFFF_FFFF_FFFF)), 0x1F_FFFF_FFFF_FFFF);
  }

  #[test]
  fn operand_sign_extension(){
    assert_eq!(operand(0x07FFFFFFFFFFFFE0), -2);
    assert_eq!(operand(pack_branch(Operation::Call, -1)), -1);
    // Most negative 54 bit value.
    assert_eq!(operand(OPERAND_SIGN << 4), -(1i64 << 53));
  }

  #[test]
  fn operand_ignores_slot_one(){
    let word = pack_branch(Operation::Bz, 100);
    assert_eq!(opcode_at(word, 1), Some(Operation::Bz.code()));
    assert_eq!(operand(word), 100);
    assert_eq!(operand(word | (0x3F << 58)), 100);
  }

  #[test]
  fn pack_fills_nops(){
    let word = pack_slots(&[Operation::Ldi, Operation::Add, Operation::Drop]);
    assert_eq!(opcode_at(word, 1), Some(Operation::Ldi.code()));
    assert_eq!(opcode_at(word, 2), Some(Operation::Add.code()));
    assert_eq!(opcode_at(word, 3), Some(Operation::Drop.code()));
    for slot in 4..=10 {
      assert_eq!(opcode_at(word, slot), Some(Operation::Nop.code()));
    }
    assert_eq!(word & 0xF, 0);
  }

  #[test]
  fn boot_word_layout(){
    // The word at $20 of the boot image: (unassigned), NOP, LDI, PUSH, RFS.
    let word: Word = 0xFC029C1400000000;
    assert_eq!(opcode_at(word, 1), Some(63));
    assert_eq!(opcode_at(word, 2), Some(Operation::Nop.code()));
    assert_eq!(opcode_at(word, 3), Some(Operation::Ldi.code()));
    assert_eq!(opcode_at(word, 4), Some(Operation::Push.code()));
    assert_eq!(opcode_at(word, 5), Some(Operation::Rfs.code()));
  }

}
