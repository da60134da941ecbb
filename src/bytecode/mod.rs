/*!

  The processor uses a 64 bit word size, and memory addresses words, not bytes. Each
  instruction word packs up to ten 6 bit opcodes ("slots"), executed one per clock cycle:

    [Slot 1:6][Slot 2:6][Slot 3:6] ... [Slot 10:6][Unused:4]
     bit 63                                         bit 0

  Slot 1 occupies the most significant six bits. Control transfer opcodes carry a signed
  54 bit displacement in bits 4 through 57 of the same word, so by convention they must be
  the first opcode of their word. Slots 2 through 10 of such a word are the displacement;
  they only execute as opcodes when a conditional transfer falls through.

  As in the WVM, an enum is used for the opcode only, not for the whole instruction. The
  instruction word itself stays a plain `Word` so that a single fetch amortizes across all
  ten dispatch cycles.

*/

mod binary;

pub use binary::{
  opcode_at, operand, pack_branch, pack_slots, slot_shift, Word, OPERAND_MASK, OPERAND_SIGN,
  SLOTS_PER_WORD, SLOT_SHIFTS
};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

/**
  Opcodes of the processor.

  The numeric value of each variant is its position in the hardware's fixed enumeration,
  so the order the opcodes are listed below is significant: it is the bit pattern the
  decoder sees in a slot. Code 30 is held back for prefixed opcodes and has no meaning
  yet. Codes 32 through 63 are unassigned.

  The control transfer group (`Bra` through `Times`) is contiguous. Order-dependencies:
      ```
      Operation::is_control_transfer()
      ```
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,         Hash
)]
#[strum(serialize_all = "UPPERCASE")]
#[repr(u8)]
pub enum Operation {
  Nop,      // Opcode 0

  // Control transfer //
  Bra,      // pc += operand
  Bz,       // branch if T == 0
  Bc,       // branch if T < 0
  Call,     // push pc to R; branch
  Rfs,      // pc = pop R
  Next,     // if R != 0 { R -= 1; branch }
  Times,    // if R != 0 { R -= 1; re-run this word }

  // Memory //
  Ldrp,     // push [R]; R += 1
  Ldxp,     // push [X]; X += 1
  Ldi,      // push next word of the instruction stream
  Ldx,      // push [X]
  Or,
  Stxp,     // [X] = pop; X += 1
  Rr8,
  Stx,      // [X] = pop

  // ALU //
  Com,
  Shl,
  Shr,
  Muls,
  Xor,
  And,
  Divs,
  Add,

  // Stack shuffling //
  Pop,      // push (pop R)
  Tx,       // push X
  Dup,
  Over,
  Push,     // push R (pop)
  Xt,       // X = pop
  Reserved, // Opcode 30, prefix for future extended opcodes
  Drop,     // Opcode 31
}

impl Operation {

  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Decodes a raw slot value. Returns `None` for codes with no assigned meaning, which
  /// includes the prefix-reserved code.
  pub fn decode(code: u8) -> Option<Operation> {
    match Operation::try_from_primitive(code) {
      Ok(Operation::Reserved) | Err(_) => None,
      Ok(op)                           => Some(op),
    }
  }

  /// True for opcodes that may replace the program counter and discard the rest of the
  /// current word. No other opcode moves the slot cursor.
  pub fn is_control_transfer(&self) -> bool {
    let code = self.code();
    code >= Operation::Bra.code() && code <= Operation::Times.code()
  }

  /// True for opcodes that take the whole-word displacement. These only have defined
  /// behaviour in slot 1.
  pub fn uses_operand(&self) -> bool {
    matches!(
      self,
      Operation::Bra | Operation::Bz | Operation::Bc | Operation::Call | Operation::Next
    )
  }

  pub fn mnemonic(&self) -> &'static str {
    self.into()
  }

}
