//! The memory bank: a flat store of 64 bit words addressed by word.
//!
//! Addresses past the end of memory never fault. They are reduced modulo the memory size,
//! as truncated address lines would do in hardware, and a diagnostic is logged for each
//! such access.

use crate::bytecode::Word;

/// Digilent Nexys2 board has 8MB of RAM. A 64 bit CPU sees this as 1MW.
pub const DEFAULT_MEMORY_WORDS: usize = 1_048_576;

pub type Address = Word;

#[derive(Clone, Debug)]
pub struct Memory {
  words: Vec<Word>,
  wrapped: u64, // Count of out-of-range accesses
}

impl Memory {

  /// Allocates `size` zeroed words. Memory is never resized afterward. A size that is
  /// zero or not a power of two is replaced by `DEFAULT_MEMORY_WORDS`.
  pub fn new(size: usize) -> Memory {
    let size =
      if size.is_power_of_two() {
        size
      } else {
        log::warn!("Memory size {} is not a nonzero power of two; using {}", size, DEFAULT_MEMORY_WORDS);
        DEFAULT_MEMORY_WORDS
      };
    Memory {
      words   : vec![0; size],
      wrapped : 0,
    }
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  /// Number of accesses so far that had to be wrapped into range.
  pub fn wrapped_accesses(&self) -> u64 {
    self.wrapped
  }

  fn in_range(&self, address: Address) -> bool {
    address < self.words.len() as Address
  }

  fn wrap(&self, address: Address) -> usize {
    (address % self.words.len() as Address) as usize
  }

  /// Returns the word at `*pc` and advances `*pc` by one. An out-of-range program counter
  /// is wrapped before the read.
  pub fn fetch_and_advance(&mut self, pc: &mut Address) -> Word {
    if !self.in_range(*pc) {
      let wrapped = self.wrap(*pc) as Address;
      log::warn!("Attempt to execute instruction at ${:X}; wrapping PC to ${:X}", *pc, wrapped);
      self.wrapped += 1;
      *pc = wrapped;
    }
    let word = self.words[*pc as usize];
    *pc = pc.wrapping_add(1);
    word
  }

  pub fn read(&mut self, address: Address) -> Word {
    if self.in_range(address) {
      return self.words[address as usize];
    }
    let index = self.wrap(address);
    log::warn!("Attempt to fetch word from ${:X}; wrapping address to ${:X}", address, index);
    self.wrapped += 1;
    self.words[index]
  }

  /// Stores `value` at `address`. A wrapped store lands somewhere the program did not ask
  /// for, so it is reported at error level.
  pub fn write(&mut self, address: Address, value: Word) {
    let index =
      if self.in_range(address) {
        address as usize
      } else {
        let index = self.wrap(address);
        log::error!(
          "Attempt to store word ${:X} to address ${:X}; wrapped to ${:X}, this almost certainly corrupts memory",
          value, address, index
        );
        self.wrapped += 1;
        index
      };
    self.words[index] = value;
  }

  /// Copies `(address, value)` pairs into memory, wrapping as `write` does.
  pub fn load(&mut self, image: &[(Address, Word)]) {
    for &(address, value) in image {
      self.write(address, value);
    }
  }

  /// Read-only view used for state display and tests; never logs or wraps.
  pub fn peek(&self, address: Address) -> Option<Word> {
    self.words.get(address as usize).copied()
  }

}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bad_sizes_fall_back(){
    assert_eq!(Memory::new(0).len(), DEFAULT_MEMORY_WORDS);
    assert_eq!(Memory::new(1000).len(), DEFAULT_MEMORY_WORDS);
    assert_eq!(Memory::new(1).len(), 1);
    assert_eq!(Memory::new(32).len(), 32);
  }

  #[test]
  fn read_write_in_range(){
    let mut m = Memory::new(16);
    m.write(3, 0xDEAD);
    assert_eq!(m.read(3), 0xDEAD);
    assert_eq!(m.wrapped_accesses(), 0);
  }

  #[test]
  fn read_wraps(){
    let mut m = Memory::new(16);
    m.write(5, 42);
    assert_eq!(m.read(16 + 5), 42);
    assert_eq!(m.wrapped_accesses(), 1);
    assert_eq!(m.read(Address::max_value()), m.peek(15).unwrap());
    assert_eq!(m.wrapped_accesses(), 2);
  }

  #[test]
  fn write_wraps(){
    let mut m = Memory::new(16);
    m.write(16 + 7, 99);
    assert_eq!(m.peek(7), Some(99));
    assert_eq!(m.wrapped_accesses(), 1);
    assert_eq!(m.read(7), 99);
    assert_eq!(m.wrapped_accesses(), 1);
  }

  #[test]
  fn fetch_advances(){
    let mut m = Memory::new(4);
    m.load(&[(0, 10), (1, 11)]);
    let mut pc = 0;
    assert_eq!(m.fetch_and_advance(&mut pc), 10);
    assert_eq!(pc, 1);
    assert_eq!(m.fetch_and_advance(&mut pc), 11);
    assert_eq!(pc, 2);
    assert_eq!(m.wrapped_accesses(), 0);
  }

  #[test]
  fn fetch_wraps_pc_before_read(){
    let mut m = Memory::new(4);
    m.load(&[(1, 77)]);
    let mut pc = 4 + 1;
    assert_eq!(m.fetch_and_advance(&mut pc), 77);
    assert_eq!(pc, 2);
    assert_eq!(m.wrapped_accesses(), 1);
  }

}
