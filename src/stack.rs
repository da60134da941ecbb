//! The parameter and return stacks.
//!
//! Each stack is a top register held outside a 16 entry circular buffer, the way the
//! hardware register file is built. There is no overflow or underflow trap: the buffer
//! pointer simply wraps, overwriting the oldest entry.

use crate::bytecode::Word;

/// Stack depth, NOT including the top register.
pub const STACK_DEPTH: usize = 16;
const STACK_MASK: usize = STACK_DEPTH - 1;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stack {
  /// The top register (T for the parameter stack, R for the return stack).
  pub top : Word,
  buffer  : [Word; STACK_DEPTH],
  pointer : usize, // Next free buffer entry
}

impl Stack {

  pub fn new() -> Stack {
    Stack::default()
  }

  pub fn pointer(&self) -> usize {
    self.pointer
  }

  /// Buffer contents in storage order, for display.
  pub fn buffer(&self) -> &[Word; STACK_DEPTH] {
    &self.buffer
  }

  /// Masks the pointer back into range, as the hardware reset line does.
  pub fn reset(&mut self) {
    self.pointer &= STACK_MASK;
  }

  /// Spills the top register into the buffer and makes `value` the new top.
  pub fn push(&mut self, value: Word) {
    self.buffer[self.pointer] = self.top;
    self.pointer = (self.pointer + 1) & STACK_MASK;
    self.top = value;
  }

  /// Returns the top register and refills it from the buffer.
  pub fn pop(&mut self) -> Word {
    let value = self.top;
    self.top = self.pop_under();
    value
  }

  /// Removes and returns the entry just below the top, leaving the top register alone.
  pub fn pop_under(&mut self) -> Word {
    self.pointer = self.pointer.wrapping_sub(1) & STACK_MASK;
    self.buffer[self.pointer]
  }

  /// The entry just below the top, without removing it.
  pub fn peek_under(&self) -> Word {
    self.buffer[self.pointer.wrapping_sub(1) & STACK_MASK]
  }

}

/// The processor's two stacks. T is `param.top` and R is `ret.top`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StackUnit {
  pub param : Stack,
  pub ret   : Stack,
}

impl StackUnit {

  pub fn new() -> StackUnit {
    StackUnit::default()
  }

  pub fn reset(&mut self) {
    self.param.reset();
    self.ret.reset();
  }

  pub fn push_param(&mut self, value: Word) {
    self.param.push(value)
  }

  pub fn pop_param(&mut self) -> Word {
    self.param.pop()
  }

  pub fn push_return(&mut self, value: Word) {
    self.ret.push(value)
  }

  pub fn pop_return(&mut self) -> Word {
    self.ret.pop()
  }

}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_pop_order(){
    let mut s = Stack::new();
    s.push(1);
    s.push(2);
    s.push(3);
    assert_eq!(s.top, 3);
    assert_eq!(s.pop(), 3);
    assert_eq!(s.pop(), 2);
    assert_eq!(s.pop(), 1);
    assert_eq!(s.top, 0);
    assert_eq!(s.pointer(), 0);
  }

  #[test]
  fn top_lives_outside_buffer(){
    let mut s = Stack::new();
    s.push(7);
    s.push(8);
    assert_eq!(s.top, 8);
    assert_eq!(s.peek_under(), 7);
    assert_eq!(s.pointer(), 2);
    assert_eq!(s.pop_under(), 7);
    assert_eq!(s.top, 8);
    assert_eq!(s.pointer(), 1);
  }

  #[test]
  fn wraparound(){
    let mut s = Stack::new();
    for v in 1..=17 {
      s.push(v);
    }
    assert_eq!(s.pointer(), 1);
    for v in (2..=17).rev() {
      assert_eq!(s.pop(), v);
    }
    // The oldest surviving value, not a fault.
    assert_eq!(s.pop(), 1);
  }

  #[test]
  fn underflow_wraps(){
    let mut s = Stack::new();
    assert_eq!(s.pop(), 0);
    assert_eq!(s.pointer(), STACK_DEPTH - 1);
    s.push(5);
    assert_eq!(s.pointer(), 0);
    assert_eq!(s.top, 5);
  }

  #[test]
  fn stacks_are_independent(){
    let mut u = StackUnit::new();
    u.push_param(1);
    u.push_return(2);
    u.push_param(3);
    assert_eq!(u.pop_return(), 2);
    assert_eq!(u.pop_param(), 3);
    assert_eq!(u.pop_param(), 1);
    assert_eq!(u.ret.pointer(), 0);
  }

}
