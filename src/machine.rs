//! The execution engine: registers, memory and stacks of one VP64 processor, and the
//! fetch/decode/execute state machine that drives them one slot per clock cycle.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::bytecode::*;
use crate::config::Config;
use crate::memory::{Address, Memory};
use crate::stack::{Stack, StackUnit, STACK_DEPTH};

/// Result of the unimplemented signed multiply.
pub const MULS_SENTINEL: Word = 0xDEAD_FEED_C0DE_0BAD;
/// Result of the unimplemented signed divide.
pub const DIVS_SENTINEL: Word = 0xFEED_DEAD_C0DE_0BAD;

const SIGN_BIT: Word = 0x8000_0000_0000_0000;

/// Where the state machine is between cycles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
  /// The next cycle begins with a fetch.
  NeedsFetch,
  /// The next cycle executes this slot (1 through 10) of the instruction register.
  Slot(u8),
}

/// A copy of the register file, for inspection and comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Registers {
  pub pc    : Address,
  pub ip    : Address,
  pub ir    : Word,
  pub state : u8,
  pub t     : Word,
  pub x     : Word,
  pub r     : Word,
  pub sp    : usize,
  pub rp    : usize,
}

pub struct Machine {

  // Flags
  exit_requested: bool, // Not yet set by any opcode

  // Memory Stores
  memory: Memory,
  stacks: StackUnit, // T and R live here as the stacks' top registers

  // Registers //
  x     : Word,    // Index register
  pc    : Address, // Next word to fetch
  ip    : Address, // Word currently being decoded
  ir    : Word,    // Instruction register
  state : u8,      // Slot cursor; outside 1..=10 forces a fetch

  // Bookkeeping
  cycles      : u64,
  diagnostics : u64,

}

impl Machine {

  // region Construction and inspection

  pub fn new() -> Machine {
    Machine::with_config(&Config::default())
  }

  pub fn with_config(config: &Config) -> Machine {
    Machine {
      exit_requested :  false,
      memory         :  Memory::new(config.memory_words),
      stacks         :  StackUnit::new(),
      x              :  0,
      pc             :  0,
      ip             :  0,
      ir             :  0,
      state          :  0,
      cycles         :  0,
      diagnostics    :  0,
    }
  }

  /// Puts the processor in its power-on control state. Memory and the data registers
  /// keep their contents.
  pub fn reset(&mut self) {
    self.pc    = 0;
    self.state = 0;
    self.ir    = 0;
    self.stacks.reset();
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  pub fn stacks(&self) -> &StackUnit {
    &self.stacks
  }

  pub fn stacks_mut(&mut self) -> &mut StackUnit {
    &mut self.stacks
  }

  pub fn registers(&self) -> Registers {
    Registers {
      pc    : self.pc,
      ip    : self.ip,
      ir    : self.ir,
      state : self.state,
      t     : self.stacks.param.top,
      x     : self.x,
      r     : self.stacks.ret.top,
      sp    : self.stacks.param.pointer(),
      rp    : self.stacks.ret.pointer(),
    }
  }

  pub fn phase(&self) -> Phase {
    match slot_shift(self.state) {
      Some(_) => Phase::Slot(self.state),
      None    => Phase::NeedsFetch
    }
  }

  pub fn pc(&self) -> Address { self.pc }
  pub fn ip(&self) -> Address { self.ip }
  pub fn ir(&self) -> Word { self.ir }
  pub fn t(&self) -> Word { self.stacks.param.top }
  pub fn r(&self) -> Word { self.stacks.ret.top }
  pub fn x(&self) -> Word { self.x }

  pub fn set_pc(&mut self, pc: Address) { self.pc = pc; }
  pub fn set_t(&mut self, value: Word) { self.stacks.param.top = value; }
  pub fn set_r(&mut self, value: Word) { self.stacks.ret.top = value; }
  pub fn set_x(&mut self, value: Word) { self.x = value; }

  /// Clock cycles executed since construction.
  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  /// Diagnostics raised by the engine itself (unknown, unimplemented and misplaced
  /// opcodes). Wrapped memory accesses are counted by `Memory`.
  pub fn diagnostics(&self) -> u64 {
    self.diagnostics
  }

  pub fn exit_requested(&self) -> bool {
    self.exit_requested
  }

  pub fn request_exit(&mut self) {
    self.exit_requested = true;
  }

  // endregion

  // region Control loop

  /// Runs until the exit flag is set or `max_cycles` cycles have elapsed. Returns the
  /// number of cycles executed.
  pub fn run(&mut self, max_cycles: Option<u64>) -> u64 {
    let start = self.cycles;
    while !self.exit_requested {
      if let Some(limit) = max_cycles {
        if self.cycles - start >= limit {
          break;
        }
      }
      self.execute();
    }
    self.cycles - start
  }

  // endregion

  // region Fetch/decode/execute

  fn fetch(&mut self) {
    self.ir    = self.memory.fetch_and_advance(&mut self.pc);
    // The address actually read, after any wrap.
    self.ip    = self.pc.wrapping_sub(1);
    self.state = 1;
    log::debug!("fetch ${:X}: {:016X}", self.ip, self.ir);
  }

  /// Discards the rest of the current word. The next cycle fetches from `self.pc`.
  fn refetch(&mut self) {
    self.state = 0;
  }

  fn branch(&mut self, displacement: i64) {
    self.pc = self.pc.wrapping_add(displacement as Word);
    log::debug!("branch from ${:X} to ${:X}", self.ip, self.pc);
    self.refetch();
  }

  /// Runs one clock cycle: fetch if the slot cursor is exhausted, then dispatch the opcode
  /// in the current slot.
  pub fn execute(&mut self) {
    if slot_shift(self.state).is_none() {
      self.fetch();
    }
    let slot = self.state;
    self.state  += 1;
    self.cycles += 1;

    // The fetch above leaves the cursor in 1..=10, so `opcode_at` always yields a code.
    let code = match opcode_at(self.ir, slot) {
      Some(code) => code,
      None       => {
        log::warn!("Slot cursor {} out of range at ${:X}; forcing a fetch", slot, self.ip);
        self.diagnostics += 1;
        self.refetch();
        return;
      }
    };

    match Operation::decode(code) {

      Some(operation) => {
        if operation.uses_operand() && slot != 1 {
          log::warn!(
            "{} in slot {} of word at ${:X}; operand is read from the whole word",
            operation.mnemonic(), slot, self.ip
          );
          self.diagnostics += 1;
        }
        self.dispatch(operation);
        debug_assert!(
          operation.is_control_transfer() || self.state == slot + 1,
          "{} moved the slot cursor", operation.mnemonic()
        );
      }

      None => self.unknown_opcode(code)

    }

    #[cfg(feature = "trace_computation")] println!("{}", self);
  }

  fn unknown_opcode(&mut self, code: u8) {
    log::warn!("Attempt to execute opcode {} at ${:X}", code, self.ip);
    self.diagnostics += 1;
  }

  fn unimplemented_opcode(&mut self, operation: Operation, sentinel: Word) {
    log::warn!("{} not yet implemented", operation.mnemonic());
    self.diagnostics += 1;
    self.stacks.param.top = sentinel;
  }

  fn dispatch(&mut self, operation: Operation) {
    let t = self.stacks.param.top;
    let r = self.stacks.ret.top;

    match operation {

      Operation::Nop => {
        // No operation, by definition.
      }

      Operation::Bra => self.branch(operand(self.ir)),

      Operation::Bz => {
        if t == 0 {
          self.branch(operand(self.ir));
        }
      }

      Operation::Bc => {
        if t & SIGN_BIT != 0 {
          self.branch(operand(self.ir));
        }
      }

      Operation::Call => {
        self.stacks.push_return(self.pc);
        self.branch(operand(self.ir));
      }

      Operation::Rfs => {
        self.pc = self.stacks.pop_return();
        self.refetch();
      }

      Operation::Next => {
        if r != 0 {
          self.stacks.ret.top = r - 1;
          self.branch(operand(self.ir));
        }
      }

      Operation::Times => {
        if r != 0 {
          self.stacks.ret.top = r - 1;
          self.pc = self.ip;
          self.refetch();
        }
      }

      Operation::Ldrp => {
        let value = self.memory.read(r);
        self.stacks.push_param(value);
        self.stacks.ret.top = r.wrapping_add(1);
      }

      Operation::Ldxp => {
        let value = self.memory.read(self.x);
        self.stacks.push_param(value);
        self.x = self.x.wrapping_add(1);
      }

      Operation::Ldi => {
        let value = self.memory.fetch_and_advance(&mut self.pc);
        self.stacks.push_param(value);
      }

      Operation::Ldx => {
        let value = self.memory.read(self.x);
        self.stacks.push_param(value);
      }

      Operation::Or => {
        self.stacks.param.top = t | self.stacks.param.pop_under();
      }

      Operation::Stxp => {
        let value = self.stacks.pop_param();
        self.memory.write(self.x, value);
        self.x = self.x.wrapping_add(1);
      }

      Operation::Rr8 => self.stacks.param.top = t.rotate_right(8),

      Operation::Stx => {
        let value = self.stacks.pop_param();
        self.memory.write(self.x, value);
      }

      Operation::Com => self.stacks.param.top = !t,

      Operation::Shl => self.stacks.param.top = t << 1,

      Operation::Shr => self.stacks.param.top = t >> 1,

      Operation::Muls => self.unimplemented_opcode(operation, MULS_SENTINEL),

      Operation::Xor => {
        self.stacks.param.top = t ^ self.stacks.param.pop_under();
      }

      Operation::And => {
        self.stacks.param.top = t & self.stacks.param.pop_under();
      }

      Operation::Divs => self.unimplemented_opcode(operation, DIVS_SENTINEL),

      Operation::Add => {
        self.stacks.param.top = t.wrapping_add(self.stacks.param.pop_under());
      }

      Operation::Pop => {
        let value = self.stacks.pop_return();
        self.stacks.push_param(value);
      }

      Operation::Tx => self.stacks.push_param(self.x),

      Operation::Dup => self.stacks.push_param(t),

      Operation::Over => {
        let second = self.stacks.param.peek_under();
        self.stacks.push_param(second);
      }

      Operation::Push => {
        let value = self.stacks.pop_param();
        self.stacks.push_return(value);
      }

      Operation::Xt => {
        self.x = self.stacks.pop_param();
      }

      Operation::Drop => {
        self.stacks.pop_param();
      }

      Operation::Reserved => self.unknown_opcode(operation.code()),

    }
  }

  // endregion

  // region Display methods

  fn make_stack_table(name: char, stack: &Stack) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Entry", ubl->"Contents"]);
    table.add_row(row![r->format!("{} =", name), format!("{:016X}", stack.top)]);

    // Most recent entry first.
    for depth in 1..=STACK_DEPTH {
      let index = stack.pointer().wrapping_sub(depth) & (STACK_DEPTH - 1);
      table.add_row(
        row![r->format!("{}[{}] =", name.to_ascii_lowercase(), index), format!("{:016X}", stack.buffer()[index])]
      );
    }
    table
  }

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    let slot = match self.phase() {
      Phase::Slot(slot)  => format!("{}", slot),
      Phase::NeedsFetch  => "fetch".to_string()
    };
    table.add_row(row![r->"PC =", format!("{:016X}", self.pc)]);
    table.add_row(row![r->"IP =", format!("{:016X}", self.ip)]);
    table.add_row(row![r->"IR =", format!("{:016X}", self.ir)]);
    table.add_row(row![r->"slot =", slot]);
    table.add_row(row![r->"X =", format!("{:016X}", self.x)]);
    table.add_row(row![r->"cycle =", format!("{}", self.cycles)]);
    table
  }

  // endregion

}

impl Default for Machine {
  fn default() -> Self {
    Machine::new()
  }
}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let register_table = self.make_register_table();
    let p_table        = Machine::make_stack_table('T', &self.stacks.param);
    let r_table        = Machine::make_stack_table('R', &self.stacks.ret);

    let mut combined_table = table!([register_table, p_table, r_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Parameter Stack", ub->"Return Stack"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "{}", combined_table)
  }
}
