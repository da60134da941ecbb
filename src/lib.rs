//! VP64: a cycle-stepped emulator for a 64 bit stack processor that packs ten 6 bit
//! opcodes into every instruction word.

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod boot;
pub mod bytecode;
pub mod config;
pub mod machine;
pub mod memory;
pub mod stack;

pub use bytecode::{Operation, Word};
pub use config::Config;
pub use machine::{Machine, Phase, Registers};
pub use memory::{Address, Memory};
pub use stack::{Stack, StackUnit};
