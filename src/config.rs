//! Runtime configuration for the emulator.
//!
//! Configuration comes from built-in defaults, overridden by environment variables:
//!
//! - `VP64_MEMORY_WORDS`: memory size in 64 bit words. Must be a nonzero power of two.
//! - `VP64_MAX_CYCLES`: stop the control loop after this many cycles. Unset means run
//!   until the exit flag is raised.

use crate::memory::DEFAULT_MEMORY_WORDS;

pub const MEMORY_WORDS_VAR: &str = "VP64_MEMORY_WORDS";
pub const MAX_CYCLES_VAR: &str = "VP64_MAX_CYCLES";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
  /// Memory size in words.
  pub memory_words: usize,
  /// Cycle budget for the control loop.
  pub max_cycles: Option<u64>,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      memory_words : DEFAULT_MEMORY_WORDS,
      max_cycles   : None,
    }
  }
}

impl Config {

  /// Defaults with environment overrides applied.
  pub fn load() -> Self {
    let mut config = Self::default();
    config.apply_overrides(|name| std::env::var(name).ok());
    log::debug!("Loaded configuration: {:?}", config);
    config
  }

  /// Applies overrides from `lookup`, which maps a variable name to its value. Values
  /// that do not parse, or are out of range, are ignored with a warning.
  pub fn apply_overrides<F>(&mut self, lookup: F)
    where F: Fn(&str) -> Option<String>
  {
    if let Some(text) = lookup(MEMORY_WORDS_VAR) {
      match text.trim().parse::<usize>() {
        Ok(words) if words.is_power_of_two() => {
          log::info!("Using {} from environment: {}", MEMORY_WORDS_VAR, words);
          self.memory_words = words;
        }
        Ok(words) => {
          log::warn!("{}={} is not a nonzero power of two; keeping {}", MEMORY_WORDS_VAR, words, self.memory_words);
        }
        Err(e) => {
          log::warn!("Failed to parse {}={:?}: {}", MEMORY_WORDS_VAR, text, e);
        }
      }
    }

    if let Some(text) = lookup(MAX_CYCLES_VAR) {
      match text.trim().parse::<u64>() {
        Ok(cycles) => {
          log::info!("Using {} from environment: {}", MAX_CYCLES_VAR, cycles);
          self.max_cycles = Some(cycles);
        }
        Err(e) => {
          log::warn!("Failed to parse {}={:?}: {}", MAX_CYCLES_VAR, text, e);
        }
      }
    }
  }

}
