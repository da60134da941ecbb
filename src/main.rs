use vp64::{boot, Config, Machine};

fn main() {
  env_logger::init();
  println!("VP64 Emulator.");

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let config      = Config::load();
  let mut machine = Machine::with_config(&config);
  boot::load_roms(&mut machine);

  // Each step is one clock cycle. Peripherals such as SPI devices would be
  // stepped here, alongside the processor.
  let cycles = machine.run(config.max_cycles);

  log::info!(
    "Stopped after {} cycles ({} diagnostics, {} wrapped memory accesses)",
    cycles,
    machine.diagnostics(),
    machine.memory().wrapped_accesses()
  );
}
