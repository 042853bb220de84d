//! Core traits and types for cycle-aware emulation.
//!
//! Every cycle a retired instruction consumes is reported back to the
//! machine, which advances the peripherals by exactly that amount. All
//! device timing derives from instruction cycle counts. No exceptions.

mod bus;
mod tickable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use tickable::Tickable;
pub use ticks::Ticks;
