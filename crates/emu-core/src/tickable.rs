//! Trait for components that can be advanced by clock cycles.

use crate::Ticks;

/// A component that can be advanced by clock cycles.
///
/// Peripherals implement this so the machine can advance them by the
/// cycle count each retired instruction consumed. A component must
/// behave identically whether advanced one cycle at a time or in a
/// batch.
pub trait Tickable {
    /// Advance the component by one clock cycle.
    fn tick(&mut self);

    /// Advance the component by multiple cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
