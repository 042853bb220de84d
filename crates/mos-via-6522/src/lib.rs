//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports with handshake lines, two
//! 16-bit timers, a serial shift register, and an interrupt controller.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                              |
//! |-----|------|------------------------------------------|
//! | $0  | ORB  | Port B data (handshake on access)        |
//! | $1  | ORA  | Port A data (handshake on access)        |
//! | $2  | DDRB | Port B data direction (1 = output)       |
//! | $3  | DDRA | Port A data direction (1 = output)       |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1)   |
//! | $6  | T1LL | Timer 1 latch low                        |
//! | $7  | T1LH | Timer 1 latch high                       |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2)   |
//! | $A  | SR   | Shift register                           |
//! | $B  | ACR  | Auxiliary control register               |
//! | $C  | PCR  | Peripheral control register              |
//! | $D  | IFR  | Interrupt flag register                  |
//! | $E  | IER  | Interrupt enable register                |
//! | $F  | ORA  | Port A data (no handshake)               |

// IFR/IER bit masks
pub const IFR_CA2: u8 = 0x01;
pub const IFR_CA1: u8 = 0x02;
pub const IFR_SR: u8 = 0x04;
pub const IFR_CB2: u8 = 0x08;
pub const IFR_CB1: u8 = 0x10;
pub const IFR_T2: u8 = 0x20;
pub const IFR_T1: u8 = 0x40;

// ACR bits
const ACR_PA_LATCH: u8 = 0x01;
const ACR_PB_LATCH: u8 = 0x02;
const ACR_T1_FREE_RUN: u8 = 0x40;
const ACR_T1_PB7: u8 = 0x80;

/// CA2/CB2 control modes, decoded from their three PCR bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlMode {
    InputNegative,
    InputNegativeIndependent,
    InputPositive,
    InputPositiveIndependent,
    OutputHandshake,
    OutputPulse,
    OutputLow,
    OutputHigh,
}

impl ControlMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::InputNegative,
            1 => Self::InputNegativeIndependent,
            2 => Self::InputPositive,
            3 => Self::InputPositiveIndependent,
            4 => Self::OutputHandshake,
            5 => Self::OutputPulse,
            6 => Self::OutputLow,
            _ => Self::OutputHigh,
        }
    }

    fn is_input(self) -> bool {
        matches!(
            self,
            Self::InputNegative
                | Self::InputNegativeIndependent
                | Self::InputPositive
                | Self::InputPositiveIndependent
        )
    }
}

/// MOS 6522 Versatile Interface Adapter.
pub struct Via6522 {
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A data direction register (1 = output).
    ddra: u8,
    /// Port B data direction register (1 = output).
    ddrb: u8,
    /// External input lines for port A (active-high, directly settable).
    pub external_a: u8,
    /// External input lines for port B (active-high, directly settable).
    pub external_b: u8,
    /// Port A input latched on the CA1 active edge (ACR bit 0).
    ira_latch: u8,
    /// Port B input latched on the CB1 active edge (ACR bit 1).
    irb_latch: u8,

    /// Timer 1 counter (16-bit, counts down).
    t1_counter: u16,
    /// Timer 1 latch (reloaded into the counter in free-run mode).
    t1_latch: u16,
    /// Timer 1 is active. Clears after the one-shot underflow.
    t1_running: bool,
    /// Timer 1 PB7 output state (ACR bit 7).
    t1_pb7_state: bool,

    /// Timer 2 counter (16-bit, counts down, always one-shot).
    t2_counter: u16,
    /// Timer 2 low-order latch (only the low byte is latched).
    t2_latch_lo: u8,
    /// Timer 2 is active.
    t2_running: bool,

    /// Shift register.
    sr: u8,

    /// Auxiliary control register.
    /// Bits 7-6: T1 control, bit 5: T2 control,
    /// bits 4-2: shift register, bit 1: PB latch, bit 0: PA latch.
    acr: u8,

    /// Peripheral control register.
    /// Bits 7-5: CB2 control, bit 4: CB1 edge,
    /// bits 3-1: CA2 control, bit 0: CA1 edge.
    pcr: u8,

    /// Interrupt flag register (bit 7 computed on read).
    ifr: u8,
    /// Interrupt enable register.
    ier: u8,

    /// Control line states, as logical levels.
    ca1: bool,
    ca2: bool,
    cb1: bool,
    cb2: bool,
}

impl Via6522 {
    /// Create a new VIA with all registers in their reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ora: 0,
            orb: 0,
            ddra: 0,
            ddrb: 0,
            external_a: 0xFF,
            external_b: 0xFF,
            ira_latch: 0,
            irb_latch: 0,
            t1_counter: 0xFFFF,
            t1_latch: 0xFFFF,
            t1_running: false,
            t1_pb7_state: false,
            t2_counter: 0xFFFF,
            t2_latch_lo: 0xFF,
            t2_running: false,
            sr: 0,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca1: false,
            ca2: false,
            cb1: false,
            cb2: false,
        }
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Check if the VIA has an active (and enabled) interrupt.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        (self.ifr & self.ier & 0x7F) != 0
    }

    /// Advance the timers by one clock cycle.
    pub fn tick(&mut self) {
        self.tick_timer1();
        self.tick_timer2();
    }

    /// Advance the timers by `cycles` cycles, one at a time so that
    /// underflow timing is exact.
    pub fn clock_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Read a VIA register.
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x00 => {
                // ORB/IRB with handshake: clears CB1/CB2 flags
                self.ifr &= !(IFR_CB1 | IFR_CB2);
                if ControlMode::from_bits(self.pcr >> 5) == ControlMode::OutputHandshake {
                    self.cb2 = false;
                }
                self.read_port_b()
            }
            0x01 => {
                // ORA/IRA with handshake: clears CA1/CA2 flags
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                if ControlMode::from_bits(self.pcr >> 1) == ControlMode::OutputHandshake {
                    self.ca2 = false;
                }
                self.read_port_a(true)
            }
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => {
                // T1C-L: read low byte AND clear T1 interrupt flag
                self.ifr &= !IFR_T1;
                self.t1_counter as u8
            }
            0x05 => (self.t1_counter >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => {
                // T2C-L: read low byte AND clear T2 interrupt flag
                self.ifr &= !IFR_T2;
                self.t2_counter as u8
            }
            0x09 => (self.t2_counter >> 8) as u8,
            0x0A => {
                self.ifr &= !IFR_SR;
                self.sr
            }
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => {
                // IFR: bit 7 reflects whether any enabled interrupt is active
                let irq_any = if self.irq_active() { 0x80 } else { 0 };
                (self.ifr & 0x7F) | irq_any
            }
            0x0E => {
                // IER: bit 7 always reads as 1
                self.ier | 0x80
            }
            0x0F => {
                // ORA no-handshake: CA flags untouched
                self.read_port_a(false)
            }
            _ => 0xFF,
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x00 => {
                // ORB with handshake: clears CB1/CB2 flags
                self.orb = value;
                self.ifr &= !(IFR_CB1 | IFR_CB2);
                match ControlMode::from_bits(self.pcr >> 5) {
                    ControlMode::OutputHandshake | ControlMode::OutputPulse => self.cb2 = false,
                    _ => {}
                }
            }
            0x01 => {
                // ORA with handshake: clears CA1/CA2 flags
                self.ora = value;
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                match ControlMode::from_bits(self.pcr >> 1) {
                    ControlMode::OutputHandshake | ControlMode::OutputPulse => self.ca2 = false,
                    _ => {}
                }
            }
            0x02 => self.ddrb = value,
            0x03 => self.ddra = value,
            0x04 | 0x06 => {
                // T1 latch low
                self.t1_latch = (self.t1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // T1C-H: latch high, copy latch into counter, start
                // timer, clear T1 interrupt flag
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.t1_counter = self.t1_latch;
                self.t1_running = true;
                self.ifr &= !IFR_T1;
                if self.acr & ACR_T1_PB7 != 0 {
                    self.t1_pb7_state = true;
                }
            }
            0x07 => {
                // T1L-H: latch high only, clear T1 flag, counter untouched
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.ifr &= !IFR_T1;
            }
            0x08 => self.t2_latch_lo = value,
            0x09 => {
                // T2C-H: load counter (high from value, low from latch),
                // start timer, clear T2 interrupt flag
                self.t2_counter = u16::from(self.t2_latch_lo) | (u16::from(value) << 8);
                self.t2_running = true;
                self.ifr &= !IFR_T2;
            }
            0x0A => {
                self.sr = value;
                self.ifr &= !IFR_SR;
            }
            0x0B => self.acr = value,
            0x0C => {
                self.pcr = value;
                self.apply_output_modes();
            }
            0x0D => {
                // IFR: writing 1s clears the corresponding flags
                self.ifr &= !(value & 0x7F);
            }
            0x0E => {
                // IER: bit 7 selects set (1) or clear (0) mode
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !(value & 0x7F);
                }
            }
            0x0F => {
                // ORA no-handshake
                self.ora = value;
            }
            _ => {}
        }
    }

    /// Set the CA1 input line. Triggers on the PCR-selected edge:
    /// raises the CA1 flag, latches port A if enabled, and in CA2
    /// handshake mode returns CA2 high.
    pub fn set_ca1(&mut self, state: bool) {
        let active_edge = if self.pcr & 0x01 != 0 {
            !self.ca1 && state // rising
        } else {
            self.ca1 && !state // falling
        };
        self.ca1 = state;

        if active_edge {
            self.ifr |= IFR_CA1;
            if self.acr & ACR_PA_LATCH != 0 {
                self.ira_latch = self.external_a;
            }
            if ControlMode::from_bits(self.pcr >> 1) == ControlMode::OutputHandshake {
                self.ca2 = true;
            }
        }
    }

    /// Set the CB1 input line. Mirror of `set_ca1` for port B.
    pub fn set_cb1(&mut self, state: bool) {
        let active_edge = if self.pcr & 0x10 != 0 {
            !self.cb1 && state
        } else {
            self.cb1 && !state
        };
        self.cb1 = state;

        if active_edge {
            self.ifr |= IFR_CB1;
            if self.acr & ACR_PB_LATCH != 0 {
                self.irb_latch = self.external_b;
            }
            if ControlMode::from_bits(self.pcr >> 5) == ControlMode::OutputHandshake {
                self.cb2 = true;
            }
        }
    }

    /// Set the CA2 input line. Ignored when PCR puts CA2 in an output
    /// mode.
    pub fn set_ca2(&mut self, state: bool) {
        let mode = ControlMode::from_bits(self.pcr >> 1);
        if !mode.is_input() {
            return;
        }
        let positive = self.pcr & 0x04 != 0;
        let active_edge = if positive {
            !self.ca2 && state
        } else {
            self.ca2 && !state
        };
        self.ca2 = state;
        if active_edge {
            self.ifr |= IFR_CA2;
        }
    }

    /// Set the CB2 input line. Ignored in output modes.
    pub fn set_cb2(&mut self, state: bool) {
        let mode = ControlMode::from_bits(self.pcr >> 5);
        if !mode.is_input() {
            return;
        }
        let positive = self.pcr & 0x40 != 0;
        let active_edge = if positive {
            !self.cb2 && state
        } else {
            self.cb2 && !state
        };
        self.cb2 = state;
        if active_edge {
            self.ifr |= IFR_CB2;
        }
    }

    /// Current CA2 line level.
    #[must_use]
    pub fn ca2_state(&self) -> bool {
        self.ca2
    }

    /// Current CB2 line level.
    #[must_use]
    pub fn cb2_state(&self) -> bool {
        self.cb2
    }

    /// Port A output value (output register masked by DDR).
    #[must_use]
    pub fn port_a_output(&self) -> u8 {
        self.ora & self.ddra
    }

    /// Port B output value. With T1 in PB7 mode, bit 7 reflects the
    /// timer toggle instead of ORB bit 7.
    #[must_use]
    pub fn port_b_output(&self) -> u8 {
        let mut out = self.orb & self.ddrb;
        if self.acr & ACR_T1_PB7 != 0 {
            out = (out & 0x7F) | if self.t1_pb7_state { 0x80 } else { 0 };
        }
        out
    }

    /// Current IFR value (diagnostic use; no flag side effects).
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.ifr
    }

    /// Current IER value.
    #[must_use]
    pub fn ier(&self) -> u8 {
        self.ier
    }

    /// Timer 1 counter value.
    #[must_use]
    pub fn t1_counter(&self) -> u16 {
        self.t1_counter
    }

    /// Timer 2 counter value.
    #[must_use]
    pub fn t2_counter(&self) -> u16 {
        self.t2_counter
    }

    /// Port B data direction register (1 = output).
    #[must_use]
    pub fn ddrb(&self) -> u8 {
        self.ddrb
    }

    /// Port A data direction register (1 = output).
    #[must_use]
    pub fn ddra(&self) -> u8 {
        self.ddra
    }

    /// Capture the complete chip state.
    #[must_use]
    pub fn state(&self) -> ViaState {
        ViaState {
            ora: self.ora,
            orb: self.orb,
            ddra: self.ddra,
            ddrb: self.ddrb,
            external_a: self.external_a,
            external_b: self.external_b,
            ira_latch: self.ira_latch,
            irb_latch: self.irb_latch,
            t1_counter: self.t1_counter,
            t1_latch: self.t1_latch,
            t1_running: self.t1_running,
            t1_pb7_state: self.t1_pb7_state,
            t2_counter: self.t2_counter,
            t2_latch_lo: self.t2_latch_lo,
            t2_running: self.t2_running,
            sr: self.sr,
            acr: self.acr,
            pcr: self.pcr,
            ifr: self.ifr,
            ier: self.ier,
            ca1: self.ca1,
            ca2: self.ca2,
            cb1: self.cb1,
            cb2: self.cb2,
        }
    }

    /// Restore a previously captured state.
    pub fn restore_state(&mut self, state: &ViaState) {
        self.ora = state.ora;
        self.orb = state.orb;
        self.ddra = state.ddra;
        self.ddrb = state.ddrb;
        self.external_a = state.external_a;
        self.external_b = state.external_b;
        self.ira_latch = state.ira_latch;
        self.irb_latch = state.irb_latch;
        self.t1_counter = state.t1_counter;
        self.t1_latch = state.t1_latch;
        self.t1_running = state.t1_running;
        self.t1_pb7_state = state.t1_pb7_state;
        self.t2_counter = state.t2_counter;
        self.t2_latch_lo = state.t2_latch_lo;
        self.t2_running = state.t2_running;
        self.sr = state.sr;
        self.acr = state.acr;
        self.pcr = state.pcr;
        self.ifr = state.ifr;
        self.ier = state.ier;
        self.ca1 = state.ca1;
        self.ca2 = state.ca2;
        self.cb1 = state.cb1;
        self.cb2 = state.cb2;
    }

    // --- Internal helpers ---

    fn read_port_a(&self, use_latch: bool) -> u8 {
        let input = if use_latch && self.acr & ACR_PA_LATCH != 0 {
            self.ira_latch
        } else {
            self.external_a
        };
        (self.ora & self.ddra) | (input & !self.ddra)
    }

    fn read_port_b(&self) -> u8 {
        let input = if self.acr & ACR_PB_LATCH != 0 {
            self.irb_latch
        } else {
            self.external_b
        };
        let mut val = (self.orb & self.ddrb) | (input & !self.ddrb);
        if self.acr & ACR_T1_PB7 != 0 {
            val = (val & 0x7F) | if self.t1_pb7_state { 0x80 } else { 0 };
        }
        val
    }

    /// Drive CA2/CB2 for the manual and pulse output modes after a PCR
    /// write.
    fn apply_output_modes(&mut self) {
        match ControlMode::from_bits(self.pcr >> 1) {
            ControlMode::OutputLow | ControlMode::OutputPulse => self.ca2 = false,
            ControlMode::OutputHigh => self.ca2 = true,
            _ => {}
        }
        match ControlMode::from_bits(self.pcr >> 5) {
            ControlMode::OutputLow | ControlMode::OutputPulse => self.cb2 = false,
            ControlMode::OutputHigh => self.cb2 = true,
            _ => {}
        }
    }

    fn tick_timer1(&mut self) {
        if !self.t1_running {
            return;
        }

        if self.t1_counter == 0 {
            self.ifr |= IFR_T1;
            if self.acr & ACR_T1_PB7 != 0 {
                self.t1_pb7_state = !self.t1_pb7_state;
            }
            if self.acr & ACR_T1_FREE_RUN != 0 {
                self.t1_counter = self.t1_latch;
            } else {
                self.t1_counter = 0xFFFF;
                self.t1_running = false;
            }
        } else {
            self.t1_counter -= 1;
        }
    }

    fn tick_timer2(&mut self) {
        if !self.t2_running {
            return;
        }

        if self.t2_counter == 0 {
            self.ifr |= IFR_T2;
            self.t2_counter = 0xFFFF;
            self.t2_running = false;
        } else {
            self.t2_counter -= 1;
        }
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete VIA chip state, for machine snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViaState {
    pub ora: u8,
    pub orb: u8,
    pub ddra: u8,
    pub ddrb: u8,
    pub external_a: u8,
    pub external_b: u8,
    pub ira_latch: u8,
    pub irb_latch: u8,
    pub t1_counter: u16,
    pub t1_latch: u16,
    pub t1_running: bool,
    pub t1_pb7_state: bool,
    pub t2_counter: u16,
    pub t2_latch_lo: u8,
    pub t2_running: bool,
    pub sr: u8,
    pub acr: u8,
    pub pcr: u8,
    pub ifr: u8,
    pub ier: u8,
    pub ca1: bool,
    pub ca2: bool,
    pub cb1: bool,
    pub cb2: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer1_countdown_and_underflow() {
        let mut via = Via6522::new();
        via.write(0x04, 3); // T1L-L
        via.write(0x05, 0); // T1C-H = start (loads counter from latch)

        assert!(via.t1_running);
        assert_eq!(via.t1_counter, 3);
        assert_eq!(via.ifr & IFR_T1, 0);

        via.clock_cycles(3); // 3 -> 0
        assert_eq!(via.t1_counter, 0);
        assert_eq!(via.ifr & IFR_T1, 0, "no IRQ until underflow");
        via.tick(); // underflow
        assert_ne!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer1_one_shot_stops() {
        let mut via = Via6522::new();
        via.write(0x04, 2);
        via.write(0x05, 0);

        via.clock_cycles(3); // 2 -> 0, then underflow
        assert!(!via.t1_running);
        assert_ne!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer1_free_run_period_is_latch_plus_one() {
        let mut via = Via6522::new();
        via.write(0x0B, ACR_T1_FREE_RUN);
        via.write(0x04, 9); // latch L = 9
        via.write(0x05, 0); // start

        // k * (L + 1) cycles produce exactly k interrupts
        for _ in 0..4 {
            via.clock_cycles(10);
            assert_ne!(via.ifr & IFR_T1, 0);
            via.write(0x0D, IFR_T1); // acknowledge
        }
        assert_eq!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer1_write_high_starts_and_clears_irq() {
        let mut via = Via6522::new();
        via.ifr = IFR_T1;
        via.write(0x04, 10);
        via.write(0x05, 0);
        assert!(via.t1_running);
        assert_eq!(via.ifr & IFR_T1, 0);
        assert_eq!(via.t1_counter, 10);
    }

    #[test]
    fn timer1_read_low_clears_irq() {
        let mut via = Via6522::new();
        via.ifr = IFR_T1;
        let _ = via.read(0x04);
        assert_eq!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer1_latch_write_does_not_start() {
        let mut via = Via6522::new();
        via.write(0x06, 0x10); // T1L-L
        via.write(0x07, 0x00); // T1L-H
        assert!(!via.t1_running);
        // T1L-H write clears a pending T1 flag
        via.ifr = IFR_T1;
        via.write(0x07, 0x00);
        assert_eq!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer2_one_shot() {
        let mut via = Via6522::new();
        via.write(0x08, 3); // T2L-L
        via.write(0x09, 0); // T2C-H = start

        assert!(via.t2_running);
        via.clock_cycles(4);
        assert!(!via.t2_running);
        assert_ne!(via.ifr & IFR_T2, 0);

        // Stays stopped; no further flags
        via.write(0x0D, IFR_T2);
        via.clock_cycles(10);
        assert_eq!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn timer2_read_low_clears_irq() {
        let mut via = Via6522::new();
        via.ifr = IFR_T2;
        let _ = via.read(0x08);
        assert_eq!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn ifr_write_clears_flags() {
        let mut via = Via6522::new();
        via.ifr = IFR_T1 | IFR_T2 | IFR_CA1;
        via.write(0x0D, IFR_T1 | IFR_CA1);
        assert_eq!(via.ifr, IFR_T2);
    }

    #[test]
    fn ier_set_clear_mode() {
        let mut via = Via6522::new();
        via.write(0x0E, 0x80 | IFR_T1 | IFR_CB1);
        assert_eq!(via.ier & IFR_T1, IFR_T1);
        assert_eq!(via.ier & IFR_CB1, IFR_CB1);

        via.write(0x0E, IFR_T1);
        assert_eq!(via.ier & IFR_T1, 0);
        assert_eq!(via.ier & IFR_CB1, IFR_CB1);
    }

    #[test]
    fn ier_reads_with_bit7_set() {
        let mut via = Via6522::new();
        via.ier = 0x42;
        assert_eq!(via.read(0x0E), 0xC2);
    }

    #[test]
    fn ifr_bit7_tracks_enabled_flags() {
        let mut via = Via6522::new();
        via.ifr = IFR_T1;
        assert_eq!(via.read(0x0D) & 0x80, 0, "not enabled, no summary bit");
        via.ier = IFR_T1;
        assert_ne!(via.read(0x0D) & 0x80, 0);
    }

    #[test]
    fn ca1_edge_sets_flag() {
        let mut via = Via6522::new();
        via.pcr = 0x01; // CA1 positive edge
        via.set_ca1(true);
        assert_ne!(via.ifr & IFR_CA1, 0);
    }

    #[test]
    fn cb1_negative_edge() {
        let mut via = Via6522::new();
        via.pcr = 0x00;
        via.set_cb1(true); // inactive edge
        assert_eq!(via.ifr & IFR_CB1, 0);
        via.set_cb1(false); // falling edge
        assert_ne!(via.ifr & IFR_CB1, 0);
    }

    #[test]
    fn ca2_input_edge_sets_flag() {
        let mut via = Via6522::new();
        via.pcr = 0x04; // CA2 input, positive edge
        via.set_ca2(true);
        assert_ne!(via.ifr & IFR_CA2, 0);
    }

    #[test]
    fn ca2_input_ignored_in_output_mode() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x0C); // CA2 manual output low
        via.set_ca2(true);
        assert_eq!(via.ifr & IFR_CA2, 0);
        assert!(!via.ca2_state());
    }

    #[test]
    fn ca2_manual_output_modes() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x0E); // CA2 manual high
        assert!(via.ca2_state());
        via.write(0x0C, 0x0C); // CA2 manual low
        assert!(!via.ca2_state());
    }

    #[test]
    fn ca2_handshake_drops_on_ora_access_and_rises_on_ca1() {
        let mut via = Via6522::new();
        // PCR bits 3-1 = 100 (CA2 handshake output), bit 0 = CA1 positive edge
        via.write(0x0C, 0x09);

        via.ca2 = true;
        let _ = via.read(0x01); // ORA read
        assert!(!via.ca2_state(), "CA2 low after port A access");

        via.set_ca1(true); // active edge
        assert!(via.ca2_state(), "CA2 returns high on CA1 edge");
    }

    #[test]
    fn external_port_reads() {
        let mut via = Via6522::new();
        via.ddra = 0x0F;
        via.ora = 0xAB;
        via.external_a = 0xC0;

        let val = via.read(0x0F);
        // Output bits: 0xAB & 0x0F = 0x0B; input bits: 0xC0 & 0xF0
        assert_eq!(val, 0xCB);
    }

    #[test]
    fn port_a_latching_freezes_input() {
        let mut via = Via6522::new();
        via.write(0x0B, ACR_PA_LATCH);
        via.pcr = 0x01; // CA1 positive edge
        via.external_a = 0x55;
        via.set_ca1(true); // latch 0x55
        via.external_a = 0xAA;

        assert_eq!(via.read(0x01), 0x55, "latched value survives input change");
        assert_eq!(via.read(0x0F), 0xAA, "no-handshake read sees live input");
    }

    #[test]
    fn port_b_external() {
        let mut via = Via6522::new();
        via.ddrb = 0x00;
        via.external_b = 0x42;
        assert_eq!(via.read(0x00), 0x42);
    }

    #[test]
    fn read_orb_clears_cb_flags() {
        let mut via = Via6522::new();
        via.ifr = IFR_CB1 | IFR_CB2 | IFR_T1;
        let _ = via.read(0x00);
        assert_eq!(via.ifr & (IFR_CB1 | IFR_CB2), 0);
        assert_ne!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn read_ora_clears_ca_flags() {
        let mut via = Via6522::new();
        via.ifr = IFR_CA1 | IFR_CA2 | IFR_T2;
        let _ = via.read(0x01);
        assert_eq!(via.ifr & (IFR_CA1 | IFR_CA2), 0);
        assert_ne!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn ora_no_handshake_preserves_ca_flags() {
        let mut via = Via6522::new();
        via.ifr = IFR_CA1 | IFR_CA2;
        let _ = via.read(0x0F);
        assert_ne!(via.ifr & IFR_CA1, 0);
        assert_ne!(via.ifr & IFR_CA2, 0);
    }

    #[test]
    fn pb7_toggles_on_free_run_underflow() {
        let mut via = Via6522::new();
        via.write(0x0B, ACR_T1_FREE_RUN | ACR_T1_PB7);
        via.ddrb = 0x80;
        via.write(0x04, 1);
        via.write(0x05, 0); // start, counter = 1, PB7 driven high

        assert!(via.t1_pb7_state);
        via.clock_cycles(2); // 1 -> 0, underflow -> toggle
        assert!(!via.t1_pb7_state);
        via.clock_cycles(2);
        assert!(via.t1_pb7_state);
        assert_eq!(via.port_b_output() & 0x80, 0x80);
    }

    #[test]
    fn irq_active_requires_both_flag_and_enable() {
        let mut via = Via6522::new();
        via.ifr = IFR_T1;
        assert!(!via.irq_active());
        via.ier = IFR_T1;
        assert!(via.irq_active());
        via.ifr = 0;
        assert!(!via.irq_active());
    }
}
