//! MOS 6521 Peripheral Interface Adapter (PIA).
//!
//! Two 8-bit ports, each with a data direction register, an edge-
//! sensitive interrupt input (CA1/CB1) and a second line (CA2/CB2)
//! usable as an interrupt input or a handshake/pulse/manual output.
//!
//! # Registers ($0-$3)
//!
//! | Reg | Name | Description                                |
//! |-----|------|--------------------------------------------|
//! | $0  | PRA  | Port A data, or DDRA when CRA bit 2 clear  |
//! | $1  | CRA  | Port A control (flags in bits 6/7 on read) |
//! | $2  | PRB  | Port B data, or DDRB when CRB bit 2 clear  |
//! | $3  | CRB  | Port B control                             |

// Control register bits
const CR_EDGE_POSITIVE: u8 = 0x01;
const CR_C1_IRQ_ENABLE: u8 = 0x02;
const CR_DATA_ACCESS: u8 = 0x04;
const CR_FLAG_C1: u8 = 0x40;
const CR_FLAG_C2: u8 = 0x80;

/// CA2/CB2 modes, decoded from control register bits 5-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineMode {
    InputNegative,
    InputNegativeIrq,
    InputPositive,
    InputPositiveIrq,
    OutputHandshake,
    OutputPulse,
    OutputLow,
    OutputHigh,
}

impl LineMode {
    fn from_control(cr: u8) -> Self {
        match (cr >> 3) & 0x07 {
            0 => Self::InputNegative,
            1 => Self::InputNegativeIrq,
            2 => Self::InputPositive,
            3 => Self::InputPositiveIrq,
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
                | Self::InputNegativeIrq
                | Self::InputPositive
                | Self::InputPositiveIrq
        )
    }
}

/// One half of the PIA: a port, its DDR, its control register and the
/// two control lines. Port A and port B behave identically here.
#[derive(Debug, Default)]
struct PiaPort {
    data: u8,
    ddr: u8,
    control: u8,
    c1: bool,
    c2: bool,
    flag_c1: bool,
    flag_c2: bool,
}

impl PiaPort {
    fn read_data(&mut self, external: u8) -> u8 {
        if self.control & CR_DATA_ACCESS != 0 {
            let value = (self.data & self.ddr) | (external & !self.ddr);
            self.flag_c1 = false;
            self.flag_c2 = false;
            if LineMode::from_control(self.control) == LineMode::OutputHandshake {
                self.c2 = false;
            }
            value
        } else {
            self.ddr
        }
    }

    fn write_data(&mut self, value: u8) {
        if self.control & CR_DATA_ACCESS != 0 {
            self.data = value;
            self.flag_c1 = false;
            self.flag_c2 = false;
            match LineMode::from_control(self.control) {
                LineMode::OutputHandshake | LineMode::OutputPulse => self.c2 = false,
                _ => {}
            }
        } else {
            self.ddr = value;
        }
    }

    fn read_control(&self) -> u8 {
        let mut value = self.control & 0x3F;
        if self.flag_c1 {
            value |= CR_FLAG_C1;
        }
        if self.flag_c2 {
            value |= CR_FLAG_C2;
        }
        value
    }

    fn write_control(&mut self, value: u8) {
        // Only the low six bits are writable; bits 6/7 are flags.
        self.control = value & 0x3F;
        match LineMode::from_control(self.control) {
            LineMode::OutputLow | LineMode::OutputPulse => self.c2 = false,
            LineMode::OutputHigh => self.c2 = true,
            _ => {}
        }
    }

    fn set_c1(&mut self, state: bool) {
        let active_edge = if self.control & CR_EDGE_POSITIVE != 0 {
            !self.c1 && state
        } else {
            self.c1 && !state
        };
        self.c1 = state;

        if active_edge {
            self.flag_c1 = true;
            if LineMode::from_control(self.control) == LineMode::OutputHandshake {
                self.c2 = true;
            }
        }
    }

    fn set_c2(&mut self, state: bool) {
        let mode = LineMode::from_control(self.control);
        if !mode.is_input() {
            return;
        }

        let old = self.c2;
        self.c2 = state;

        // Flag only raised in the with-IRQ input modes.
        let positive = matches!(mode, LineMode::InputPositive | LineMode::InputPositiveIrq);
        let enabled = matches!(mode, LineMode::InputNegativeIrq | LineMode::InputPositiveIrq);
        if !enabled {
            return;
        }
        let active_edge = if positive { !old && state } else { old && !state };
        if active_edge {
            self.flag_c2 = true;
        }
    }

    fn irq_active(&self) -> bool {
        // C1 interrupts gate on CR bit 1; C2 flags only exist in the
        // IRQ-enabled input modes, so the flag itself is the gate.
        (self.flag_c1 && self.control & CR_C1_IRQ_ENABLE != 0) || self.flag_c2
    }
}

/// MOS 6521 Peripheral Interface Adapter.
#[derive(Debug, Default)]
pub struct Pia6521 {
    porta: PiaPort,
    portb: PiaPort,
    /// External input lines for port A.
    pub external_a: u8,
    /// External input lines for port B.
    pub external_b: u8,
}

impl Pia6521 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            porta: PiaPort::default(),
            portb: PiaPort::default(),
            external_a: 0xFF,
            external_b: 0xFF,
        }
    }

    /// Reset to power-on state: all registers zero, lines released.
    pub fn reset(&mut self) {
        let external_a = self.external_a;
        let external_b = self.external_b;
        *self = Self::new();
        self.external_a = external_a;
        self.external_b = external_b;
    }

    /// Read a PIA register.
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x03 {
            0x00 => {
                let external = self.external_a;
                self.porta.read_data(external)
            }
            0x01 => self.porta.read_control(),
            0x02 => {
                let external = self.external_b;
                self.portb.read_data(external)
            }
            _ => self.portb.read_control(),
        }
    }

    /// Write a PIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x03 {
            0x00 => self.porta.write_data(value),
            0x01 => self.porta.write_control(value),
            0x02 => self.portb.write_data(value),
            _ => self.portb.write_control(value),
        }
    }

    /// Set the CA1 input line.
    pub fn set_ca1(&mut self, state: bool) {
        self.porta.set_c1(state);
    }

    /// Set the CA2 input line (ignored in output modes).
    pub fn set_ca2(&mut self, state: bool) {
        self.porta.set_c2(state);
    }

    /// Set the CB1 input line.
    pub fn set_cb1(&mut self, state: bool) {
        self.portb.set_c1(state);
    }

    /// Set the CB2 input line (ignored in output modes).
    pub fn set_cb2(&mut self, state: bool) {
        self.portb.set_c2(state);
    }

    /// Current CA2 line level.
    #[must_use]
    pub fn ca2_state(&self) -> bool {
        self.porta.c2
    }

    /// Current CB2 line level.
    #[must_use]
    pub fn cb2_state(&self) -> bool {
        self.portb.c2
    }

    /// Port A output value (data register masked by DDR).
    #[must_use]
    pub fn port_a_output(&self) -> u8 {
        self.porta.data & self.porta.ddr
    }

    /// Port B output value.
    #[must_use]
    pub fn port_b_output(&self) -> u8 {
        self.portb.data & self.portb.ddr
    }

    /// IRQA line state.
    #[must_use]
    pub fn irqa_active(&self) -> bool {
        self.porta.irq_active()
    }

    /// IRQB line state.
    #[must_use]
    pub fn irqb_active(&self) -> bool {
        self.portb.irq_active()
    }

    /// Either IRQ output.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.irqa_active() || self.irqb_active()
    }

    /// Capture the complete chip state.
    #[must_use]
    pub fn state(&self) -> PiaState {
        PiaState {
            porta_data: self.porta.data,
            porta_ddr: self.porta.ddr,
            porta_ctrl: self.porta.control,
            portb_data: self.portb.data,
            portb_ddr: self.portb.ddr,
            portb_ctrl: self.portb.control,
            ca1: self.porta.c1,
            ca2: self.porta.c2,
            cb1: self.portb.c1,
            cb2: self.portb.c2,
            flag_ca1: self.porta.flag_c1,
            flag_ca2: self.porta.flag_c2,
            flag_cb1: self.portb.flag_c1,
            flag_cb2: self.portb.flag_c2,
            external_a: self.external_a,
            external_b: self.external_b,
        }
    }

    /// Restore a previously captured state.
    pub fn restore_state(&mut self, state: &PiaState) {
        self.porta.data = state.porta_data;
        self.porta.ddr = state.porta_ddr;
        self.porta.control = state.porta_ctrl;
        self.portb.data = state.portb_data;
        self.portb.ddr = state.portb_ddr;
        self.portb.control = state.portb_ctrl;
        self.porta.c1 = state.ca1;
        self.porta.c2 = state.ca2;
        self.portb.c1 = state.cb1;
        self.portb.c2 = state.cb2;
        self.porta.flag_c1 = state.flag_ca1;
        self.porta.flag_c2 = state.flag_ca2;
        self.portb.flag_c1 = state.flag_cb1;
        self.portb.flag_c2 = state.flag_cb2;
        self.external_a = state.external_a;
        self.external_b = state.external_b;
    }
}

/// Complete PIA chip state, for machine snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiaState {
    pub porta_data: u8,
    pub porta_ddr: u8,
    pub porta_ctrl: u8,
    pub portb_data: u8,
    pub portb_ddr: u8,
    pub portb_ctrl: u8,
    pub ca1: bool,
    pub ca2: bool,
    pub cb1: bool,
    pub cb2: bool,
    pub flag_ca1: bool,
    pub flag_ca2: bool,
    pub flag_cb1: bool,
    pub flag_cb2: bool,
    pub external_a: u8,
    pub external_b: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// CRA/CRB with data-register access and C1 IRQ enabled.
    const DATA_IRQ: u8 = CR_DATA_ACCESS | CR_C1_IRQ_ENABLE;

    #[test]
    fn ddr_vs_data_access() {
        let mut pia = Pia6521::new();
        // CRA bit 2 clear: register 0 addresses the DDR
        pia.write(0x00, 0x0F);
        assert_eq!(pia.read(0x00), 0x0F);

        // CRA bit 2 set: register 0 addresses the data register
        pia.write(0x01, CR_DATA_ACCESS);
        pia.write(0x00, 0xA5);
        assert_eq!(pia.port_a_output(), 0xA5 & 0x0F);
    }

    #[test]
    fn data_read_mixes_ddr() {
        let mut pia = Pia6521::new();
        pia.write(0x00, 0x0F); // DDRA: low nibble output
        pia.write(0x01, CR_DATA_ACCESS);
        pia.write(0x00, 0xAB);
        pia.external_a = 0xC0;

        assert_eq!(pia.read(0x00), 0xCB);
    }

    #[test]
    fn ca1_edge_raises_flag_and_irq() {
        let mut pia = Pia6521::new();
        pia.write(0x01, DATA_IRQ); // negative edge (bit 0 clear)
        pia.set_ca1(true);
        assert!(!pia.irqa_active(), "rising edge is the inactive one");
        pia.set_ca1(false);
        assert!(pia.irqa_active());

        let cra = pia.read(0x01);
        assert_ne!(cra & CR_FLAG_C1, 0, "flag visible in CRA bit 6");
    }

    #[test]
    fn ca1_positive_edge_select() {
        let mut pia = Pia6521::new();
        pia.write(0x01, DATA_IRQ | CR_EDGE_POSITIVE);
        pia.set_ca1(true);
        assert!(pia.irqa_active());
    }

    #[test]
    fn data_read_clears_flags() {
        let mut pia = Pia6521::new();
        pia.write(0x01, DATA_IRQ);
        pia.set_ca1(true);
        pia.set_ca1(false);
        assert!(pia.irqa_active());

        let _ = pia.read(0x00);
        assert!(!pia.irqa_active());
        assert_eq!(pia.read(0x01) & (CR_FLAG_C1 | CR_FLAG_C2), 0);
    }

    #[test]
    fn ca2_input_irq_mode() {
        let mut pia = Pia6521::new();
        // CA2 input, positive edge, IRQ enabled: bits 5-3 = 011
        pia.write(0x01, CR_DATA_ACCESS | 0x18);
        pia.set_ca2(true);
        assert!(pia.irqa_active());
        assert_ne!(pia.read(0x01) & CR_FLAG_C2, 0);
    }

    #[test]
    fn ca2_input_without_irq_raises_nothing() {
        let mut pia = Pia6521::new();
        // CA2 input, positive edge, no IRQ: bits 5-3 = 010
        pia.write(0x01, CR_DATA_ACCESS | 0x10);
        pia.set_ca2(true);
        assert!(!pia.irqa_active());
    }

    #[test]
    fn ca2_manual_output() {
        let mut pia = Pia6521::new();
        pia.write(0x01, CR_DATA_ACCESS | 0x38); // manual high
        assert!(pia.ca2_state());
        pia.write(0x01, CR_DATA_ACCESS | 0x30); // manual low
        assert!(!pia.ca2_state());
    }

    #[test]
    fn ca2_handshake_cycle() {
        let mut pia = Pia6521::new();
        // CA2 handshake output (bits 5-3 = 100), CA1 positive edge
        pia.write(0x01, CR_DATA_ACCESS | 0x20 | CR_EDGE_POSITIVE);
        pia.porta.c2 = true;

        let _ = pia.read(0x00);
        assert!(!pia.ca2_state(), "CA2 drops on data read");

        pia.set_ca1(true);
        assert!(pia.ca2_state(), "CA2 returns high on CA1 edge");
    }

    #[test]
    fn port_b_symmetry() {
        let mut pia = Pia6521::new();
        pia.write(0x02, 0xFF); // DDRB all output
        pia.write(0x03, CR_DATA_ACCESS | CR_C1_IRQ_ENABLE);
        pia.write(0x02, 0x5A);
        assert_eq!(pia.port_b_output(), 0x5A);

        pia.set_cb1(true);
        pia.set_cb1(false);
        assert!(pia.irqb_active());
        let _ = pia.read(0x02);
        assert!(!pia.irqb_active());
    }

    #[test]
    fn control_write_masks_flag_bits() {
        let mut pia = Pia6521::new();
        pia.write(0x01, 0xFF);
        assert_eq!(pia.read(0x01) & 0xC0, 0, "flag bits are read-only");
    }
}
