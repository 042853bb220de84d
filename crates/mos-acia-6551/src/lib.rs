//! MOS 6551 Asynchronous Communications Interface Adapter (ACIA).
//!
//! Byte-level serial emulation: transmitted bytes leave after a
//! word-length-plus-framing countdown driven by the programmed baud
//! divider; analog bit timing is not modeled.
//!
//! # Registers ($0-$3)
//!
//! | Reg | Read            | Write            |
//! |-----|-----------------|------------------|
//! | $0  | Receive data    | Transmit data    |
//! | $1  | Status          | Programmed reset |
//! | $2  | Command         | Command          |
//! | $3  | Control         | Control          |
//!
//! # Status bits
//!
//! | Bit | Meaning                                  |
//! |-----|------------------------------------------|
//! | 0   | Parity error                             |
//! | 1   | Framing error                            |
//! | 2   | Receiver overrun                         |
//! | 3   | RDRF — receive data register full        |
//! | 4   | TDRE — transmit data register empty      |
//! | 5   | DCD (set when carrier absent)            |
//! | 6   | DSR (set when data-set not ready)        |
//! | 7   | IRQ                                      |

// Status register bits
pub const STATUS_PARITY_ERR: u8 = 0x01;
pub const STATUS_FRAMING_ERR: u8 = 0x02;
pub const STATUS_OVERRUN: u8 = 0x04;
pub const STATUS_RDRF: u8 = 0x08;
pub const STATUS_TDRE: u8 = 0x10;
pub const STATUS_DCD: u8 = 0x20;
pub const STATUS_DSR: u8 = 0x40;
pub const STATUS_IRQ: u8 = 0x80;

// Command register bits
pub const CMD_DTR_ENABLE: u8 = 0x01;
const CMD_IRQ_MASK: u8 = 0x0E;
const CMD_IRQ_RX: u8 = 0x02;
const CMD_IRQ_TX: u8 = 0x04;
const CMD_IRQ_RX_BREAK: u8 = 0x0E;

// Control register bits
pub const CTRL_BAUD_MASK: u8 = 0x0F;
pub const CTRL_RECV_CLK: u8 = 0x10;
pub const CTRL_WORD_MASK: u8 = 0x60;
pub const CTRL_STOP_BITS: u8 = 0x80;

const FIFO_SIZE: usize = 256;

/// Baud rates for the control register's select field. Index 0 is the
/// external-clock setting.
const BAUD_RATES: [u32; 16] = [
    0, 50, 75, 110, 135, 150, 300, 600, 1200, 1800, 2400, 3600, 4800, 7200, 9600, 19200,
];

/// Transmit clock dividers per baud select, in CPU cycles per bit.
const CLOCK_DIVIDERS: [u32; 16] = [
    16, 38400, 25600, 17455, 14245, 12800, 6400, 3200, 1600, 1067, 800, 533, 400, 267, 200, 100,
];

/// Host side of the serial line.
///
/// The machine embedding the ACIA installs one of these to see
/// transmitted bytes and to feed received ones; `poll_receive` is
/// polled from `clock_cycles`.
pub trait SerialHost {
    /// A byte finished shifting out.
    fn byte_transmitted(&mut self, byte: u8);

    /// Offer a byte to the receiver, if one is pending.
    fn poll_receive(&mut self) -> Option<u8> {
        None
    }

    /// The DTR output changed level.
    fn dtr_changed(&mut self, _asserted: bool) {}
}

/// A fixed 256-entry byte ring.
struct Fifo {
    buf: [u8; FIFO_SIZE],
    head: usize,
    tail: usize,
    count: usize,
}

impl Fifo {
    const fn new() -> Self {
        Self {
            buf: [0; FIFO_SIZE],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    fn push(&mut self, byte: u8) -> bool {
        if self.count == FIFO_SIZE {
            return false;
        }
        self.buf[self.head] = byte;
        self.head = (self.head + 1) % FIFO_SIZE;
        self.count += 1;
        true
    }

    fn pop(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let byte = self.buf[self.tail];
        self.tail = (self.tail + 1) % FIFO_SIZE;
        self.count -= 1;
        Some(byte)
    }

    fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Pending bytes in queue order.
    fn snapshot(&self) -> Vec<u8> {
        (0..self.count)
            .map(|i| self.buf[(self.tail + i) % FIFO_SIZE])
            .collect()
    }

    fn restore_from(&mut self, bytes: &[u8]) {
        self.clear();
        for &byte in bytes.iter().take(FIFO_SIZE) {
            self.push(byte);
        }
    }
}

/// MOS 6551 ACIA.
pub struct Acia6551 {
    rx_fifo: Fifo,
    tx_fifo: Fifo,

    command: u8,
    control: u8,

    rdrf: bool,
    tdre: bool,
    parity_error: bool,
    framing_error: bool,
    overrun_error: bool,

    // Control lines, stored as logical "asserted" levels; the status
    // register bits are the inversion of these.
    dtr_asserted: bool,
    dcd_asserted: bool,
    dsr_asserted: bool,

    // Transmit timing
    tx_shift: u8,
    tx_bits_remaining: u8,
    tx_clock_divider: u32,
    tx_clock_counter: u32,

    host: Option<Box<dyn SerialHost>>,
}

impl Acia6551 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rx_fifo: Fifo::new(),
            tx_fifo: Fifo::new(),
            command: 0,
            control: 0,
            rdrf: false,
            tdre: true,
            parity_error: false,
            framing_error: false,
            overrun_error: false,
            dtr_asserted: false,
            dcd_asserted: false,
            dsr_asserted: false,
            tx_shift: 0,
            tx_bits_remaining: 0,
            tx_clock_divider: 1,
            tx_clock_counter: 0,
            host: None,
        }
    }

    /// Install the host side of the serial line.
    pub fn set_host(&mut self, host: Box<dyn SerialHost>) {
        self.host = Some(host);
    }

    /// Reset to power-on state. Also the effect of a programmed reset
    /// (a write to register 1): command and control cleared, FIFOs
    /// emptied, TDRE set. The installed host survives.
    pub fn reset(&mut self) {
        self.rx_fifo.clear();
        self.tx_fifo.clear();
        self.command = 0;
        self.control = 0;
        self.rdrf = false;
        self.tdre = true;
        self.parity_error = false;
        self.framing_error = false;
        self.overrun_error = false;
        self.dtr_asserted = false;
        self.tx_shift = 0;
        self.tx_bits_remaining = 0;
        self.tx_clock_divider = 1;
        self.tx_clock_counter = 0;
    }

    /// Read an ACIA register.
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x03 {
            0x00 => {
                let value = self.rx_fifo.pop().unwrap_or(0);
                self.rdrf = !self.rx_fifo.is_empty();
                self.parity_error = false;
                self.framing_error = false;
                self.overrun_error = false;
                value
            }
            0x01 => self.status(),
            0x02 => self.command,
            _ => self.control,
        }
    }

    /// Write an ACIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x03 {
            0x00 => {
                self.tx_fifo.push(value);
                self.tdre = false;
                if self.tx_bits_remaining == 0 {
                    self.start_transmit();
                }
            }
            0x01 => self.reset(),
            0x02 => {
                self.command = value;
                let dtr = value & CMD_DTR_ENABLE != 0;
                if dtr != self.dtr_asserted {
                    self.dtr_asserted = dtr;
                    if let Some(host) = self.host.as_mut() {
                        host.dtr_changed(dtr);
                    }
                }
            }
            _ => {
                self.control = value;
                // Receive clock source (bit 4) selects the baud
                // generator; the receive path is byte-level here, so
                // only the transmit divider matters.
                self.tx_clock_divider = CLOCK_DIVIDERS[usize::from(value & CTRL_BAUD_MASK)];
            }
        }
    }

    /// Compose the status register from the logical line states.
    #[must_use]
    pub fn status(&self) -> u8 {
        let mut status = 0;
        if self.parity_error {
            status |= STATUS_PARITY_ERR;
        }
        if self.framing_error {
            status |= STATUS_FRAMING_ERR;
        }
        if self.overrun_error {
            status |= STATUS_OVERRUN;
        }
        if self.rdrf {
            status |= STATUS_RDRF;
        }
        if self.tdre {
            status |= STATUS_TDRE;
        }
        if !self.dcd_asserted {
            status |= STATUS_DCD;
        }
        if !self.dsr_asserted {
            status |= STATUS_DSR;
        }
        if self.irq_active() {
            status |= STATUS_IRQ;
        }
        status
    }

    /// Advance the serial clocks. Each cycle decrements any active
    /// transmit bit timer; a completed byte is handed to the host and
    /// the next FIFO byte starts. The receive side polls the host for
    /// arrivals.
    pub fn clock_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            if self.tx_bits_remaining > 0 {
                self.tx_clock_counter += 1;
                if self.tx_clock_counter >= self.tx_clock_divider {
                    self.tx_clock_counter = 0;
                    self.tx_bits_remaining -= 1;
                    if self.tx_bits_remaining == 0 {
                        let byte = self.tx_shift;
                        if let Some(host) = self.host.as_mut() {
                            host.byte_transmitted(byte);
                        }
                        if self.tx_fifo.is_empty() {
                            self.tdre = true;
                        } else {
                            self.start_transmit();
                        }
                    }
                }
            }

            let polled = self.host.as_mut().and_then(|host| host.poll_receive());
            if let Some(byte) = polled {
                self.receive_byte(byte);
            }
        }
    }

    /// Push a byte into the receiver, as if it arrived on the line.
    pub fn receive_byte(&mut self, byte: u8) {
        if self.rx_fifo.push(byte) {
            self.rdrf = true;
        } else {
            self.overrun_error = true;
        }
    }

    /// IRQ line state: any enabled condition matches.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        let irq_mode = self.command & CMD_IRQ_MASK;
        let rx_irq =
            (irq_mode == CMD_IRQ_RX || irq_mode == CMD_IRQ_RX_BREAK) && self.rdrf;
        let tx_irq = irq_mode == CMD_IRQ_TX && self.tdre;
        rx_irq || tx_irq
    }

    /// DTR output level.
    #[must_use]
    pub fn dtr(&self) -> bool {
        self.dtr_asserted
    }

    /// Drive the DCD input (logical level: true = carrier present).
    pub fn set_dcd(&mut self, asserted: bool) {
        self.dcd_asserted = asserted;
    }

    /// Drive the DSR input (logical level: true = data set ready).
    pub fn set_dsr(&mut self, asserted: bool) {
        self.dsr_asserted = asserted;
    }

    /// Programmed baud rate, or 0 for the external-clock setting.
    #[must_use]
    pub fn baud_rate(&self) -> u32 {
        BAUD_RATES[usize::from(self.control & CTRL_BAUD_MASK)]
    }

    /// Configured word length in bits.
    #[must_use]
    pub fn word_length(&self) -> u8 {
        match self.control & CTRL_WORD_MASK {
            0x00 => 8,
            0x20 => 7,
            0x40 => 6,
            _ => 5,
        }
    }

    /// Bytes waiting in the receive FIFO.
    #[must_use]
    pub fn rx_pending(&self) -> usize {
        self.rx_fifo.count
    }

    /// Capture the complete chip state, FIFO contents included.
    #[must_use]
    pub fn state(&self) -> AciaState {
        AciaState {
            command: self.command,
            control: self.control,
            rdrf: self.rdrf,
            tdre: self.tdre,
            parity_error: self.parity_error,
            framing_error: self.framing_error,
            overrun_error: self.overrun_error,
            dtr_asserted: self.dtr_asserted,
            dcd_asserted: self.dcd_asserted,
            dsr_asserted: self.dsr_asserted,
            tx_shift: self.tx_shift,
            tx_bits_remaining: self.tx_bits_remaining,
            tx_clock_divider: self.tx_clock_divider,
            tx_clock_counter: self.tx_clock_counter,
            rx_fifo: self.rx_fifo.snapshot(),
            tx_fifo: self.tx_fifo.snapshot(),
        }
    }

    /// Restore a previously captured state. The installed host is
    /// unaffected.
    pub fn restore_state(&mut self, state: &AciaState) {
        self.command = state.command;
        self.control = state.control;
        self.rdrf = state.rdrf;
        self.tdre = state.tdre;
        self.parity_error = state.parity_error;
        self.framing_error = state.framing_error;
        self.overrun_error = state.overrun_error;
        self.dtr_asserted = state.dtr_asserted;
        self.dcd_asserted = state.dcd_asserted;
        self.dsr_asserted = state.dsr_asserted;
        self.tx_shift = state.tx_shift;
        self.tx_bits_remaining = state.tx_bits_remaining;
        self.tx_clock_divider = state.tx_clock_divider;
        self.tx_clock_counter = state.tx_clock_counter;
        self.rx_fifo.restore_from(&state.rx_fifo);
        self.tx_fifo.restore_from(&state.tx_fifo);
    }

    /// Load the shift register from the FIFO and arm the bit timer for
    /// data + start + stop.
    fn start_transmit(&mut self) {
        if let Some(byte) = self.tx_fifo.pop() {
            self.tx_shift = byte;
            self.tx_bits_remaining = self.word_length() + 2;
            self.tx_clock_counter = 0;
        }
    }
}

impl Default for Acia6551 {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete ACIA chip state, for machine snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AciaState {
    pub command: u8,
    pub control: u8,
    pub rdrf: bool,
    pub tdre: bool,
    pub parity_error: bool,
    pub framing_error: bool,
    pub overrun_error: bool,
    pub dtr_asserted: bool,
    pub dcd_asserted: bool,
    pub dsr_asserted: bool,
    pub tx_shift: u8,
    pub tx_bits_remaining: u8,
    pub tx_clock_divider: u32,
    pub tx_clock_counter: u32,
    pub rx_fifo: Vec<u8>,
    pub tx_fifo: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records transmitted bytes and serves a scripted receive queue.
    struct TestHost {
        transmitted: Rc<RefCell<Vec<u8>>>,
        to_receive: Rc<RefCell<Vec<u8>>>,
    }

    fn acia_with_host() -> (Acia6551, Rc<RefCell<Vec<u8>>>, Rc<RefCell<Vec<u8>>>) {
        let transmitted = Rc::new(RefCell::new(Vec::new()));
        let to_receive = Rc::new(RefCell::new(Vec::new()));
        let mut acia = Acia6551::new();
        acia.set_host(Box::new(TestHost {
            transmitted: Rc::clone(&transmitted),
            to_receive: Rc::clone(&to_receive),
        }));
        (acia, transmitted, to_receive)
    }

    impl SerialHost for TestHost {
        fn byte_transmitted(&mut self, byte: u8) {
            self.transmitted.borrow_mut().push(byte);
        }

        fn poll_receive(&mut self) -> Option<u8> {
            let mut queue = self.to_receive.borrow_mut();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        }
    }

    /// 9600 baud, internal receiver clock, 8 data bits.
    const CTRL_9600_8N1: u8 = 0x1E;

    #[test]
    fn reset_state() {
        let mut acia = Acia6551::new();
        let status = acia.read(0x01);
        assert_ne!(status & STATUS_TDRE, 0, "TDRE set out of reset");
        assert_eq!(status & STATUS_RDRF, 0);
        assert_ne!(status & STATUS_DCD, 0, "no carrier out of reset");
    }

    #[test]
    fn transmit_leaves_after_baud_countdown() {
        let (mut acia, transmitted, _) = acia_with_host();
        acia.write(0x03, CTRL_9600_8N1); // divider 200, 10 bits/byte
        acia.write(0x00, 0x41);

        assert_eq!(acia.status() & STATUS_TDRE, 0, "TDRE drops on write");
        acia.clock_cycles(1999);
        assert!(transmitted.borrow().is_empty(), "still shifting");
        acia.clock_cycles(1);
        assert_eq!(*transmitted.borrow(), vec![0x41]);
        assert_ne!(acia.status() & STATUS_TDRE, 0, "TDRE back once drained");
    }

    #[test]
    fn transmit_queues_bytes_back_to_back() {
        let (mut acia, transmitted, _) = acia_with_host();
        acia.write(0x03, 0x1F); // 19200 baud, divider 100
        acia.write(0x00, b'H');
        acia.write(0x00, b'I');

        acia.clock_cycles(2000); // two 1000-cycle bytes
        assert_eq!(*transmitted.borrow(), b"HI".to_vec());
    }

    #[test]
    fn receive_sets_rdrf_and_read_drains() {
        let mut acia = Acia6551::new();
        acia.receive_byte(0x58);
        assert_ne!(acia.status() & STATUS_RDRF, 0);

        assert_eq!(acia.read(0x00), 0x58);
        assert_eq!(acia.status() & STATUS_RDRF, 0, "RDRF clear after drain");
    }

    #[test]
    fn rdrf_stays_while_fifo_backed_up() {
        let mut acia = Acia6551::new();
        acia.receive_byte(0x01);
        acia.receive_byte(0x02);
        assert_eq!(acia.read(0x00), 0x01);
        assert_ne!(acia.status() & STATUS_RDRF, 0, "second byte still queued");
        assert_eq!(acia.read(0x00), 0x02);
        assert_eq!(acia.status() & STATUS_RDRF, 0);
    }

    #[test]
    fn overrun_on_full_fifo() {
        let mut acia = Acia6551::new();
        for i in 0..=255u16 {
            acia.receive_byte(i as u8);
        }
        acia.receive_byte(0xFF);
        assert_ne!(acia.status() & STATUS_OVERRUN, 0);

        let _ = acia.read(0x00);
        assert_eq!(acia.status() & STATUS_OVERRUN, 0, "cleared by data read");
    }

    #[test]
    fn receive_polls_host() {
        let (mut acia, _, to_receive) = acia_with_host();
        to_receive.borrow_mut().push(0x7A);
        acia.clock_cycles(1);
        assert_ne!(acia.status() & STATUS_RDRF, 0);
        assert_eq!(acia.read(0x00), 0x7A);
    }

    #[test]
    fn rx_irq_mode() {
        let mut acia = Acia6551::new();
        acia.write(0x02, CMD_DTR_ENABLE | 0x02); // IRQ on RDRF
        assert!(!acia.irq_active());
        acia.receive_byte(b'X');
        assert!(acia.irq_active());
        assert_ne!(acia.status() & STATUS_IRQ, 0);

        let _ = acia.read(0x00);
        assert!(!acia.irq_active());
    }

    #[test]
    fn tx_irq_mode() {
        let mut acia = Acia6551::new();
        acia.write(0x02, CMD_DTR_ENABLE | 0x04); // IRQ on TDRE
        assert!(acia.irq_active(), "TDRE set at rest");
        acia.write(0x00, 0x00);
        assert!(!acia.irq_active(), "clears while shifting");
    }

    #[test]
    fn programmed_reset_clears_everything() {
        let mut acia = Acia6551::new();
        acia.write(0x03, CTRL_9600_8N1);
        acia.write(0x02, CMD_DTR_ENABLE);
        acia.receive_byte(0x55);
        acia.write(0x00, 0xAA);

        acia.write(0x01, 0x00); // programmed reset
        assert_eq!(acia.read(0x02), 0);
        assert_eq!(acia.read(0x03), 0);
        assert_eq!(acia.status() & STATUS_RDRF, 0);
        assert_ne!(acia.status() & STATUS_TDRE, 0);
        assert_eq!(acia.rx_pending(), 0);
    }

    #[test]
    fn dtr_follows_command_bit() {
        let mut acia = Acia6551::new();
        assert!(!acia.dtr());
        acia.write(0x02, CMD_DTR_ENABLE);
        assert!(acia.dtr());
    }

    #[test]
    fn dcd_dsr_inverted_at_register_boundary() {
        let mut acia = Acia6551::new();
        acia.set_dcd(true);
        acia.set_dsr(true);
        let status = acia.status();
        assert_eq!(status & STATUS_DCD, 0, "asserted line reads as clear bit");
        assert_eq!(status & STATUS_DSR, 0);
    }

    #[test]
    fn baud_and_word_length_decode() {
        let mut acia = Acia6551::new();
        acia.write(0x03, 0x0E);
        assert_eq!(acia.baud_rate(), 9600);
        assert_eq!(acia.word_length(), 8);

        acia.write(0x03, 0x60 | 0x01);
        assert_eq!(acia.baud_rate(), 50);
        assert_eq!(acia.word_length(), 5);

        acia.write(0x03, 0x00);
        assert_eq!(acia.baud_rate(), 0, "external clock");
    }
}
