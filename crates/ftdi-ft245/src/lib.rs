//! FTDI FT245-style USB parallel FIFO.
//!
//! An 8-bit data bus with strobe-driven transfers: the CPU side pulls
//! RD# low to clock bytes out of the receive FIFO (after a short
//! latency window during which the bus still shows the stale value)
//! and raises WR to sample the bus into the transmit FIFO. The USB
//! side is a pair of push/pull helpers standing in for the host PC.
//!
//! All control lines that are active-low on the chip (RXF#, TXE#,
//! PWREN#, RD#) are modeled as logical "asserted" booleans here; the
//! inversion happens at whatever register boundary exposes them.

const FIFO_SIZE: usize = 512;

/// Host (PC) side of the USB link.
pub trait UsbHost {
    /// The CPU pushed a byte through the transmit FIFO.
    fn byte_written(&mut self, byte: u8);

    /// Offer a byte for the receive FIFO, if the host has one pending.
    fn poll_usb(&mut self) -> Option<u8> {
        None
    }
}

/// A fixed 512-entry byte ring.
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

    fn peek(&self) -> Option<u8> {
        if self.count == 0 {
            None
        } else {
            Some(self.buf[self.tail])
        }
    }

    fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
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

/// FT245 USB FIFO.
pub struct Ft245 {
    /// Current value on the 8-bit data bus.
    data_bus: u8,

    /// RD# strobe is asserted (line low).
    rd_asserted: bool,
    /// WR strobe level (active high).
    wr: bool,

    /// USB -> CPU buffer.
    rx_fifo: Fifo,
    /// CPU -> USB buffer.
    tx_fifo: Fifo,

    usb_connected: bool,
    usb_configured: bool,

    /// Cycles between RD# assertion and valid data on the bus.
    read_latency: u8,
    read_timer: u8,

    host: Option<Box<dyn UsbHost>>,
}

impl Ft245 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_bus: 0xFF,
            rd_asserted: false,
            wr: false,
            rx_fifo: Fifo::new(),
            tx_fifo: Fifo::new(),
            usb_connected: false,
            usb_configured: false,
            // ~50ns on an FT245R, a couple of cycles at hobbyist clocks
            read_latency: 2,
            read_timer: 0,
            host: None,
        }
    }

    /// Install the host side of the USB link.
    pub fn set_host(&mut self, host: Box<dyn UsbHost>) {
        self.host = Some(host);
    }

    /// Reset to power-on state: bus idle, FIFOs empty, USB down.
    pub fn reset(&mut self) {
        self.data_bus = 0xFF;
        self.rd_asserted = false;
        self.wr = false;
        self.rx_fifo.clear();
        self.tx_fifo.clear();
        self.usb_connected = false;
        self.usb_configured = false;
        self.read_timer = 0;
    }

    // --- CPU side ---

    /// Read the data bus. While RD# is asserted and the latency window
    /// has elapsed, this pops the head of the receive FIFO; during the
    /// window the stale bus value is returned.
    pub fn read(&mut self) -> u8 {
        if self.rd_asserted && self.rx_fifo.count > 0 && self.read_timer >= self.read_latency {
            if let Some(byte) = self.rx_fifo.pop() {
                self.data_bus = byte;
                self.read_timer = 0;
            }
        }
        self.data_bus
    }

    /// Drive the data bus. The byte is only sampled on a WR rising
    /// edge.
    pub fn write(&mut self, data: u8) {
        self.data_bus = data;
    }

    /// Drive the RD# strobe; `asserted` pulls the line low. The
    /// falling edge starts the read latency timer.
    pub fn set_rd(&mut self, asserted: bool) {
        if asserted && !self.rd_asserted {
            self.read_timer = 0;
        }
        self.rd_asserted = asserted;
    }

    /// Drive the WR strobe (active high). The rising edge samples the
    /// data bus into the transmit FIFO if it has space.
    pub fn set_wr(&mut self, level: bool) {
        let rising = level && !self.wr;
        self.wr = level;

        if rising && self.tx_fifo.push(self.data_bus) {
            let byte = self.data_bus;
            if let Some(host) = self.host.as_mut() {
                host.byte_written(byte);
            }
        }
    }

    /// RXF# is asserted (low) iff the receive FIFO holds data.
    #[must_use]
    pub fn rx_available(&self) -> bool {
        self.rx_fifo.count > 0
    }

    /// TXE# is asserted (low) iff the transmit FIFO has space.
    #[must_use]
    pub fn tx_space(&self) -> bool {
        self.tx_fifo.count < FIFO_SIZE
    }

    /// PWREN# is asserted (low) iff USB is connected and configured.
    #[must_use]
    pub fn power_enabled(&self) -> bool {
        self.usb_connected && self.usb_configured
    }

    /// Current data bus value, without read side effects.
    #[must_use]
    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    /// Whether the RD# strobe is currently asserted.
    #[must_use]
    pub fn rd_asserted(&self) -> bool {
        self.rd_asserted
    }

    /// Advance one cycle: run the read latency timer and poll the USB
    /// host for arriving bytes.
    pub fn tick(&mut self) {
        if self.rd_asserted && self.read_timer < self.read_latency {
            self.read_timer += 1;
            if self.read_timer >= self.read_latency {
                // Latency over: the head byte appears on the bus.
                if let Some(byte) = self.rx_fifo.peek() {
                    self.data_bus = byte;
                }
            }
        }

        let polled = self.host.as_mut().and_then(|host| host.poll_usb());
        if let Some(byte) = polled {
            self.usb_receive_byte(byte);
        }
    }

    /// Advance `cycles` cycles.
    pub fn clock_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    // --- USB (PC) side ---

    /// Queue a byte for the CPU. Returns false when the FIFO is full.
    pub fn usb_receive_byte(&mut self, byte: u8) -> bool {
        self.rx_fifo.push(byte)
    }

    /// Take one byte the CPU wrote, if any.
    pub fn usb_transmit_byte(&mut self) -> Option<u8> {
        self.tx_fifo.pop()
    }

    /// Queue a buffer for the CPU; returns how many bytes fit.
    pub fn usb_receive_buffer(&mut self, data: &[u8]) -> usize {
        let mut sent = 0;
        for &byte in data {
            if !self.usb_receive_byte(byte) {
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Drain up to `max` CPU-written bytes.
    pub fn usb_transmit_buffer(&mut self, max: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.usb_transmit_byte() {
                Some(byte) => out.push(byte),
                None => break,
            }
        }
        out
    }

    /// Connect or disconnect the USB cable. Disconnecting flushes both
    /// FIFOs and drops the configuration.
    pub fn set_usb_connected(&mut self, connected: bool) {
        self.usb_connected = connected;
        if !connected {
            self.usb_configured = false;
            self.rx_fifo.clear();
            self.tx_fifo.clear();
        }
    }

    /// Mark USB enumeration complete. Ignored while disconnected.
    pub fn set_usb_configured(&mut self, configured: bool) {
        if self.usb_connected {
            self.usb_configured = configured;
        }
    }

    /// Bytes waiting for the CPU.
    #[must_use]
    pub fn rx_count(&self) -> usize {
        self.rx_fifo.count
    }

    /// Bytes waiting for the USB host.
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.tx_fifo.count
    }

    /// Capture the complete chip state, FIFO contents included.
    #[must_use]
    pub fn state(&self) -> Ft245State {
        Ft245State {
            data_bus: self.data_bus,
            rd_asserted: self.rd_asserted,
            wr: self.wr,
            usb_connected: self.usb_connected,
            usb_configured: self.usb_configured,
            read_latency: self.read_latency,
            read_timer: self.read_timer,
            rx_fifo: self.rx_fifo.snapshot(),
            tx_fifo: self.tx_fifo.snapshot(),
        }
    }

    /// Restore a previously captured state. The installed host is
    /// unaffected.
    pub fn restore_state(&mut self, state: &Ft245State) {
        self.data_bus = state.data_bus;
        self.rd_asserted = state.rd_asserted;
        self.wr = state.wr;
        self.usb_connected = state.usb_connected;
        self.usb_configured = state.usb_configured;
        self.read_latency = state.read_latency;
        self.read_timer = state.read_timer;
        self.rx_fifo.restore_from(&state.rx_fifo);
        self.tx_fifo.restore_from(&state.tx_fifo);
    }
}

/// Complete FT245 chip state, for machine snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ft245State {
    pub data_bus: u8,
    pub rd_asserted: bool,
    pub wr: bool,
    pub usb_connected: bool,
    pub usb_configured: bool,
    pub read_latency: u8,
    pub read_timer: u8,
    pub rx_fifo: Vec<u8>,
    pub tx_fifo: Vec<u8>,
}

impl Default for Ft245 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rxf_tracks_rx_fifo() {
        let mut ft = Ft245::new();
        assert!(!ft.rx_available());
        ft.usb_receive_byte(0x42);
        assert!(ft.rx_available());
    }

    #[test]
    fn read_returns_stale_bus_during_latency() {
        let mut ft = Ft245::new();
        ft.usb_receive_byte(0xAA);
        ft.set_rd(true);

        assert_eq!(ft.read(), 0xFF, "stale idle bus inside the window");
        ft.clock_cycles(2);
        assert_eq!(ft.read(), 0xAA, "fresh data after the latency");
        assert!(!ft.rx_available(), "the read popped the byte");
    }

    #[test]
    fn read_sequence_pops_in_order() {
        let mut ft = Ft245::new();
        ft.usb_receive_buffer(&[1, 2, 3]);

        for expected in 1..=3u8 {
            ft.set_rd(true);
            ft.clock_cycles(2);
            assert_eq!(ft.read(), expected);
            ft.set_rd(false);
        }
    }

    #[test]
    fn write_samples_on_wr_rising_edge() {
        let mut ft = Ft245::new();
        ft.write(0x5A);
        assert_eq!(ft.tx_count(), 0, "nothing without a strobe");

        ft.set_wr(true);
        assert_eq!(ft.tx_count(), 1);
        ft.set_wr(true); // level held: no second sample
        assert_eq!(ft.tx_count(), 1);

        ft.set_wr(false);
        ft.write(0xA5);
        ft.set_wr(true);
        assert_eq!(ft.usb_transmit_buffer(8), vec![0x5A, 0xA5]);
    }

    #[test]
    fn txe_deasserts_when_full() {
        let mut ft = Ft245::new();
        assert!(ft.tx_space());
        for i in 0..512usize {
            ft.write(i as u8);
            ft.set_wr(true);
            ft.set_wr(false);
        }
        assert!(!ft.tx_space());

        // A further write strobe is dropped
        ft.write(0xEE);
        ft.set_wr(true);
        assert_eq!(ft.tx_count(), 512);
    }

    #[test]
    fn pwren_requires_connected_and_configured() {
        let mut ft = Ft245::new();
        assert!(!ft.power_enabled());
        ft.set_usb_connected(true);
        assert!(!ft.power_enabled());
        ft.set_usb_configured(true);
        assert!(ft.power_enabled());
    }

    #[test]
    fn configure_ignored_while_disconnected() {
        let mut ft = Ft245::new();
        ft.set_usb_configured(true);
        assert!(!ft.power_enabled());
    }

    #[test]
    fn disconnect_flushes_fifos() {
        let mut ft = Ft245::new();
        ft.set_usb_connected(true);
        ft.set_usb_configured(true);
        ft.usb_receive_buffer(&[1, 2, 3]);
        ft.write(0x10);
        ft.set_wr(true);

        ft.set_usb_connected(false);
        assert_eq!(ft.rx_count(), 0);
        assert_eq!(ft.tx_count(), 0);
        assert!(!ft.power_enabled());
    }

    #[test]
    fn usb_host_poll_feeds_rx() {
        struct OneByte(Option<u8>);
        impl UsbHost for OneByte {
            fn byte_written(&mut self, _byte: u8) {}
            fn poll_usb(&mut self) -> Option<u8> {
                self.0.take()
            }
        }

        let mut ft = Ft245::new();
        ft.set_host(Box::new(OneByte(Some(0x99))));
        ft.tick();
        assert_eq!(ft.rx_count(), 1);
        ft.tick();
        assert_eq!(ft.rx_count(), 1, "host had only one byte");
    }

    #[test]
    fn rx_fifo_bounded_at_512() {
        let mut ft = Ft245::new();
        let data = vec![0u8; 600];
        assert_eq!(ft.usb_receive_buffer(&data), 512);
    }
}
