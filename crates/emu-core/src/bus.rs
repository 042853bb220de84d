//! Memory and I/O bus interface.

/// Memory and I/O bus interface over a 24-bit address space.
///
/// Components access memory and peripherals through this trait. The bus
/// handles bank and region decoding and routes device-window accesses to
/// the owning peripheral. Addresses are 24-bit (`bank << 16 | offset`);
/// the top byte of the `u32` is ignored.
pub trait Bus {
    /// Read a byte from the given 24-bit address.
    fn read(&mut self, address: u32) -> u8;

    /// Write a byte to the given 24-bit address.
    fn write(&mut self, address: u32, value: u8);

    /// Advance every clocked device behind the bus by `cycles` cycles.
    fn tick(&mut self, cycles: u32);

    /// Whether any device behind the bus is asserting its IRQ line.
    fn irq_asserted(&self) -> bool {
        false
    }
}

/// A flat RAM bus for tests and tools.
///
/// Holds a configurable number of fully populated 64 KiB banks starting
/// at bank 0; addresses in absent banks behave as open bus (reads 0xFF,
/// writes dropped). Counts the cycles ticked into it and exposes a
/// host-settable IRQ line.
pub struct SimpleBus {
    banks: Vec<Vec<u8>>,
    /// Total cycles ticked into the bus.
    pub ticks: u64,
    /// Host-controlled IRQ line state.
    pub irq_line: bool,
}

impl SimpleBus {
    /// A bus with bank 0 only.
    #[must_use]
    pub fn new() -> Self {
        Self::with_banks(1)
    }

    /// A bus with banks `0..count` populated.
    #[must_use]
    pub fn with_banks(count: usize) -> Self {
        Self {
            banks: (0..count).map(|_| vec![0u8; 0x1_0000]).collect(),
            ticks: 0,
            irq_line: false,
        }
    }

    /// Copy `data` into memory starting at `addr`.
    pub fn load(&mut self, addr: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write(addr + i as u32, byte);
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, addr: u32) -> u8 {
        let bank = ((addr >> 16) & 0xFF) as usize;
        self.banks
            .get(bank)
            .map_or(0xFF, |b| b[(addr & 0xFFFF) as usize])
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u32) -> u8 {
        self.peek(address)
    }

    fn write(&mut self, address: u32, value: u8) {
        let bank = ((address >> 16) & 0xFF) as usize;
        if let Some(b) = self.banks.get_mut(bank) {
            b[(address & 0xFFFF) as usize] = value;
        }
    }

    fn tick(&mut self, cycles: u32) {
        self.ticks += u64::from(cycles);
    }

    fn irq_asserted(&self) -> bool {
        self.irq_line
    }
}
