//! The assembled single-board computer: CPU, banked memory, and the
//! peripheral set, stepped one instruction at a time.

use emu_core::Bus;
use ftdi_ft245::UsbHost;
use mos_acia_6551::{Acia6551, SerialHost};
use mos_pia_6521::Pia6521;
use mos_via_6522::Via6522;
use wdc_65816::{StepResult, Wdc65816};

use crate::board_fifo::BoardFifo;
use crate::memory::{Memory, MemoryLayout};
use crate::snapshot::Snapshot;

/// Outcome of applying a loader image to the machine.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    /// Data bytes written into memory.
    pub bytes_loaded: usize,
    /// Entry point the image named, if any (already applied to PC).
    pub entry_point: Option<u32>,
    /// Non-fatal loader diagnostics (checksum mismatches, unknown
    /// record types), rendered for the host.
    pub warnings: Vec<String>,
}

/// A W65C816S single-board computer.
///
/// `step()` is the only way machine state advances: it retires one
/// instruction, clocks every peripheral by the consumed cycle count,
/// and services any resulting interrupt. The host drives everything
/// else through explicit setters (control lines, USB/serial traffic,
/// loaders).
pub struct Machine {
    cpu: Wdc65816,
    memory: Memory,
}

impl Machine {
    /// A machine with the default board layout (RAM low, device
    /// windows at $7F80-$7FFF, ROM high). Load a ROM, then `reset()`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(MemoryLayout::default_board())
    }

    /// A machine with a custom address-space layout.
    #[must_use]
    pub fn with_layout(layout: MemoryLayout) -> Self {
        Self {
            cpu: Wdc65816::new(),
            memory: Memory::new(layout),
        }
    }

    /// Reset the processor: emulation mode, stack at $01FF, I set, D
    /// clear, PC fetched from the reset vector at $00FFFC.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.memory);
    }

    /// Execute one instruction (or resume a WAI stall) and clock the
    /// devices by exactly the consumed cycles.
    pub fn step(&mut self) -> StepResult {
        self.cpu.step(&mut self.memory)
    }

    /// Step until the processor halts or `max_steps` runs out.
    /// Returns the number of steps executed.
    pub fn run_until_halt(&mut self, max_steps: u64) -> u64 {
        for executed in 0..max_steps {
            if self.cpu.is_halted() {
                return executed;
            }
            self.step();
        }
        max_steps
    }

    /// Debugger read through the normal bus path (device windows see
    /// the access).
    pub fn read_byte(&mut self, addr: u32) -> u8 {
        self.memory.read_byte(addr)
    }

    /// Little-endian word read through the normal bus path.
    pub fn read_word(&mut self, addr: u32) -> u16 {
        self.memory.read_word(addr)
    }

    /// Debugger/loader write: lands in ROM regions too.
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        self.memory.write_byte_privileged(addr, value);
    }

    /// Pre-fill memory (typically a ROM region) starting at `addr`.
    pub fn load_rom(&mut self, data: &[u8], addr: u32) {
        self.memory.load_chunk(addr, data);
    }

    /// Load an Intel HEX image through the privileged write path.
    pub fn load_ihex(&mut self, text: &str) -> Result<LoadSummary, format_ihex::IhexError> {
        let file = format_ihex::IhexFile::parse(text)?;
        let mut summary = LoadSummary {
            bytes_loaded: file.byte_count(),
            entry_point: file.start_address,
            warnings: file.warnings.iter().map(ToString::to_string).collect(),
        };
        for chunk in &file.chunks {
            self.memory.load_chunk(chunk.address & 0x00FF_FFFF, &chunk.data);
        }
        if let Some(entry) = summary.entry_point {
            summary.entry_point = Some(entry & 0x00FF_FFFF);
        }
        Ok(summary)
    }

    /// Load a Motorola S-record image. An S7/S8/S9 entry point, when
    /// present, becomes the initial PC (and program bank).
    pub fn load_srec(&mut self, text: &str) -> Result<LoadSummary, format_srec::SrecError> {
        let file = format_srec::SrecFile::parse(text)?;
        let summary = LoadSummary {
            bytes_loaded: file.byte_count(),
            entry_point: file.entry_point.map(|e| e & 0x00FF_FFFF),
            warnings: file.warnings.iter().map(ToString::to_string).collect(),
        };
        for chunk in &file.chunks {
            self.memory.load_chunk(chunk.address & 0x00FF_FFFF, &chunk.data);
        }
        if let Some(entry) = summary.entry_point {
            self.cpu.regs.pc = entry as u16;
            self.cpu.regs.pbr = (entry >> 16) as u8;
        }
        Ok(summary)
    }

    /// Whether any peripheral is asserting its IRQ line.
    #[must_use]
    pub fn irq_asserted(&self) -> bool {
        self.memory.irq_asserted()
    }

    // --- Component access for host wiring and inspection ---

    #[must_use]
    pub fn cpu(&self) -> &Wdc65816 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Wdc65816 {
        &mut self.cpu
    }

    #[must_use]
    pub fn acia(&self) -> &Acia6551 {
        &self.memory.acia
    }

    pub fn acia_mut(&mut self) -> &mut Acia6551 {
        &mut self.memory.acia
    }

    #[must_use]
    pub fn pia(&self) -> &Pia6521 {
        &self.memory.pia
    }

    pub fn pia_mut(&mut self) -> &mut Pia6521 {
        &mut self.memory.pia
    }

    #[must_use]
    pub fn via(&self) -> &Via6522 {
        &self.memory.via
    }

    pub fn via_mut(&mut self) -> &mut Via6522 {
        &mut self.memory.via
    }

    #[must_use]
    pub fn board_fifo(&self) -> &BoardFifo {
        &self.memory.board_fifo
    }

    pub fn board_fifo_mut(&mut self) -> &mut BoardFifo {
        &mut self.memory.board_fifo
    }

    /// Install the host side of the ACIA's serial line.
    pub fn set_serial_host(&mut self, host: Box<dyn SerialHost>) {
        self.memory.acia.set_host(host);
    }

    /// Install the host side of the board FIFO's USB link.
    pub fn set_usb_host(&mut self, host: Box<dyn UsbHost>) {
        self.memory.set_usb_host(host);
    }

    // --- Snapshots ---

    /// Capture the complete machine state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Restore a snapshot. Fails if the snapshot's memory shape does
    /// not match this machine's layout.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), &'static str> {
        snapshot.apply(self)
    }

    pub(crate) fn memory(&self) -> &Memory {
        &self.memory
    }

    pub(crate) fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
