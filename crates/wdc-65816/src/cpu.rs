//! 65816 CPU core: fetch-decode-execute, interrupts, WAI/STP.

use emu_core::{Bus, Ticks};

use crate::decode::format_operand;
use crate::opcodes::{OperandKind, MIN_CYCLES, OPCODES};
use crate::registers::Registers;
use crate::status::{self, B};

/// Interrupt sources and their bank-0 vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Irq,
    Nmi,
    Brk,
    Cop,
    Abort,
}

impl Interrupt {
    /// Vector address for this source in the current mode.
    #[must_use]
    pub const fn vector(self, emulation: bool) -> u16 {
        if emulation {
            match self {
                Self::Irq | Self::Brk => 0xFFFE,
                Self::Nmi => 0xFFFA,
                Self::Cop => 0xFFF4,
                Self::Abort => 0xFFF8,
            }
        } else {
            match self {
                Self::Irq => 0xFFEE,
                Self::Nmi => 0xFFEA,
                Self::Brk => 0xFFE6,
                Self::Cop => 0xFFE4,
                Self::Abort => 0xFFE8,
            }
        }
    }
}

/// The reset vector, fetched in emulation mode.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// What one `step()` call did.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// 24-bit address the opcode was fetched from.
    pub address: u32,
    /// The opcode byte.
    pub opcode: u8,
    /// Mnemonic from the dispatch table.
    pub mnemonic: &'static str,
    /// Raw operand value (up to 24 bits, little-endian byte order).
    pub operand: u32,
    /// Operand rendered in assembler syntax, for tracing.
    pub operand_str: String,
    /// Total instruction length in bytes, opcode included.
    pub instruction_size: u8,
    /// Cycles consumed, including any wait and interrupt entry.
    pub cycles: u32,
    /// The processor has executed STP.
    pub halted: bool,
    /// The processor is still inside a WAI stall.
    pub waiting: bool,
}

/// The W65C816S CPU.
///
/// Memory, peripherals and their clocks are all reached through the
/// `Bus` the caller passes to `step()`; the CPU itself owns nothing but
/// its register file and stall state.
#[derive(Debug)]
pub struct Wdc65816 {
    /// CPU registers.
    pub regs: Registers,

    /// Set by WAI until an interrupt is serviced.
    waiting: bool,

    /// Set by STP; never cleared except by reset.
    halted: bool,

    /// Pending non-maskable interrupt edge.
    nmi_pending: bool,

    /// Total cycles executed (for debugging).
    total_cycles: u64,
}

impl Default for Wdc65816 {
    fn default() -> Self {
        Self::new()
    }
}

impl Wdc65816 {
    /// Create a new CPU in reset-register state. The PC is not valid
    /// until `reset()` fetches the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            waiting: false,
            halted: false,
            nmi_pending: false,
            total_cycles: 0,
        }
    }

    /// Reset: emulation mode, stack at $01FF, I set, D clear, PC from
    /// the reset vector at $00FFFC.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.waiting = false;
        self.halted = false;
        self.nmi_pending = false;
        self.regs.pc = self.read_word_at(bus, 0, RESET_VECTOR);
    }

    /// True once STP has executed.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// True while a WAI stall is pending.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Total cycles executed since reset.
    #[must_use]
    pub const fn total_cycles(&self) -> Ticks {
        Ticks::new(self.total_cycles)
    }

    /// Latch a non-maskable interrupt edge. It is serviced at the next
    /// `step()` boundary regardless of the I flag.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    pub(crate) fn set_waiting(&mut self, waiting: bool) {
        self.waiting = waiting;
    }

    /// Overwrite the WAI/STP stall flags. Meant for snapshot restore;
    /// normal operation only changes these through the instructions.
    pub fn set_stall_flags(&mut self, waiting: bool, halted: bool) {
        self.waiting = waiting;
        self.halted = halted;
    }

    pub(crate) fn set_halted(&mut self) {
        self.halted = true;
    }

    /// Execute one instruction (or resume a pending WAI stall) and
    /// advance the devices behind the bus by the consumed cycle count.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> StepResult {
        if self.halted {
            return self.stall_result("STP", 0xDB, 0);
        }

        if self.waiting {
            // Resumed WAI. With I set the stall degenerates to a
            // two-cycle no-op; otherwise keep polling the devices.
            if self.regs.interrupts_disabled() {
                self.waiting = false;
                bus.tick(2);
                self.total_cycles += 2;
                return self.stall_result("WAI", 0xCB, 2);
            }
            let cycles = self.wait_for_interrupt(bus);
            self.total_cycles += u64::from(cycles);
            return self.stall_result("WAI", 0xCB, cycles);
        }

        let address = addr24(self.regs.pbr, self.regs.pc);
        let opcode = self.fetch_byte(bus);
        let meta = &OPCODES[opcode as usize];

        let size = meta.operand_size(&self.regs);
        let mut operand: u32 = 0;
        if meta.operand != OperandKind::None {
            for i in 0..size {
                operand |= u32::from(self.fetch_byte(bus)) << (8 * i);
            }
        }
        let arg_one = (operand & 0xFFFF) as u16;
        let arg_two = (operand >> 16) as u16;

        let mut cycles = u32::from(MIN_CYCLES[opcode as usize]);
        cycles += self.execute(bus, opcode, arg_one, arg_two);

        bus.tick(cycles);

        if self.nmi_pending && !self.halted {
            self.nmi_pending = false;
            self.waiting = false;
            let entry = self.interrupt_entry(bus, Interrupt::Nmi);
            bus.tick(entry);
            cycles += entry;
        } else if !self.waiting
            && !self.halted
            && bus.irq_asserted()
            && !self.regs.interrupts_disabled()
        {
            let entry = self.interrupt_entry(bus, Interrupt::Irq);
            bus.tick(entry);
            cycles += entry;
        }

        if self.waiting {
            cycles += self.wait_for_interrupt(bus);
        }

        self.total_cycles += u64::from(cycles);

        StepResult {
            address,
            opcode,
            mnemonic: meta.mnemonic,
            operand,
            operand_str: format_operand(meta, operand, size),
            instruction_size: 1 + size,
            cycles,
            halted: self.halted,
            waiting: self.waiting,
        }
    }

    /// Advance devices one cycle at a time until some device raises its
    /// IRQ line, then take the interrupt. Only called with I clear; the
    /// stall otherwise never starts.
    fn wait_for_interrupt<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let mut cycles = 0u32;
        loop {
            bus.tick(1);
            cycles += 1;
            if self.nmi_pending {
                self.nmi_pending = false;
                self.waiting = false;
                let entry = self.interrupt_entry(bus, Interrupt::Nmi);
                bus.tick(entry);
                cycles += entry;
                break;
            }
            if bus.irq_asserted() && !self.regs.interrupts_disabled() {
                self.waiting = false;
                let entry = self.interrupt_entry(bus, Interrupt::Irq);
                bus.tick(entry);
                cycles += entry;
                break;
            }
        }
        cycles
    }

    /// Interrupt entry sequence. Returns the cycles consumed (7 in
    /// emulation mode, 8 in native mode for the extra PBR push).
    ///
    /// The caller has already advanced PC past the instruction (for BRK
    /// and COP, past the signature byte), so PC is pushed as-is.
    pub(crate) fn interrupt_entry<B: Bus>(&mut self, bus: &mut B, kind: Interrupt) -> u32 {
        let native = !self.regs.emulation;
        if native {
            let pbr = self.regs.pbr;
            self.push_byte(bus, pbr);
        }
        let pc = self.regs.pc;
        self.push_word(bus, pc);

        let mut p = self.regs.p.0;
        if self.regs.emulation {
            // Bit 4 doubles as the 6502 Break flag on interrupt pushes.
            if kind == Interrupt::Brk {
                p |= B;
            } else {
                p &= !B;
            }
        }
        self.push_byte(bus, p);

        self.regs.pbr = 0;
        self.regs.p.clear(status::D);
        self.regs.p.set(status::I);
        self.regs.pc = self.read_word_at(bus, 0, kind.vector(self.regs.emulation));

        if native { 8 } else { 7 }
    }

    fn stall_result(&self, mnemonic: &'static str, opcode: u8, cycles: u32) -> StepResult {
        StepResult {
            address: addr24(self.regs.pbr, self.regs.pc),
            opcode,
            mnemonic,
            operand: 0,
            operand_str: String::new(),
            instruction_size: 0,
            cycles,
            halted: self.halted,
            waiting: self.waiting,
        }
    }

    // --- Bus access helpers ---

    /// Fetch one byte at PBR:PC and advance PC (bank byte untouched).
    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(addr24(self.regs.pbr, self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn read_byte_at<B: Bus>(&mut self, bus: &mut B, bank: u8, addr: u16) -> u8 {
        bus.read(addr24(bank, addr))
    }

    pub(crate) fn write_byte_at<B: Bus>(&mut self, bus: &mut B, bank: u8, addr: u16, value: u8) {
        bus.write(addr24(bank, addr), value);
    }

    /// Word read wrapping at the bank boundary; the 65816 does not
    /// cross banks on data-word accesses.
    pub(crate) fn read_word_at<B: Bus>(&mut self, bus: &mut B, bank: u8, addr: u16) -> u16 {
        let lo = self.read_byte_at(bus, bank, addr);
        let hi = self.read_byte_at(bus, bank, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn write_word_at<B: Bus>(&mut self, bus: &mut B, bank: u8, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte_at(bus, bank, addr, lo);
        self.write_byte_at(bus, bank, addr.wrapping_add(1), hi);
    }

    // --- Stack discipline ---

    /// Push decrements. Stack lives in bank 0; emulation mode wraps
    /// within page 1, native mode wraps over the full 16 bits.
    pub(crate) fn push_byte<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let s = self.regs.s;
        bus.write(u32::from(s), value);
        self.regs.s = if self.regs.emulation {
            0x0100 | u16::from((s as u8).wrapping_sub(1))
        } else {
            s.wrapping_sub(1)
        };
    }

    /// Pop pre-increments.
    pub(crate) fn pop_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.regs.s = if self.regs.emulation {
            0x0100 | u16::from((self.regs.s as u8).wrapping_add(1))
        } else {
            self.regs.s.wrapping_add(1)
        };
        bus.read(u32::from(self.regs.s))
    }

    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push_byte(bus, hi);
        self.push_byte(bus, lo);
    }

    pub(crate) fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop_byte(bus);
        let hi = self.pop_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    // --- Flag helpers ---

    /// Set N and Z from an 8-bit result. Never leaks bits above the
    /// logical width into N.
    pub(crate) fn set_nz8(&mut self, value: u8) {
        self.regs.p.assign(status::Z, value == 0);
        self.regs.p.assign(status::N, value & 0x80 != 0);
    }

    /// Set N and Z from a 16-bit result.
    pub(crate) fn set_nz16(&mut self, value: u16) {
        self.regs.p.assign(status::Z, value == 0);
        self.regs.p.assign(status::N, value & 0x8000 != 0);
    }
}

/// Concatenate a bank byte and a 16-bit offset into a 24-bit address.
#[must_use]
pub(crate) const fn addr24(bank: u8, addr: u16) -> u32 {
    (bank as u32) << 16 | addr as u32
}
