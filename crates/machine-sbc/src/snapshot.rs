//! Save state (snapshot) support.
//!
//! A snapshot is the processor register file plus every RAM/ROM
//! region's contents and every peripheral's register and FIFO state.
//! Capture and restore work against a machine with the same memory
//! layout; the byte format is versioned and length-checked.

use ftdi_ft245::Ft245State;
use mos_acia_6551::AciaState;
use mos_pia_6521::PiaState;
use mos_via_6522::ViaState;
use wdc_65816::{Registers, Status};

use crate::board_fifo::BoardFifoState;
use crate::machine::Machine;

/// Magic bytes for snapshot identification.
const SNAPSHOT_MAGIC: &[u8; 4] = b"SBCS";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// CPU state, including the WAI/STP stall flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuState {
    pub regs: Registers,
    pub waiting: bool,
    pub halted: bool,
}

/// Complete machine state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cpu: CpuState,
    /// RAM and ROM region contents, in bank/region order.
    pub memory: Vec<Vec<u8>>,
    pub acia: AciaState,
    pub pia: PiaState,
    pub via: ViaState,
    pub board_fifo: BoardFifoState,
}

impl Snapshot {
    /// Capture the current machine state.
    #[must_use]
    pub fn capture(machine: &Machine) -> Self {
        Self {
            cpu: CpuState {
                regs: machine.cpu().regs,
                waiting: machine.cpu().is_waiting(),
                halted: machine.cpu().is_halted(),
            },
            memory: machine.memory().region_images(),
            acia: machine.acia().state(),
            pia: machine.pia().state(),
            via: machine.via().state(),
            board_fifo: machine.board_fifo().state(),
        }
    }

    /// Write this snapshot back into a machine with the same layout.
    pub fn apply(&self, machine: &mut Machine) -> Result<(), &'static str> {
        machine.memory_mut().restore_region_images(&self.memory)?;
        machine.cpu_mut().regs = self.cpu.regs;
        machine
            .cpu_mut()
            .set_stall_flags(self.cpu.waiting, self.cpu.halted);
        machine.acia_mut().restore_state(&self.acia);
        machine.pia_mut().restore_state(&self.pia);
        machine.via_mut().restore_state(&self.via);
        machine.board_fifo_mut().restore_state(&self.board_fifo);
        Ok(())
    }

    /// Serialize to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(SNAPSHOT_MAGIC);
        w.u8(SNAPSHOT_VERSION);

        // CPU
        let regs = &self.cpu.regs;
        w.u16(regs.a);
        w.u16(regs.x);
        w.u16(regs.y);
        w.u16(regs.s);
        w.u16(regs.pc);
        w.u16(regs.d);
        w.u8(regs.dbr);
        w.u8(regs.pbr);
        w.u8(regs.p.0);
        w.flag(regs.emulation);
        w.flag(self.cpu.waiting);
        w.flag(self.cpu.halted);

        // Memory regions
        w.u32(self.memory.len() as u32);
        for region in &self.memory {
            w.blob(region);
        }

        // Peripherals
        write_acia(&mut w, &self.acia);
        write_pia(&mut w, &self.pia);
        write_via(&mut w, &self.via);
        write_via(&mut w, &self.board_fifo.via);
        write_ft245(&mut w, &self.board_fifo.ft245);

        w.data
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, &'static str> {
        let mut r = Reader::new(data);
        if r.bytes(4)? != SNAPSHOT_MAGIC {
            return Err("invalid snapshot magic");
        }
        if r.u8()? != SNAPSHOT_VERSION {
            return Err("unsupported snapshot version");
        }

        let regs = Registers {
            a: r.u16()?,
            x: r.u16()?,
            y: r.u16()?,
            s: r.u16()?,
            pc: r.u16()?,
            d: r.u16()?,
            dbr: r.u8()?,
            pbr: r.u8()?,
            p: Status(r.u8()?),
            emulation: r.flag()?,
        };
        let cpu = CpuState {
            regs,
            waiting: r.flag()?,
            halted: r.flag()?,
        };

        let region_count = r.u32()? as usize;
        let mut memory = Vec::with_capacity(region_count);
        for _ in 0..region_count {
            memory.push(r.blob()?);
        }

        let acia = read_acia(&mut r)?;
        let pia = read_pia(&mut r)?;
        let via = read_via(&mut r)?;
        let fifo_via = read_via(&mut r)?;
        let fifo_ft245 = read_ft245(&mut r)?;

        Ok(Self {
            cpu,
            memory,
            acia,
            pia,
            via,
            board_fifo: BoardFifoState {
                via: fifo_via,
                ft245: fifo_ft245,
            },
        })
    }
}

fn write_via(w: &mut Writer, s: &ViaState) {
    w.u8(s.ora);
    w.u8(s.orb);
    w.u8(s.ddra);
    w.u8(s.ddrb);
    w.u8(s.external_a);
    w.u8(s.external_b);
    w.u8(s.ira_latch);
    w.u8(s.irb_latch);
    w.u16(s.t1_counter);
    w.u16(s.t1_latch);
    w.flag(s.t1_running);
    w.flag(s.t1_pb7_state);
    w.u16(s.t2_counter);
    w.u8(s.t2_latch_lo);
    w.flag(s.t2_running);
    w.u8(s.sr);
    w.u8(s.acr);
    w.u8(s.pcr);
    w.u8(s.ifr);
    w.u8(s.ier);
    w.flag(s.ca1);
    w.flag(s.ca2);
    w.flag(s.cb1);
    w.flag(s.cb2);
}

fn read_via(r: &mut Reader<'_>) -> Result<ViaState, &'static str> {
    Ok(ViaState {
        ora: r.u8()?,
        orb: r.u8()?,
        ddra: r.u8()?,
        ddrb: r.u8()?,
        external_a: r.u8()?,
        external_b: r.u8()?,
        ira_latch: r.u8()?,
        irb_latch: r.u8()?,
        t1_counter: r.u16()?,
        t1_latch: r.u16()?,
        t1_running: r.flag()?,
        t1_pb7_state: r.flag()?,
        t2_counter: r.u16()?,
        t2_latch_lo: r.u8()?,
        t2_running: r.flag()?,
        sr: r.u8()?,
        acr: r.u8()?,
        pcr: r.u8()?,
        ifr: r.u8()?,
        ier: r.u8()?,
        ca1: r.flag()?,
        ca2: r.flag()?,
        cb1: r.flag()?,
        cb2: r.flag()?,
    })
}

fn write_pia(w: &mut Writer, s: &PiaState) {
    w.u8(s.porta_data);
    w.u8(s.porta_ddr);
    w.u8(s.porta_ctrl);
    w.u8(s.portb_data);
    w.u8(s.portb_ddr);
    w.u8(s.portb_ctrl);
    w.flag(s.ca1);
    w.flag(s.ca2);
    w.flag(s.cb1);
    w.flag(s.cb2);
    w.flag(s.flag_ca1);
    w.flag(s.flag_ca2);
    w.flag(s.flag_cb1);
    w.flag(s.flag_cb2);
    w.u8(s.external_a);
    w.u8(s.external_b);
}

fn read_pia(r: &mut Reader<'_>) -> Result<PiaState, &'static str> {
    Ok(PiaState {
        porta_data: r.u8()?,
        porta_ddr: r.u8()?,
        porta_ctrl: r.u8()?,
        portb_data: r.u8()?,
        portb_ddr: r.u8()?,
        portb_ctrl: r.u8()?,
        ca1: r.flag()?,
        ca2: r.flag()?,
        cb1: r.flag()?,
        cb2: r.flag()?,
        flag_ca1: r.flag()?,
        flag_ca2: r.flag()?,
        flag_cb1: r.flag()?,
        flag_cb2: r.flag()?,
        external_a: r.u8()?,
        external_b: r.u8()?,
    })
}

fn write_acia(w: &mut Writer, s: &AciaState) {
    w.u8(s.command);
    w.u8(s.control);
    w.flag(s.rdrf);
    w.flag(s.tdre);
    w.flag(s.parity_error);
    w.flag(s.framing_error);
    w.flag(s.overrun_error);
    w.flag(s.dtr_asserted);
    w.flag(s.dcd_asserted);
    w.flag(s.dsr_asserted);
    w.u8(s.tx_shift);
    w.u8(s.tx_bits_remaining);
    w.u32(s.tx_clock_divider);
    w.u32(s.tx_clock_counter);
    w.blob(&s.rx_fifo);
    w.blob(&s.tx_fifo);
}

fn read_acia(r: &mut Reader<'_>) -> Result<AciaState, &'static str> {
    Ok(AciaState {
        command: r.u8()?,
        control: r.u8()?,
        rdrf: r.flag()?,
        tdre: r.flag()?,
        parity_error: r.flag()?,
        framing_error: r.flag()?,
        overrun_error: r.flag()?,
        dtr_asserted: r.flag()?,
        dcd_asserted: r.flag()?,
        dsr_asserted: r.flag()?,
        tx_shift: r.u8()?,
        tx_bits_remaining: r.u8()?,
        tx_clock_divider: r.u32()?,
        tx_clock_counter: r.u32()?,
        rx_fifo: r.blob()?,
        tx_fifo: r.blob()?,
    })
}

fn write_ft245(w: &mut Writer, s: &Ft245State) {
    w.u8(s.data_bus);
    w.flag(s.rd_asserted);
    w.flag(s.wr);
    w.flag(s.usb_connected);
    w.flag(s.usb_configured);
    w.u8(s.read_latency);
    w.u8(s.read_timer);
    w.blob(&s.rx_fifo);
    w.blob(&s.tx_fifo);
}

fn read_ft245(r: &mut Reader<'_>) -> Result<Ft245State, &'static str> {
    Ok(Ft245State {
        data_bus: r.u8()?,
        rd_asserted: r.flag()?,
        wr: r.flag()?,
        usb_connected: r.flag()?,
        usb_configured: r.flag()?,
        read_latency: r.u8()?,
        read_timer: r.u8()?,
        rx_fifo: r.blob()?,
        tx_fifo: r.blob()?,
    })
}

/// Little-endian byte sink.
struct Writer {
    data: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn u8(&mut self, value: u8) {
        self.data.push(value);
    }

    fn flag(&mut self, value: bool) {
        self.data.push(u8::from(value));
    }

    fn u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn blob(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.bytes(bytes);
    }
}

/// Little-endian byte source with bounds checking.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], &'static str> {
        let end = self.pos.checked_add(len).ok_or("snapshot truncated")?;
        let slice = self.data.get(self.pos..end).ok_or("snapshot truncated")?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, &'static str> {
        Ok(self.bytes(1)?[0])
    }

    fn flag(&mut self) -> Result<bool, &'static str> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, &'static str> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, &'static str> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn blob(&mut self) -> Result<Vec<u8>, &'static str> {
        let len = self.u32()? as usize;
        Ok(self.bytes(len)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_format_round_trips() {
        let mut machine = Machine::new();
        machine.load_rom(&[0xA9, 0x42, 0xDB], 0x8000);
        machine.write_byte(0x1000, 0x77);
        machine.cpu_mut().regs.pc = 0x8000;
        machine.step();
        machine.acia_mut().receive_byte(0x12);

        let snapshot = machine.snapshot();
        let bytes = snapshot.to_bytes();
        let decoded = Snapshot::from_bytes(&bytes).expect("valid snapshot bytes");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(Snapshot::from_bytes(b"XXXX\x01").is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let machine = Machine::new();
        let bytes = machine.snapshot().to_bytes();
        assert!(Snapshot::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
