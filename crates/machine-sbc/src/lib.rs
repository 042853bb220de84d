//! W65C816S single-board computer emulator.
//!
//! Wires the CPU to a banked 24-bit memory bus with the peripheral set
//! found on hobbyist 65xx boards: a 65C51 ACIA, a 65C21 PIA, a 65C22
//! VIA, and a second VIA driving an FT245 USB FIFO. Each retired
//! instruction's cycle count clocks every peripheral, so timer and
//! serial timing line up with executed code — a `WAI` observably
//! stalls until a device raises an interrupt.

mod board_fifo;
mod machine;
mod memory;
mod snapshot;

pub use board_fifo::{
    BoardFifo, BoardFifoState, PORTB_PWREN_N, PORTB_RD_N, PORTB_RXF_N, PORTB_TXE_N, PORTB_WR,
};
pub use machine::{LoadSummary, Machine};
pub use memory::{Device, Memory, MemoryLayout};
pub use snapshot::{CpuState, Snapshot};
