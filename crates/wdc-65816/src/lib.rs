//! W65C816S CPU implementation.
//!
//! Fetch-decode-execute emulation driven by a 256-entry opcode metadata
//! table. Each `step()` retires one instruction, reports its cycle cost,
//! and advances the devices behind the bus by exactly that amount.
//! Interrupt sequencing, the emulation/native mode machinery, and the
//! `WAI`/`STP` stall states all live here; memory and peripherals are
//! reached exclusively through the `emu_core::Bus` trait.

mod addressing;
mod cpu;
mod decode;
mod execute;
mod opcodes;
mod registers;
pub mod status;

pub use cpu::{Interrupt, StepResult, Wdc65816};
pub use decode::{DecodedInstruction, Decoder};
pub use opcodes::{
    Instr, LabelHook, ModeFlags, Opcode, OperandKind, SizeAdjust, StateHook, mode, OPCODES,
};
pub use registers::Registers;
pub use status::Status;
