//! Instruction decoding for trace output.
//!
//! `format_operand` renders an operand in assembler syntax from the
//! table's mode flags. `Decoder` walks a raw byte buffer without a
//! running machine, tracking the M/X/E mode machinery through the
//! table's state hooks so operand sizes stay correct across SEP/REP/XCE.
//! When a machine is present, seed the decoder from its live registers
//! instead of the default emulation-mode hint.

use crate::opcodes::{mode, LabelHook, Opcode, OperandKind, SizeAdjust, StateHook, OPCODES};
use crate::registers::Registers;
use crate::status;

/// Render an operand in assembler syntax. `size` is the operand byte
/// count actually read.
#[must_use]
pub(crate) fn format_operand(meta: &Opcode, operand: u32, size: u8) -> String {
    let modes = meta.modes;
    let has = |flag: u16| modes & flag != 0;

    if modes == mode::IMPLIED {
        return String::new();
    }

    if has(mode::IMMEDIATE) {
        return if size == 2 {
            format!("#${operand:04X}")
        } else {
            format!("#${operand:02X}")
        };
    }

    if has(mode::BLOCK_MOVE) {
        // Assembler order is source, destination; the destination bank
        // is the low operand byte.
        return format!("${:02X}, ${:02X}", (operand >> 8) & 0xFF, operand & 0xFF);
    }

    if has(mode::PC_RELATIVE) {
        let displacement = operand as u8 as i8;
        return if displacement < 0 {
            format!("$<{:02X}", displacement.unsigned_abs())
        } else {
            format!("$>{displacement:02X}")
        };
    }

    if has(mode::PC_RELATIVE_LONG) {
        let displacement = operand as u16 as i16;
        return if displacement < 0 {
            format!("$<{:04X}", displacement.unsigned_abs())
        } else {
            format!("$>{displacement:04X}")
        };
    }

    if has(mode::DIRECT_PAGE) {
        let d = operand & 0xFF;
        return if has(mode::INDIRECT_LONG) {
            if has(mode::INDEXED_Y) {
                format!("[${d:02X}], Y")
            } else {
                format!("[${d:02X}]")
            }
        } else if has(mode::INDIRECT) {
            if has(mode::INDEXED_X) {
                format!("(${d:02X}, X)")
            } else if has(mode::INDEXED_Y) {
                format!("(${d:02X}), Y")
            } else {
                format!("(${d:02X})")
            }
        } else if has(mode::INDEXED_X) {
            format!("${d:02X}, X")
        } else if has(mode::INDEXED_Y) {
            format!("${d:02X}, Y")
        } else {
            format!("${d:02X}")
        };
    }

    if has(mode::STACK_RELATIVE) {
        let d = operand & 0xFF;
        return if has(mode::INDEXED_Y) {
            format!("(${d:02X}, S), Y")
        } else {
            format!("${d:02X}, S")
        };
    }

    if has(mode::ABSOLUTE_LONG) {
        let long = operand & 0x00FF_FFFF;
        return if has(mode::INDEXED_X) {
            format!("${long:06X}, X")
        } else {
            format!("${long:06X}")
        };
    }

    if has(mode::ABSOLUTE) {
        let a = operand & 0xFFFF;
        return if has(mode::INDIRECT_LONG) {
            format!("[${a:04X}]")
        } else if has(mode::INDIRECT) {
            if has(mode::INDEXED_X) {
                format!("(${a:04X}, X)")
            } else {
                format!("(${a:04X})")
            }
        } else if has(mode::INDEXED_X) {
            format!("${a:04X}, X")
        } else if has(mode::INDEXED_Y) {
            format!("${a:04X}, Y")
        } else {
            format!("${a:04X}")
        };
    }

    String::new()
}

/// One decoded instruction from a raw buffer.
#[derive(Debug, Clone)]
pub struct DecodedInstruction {
    /// Buffer offset of the opcode byte.
    pub offset: usize,
    /// The opcode byte.
    pub opcode: u8,
    /// Mnemonic from the dispatch table.
    pub mnemonic: &'static str,
    /// Raw operand value.
    pub operand: u32,
    /// Total length in bytes, opcode included.
    pub size: u8,
    /// Operand rendered in assembler syntax.
    pub operand_str: String,
    /// Control-flow target for branches, calls and direct jumps.
    pub target: Option<u32>,
}

/// Mode-tracking decoder for raw buffers.
///
/// Operand sizes on the 65816 depend on processor mode, so a linear
/// scan has to carry its own M/X/E mirror. Defaults to emulation mode;
/// use `from_registers` when a live machine is available.
#[derive(Debug, Clone)]
pub struct Decoder {
    m_set: bool,
    x_set: bool,
    emulation: bool,
    carry: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Decoder with the emulation-mode hint (M and X forced set).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            m_set: true,
            x_set: true,
            emulation: true,
            carry: false,
        }
    }

    /// Decoder for native-mode code with known register widths.
    #[must_use]
    pub const fn with_widths(m_set: bool, x_set: bool) -> Self {
        Self {
            m_set,
            x_set,
            emulation: false,
            carry: false,
        }
    }

    /// Seed the mode mirror from a live register file.
    #[must_use]
    pub const fn from_registers(regs: &Registers) -> Self {
        Self {
            m_set: regs.acc_is_8bit(),
            x_set: regs.index_is_8bit(),
            emulation: regs.emulation,
            carry: regs.p.is_set(status::C),
        }
    }

    /// Decode one instruction at `offset`. Returns `None` when the
    /// buffer ends inside the instruction.
    pub fn decode_at(&mut self, bytes: &[u8], offset: usize) -> Option<DecodedInstruction> {
        let opcode = *bytes.get(offset)?;
        let meta = &OPCODES[opcode as usize];

        let size = self.operand_size(meta);
        let end = offset + 1 + usize::from(size);
        if end > bytes.len() {
            return None;
        }

        let mut operand: u32 = 0;
        if meta.operand != OperandKind::None {
            for (i, &byte) in bytes[offset + 1..end].iter().enumerate() {
                operand |= u32::from(byte) << (8 * i);
            }
        }

        self.apply_state_hook(meta, operand);

        let total = 1 + size;
        let target = meta.label_hook.map(|hook| match hook {
            LabelHook::Branch => {
                let next = offset as u32 + u32::from(total);
                next.wrapping_add(i32::from(operand as u8 as i8) as u32)
            }
            LabelHook::BranchLong => {
                let next = offset as u32 + u32::from(total);
                next.wrapping_add(i32::from(operand as u16 as i16) as u32)
            }
            LabelHook::Call | LabelHook::Jump => operand & 0xFFFF,
            LabelHook::CallLong => operand & 0x00FF_FFFF,
        });

        Some(DecodedInstruction {
            offset,
            opcode,
            mnemonic: meta.mnemonic,
            operand,
            size: total,
            operand_str: format_operand(meta, operand, size),
            target,
        })
    }

    fn operand_size(&self, meta: &Opcode) -> u8 {
        match meta.size_adjust {
            SizeAdjust::Base => meta.base_size,
            SizeAdjust::MSet => {
                if self.m_set {
                    meta.base_size
                } else {
                    meta.base_size + 1
                }
            }
            SizeAdjust::XSet => {
                if self.x_set {
                    meta.base_size
                } else {
                    meta.base_size + 1
                }
            }
        }
    }

    /// Follow the mode-altering opcodes so later sizes stay right.
    fn apply_state_hook(&mut self, meta: &Opcode, operand: u32) {
        let Some(hook) = meta.state_hook else {
            return;
        };
        match hook {
            StateHook::Sep => {
                if !self.emulation {
                    if operand & u32::from(status::M) != 0 {
                        self.m_set = true;
                    }
                    if operand & u32::from(status::X) != 0 {
                        self.x_set = true;
                    }
                }
            }
            StateHook::Rep => {
                if !self.emulation {
                    if operand & u32::from(status::M) != 0 {
                        self.m_set = false;
                    }
                    if operand & u32::from(status::X) != 0 {
                        self.x_set = false;
                    }
                }
            }
            StateHook::Clc => self.carry = false,
            StateHook::Sec => self.carry = true,
            StateHook::Xce => {
                let entering_emulation = self.carry;
                self.carry = self.emulation;
                self.emulation = entering_emulation;
                if entering_emulation {
                    self.m_set = true;
                    self.x_set = true;
                }
            }
        }
    }
}
