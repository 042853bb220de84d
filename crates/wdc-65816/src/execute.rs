//! Instruction semantics for all 256 opcodes.
//!
//! `execute` dispatches on the table's `Instr` tag; the addressing-mode
//! flags select the effective-address recipe. Width-sensitive
//! operations re-examine M (or X) here, at execution time; the
//! decoder's size estimate only governed how many operand bytes were
//! fetched.

use emu_core::Bus;

use crate::addressing::DataRef;
use crate::cpu::{Interrupt, Wdc65816};
use crate::opcodes::{mode, Instr, ModeFlags, MIN_CYCLES, OPCODES};
use crate::status::{self, Status};

impl Wdc65816 {
    /// Run one opcode's semantics. Returns extra cycles beyond the
    /// fixed table cost (taken branches, block moves, native-mode
    /// interrupt entry).
    pub(crate) fn execute<B: Bus>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        arg_one: u16,
        arg_two: u16,
    ) -> u32 {
        let meta = &OPCODES[opcode as usize];
        let modes = meta.modes;

        match meta.instr {
            // --- ALU ---
            Instr::Adc => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                self.adc(v);
            }
            Instr::Sbc => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                let inverted = if self.regs.acc_is_8bit() {
                    !v & 0x00FF
                } else {
                    !v
                };
                self.adc(inverted);
            }
            Instr::And => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                self.logic_op(|a, b| a & b, v);
            }
            Instr::Ora => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                self.logic_op(|a, b| a | b, v);
            }
            Instr::Eor => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                self.logic_op(|a, b| a ^ b, v);
            }
            Instr::Cmp => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                let a = self.acc_value();
                self.compare(a, v, self.regs.acc_is_8bit());
            }
            Instr::Cpx => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_x(bus, r);
                let x = self.regs.x_index();
                self.compare(x, v, self.regs.index_is_8bit());
            }
            Instr::Cpy => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_x(bus, r);
                let y = self.regs.y_index();
                self.compare(y, v, self.regs.index_is_8bit());
            }
            Instr::Bit => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                let a = self.acc_value();
                self.regs.p.assign(status::Z, a & v == 0);
                // The immediate form affects Z only.
                if modes & mode::IMMEDIATE == 0 {
                    let (n_bit, v_bit) = if self.regs.acc_is_8bit() {
                        (v & 0x80 != 0, v & 0x40 != 0)
                    } else {
                        (v & 0x8000 != 0, v & 0x4000 != 0)
                    };
                    self.regs.p.assign(status::N, n_bit);
                    self.regs.p.assign(status::V, v_bit);
                }
            }
            Instr::Tsb => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let a = self.acc_value();
                let v = self.read_m(bus, r);
                self.regs.p.assign(status::Z, a & v == 0);
                self.write_m(bus, r, v | a);
            }
            Instr::Trb => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let a = self.acc_value();
                let v = self.read_m(bus, r);
                self.regs.p.assign(status::Z, a & v == 0);
                self.write_m(bus, r, v & !a);
            }

            // --- Shifts and rotates ---
            Instr::Asl => self.shift_op(bus, modes, arg_one, arg_two, ShiftKind::Asl),
            Instr::Lsr => self.shift_op(bus, modes, arg_one, arg_two, ShiftKind::Lsr),
            Instr::Rol => self.shift_op(bus, modes, arg_one, arg_two, ShiftKind::Rol),
            Instr::Ror => self.shift_op(bus, modes, arg_one, arg_two, ShiftKind::Ror),

            // --- Increments and decrements ---
            Instr::Inc => self.step_op(bus, modes, arg_one, arg_two, 1),
            Instr::Dec => self.step_op(bus, modes, arg_one, arg_two, 0xFFFF),
            Instr::Inx => {
                let v = self.index_step(self.regs.x, 1);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Dex => {
                let v = self.index_step(self.regs.x, 0xFFFF);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Iny => {
                let v = self.index_step(self.regs.y, 1);
                self.regs.y = v;
                self.set_nz_index(v);
            }
            Instr::Dey => {
                let v = self.index_step(self.regs.y, 0xFFFF);
                self.regs.y = v;
                self.set_nz_index(v);
            }

            // --- Loads and stores ---
            Instr::Lda => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_m(bus, r);
                self.set_acc(v);
                self.set_nz_acc(v);
            }
            Instr::Ldx => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_x(bus, r);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Ldy => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.read_x(bus, r);
                self.regs.y = v;
                self.set_nz_index(v);
            }
            Instr::Sta => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.acc_value();
                self.write_m(bus, r, v);
            }
            Instr::Stx => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.regs.x_index();
                self.write_x(bus, r, v);
            }
            Instr::Sty => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                let v = self.regs.y_index();
                self.write_x(bus, r, v);
            }
            Instr::Stz => {
                let r = self.data_ref(bus, modes, arg_one, arg_two);
                self.write_m(bus, r, 0);
            }

            // --- Stack ---
            Instr::Pha => {
                let v = self.acc_value();
                self.push_acc_width(bus, v);
            }
            Instr::Phx => {
                let v = self.regs.x_index();
                self.push_index_width(bus, v);
            }
            Instr::Phy => {
                let v = self.regs.y_index();
                self.push_index_width(bus, v);
            }
            Instr::Pla => {
                let v = self.pop_acc_width(bus);
                self.set_acc(v);
                self.set_nz_acc(v);
            }
            Instr::Plx => {
                let v = self.pop_index_width(bus);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Ply => {
                let v = self.pop_index_width(bus);
                self.regs.y = v;
                self.set_nz_index(v);
            }
            Instr::Php => {
                let mut p = self.regs.p.0;
                if self.regs.emulation {
                    p |= status::B;
                }
                self.push_byte(bus, p);
            }
            Instr::Plp => {
                let p = self.pop_byte(bus);
                self.regs.p = Status(p);
                if self.regs.emulation {
                    self.regs.p.set(status::M | status::X);
                }
                if self.regs.index_is_8bit() {
                    self.regs.truncate_index_registers();
                }
            }
            Instr::Phd => {
                let d = self.regs.d;
                self.push_word(bus, d);
            }
            Instr::Pld => {
                let d = self.pop_word(bus);
                self.regs.d = d;
                self.set_nz16(d);
            }
            Instr::Phb => {
                let b = self.regs.dbr;
                self.push_byte(bus, b);
            }
            Instr::Plb => {
                let b = self.pop_byte(bus);
                self.regs.dbr = b;
                self.set_nz8(b);
            }
            Instr::Phk => {
                let k = self.regs.pbr;
                self.push_byte(bus, k);
            }
            Instr::Pea => {
                self.push_word(bus, arg_one);
            }
            Instr::Pei => {
                let ptr = self.dp_addr(arg_one);
                let v = self.read_word_at(bus, 0, ptr);
                self.push_word(bus, v);
            }
            Instr::Per => {
                let target = self.regs.pc.wrapping_add(arg_one);
                self.push_word(bus, target);
            }

            // --- Control transfer ---
            Instr::Bpl => return self.branch(!self.regs.p.is_set(status::N), arg_one),
            Instr::Bmi => return self.branch(self.regs.p.is_set(status::N), arg_one),
            Instr::Bvc => return self.branch(!self.regs.p.is_set(status::V), arg_one),
            Instr::Bvs => return self.branch(self.regs.p.is_set(status::V), arg_one),
            Instr::Bcc => return self.branch(!self.regs.p.is_set(status::C), arg_one),
            Instr::Bcs => return self.branch(self.regs.p.is_set(status::C), arg_one),
            Instr::Bne => return self.branch(!self.regs.p.is_set(status::Z), arg_one),
            Instr::Beq => return self.branch(self.regs.p.is_set(status::Z), arg_one),
            Instr::Bra => return self.branch(true, arg_one),
            Instr::Brl => {
                self.regs.pc = self.regs.pc.wrapping_add(arg_one);
            }
            Instr::Jmp => {
                if modes & mode::INDIRECT != 0 {
                    self.regs.pc = if modes & mode::INDEXED_X != 0 {
                        self.absolute_indexed_indirect(bus, arg_one)
                    } else {
                        self.absolute_indirect(bus, arg_one)
                    };
                } else {
                    self.regs.pc = arg_one;
                }
            }
            Instr::Jml => {
                if modes & mode::INDIRECT_LONG != 0 {
                    let target = self.absolute_indirect_long(bus, arg_one);
                    self.regs.pbr = target.bank;
                    self.regs.pc = target.addr;
                } else {
                    self.regs.pbr = arg_two as u8;
                    self.regs.pc = arg_one;
                }
            }
            Instr::Jsr => {
                let ret = self.regs.pc.wrapping_sub(1);
                let target = if modes & mode::INDIRECT != 0 {
                    self.absolute_indexed_indirect(bus, arg_one)
                } else {
                    arg_one
                };
                self.push_word(bus, ret);
                self.regs.pc = target;
            }
            Instr::Jsl => {
                let pbr = self.regs.pbr;
                self.push_byte(bus, pbr);
                let ret = self.regs.pc.wrapping_sub(1);
                self.push_word(bus, ret);
                self.regs.pbr = arg_two as u8;
                self.regs.pc = arg_one;
            }
            Instr::Rts => {
                self.regs.pc = self.pop_word(bus).wrapping_add(1);
            }
            Instr::Rtl => {
                self.regs.pc = self.pop_word(bus).wrapping_add(1);
                self.regs.pbr = self.pop_byte(bus);
            }
            Instr::Rti => {
                let p = self.pop_byte(bus);
                self.regs.p = Status(p);
                if self.regs.emulation {
                    self.regs.p.set(status::M | status::X);
                }
                if self.regs.index_is_8bit() {
                    self.regs.truncate_index_registers();
                }
                self.regs.pc = self.pop_word(bus);
                if !self.regs.emulation {
                    self.regs.pbr = self.pop_byte(bus);
                }
            }
            Instr::Brk => {
                let entry = self.interrupt_entry(bus, Interrupt::Brk);
                return entry - u32::from(MIN_CYCLES[opcode as usize]);
            }
            Instr::Cop => {
                let entry = self.interrupt_entry(bus, Interrupt::Cop);
                return entry - u32::from(MIN_CYCLES[opcode as usize]);
            }

            // --- Block moves ---
            Instr::Mvn => return self.block_move(bus, arg_one, 1),
            Instr::Mvp => return self.block_move(bus, arg_one, 0xFFFF),

            // --- Flags and mode ---
            Instr::Clc => self.regs.p.clear(status::C),
            Instr::Sec => self.regs.p.set(status::C),
            Instr::Cli => self.regs.p.clear(status::I),
            Instr::Sei => self.regs.p.set(status::I),
            Instr::Cld => self.regs.p.clear(status::D),
            Instr::Sed => self.regs.p.set(status::D),
            Instr::Clv => self.regs.p.clear(status::V),
            Instr::Rep => {
                let mut mask = arg_one as u8;
                if self.regs.emulation {
                    mask &= !(status::M | status::X);
                }
                self.regs.p.0 &= !mask;
            }
            Instr::Sep => {
                let mut mask = arg_one as u8;
                if self.regs.emulation {
                    mask &= !(status::M | status::X);
                }
                self.regs.p.0 |= mask;
                if self.regs.p.is_set(status::X) {
                    self.regs.truncate_index_registers();
                }
            }
            Instr::Xce => {
                let old_carry = self.regs.p.is_set(status::C);
                let old_emulation = self.regs.emulation;
                self.regs.p.assign(status::C, old_emulation);
                self.regs.emulation = old_carry;
                if old_carry && !old_emulation {
                    // Entering emulation: 8-bit everything, stack back
                    // into page 1.
                    self.regs.p.set(status::M | status::X);
                    self.regs.truncate_index_registers();
                    self.regs.confine_stack_to_page_1();
                }
            }

            // --- Transfers ---
            Instr::Tax => {
                let v = self.index_truncate(self.regs.a);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Tay => {
                let v = self.index_truncate(self.regs.a);
                self.regs.y = v;
                self.set_nz_index(v);
            }
            Instr::Txa => {
                let v = if self.regs.acc_is_8bit() {
                    self.regs.x & 0x00FF
                } else {
                    self.regs.x_index()
                };
                self.set_acc(v);
                self.set_nz_acc(v);
            }
            Instr::Tya => {
                let v = if self.regs.acc_is_8bit() {
                    self.regs.y & 0x00FF
                } else {
                    self.regs.y_index()
                };
                self.set_acc(v);
                self.set_nz_acc(v);
            }
            Instr::Tsx => {
                let v = self.index_truncate(self.regs.s);
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Txs => {
                self.regs.s = if self.regs.emulation {
                    0x0100 | (self.regs.x & 0x00FF)
                } else {
                    self.regs.x_index()
                };
            }
            Instr::Txy => {
                let v = self.regs.x_index();
                self.regs.y = v;
                self.set_nz_index(v);
            }
            Instr::Tyx => {
                let v = self.regs.y_index();
                self.regs.x = v;
                self.set_nz_index(v);
            }
            Instr::Tcd => {
                self.regs.d = self.regs.a;
                self.set_nz16(self.regs.a);
            }
            Instr::Tdc => {
                self.regs.a = self.regs.d;
                self.set_nz16(self.regs.d);
            }
            Instr::Tcs => {
                self.regs.s = if self.regs.emulation {
                    0x0100 | (self.regs.a & 0x00FF)
                } else {
                    self.regs.a
                };
            }
            Instr::Tsc => {
                self.regs.a = self.regs.s;
                self.set_nz16(self.regs.s);
            }
            Instr::Xba => {
                self.regs.a = self.regs.a.rotate_left(8);
                self.set_nz8(self.regs.a as u8);
            }

            // --- Misc ---
            Instr::Nop | Instr::Wdm => {}
            Instr::Wai => {
                if !self.regs.interrupts_disabled() {
                    self.set_waiting(true);
                }
            }
            Instr::Stp => self.set_halted(),
        }

        0
    }

    // --- Width-sensitive access helpers ---

    /// Accumulator at its logical width.
    fn acc_value(&self) -> u16 {
        if self.regs.acc_is_8bit() {
            self.regs.a & 0x00FF
        } else {
            self.regs.a
        }
    }

    /// Write the accumulator at its logical width. In 8-bit mode the
    /// hidden high byte is preserved, as on hardware.
    fn set_acc(&mut self, value: u16) {
        if self.regs.acc_is_8bit() {
            self.regs.a = (self.regs.a & 0xFF00) | (value & 0x00FF);
        } else {
            self.regs.a = value;
        }
    }

    fn set_nz_acc(&mut self, value: u16) {
        if self.regs.acc_is_8bit() {
            self.set_nz8(value as u8);
        } else {
            self.set_nz16(value);
        }
    }

    fn set_nz_index(&mut self, value: u16) {
        if self.regs.index_is_8bit() {
            self.set_nz8(value as u8);
        } else {
            self.set_nz16(value);
        }
    }

    /// Truncate a 16-bit value to the index width.
    fn index_truncate(&self, value: u16) -> u16 {
        if self.regs.index_is_8bit() {
            value & 0x00FF
        } else {
            value
        }
    }

    /// Add a (wrapping) delta at the index width.
    fn index_step(&self, value: u16, delta: u16) -> u16 {
        if self.regs.index_is_8bit() {
            u16::from((value as u8).wrapping_add(delta as u8))
        } else {
            value.wrapping_add(delta)
        }
    }

    /// Read a data operand at the accumulator width.
    fn read_m<B: Bus>(&mut self, bus: &mut B, r: DataRef) -> u16 {
        match r {
            DataRef::Imm(v) => {
                if self.regs.acc_is_8bit() {
                    v & 0x00FF
                } else {
                    v
                }
            }
            DataRef::Mem(ea) => {
                if self.regs.acc_is_8bit() {
                    u16::from(self.read_byte_at(bus, ea.bank, ea.addr))
                } else {
                    self.read_word_at(bus, ea.bank, ea.addr)
                }
            }
        }
    }

    /// Read a data operand at the index width.
    fn read_x<B: Bus>(&mut self, bus: &mut B, r: DataRef) -> u16 {
        match r {
            DataRef::Imm(v) => {
                if self.regs.index_is_8bit() {
                    v & 0x00FF
                } else {
                    v
                }
            }
            DataRef::Mem(ea) => {
                if self.regs.index_is_8bit() {
                    u16::from(self.read_byte_at(bus, ea.bank, ea.addr))
                } else {
                    self.read_word_at(bus, ea.bank, ea.addr)
                }
            }
        }
    }

    fn write_m<B: Bus>(&mut self, bus: &mut B, r: DataRef, value: u16) {
        if let DataRef::Mem(ea) = r {
            if self.regs.acc_is_8bit() {
                self.write_byte_at(bus, ea.bank, ea.addr, value as u8);
            } else {
                self.write_word_at(bus, ea.bank, ea.addr, value);
            }
        }
    }

    fn write_x<B: Bus>(&mut self, bus: &mut B, r: DataRef, value: u16) {
        if let DataRef::Mem(ea) = r {
            if self.regs.index_is_8bit() {
                self.write_byte_at(bus, ea.bank, ea.addr, value as u8);
            } else {
                self.write_word_at(bus, ea.bank, ea.addr, value);
            }
        }
    }

    fn push_acc_width<B: Bus>(&mut self, bus: &mut B, value: u16) {
        if self.regs.acc_is_8bit() {
            self.push_byte(bus, value as u8);
        } else {
            self.push_word(bus, value);
        }
    }

    fn pop_acc_width<B: Bus>(&mut self, bus: &mut B) -> u16 {
        if self.regs.acc_is_8bit() {
            u16::from(self.pop_byte(bus))
        } else {
            self.pop_word(bus)
        }
    }

    fn push_index_width<B: Bus>(&mut self, bus: &mut B, value: u16) {
        if self.regs.index_is_8bit() {
            self.push_byte(bus, value as u8);
        } else {
            self.push_word(bus, value);
        }
    }

    fn pop_index_width<B: Bus>(&mut self, bus: &mut B) -> u16 {
        if self.regs.index_is_8bit() {
            u16::from(self.pop_byte(bus))
        } else {
            self.pop_word(bus)
        }
    }

    // --- ALU cores ---

    /// Binary add with carry at the accumulator width; SBC feeds the
    /// inverted operand through the same path.
    fn adc(&mut self, value: u16) {
        let carry = u32::from(self.regs.p.is_set(status::C));
        if self.regs.acc_is_8bit() {
            let a = u32::from(self.regs.a & 0x00FF);
            let v = u32::from(value);
            let sum = a + v + carry;
            self.regs.p.assign(status::C, sum > 0xFF);
            self.regs
                .p
                .assign(status::V, (!(a ^ v) & (a ^ sum)) & 0x80 != 0);
            let result = (sum & 0xFF) as u16;
            self.set_acc(result);
            self.set_nz8(result as u8);
        } else {
            let a = u32::from(self.regs.a);
            let v = u32::from(value);
            let sum = a + v + carry;
            self.regs.p.assign(status::C, sum > 0xFFFF);
            self.regs
                .p
                .assign(status::V, (!(a ^ v) & (a ^ sum)) & 0x8000 != 0);
            let result = (sum & 0xFFFF) as u16;
            self.set_acc(result);
            self.set_nz16(result);
        }
    }

    fn logic_op(&mut self, f: fn(u16, u16) -> u16, value: u16) {
        let result = f(self.acc_value(), value);
        self.set_acc(result);
        self.set_nz_acc(result);
    }

    /// Compare is a subtract without a store: C set on no-borrow.
    fn compare(&mut self, reg: u16, value: u16, is_8bit: bool) {
        if is_8bit {
            let r = (reg as u8).wrapping_sub(value as u8);
            self.regs.p.assign(status::C, (reg & 0xFF) >= (value & 0xFF));
            self.set_nz8(r);
        } else {
            let r = reg.wrapping_sub(value);
            self.regs.p.assign(status::C, reg >= value);
            self.set_nz16(r);
        }
    }

    /// Shift/rotate, on memory or (implied mode) the accumulator.
    fn shift_op<B: Bus>(
        &mut self,
        bus: &mut B,
        modes: ModeFlags,
        arg_one: u16,
        arg_two: u16,
        kind: ShiftKind,
    ) {
        if modes == mode::IMPLIED {
            let v = self.acc_value();
            let r = self.shift_value(v, kind);
            self.set_acc(r);
            self.set_nz_acc(r);
        } else {
            let dref = self.data_ref(bus, modes, arg_one, arg_two);
            let v = self.read_m(bus, dref);
            let r = self.shift_value(v, kind);
            self.write_m(bus, dref, r);
            self.set_nz_acc(r);
        }
    }

    fn shift_value(&mut self, value: u16, kind: ShiftKind) -> u16 {
        let is_8bit = self.regs.acc_is_8bit();
        let top_bit: u16 = if is_8bit { 0x80 } else { 0x8000 };
        let mask: u16 = if is_8bit { 0x00FF } else { 0xFFFF };
        let old_carry = self.regs.p.is_set(status::C);

        match kind {
            ShiftKind::Asl => {
                self.regs.p.assign(status::C, value & top_bit != 0);
                (value << 1) & mask
            }
            ShiftKind::Lsr => {
                self.regs.p.assign(status::C, value & 1 != 0);
                (value & mask) >> 1
            }
            ShiftKind::Rol => {
                self.regs.p.assign(status::C, value & top_bit != 0);
                ((value << 1) | u16::from(old_carry)) & mask
            }
            ShiftKind::Ror => {
                self.regs.p.assign(status::C, value & 1 != 0);
                let carry_in = if old_carry { top_bit } else { 0 };
                ((value & mask) >> 1) | carry_in
            }
        }
    }

    /// INC/DEC, on memory or (implied mode) the accumulator.
    fn step_op<B: Bus>(
        &mut self,
        bus: &mut B,
        modes: ModeFlags,
        arg_one: u16,
        arg_two: u16,
        delta: u16,
    ) {
        if modes == mode::IMPLIED {
            let v = self.acc_value();
            let r = if self.regs.acc_is_8bit() {
                u16::from((v as u8).wrapping_add(delta as u8))
            } else {
                v.wrapping_add(delta)
            };
            self.set_acc(r);
            self.set_nz_acc(r);
        } else {
            let dref = self.data_ref(bus, modes, arg_one, arg_two);
            let v = self.read_m(bus, dref);
            let r = if self.regs.acc_is_8bit() {
                u16::from((v as u8).wrapping_add(delta as u8))
            } else {
                v.wrapping_add(delta)
            };
            self.write_m(bus, dref, r);
            self.set_nz_acc(r);
        }
    }

    // --- Control-flow helpers ---

    /// Conditional branch; a taken branch costs one extra cycle.
    fn branch(&mut self, taken: bool, offset: u16) -> u32 {
        if taken {
            let displacement = i16::from(offset as u8 as i8);
            self.regs.pc = self.regs.pc.wrapping_add(displacement as u16);
            1
        } else {
            0
        }
    }

    /// MVN (`delta` = 1) and MVP (`delta` = -1): `A + 1` bytes copied
    /// from `srcbank:X` to `dstbank:Y`, byte at a time through the bus,
    /// indices stepping in the given direction after each byte. On
    /// completion A is $FFFF and DBR holds the destination bank.
    fn block_move<B: Bus>(&mut self, bus: &mut B, banks: u16, delta: u16) -> u32 {
        let dst_bank = (banks & 0x00FF) as u8;
        let src_bank = (banks >> 8) as u8;
        let count = u32::from(self.regs.a) + 1;

        for _ in 0..count {
            let src = self.regs.x_index();
            let dst = self.regs.y_index();
            let value = self.read_byte_at(bus, src_bank, src);
            self.write_byte_at(bus, dst_bank, dst, value);
            self.regs.x = self.index_step(self.regs.x, delta);
            self.regs.y = self.index_step(self.regs.y, delta);
        }

        self.regs.a = 0xFFFF;
        self.regs.dbr = dst_bank;

        // Seven cycles per byte; the table already charged seven.
        7 * count - 7
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Asl,
    Lsr,
    Rol,
    Ror,
}
