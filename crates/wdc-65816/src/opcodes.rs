//! The 256-entry opcode dispatch table.
//!
//! One record per opcode: mnemonic, operand sizing rule, operand reader,
//! addressing-mode flags, optional decode-time hooks, and the semantic
//! operation. The execute module dispatches on `instr` + `modes`; the
//! decoder uses the sizing columns so it can report operand widths
//! without running any instruction semantics.

/// Operand byte count adjustment rule.
///
/// `MSet`/`XSet` opcodes read one extra operand byte when the named flag
/// is clear (16-bit mode). In emulation mode M and X are forced set, so
/// the size stays at the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAdjust {
    Base,
    MSet,
    XSet,
}

/// How the operand bytes are gathered at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand bytes.
    None,
    /// One byte.
    Read8,
    /// Two bytes, little-endian.
    Read16,
    /// Three bytes: 16-bit address plus bank byte.
    Read24,
    /// One or two bytes depending on the sizing rule's flag.
    Read8Or16,
    /// Two bank bytes for MVN/MVP, packed as `(src << 8) | dst`
    /// (the destination bank is the first byte fetched).
    ReadBlockMove,
}

/// Decode-time CPU-state side effect.
///
/// Lets a decoder scanning a raw buffer track the M/X/E mode machinery
/// without executing anything; the instruction semantics run in the
/// execute module regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateHook {
    Sep,
    Rep,
    Clc,
    Sec,
    Xce,
}

/// Decode-time control-flow classification for trace consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelHook {
    /// Conditional or unconditional short branch (signed 8-bit).
    Branch,
    /// BRL (signed 16-bit).
    BranchLong,
    /// JSR with a 16-bit target.
    Call,
    /// JSL with a 24-bit target.
    CallLong,
    /// JMP/JML with a direct target.
    Jump,
}

/// Addressing-mode tag bitset. Combinations encode the effective-address
/// recipe, e.g. `DIRECT_PAGE | INDIRECT | INDEXED_Y` is `(d),y`.
pub type ModeFlags = u16;

pub mod mode {
    pub const IMPLIED: u16 = 0;
    pub const DIRECT_PAGE: u16 = 0x0001;
    pub const IMMEDIATE: u16 = 0x0002;
    pub const INDIRECT: u16 = 0x0004;
    pub const INDEXED_X: u16 = 0x0008;
    pub const INDEXED_Y: u16 = 0x0010;
    pub const ABSOLUTE: u16 = 0x0020;
    pub const ABSOLUTE_LONG: u16 = 0x0040;
    pub const INDEXED_LONG: u16 = 0x0080;
    pub const PC_RELATIVE: u16 = 0x0100;
    pub const STACK_RELATIVE: u16 = 0x0200;
    pub const PC_RELATIVE_LONG: u16 = 0x0400;
    pub const BLOCK_MOVE: u16 = 0x0800;
    pub const INDIRECT_LONG: u16 = 0x1000;
}

/// The semantic operation an opcode performs.
///
/// Where one mnemonic covers several addressing modes, `Opcode::modes`
/// selects the effective-address recipe; the variant stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Brl,
    Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp, Cop, Cpx, Cpy, Dec, Dex, Dey,
    Eor, Inc, Inx, Iny, Jml, Jmp, Jsl, Jsr, Lda, Ldx, Ldy, Lsr, Mvn,
    Mvp, Nop, Ora, Pea, Pei, Per, Pha, Phb, Phd, Phk, Php, Phx, Phy,
    Pla, Plb, Pld, Plp, Plx, Ply, Rep, Rol, Ror, Rti, Rtl, Rts, Sbc,
    Sec, Sed, Sei, Sep, Sta, Stp, Stx, Sty, Stz, Tax, Tay, Tcd, Tcs,
    Tdc, Trb, Tsb, Tsc, Tsx, Txa, Txs, Txy, Tya, Tyx, Wai, Wdm, Xba,
    Xce,
}

/// One opcode table record.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Mnemonic for tracing.
    pub mnemonic: &'static str,
    /// Operand byte count before any mode adjustment.
    pub base_size: u8,
    /// Which flag, if any, widens the operand.
    pub size_adjust: SizeAdjust,
    /// How the operand bytes are read.
    pub operand: OperandKind,
    /// Decode-time mode-state side effect.
    pub state_hook: Option<StateHook>,
    /// Decode-time control-flow classification.
    pub label_hook: Option<LabelHook>,
    /// Addressing-mode tags.
    pub modes: ModeFlags,
    /// Semantic operation.
    pub instr: Instr,
}

const fn op(
    mnemonic: &'static str,
    base_size: u8,
    size_adjust: SizeAdjust,
    operand: OperandKind,
    modes: ModeFlags,
    instr: Instr,
) -> Opcode {
    Opcode {
        mnemonic,
        base_size,
        size_adjust,
        operand,
        state_hook: None,
        label_hook: None,
        modes,
        instr,
    }
}

const fn st(o: Opcode, hook: StateHook) -> Opcode {
    Opcode {
        state_hook: Some(hook),
        ..o
    }
}

const fn lb(o: Opcode, hook: LabelHook) -> Opcode {
    Opcode {
        label_hook: Some(hook),
        ..o
    }
}

use self::mode::{
    ABSOLUTE as ABS, ABSOLUTE_LONG as ABL, BLOCK_MOVE as BMA, DIRECT_PAGE as DP,
    IMMEDIATE as IMM, IMPLIED as IMP, INDEXED_X as IX, INDEXED_Y as IY, INDIRECT as IND,
    INDIRECT_LONG as INDL, PC_RELATIVE as PCR, PC_RELATIVE_LONG as PCRL,
    STACK_RELATIVE as SR,
};
use self::Instr as I;
use self::LabelHook as L;
use self::OperandKind as K;
use self::SizeAdjust as A;
use self::StateHook as S;

/// The full opcode dispatch table. Indexed directly by the opcode byte.
#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    op("BRK", 1, A::Base, K::Read8,         IMM,                 I::Brk), //  00: BRK #s
    op("ORA", 1, A::Base, K::Read8,         DP | IND | IX,       I::Ora), //  01: ORA (d,x)
    op("COP", 1, A::Base, K::Read8,         IMM,                 I::Cop), //  02: COP #s
    op("ORA", 1, A::Base, K::Read8,         SR,                  I::Ora), //  03: ORA d,s
    op("TSB", 1, A::Base, K::Read8,         DP,                  I::Tsb), //  04: TSB d
    op("ORA", 1, A::Base, K::Read8,         DP,                  I::Ora), //  05: ORA d
    op("ASL", 1, A::Base, K::Read8,         DP,                  I::Asl), //  06: ASL d
    op("ORA", 1, A::Base, K::Read8,         DP | INDL,           I::Ora), //  07: ORA [d]
    op("PHP", 0, A::Base, K::None,          IMP,                 I::Php), //  08: PHP
    op("ORA", 1, A::MSet, K::Read8Or16,     IMM,                 I::Ora), //  09: ORA #
    op("ASL", 0, A::Base, K::None,          IMP,                 I::Asl), //  0A: ASL A
    op("PHD", 0, A::Base, K::None,          IMP,                 I::Phd), //  0B: PHD
    op("TSB", 2, A::Base, K::Read16,        ABS,                 I::Tsb), //  0C: TSB a
    op("ORA", 2, A::Base, K::Read16,        ABS,                 I::Ora), //  0D: ORA a
    op("ASL", 2, A::Base, K::Read16,        ABS,                 I::Asl), //  0E: ASL a
    op("ORA", 3, A::Base, K::Read24,        ABL,                 I::Ora), //  0F: ORA al
    lb(op("BPL", 1, A::Base, K::Read8,      PCR,                 I::Bpl), L::Branch), // 10
    op("ORA", 1, A::Base, K::Read8,         DP | IND | IY,       I::Ora), //  11: ORA (d),y
    op("ORA", 1, A::Base, K::Read8,         DP | IND,            I::Ora), //  12: ORA (d)
    op("ORA", 1, A::Base, K::Read8,         SR | IND | IY,       I::Ora), //  13: ORA (d,s),y
    op("TRB", 1, A::Base, K::Read8,         DP,                  I::Trb), //  14: TRB d
    op("ORA", 1, A::Base, K::Read8,         DP | IX,             I::Ora), //  15: ORA d,x
    op("ASL", 1, A::Base, K::Read8,         DP | IX,             I::Asl), //  16: ASL d,x
    op("ORA", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Ora), //  17: ORA [d],y
    st(op("CLC", 0, A::Base, K::None,       IMP,                 I::Clc), S::Clc), // 18
    op("ORA", 2, A::Base, K::Read16,        ABS | IY,            I::Ora), //  19: ORA a,y
    op("INC", 0, A::Base, K::None,          IMP,                 I::Inc), //  1A: INC A
    op("TCS", 0, A::Base, K::None,          IMP,                 I::Tcs), //  1B: TCS
    op("TRB", 2, A::Base, K::Read16,        ABS,                 I::Trb), //  1C: TRB a
    op("ORA", 2, A::Base, K::Read16,        ABS | IX,            I::Ora), //  1D: ORA a,x
    op("ASL", 2, A::Base, K::Read16,        ABS | IX,            I::Asl), //  1E: ASL a,x
    op("ORA", 3, A::Base, K::Read24,        ABL | IX,            I::Ora), //  1F: ORA al,x
    lb(op("JSR", 2, A::Base, K::Read16,     ABS,                 I::Jsr), L::Call), // 20
    op("AND", 1, A::Base, K::Read8,         DP | IND | IX,       I::And), //  21: AND (d,x)
    lb(op("JSL", 3, A::Base, K::Read24,     ABL,                 I::Jsl), L::CallLong), // 22
    op("AND", 1, A::Base, K::Read8,         SR,                  I::And), //  23: AND d,s
    op("BIT", 1, A::Base, K::Read8,         DP,                  I::Bit), //  24: BIT d
    op("AND", 1, A::Base, K::Read8,         DP,                  I::And), //  25: AND d
    op("ROL", 1, A::Base, K::Read8,         DP,                  I::Rol), //  26: ROL d
    op("AND", 1, A::Base, K::Read8,         DP | INDL,           I::And), //  27: AND [d]
    op("PLP", 0, A::Base, K::None,          IMP,                 I::Plp), //  28: PLP
    op("AND", 1, A::MSet, K::Read8Or16,     IMM,                 I::And), //  29: AND #
    op("ROL", 0, A::Base, K::None,          IMP,                 I::Rol), //  2A: ROL A
    op("PLD", 0, A::Base, K::None,          IMP,                 I::Pld), //  2B: PLD
    op("BIT", 2, A::Base, K::Read16,        ABS,                 I::Bit), //  2C: BIT a
    op("AND", 2, A::Base, K::Read16,        ABS,                 I::And), //  2D: AND a
    op("ROL", 2, A::Base, K::Read16,        ABS,                 I::Rol), //  2E: ROL a
    op("AND", 3, A::Base, K::Read24,        ABL,                 I::And), //  2F: AND al
    lb(op("BMI", 1, A::Base, K::Read8,      PCR,                 I::Bmi), L::Branch), // 30
    op("AND", 1, A::Base, K::Read8,         DP | IND | IY,       I::And), //  31: AND (d),y
    op("AND", 1, A::Base, K::Read8,         DP | IND,            I::And), //  32: AND (d)
    op("AND", 1, A::Base, K::Read8,         SR | IND | IY,       I::And), //  33: AND (d,s),y
    op("BIT", 1, A::Base, K::Read8,         DP | IX,             I::Bit), //  34: BIT d,x
    op("AND", 1, A::Base, K::Read8,         DP | IX,             I::And), //  35: AND d,x
    op("ROL", 1, A::Base, K::Read8,         DP | IX,             I::Rol), //  36: ROL d,x
    op("AND", 1, A::Base, K::Read8,         DP | INDL | IY,      I::And), //  37: AND [d],y
    st(op("SEC", 0, A::Base, K::None,       IMP,                 I::Sec), S::Sec), // 38
    op("AND", 2, A::Base, K::Read16,        ABS | IY,            I::And), //  39: AND a,y
    op("DEC", 0, A::Base, K::None,          IMP,                 I::Dec), //  3A: DEC A
    op("TSC", 0, A::Base, K::None,          IMP,                 I::Tsc), //  3B: TSC
    op("BIT", 2, A::Base, K::Read16,        ABS | IX,            I::Bit), //  3C: BIT a,x
    op("AND", 2, A::Base, K::Read16,        ABS | IX,            I::And), //  3D: AND a,x
    op("ROL", 2, A::Base, K::Read16,        ABS | IX,            I::Rol), //  3E: ROL a,x
    op("AND", 3, A::Base, K::Read24,        ABL | IX,            I::And), //  3F: AND al,x
    op("RTI", 0, A::Base, K::None,          IMP,                 I::Rti), //  40: RTI
    op("EOR", 1, A::Base, K::Read8,         DP | IND | IX,       I::Eor), //  41: EOR (d,x)
    op("WDM", 1, A::Base, K::Read8,         IMM,                 I::Wdm), //  42: WDM #s
    op("EOR", 1, A::Base, K::Read8,         SR,                  I::Eor), //  43: EOR d,s
    op("MVP", 2, A::Base, K::ReadBlockMove, BMA,                 I::Mvp), //  44: MVP s,d
    op("EOR", 1, A::Base, K::Read8,         DP,                  I::Eor), //  45: EOR d
    op("LSR", 1, A::Base, K::Read8,         DP,                  I::Lsr), //  46: LSR d
    op("EOR", 1, A::Base, K::Read8,         DP | INDL,           I::Eor), //  47: EOR [d]
    op("PHA", 0, A::Base, K::None,          IMP,                 I::Pha), //  48: PHA
    op("EOR", 1, A::MSet, K::Read8Or16,     IMM,                 I::Eor), //  49: EOR #
    op("LSR", 0, A::Base, K::None,          IMP,                 I::Lsr), //  4A: LSR A
    op("PHK", 0, A::Base, K::None,          IMP,                 I::Phk), //  4B: PHK
    lb(op("JMP", 2, A::Base, K::Read16,     ABS,                 I::Jmp), L::Jump), // 4C
    op("EOR", 2, A::Base, K::Read16,        ABS,                 I::Eor), //  4D: EOR a
    op("LSR", 2, A::Base, K::Read16,        ABS,                 I::Lsr), //  4E: LSR a
    op("EOR", 3, A::Base, K::Read24,        ABL,                 I::Eor), //  4F: EOR al
    lb(op("BVC", 1, A::Base, K::Read8,      PCR,                 I::Bvc), L::Branch), // 50
    op("EOR", 1, A::Base, K::Read8,         DP | IND | IY,       I::Eor), //  51: EOR (d),y
    op("EOR", 1, A::Base, K::Read8,         DP | IND,            I::Eor), //  52: EOR (d)
    op("EOR", 1, A::Base, K::Read8,         SR | IND | IY,       I::Eor), //  53: EOR (d,s),y
    op("MVN", 2, A::Base, K::ReadBlockMove, BMA,                 I::Mvn), //  54: MVN s,d
    op("EOR", 1, A::Base, K::Read8,         DP | IX,             I::Eor), //  55: EOR d,x
    op("LSR", 1, A::Base, K::Read8,         DP | IX,             I::Lsr), //  56: LSR d,x
    op("EOR", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Eor), //  57: EOR [d],y
    op("CLI", 0, A::Base, K::None,          IMP,                 I::Cli), //  58: CLI
    op("EOR", 2, A::Base, K::Read16,        ABS | IY,            I::Eor), //  59: EOR a,y
    op("PHY", 0, A::Base, K::None,          IMP,                 I::Phy), //  5A: PHY
    op("TCD", 0, A::Base, K::None,          IMP,                 I::Tcd), //  5B: TCD
    lb(op("JML", 3, A::Base, K::Read24,     ABL,                 I::Jml), L::Jump), // 5C
    op("EOR", 2, A::Base, K::Read16,        ABS | IX,            I::Eor), //  5D: EOR a,x
    op("LSR", 2, A::Base, K::Read16,        ABS | IX,            I::Lsr), //  5E: LSR a,x
    op("EOR", 3, A::Base, K::Read24,        ABL | IX,            I::Eor), //  5F: EOR al,x
    op("RTS", 0, A::Base, K::None,          IMP,                 I::Rts), //  60: RTS
    op("ADC", 1, A::Base, K::Read8,         DP | IND | IX,       I::Adc), //  61: ADC (d,x)
    op("PER", 2, A::Base, K::Read16,        PCRL,                I::Per), //  62: PER rl
    op("ADC", 1, A::Base, K::Read8,         SR,                  I::Adc), //  63: ADC d,s
    op("STZ", 1, A::Base, K::Read8,         DP,                  I::Stz), //  64: STZ d
    op("ADC", 1, A::Base, K::Read8,         DP,                  I::Adc), //  65: ADC d
    op("ROR", 1, A::Base, K::Read8,         DP,                  I::Ror), //  66: ROR d
    op("ADC", 1, A::Base, K::Read8,         DP | INDL,           I::Adc), //  67: ADC [d]
    op("PLA", 0, A::Base, K::None,          IMP,                 I::Pla), //  68: PLA
    op("ADC", 1, A::MSet, K::Read8Or16,     IMM,                 I::Adc), //  69: ADC #
    op("ROR", 0, A::Base, K::None,          IMP,                 I::Ror), //  6A: ROR A
    op("RTL", 0, A::Base, K::None,          IMP,                 I::Rtl), //  6B: RTL
    op("JMP", 2, A::Base, K::Read16,        ABS | IND,           I::Jmp), //  6C: JMP (a)
    op("ADC", 2, A::Base, K::Read16,        ABS,                 I::Adc), //  6D: ADC a
    op("ROR", 2, A::Base, K::Read16,        ABS,                 I::Ror), //  6E: ROR a
    op("ADC", 3, A::Base, K::Read24,        ABL,                 I::Adc), //  6F: ADC al
    lb(op("BVS", 1, A::Base, K::Read8,      PCR,                 I::Bvs), L::Branch), // 70
    op("ADC", 1, A::Base, K::Read8,         DP | IND | IY,       I::Adc), //  71: ADC (d),y
    op("ADC", 1, A::Base, K::Read8,         DP | IND,            I::Adc), //  72: ADC (d)
    op("ADC", 1, A::Base, K::Read8,         SR | IND | IY,       I::Adc), //  73: ADC (d,s),y
    op("STZ", 1, A::Base, K::Read8,         DP | IX,             I::Stz), //  74: STZ d,x
    op("ADC", 1, A::Base, K::Read8,         DP | IX,             I::Adc), //  75: ADC d,x
    op("ROR", 1, A::Base, K::Read8,         DP | IX,             I::Ror), //  76: ROR d,x
    op("ADC", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Adc), //  77: ADC [d],y
    op("SEI", 0, A::Base, K::None,          IMP,                 I::Sei), //  78: SEI
    op("ADC", 2, A::Base, K::Read16,        ABS | IY,            I::Adc), //  79: ADC a,y
    op("PLY", 0, A::Base, K::None,          IMP,                 I::Ply), //  7A: PLY
    op("TDC", 0, A::Base, K::None,          IMP,                 I::Tdc), //  7B: TDC
    op("JMP", 2, A::Base, K::Read16,        ABS | IND | IX,      I::Jmp), //  7C: JMP (a,x)
    op("ADC", 2, A::Base, K::Read16,        ABS | IX,            I::Adc), //  7D: ADC a,x
    op("ROR", 2, A::Base, K::Read16,        ABS | IX,            I::Ror), //  7E: ROR a,x
    op("ADC", 3, A::Base, K::Read24,        ABL | IX,            I::Adc), //  7F: ADC al,x
    lb(op("BRA", 1, A::Base, K::Read8,      PCR,                 I::Bra), L::Branch), // 80
    op("STA", 1, A::Base, K::Read8,         DP | IND | IX,       I::Sta), //  81: STA (d,x)
    lb(op("BRL", 2, A::Base, K::Read16,     PCRL,                I::Brl), L::BranchLong), // 82
    op("STA", 1, A::Base, K::Read8,         SR,                  I::Sta), //  83: STA d,s
    op("STY", 1, A::Base, K::Read8,         DP,                  I::Sty), //  84: STY d
    op("STA", 1, A::Base, K::Read8,         DP,                  I::Sta), //  85: STA d
    op("STX", 1, A::Base, K::Read8,         DP,                  I::Stx), //  86: STX d
    op("STA", 1, A::Base, K::Read8,         DP | INDL,           I::Sta), //  87: STA [d]
    op("DEY", 0, A::Base, K::None,          IMP,                 I::Dey), //  88: DEY
    op("BIT", 1, A::MSet, K::Read8Or16,     IMM,                 I::Bit), //  89: BIT #
    op("TXA", 0, A::Base, K::None,          IMP,                 I::Txa), //  8A: TXA
    op("PHB", 0, A::Base, K::None,          IMP,                 I::Phb), //  8B: PHB
    op("STY", 2, A::Base, K::Read16,        ABS,                 I::Sty), //  8C: STY a
    op("STA", 2, A::Base, K::Read16,        ABS,                 I::Sta), //  8D: STA a
    op("STX", 2, A::Base, K::Read16,        ABS,                 I::Stx), //  8E: STX a
    op("STA", 3, A::Base, K::Read24,        ABL,                 I::Sta), //  8F: STA al
    lb(op("BCC", 1, A::Base, K::Read8,      PCR,                 I::Bcc), L::Branch), // 90
    op("STA", 1, A::Base, K::Read8,         DP | IND | IY,       I::Sta), //  91: STA (d),y
    op("STA", 1, A::Base, K::Read8,         DP | IND,            I::Sta), //  92: STA (d)
    op("STA", 1, A::Base, K::Read8,         SR | IND | IY,       I::Sta), //  93: STA (d,s),y
    op("STY", 1, A::Base, K::Read8,         DP | IX,             I::Sty), //  94: STY d,x
    op("STA", 1, A::Base, K::Read8,         DP | IX,             I::Sta), //  95: STA d,x
    op("STX", 1, A::Base, K::Read8,         DP | IY,             I::Stx), //  96: STX d,y
    op("STA", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Sta), //  97: STA [d],y
    op("TYA", 0, A::Base, K::None,          IMP,                 I::Tya), //  98: TYA
    op("STA", 2, A::Base, K::Read16,        ABS | IY,            I::Sta), //  99: STA a,y
    op("TXS", 0, A::Base, K::None,          IMP,                 I::Txs), //  9A: TXS
    op("TXY", 0, A::Base, K::None,          IMP,                 I::Txy), //  9B: TXY
    op("STZ", 2, A::Base, K::Read16,        ABS,                 I::Stz), //  9C: STZ a
    op("STA", 2, A::Base, K::Read16,        ABS | IX,            I::Sta), //  9D: STA a,x
    op("STZ", 2, A::Base, K::Read16,        ABS | IX,            I::Stz), //  9E: STZ a,x
    op("STA", 3, A::Base, K::Read24,        ABL | IX,            I::Sta), //  9F: STA al,x
    op("LDY", 1, A::XSet, K::Read8Or16,     IMM,                 I::Ldy), //  A0: LDY #
    op("LDA", 1, A::Base, K::Read8,         DP | IND | IX,       I::Lda), //  A1: LDA (d,x)
    op("LDX", 1, A::XSet, K::Read8Or16,     IMM,                 I::Ldx), //  A2: LDX #
    op("LDA", 1, A::Base, K::Read8,         SR,                  I::Lda), //  A3: LDA d,s
    op("LDY", 1, A::Base, K::Read8,         DP,                  I::Ldy), //  A4: LDY d
    op("LDA", 1, A::Base, K::Read8,         DP,                  I::Lda), //  A5: LDA d
    op("LDX", 1, A::Base, K::Read8,         DP,                  I::Ldx), //  A6: LDX d
    op("LDA", 1, A::Base, K::Read8,         DP | INDL,           I::Lda), //  A7: LDA [d]
    op("TAY", 0, A::Base, K::None,          IMP,                 I::Tay), //  A8: TAY
    op("LDA", 1, A::MSet, K::Read8Or16,     IMM,                 I::Lda), //  A9: LDA #
    op("TAX", 0, A::Base, K::None,          IMP,                 I::Tax), //  AA: TAX
    op("PLB", 0, A::Base, K::None,          IMP,                 I::Plb), //  AB: PLB
    op("LDY", 2, A::Base, K::Read16,        ABS,                 I::Ldy), //  AC: LDY a
    op("LDA", 2, A::Base, K::Read16,        ABS,                 I::Lda), //  AD: LDA a
    op("LDX", 2, A::Base, K::Read16,        ABS,                 I::Ldx), //  AE: LDX a
    op("LDA", 3, A::Base, K::Read24,        ABL,                 I::Lda), //  AF: LDA al
    lb(op("BCS", 1, A::Base, K::Read8,      PCR,                 I::Bcs), L::Branch), // B0
    op("LDA", 1, A::Base, K::Read8,         DP | IND | IY,       I::Lda), //  B1: LDA (d),y
    op("LDA", 1, A::Base, K::Read8,         DP | IND,            I::Lda), //  B2: LDA (d)
    op("LDA", 1, A::Base, K::Read8,         SR | IND | IY,       I::Lda), //  B3: LDA (d,s),y
    op("LDY", 1, A::Base, K::Read8,         DP | IX,             I::Ldy), //  B4: LDY d,x
    op("LDA", 1, A::Base, K::Read8,         DP | IX,             I::Lda), //  B5: LDA d,x
    op("LDX", 1, A::Base, K::Read8,         DP | IY,             I::Ldx), //  B6: LDX d,y
    op("LDA", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Lda), //  B7: LDA [d],y
    op("CLV", 0, A::Base, K::None,          IMP,                 I::Clv), //  B8: CLV
    op("LDA", 2, A::Base, K::Read16,        ABS | IY,            I::Lda), //  B9: LDA a,y
    op("TSX", 0, A::Base, K::None,          IMP,                 I::Tsx), //  BA: TSX
    op("TYX", 0, A::Base, K::None,          IMP,                 I::Tyx), //  BB: TYX
    op("LDY", 2, A::Base, K::Read16,        ABS | IX,            I::Ldy), //  BC: LDY a,x
    op("LDA", 2, A::Base, K::Read16,        ABS | IX,            I::Lda), //  BD: LDA a,x
    op("LDX", 2, A::Base, K::Read16,        ABS | IY,            I::Ldx), //  BE: LDX a,y
    op("LDA", 3, A::Base, K::Read24,        ABL | IX,            I::Lda), //  BF: LDA al,x
    op("CPY", 1, A::XSet, K::Read8Or16,     IMM,                 I::Cpy), //  C0: CPY #
    op("CMP", 1, A::Base, K::Read8,         DP | IND | IX,       I::Cmp), //  C1: CMP (d,x)
    st(op("REP", 1, A::Base, K::Read8,      IMM,                 I::Rep), S::Rep), // C2
    op("CMP", 1, A::Base, K::Read8,         SR,                  I::Cmp), //  C3: CMP d,s
    op("CPY", 1, A::Base, K::Read8,         DP,                  I::Cpy), //  C4: CPY d
    op("CMP", 1, A::Base, K::Read8,         DP,                  I::Cmp), //  C5: CMP d
    op("DEC", 1, A::Base, K::Read8,         DP,                  I::Dec), //  C6: DEC d
    op("CMP", 1, A::Base, K::Read8,         DP | INDL,           I::Cmp), //  C7: CMP [d]
    op("INY", 0, A::Base, K::None,          IMP,                 I::Iny), //  C8: INY
    op("CMP", 1, A::MSet, K::Read8Or16,     IMM,                 I::Cmp), //  C9: CMP #
    op("DEX", 0, A::Base, K::None,          IMP,                 I::Dex), //  CA: DEX
    op("WAI", 0, A::Base, K::None,          IMP,                 I::Wai), //  CB: WAI
    op("CPY", 2, A::Base, K::Read16,        ABS,                 I::Cpy), //  CC: CPY a
    op("CMP", 2, A::Base, K::Read16,        ABS,                 I::Cmp), //  CD: CMP a
    op("DEC", 2, A::Base, K::Read16,        ABS,                 I::Dec), //  CE: DEC a
    op("CMP", 3, A::Base, K::Read24,        ABL,                 I::Cmp), //  CF: CMP al
    lb(op("BNE", 1, A::Base, K::Read8,      PCR,                 I::Bne), L::Branch), // D0
    op("CMP", 1, A::Base, K::Read8,         DP | IND | IY,       I::Cmp), //  D1: CMP (d),y
    op("CMP", 1, A::Base, K::Read8,         DP | IND,            I::Cmp), //  D2: CMP (d)
    op("CMP", 1, A::Base, K::Read8,         SR | IND | IY,       I::Cmp), //  D3: CMP (d,s),y
    op("PEI", 1, A::Base, K::Read8,         DP | IND,            I::Pei), //  D4: PEI (d)
    op("CMP", 1, A::Base, K::Read8,         DP | IX,             I::Cmp), //  D5: CMP d,x
    op("DEC", 1, A::Base, K::Read8,         DP | IX,             I::Dec), //  D6: DEC d,x
    op("CMP", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Cmp), //  D7: CMP [d],y
    op("CLD", 0, A::Base, K::None,          IMP,                 I::Cld), //  D8: CLD
    op("CMP", 2, A::Base, K::Read16,        ABS | IY,            I::Cmp), //  D9: CMP a,y
    op("PHX", 0, A::Base, K::None,          IMP,                 I::Phx), //  DA: PHX
    op("STP", 0, A::Base, K::None,          IMP,                 I::Stp), //  DB: STP
    op("JML", 2, A::Base, K::Read16,        ABS | INDL,          I::Jml), //  DC: JML [a]
    op("CMP", 2, A::Base, K::Read16,        ABS | IX,            I::Cmp), //  DD: CMP a,x
    op("DEC", 2, A::Base, K::Read16,        ABS | IX,            I::Dec), //  DE: DEC a,x
    op("CMP", 3, A::Base, K::Read24,        ABL | IX,            I::Cmp), //  DF: CMP al,x
    op("CPX", 1, A::XSet, K::Read8Or16,     IMM,                 I::Cpx), //  E0: CPX #
    op("SBC", 1, A::Base, K::Read8,         DP | IND | IX,       I::Sbc), //  E1: SBC (d,x)
    st(op("SEP", 1, A::Base, K::Read8,      IMM,                 I::Sep), S::Sep), // E2
    op("SBC", 1, A::Base, K::Read8,         SR,                  I::Sbc), //  E3: SBC d,s
    op("CPX", 1, A::Base, K::Read8,         DP,                  I::Cpx), //  E4: CPX d
    op("SBC", 1, A::Base, K::Read8,         DP,                  I::Sbc), //  E5: SBC d
    op("INC", 1, A::Base, K::Read8,         DP,                  I::Inc), //  E6: INC d
    op("SBC", 1, A::Base, K::Read8,         DP | INDL,           I::Sbc), //  E7: SBC [d]
    op("INX", 0, A::Base, K::None,          IMP,                 I::Inx), //  E8: INX
    op("SBC", 1, A::MSet, K::Read8Or16,     IMM,                 I::Sbc), //  E9: SBC #
    op("NOP", 0, A::Base, K::None,          IMP,                 I::Nop), //  EA: NOP
    op("XBA", 0, A::Base, K::None,          IMP,                 I::Xba), //  EB: XBA
    op("CPX", 2, A::Base, K::Read16,        ABS,                 I::Cpx), //  EC: CPX a
    op("SBC", 2, A::Base, K::Read16,        ABS,                 I::Sbc), //  ED: SBC a
    op("INC", 2, A::Base, K::Read16,        ABS,                 I::Inc), //  EE: INC a
    op("SBC", 3, A::Base, K::Read24,        ABL,                 I::Sbc), //  EF: SBC al
    lb(op("BEQ", 1, A::Base, K::Read8,      PCR,                 I::Beq), L::Branch), // F0
    op("SBC", 1, A::Base, K::Read8,         DP | IND | IY,       I::Sbc), //  F1: SBC (d),y
    op("SBC", 1, A::Base, K::Read8,         DP | IND,            I::Sbc), //  F2: SBC (d)
    op("SBC", 1, A::Base, K::Read8,         SR | IND | IY,       I::Sbc), //  F3: SBC (d,s),y
    op("PEA", 2, A::Base, K::Read16,        ABS,                 I::Pea), //  F4: PEA a
    op("SBC", 1, A::Base, K::Read8,         DP | IX,             I::Sbc), //  F5: SBC d,x
    op("INC", 1, A::Base, K::Read8,         DP | IX,             I::Inc), //  F6: INC d,x
    op("SBC", 1, A::Base, K::Read8,         DP | INDL | IY,      I::Sbc), //  F7: SBC [d],y
    op("SED", 0, A::Base, K::None,          IMP,                 I::Sed), //  F8: SED
    op("SBC", 2, A::Base, K::Read16,        ABS | IY,            I::Sbc), //  F9: SBC a,y
    op("PLX", 0, A::Base, K::None,          IMP,                 I::Plx), //  FA: PLX
    st(op("XCE", 0, A::Base, K::None,       IMP,                 I::Xce), S::Xce), // FB
    op("JSR", 2, A::Base, K::Read16,        ABS | IND | IX,      I::Jsr), //  FC: JSR (a,x)
    op("SBC", 2, A::Base, K::Read16,        ABS | IX,            I::Sbc), //  FD: SBC a,x
    op("INC", 2, A::Base, K::Read16,        ABS | IX,            I::Inc), //  FE: INC a,x
    op("SBC", 3, A::Base, K::Read24,        ABL | IX,            I::Sbc), //  FF: SBC al,x
];

// Every opcode byte must decode; there are no undefined positions.
const _: () = assert!(OPCODES.len() == 256);

/// Minimum cycle cost per opcode (the W65C816 data-sheet column with all
/// conditional additions at zero). Branches add one when taken; MVN/MVP
/// cost seven cycles per byte moved instead of their table entry.
#[rustfmt::skip]
pub(crate) static MIN_CYCLES: [u8; 256] = [
    7,6,7,4,5,3,5,6, 3,2,2,4,6,4,6,5,   // $00 - $0f
    2,5,5,7,5,4,6,6, 2,4,2,2,6,4,7,5,   // $10 - $1f
    6,6,8,4,3,3,5,6, 4,2,2,5,4,4,6,5,   // $20 - $2f
    2,5,5,7,4,4,6,6, 2,4,2,2,4,4,7,5,   // $30 - $3f
    7,6,2,4,7,3,5,6, 3,2,2,3,3,4,6,5,   // $40 - $4f
    2,5,5,7,7,4,6,6, 2,4,3,2,4,4,7,5,   // $50 - $5f
    7,6,6,4,3,3,5,6, 4,2,2,6,5,4,6,5,   // $60 - $6f
    2,5,5,7,4,4,6,6, 2,4,4,2,6,2,7,5,   // $70 - $7f
    2,6,3,4,3,3,3,2, 2,2,2,3,4,4,4,5,   // $80 - $8f
    2,6,5,7,4,4,4,6, 2,5,2,2,3,5,5,5,   // $90 - $9f
    2,6,2,4,3,3,3,6, 2,2,2,4,4,4,4,5,   // $a0 - $af
    2,5,5,7,4,4,4,6, 2,4,2,2,4,4,4,5,   // $b0 - $bf
    2,6,3,4,3,3,5,6, 2,2,2,3,4,4,6,5,   // $c0 - $cf
    2,5,5,7,6,4,6,6, 2,4,3,3,6,4,7,5,   // $d0 - $df
    2,6,3,4,3,3,5,6, 2,2,2,3,4,4,6,5,   // $e0 - $ef
    2,5,5,7,5,4,6,6, 2,4,4,2,6,4,7,5,   // $f0 - $ff
];

impl Opcode {
    /// Effective operand byte count for the given register state.
    #[must_use]
    pub fn operand_size(&self, regs: &crate::Registers) -> u8 {
        match self.size_adjust {
            SizeAdjust::Base => self.base_size,
            SizeAdjust::MSet => {
                if regs.acc_is_8bit() {
                    self.base_size
                } else {
                    self.base_size + 1
                }
            }
            SizeAdjust::XSet => {
                if regs.index_is_8bit() {
                    self.base_size
                } else {
                    self.base_size + 1
                }
            }
        }
    }
}
