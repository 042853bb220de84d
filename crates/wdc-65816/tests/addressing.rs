//! Effective-address resolution tests, one addressing mode at a time.

use emu_core::SimpleBus;
use wdc_65816::Wdc65816;

/// Load a program at $8000 in bank 0 and point PC there.
fn setup_program(bus: &mut SimpleBus, cpu: &mut Wdc65816, program: &[u8]) {
    bus.load(0x8000, program);
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0;
}

/// CLC; XCE to reach native mode.
fn enter_native(cpu: &mut Wdc65816, bus: &mut SimpleBus) {
    bus.load(0x0200, &[0x18, 0xFB]);
    cpu.regs.pc = 0x0200;
    cpu.step(bus);
    cpu.step(bus);
}

#[test]
fn absolute_uses_data_bank() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    cpu.regs.dbr = 0x02;
    bus.load(0x02_1000, &[0x77]);

    // LDA $1000
    setup_program(&mut bus, &mut cpu, &[0xAD, 0x00, 0x10]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x77);
}

#[test]
fn absolute_indexed_adds_index_within_bank() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.x = 0x10;
    cpu.regs.y = 0x20;
    bus.load(0x1010, &[0xAA]);
    bus.load(0x1020, &[0xBB]);

    // LDA $1000,X; then LDA $1000,Y
    setup_program(&mut bus, &mut cpu, &[0xBD, 0x00, 0x10, 0xB9, 0x00, 0x10]);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a & 0xFF, 0xAA);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a & 0xFF, 0xBB);
}

#[test]
fn direct_page_indexed_wraps_at_16_bits() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.d = 0xFFF0;
    cpu.regs.x = 0x20;
    // (D + d + X) & 0xFFFF = (0xFFF0 + 0x10 + 0x20) & 0xFFFF = 0x0020
    bus.load(0x0020, &[0x42]);

    // LDA $10,X
    setup_program(&mut bus, &mut cpu, &[0xB5, 0x10]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x42);
}

#[test]
fn dp_indexed_indirect_indexes_before_the_pointer() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.x = 0x04;
    bus.load(0x0014, &[0x00, 0x30]); // pointer at d+X -> $3000
    bus.load(0x3000, &[0x55]);

    // LDA ($10,X)
    setup_program(&mut bus, &mut cpu, &[0xA1, 0x10]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x55);
}

#[test]
fn dp_indirect_long_carries_its_own_bank() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    bus.load(0x0010, &[0x00, 0x40, 0x02]); // 24-bit pointer -> $02:4000
    bus.load(0x02_4000, &[0x99]);

    // LDA [$10]
    setup_program(&mut bus, &mut cpu, &[0xA7, 0x10]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x99);
}

#[test]
fn dp_indirect_long_indexed_adds_y_to_the_address_only() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    cpu.regs.y = 0x03;
    bus.load(0x0010, &[0xFE, 0xFF, 0x02]); // pointer -> $02:FFFE
    // $02:FFFE + 3 wraps inside bank 2 to $02:0001
    bus.load(0x02_0001, &[0x66]);

    // LDA [$10],Y
    setup_program(&mut bus, &mut cpu, &[0xB7, 0x10]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x66, "bank byte unchanged by indexing");
}

#[test]
fn stack_relative_reads_above_the_stack_pointer() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.s = 0x01F0;
    bus.load(0x01F4, &[0x3C]);

    // LDA $04,S
    setup_program(&mut bus, &mut cpu, &[0xA3, 0x04]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x3C);
}

#[test]
fn stack_relative_indirect_indexed() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.s = 0x01F0;
    cpu.regs.y = 0x02;
    bus.load(0x01F4, &[0x00, 0x30]); // pointer at S+4 -> $3000
    bus.load(0x3002, &[0x21]);

    // LDA ($04,S),Y
    setup_program(&mut bus, &mut cpu, &[0xB3, 0x04]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x21);
}

#[test]
fn absolute_long_ignores_data_bank() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    cpu.regs.dbr = 0x01; // would point elsewhere
    bus.load(0x02_3456, &[0x88]);

    // LDA $023456
    setup_program(&mut bus, &mut cpu, &[0xAF, 0x56, 0x34, 0x02]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x88);
}

#[test]
fn absolute_long_indexed() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    cpu.regs.x = 0x10;
    bus.load(0x02_3466, &[0x44]);

    // LDA $023456,X
    setup_program(&mut bus, &mut cpu, &[0xBF, 0x56, 0x34, 0x02]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a & 0xFF, 0x44);
}

#[test]
fn jmp_absolute_indirect_fetches_pointer_from_bank_0() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    bus.load(0x0300, &[0x00, 0x90]); // pointer -> $9000

    // JMP ($0300)
    setup_program(&mut bus, &mut cpu, &[0x6C, 0x00, 0x03]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x9000);
    assert_eq!(cpu.regs.pbr, 0x00);
}

#[test]
fn jmp_indexed_indirect_fetches_pointer_from_program_bank() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.x = 0x02;
    bus.load(0x0302, &[0x34, 0x12]); // pointer at a+X -> $1234

    // JMP ($0300,X)
    setup_program(&mut bus, &mut cpu, &[0x7C, 0x00, 0x03]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x1234);
}

#[test]
fn jml_absolute_indirect_long_switches_bank() {
    let mut bus = SimpleBus::with_banks(3);
    let mut cpu = Wdc65816::new();
    bus.load(0x0300, &[0x00, 0x90, 0x02]); // pointer -> $02:9000

    // JML [$0300]
    setup_program(&mut bus, &mut cpu, &[0xDC, 0x00, 0x03]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pbr, 0x02);
    assert_eq!(cpu.regs.pc, 0x9000);
}

#[test]
fn jml_absolute_long() {
    let mut bus = SimpleBus::with_banks(2);
    let mut cpu = Wdc65816::new();

    // JML $019000
    setup_program(&mut bus, &mut cpu, &[0x5C, 0x00, 0x90, 0x01]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pbr, 0x01);
    assert_eq!(cpu.regs.pc, 0x9000);
}

#[test]
fn brl_takes_a_signed_16_bit_displacement() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();

    // BRL -3: lands on the BRL's own operand low byte
    setup_program(&mut bus, &mut cpu, &[0x82, 0xFD, 0xFF]);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x8000, "PC past operand plus -3");
}

#[test]
fn per_pushes_a_pc_relative_address() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();

    // PER $0010: pushes PC-after-operand + $10 = $8013
    setup_program(&mut bus, &mut cpu, &[0x62, 0x10, 0x00]);
    cpu.step(&mut bus);

    assert_eq!(bus.peek(0x01FF), 0x80);
    assert_eq!(bus.peek(0x01FE), 0x13);
}

#[test]
fn pei_pushes_the_pointer_at_the_dp_address() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    bus.load(0x0030, &[0xCD, 0xAB]);

    // PEI ($30)
    setup_program(&mut bus, &mut cpu, &[0xD4, 0x30]);
    cpu.step(&mut bus);

    assert_eq!(bus.peek(0x01FF), 0xAB);
    assert_eq!(bus.peek(0x01FE), 0xCD);
}

#[test]
fn index_width_limits_effective_index() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    enter_native(&mut cpu, &mut bus);

    // REP #$10; LDX #$0110; SEP #$10; LDA $2000,X
    // After SEP the index is 8-bit: only $10 of X remains.
    setup_program(
        &mut bus,
        &mut cpu,
        &[0xC2, 0x10, 0xA2, 0x10, 0x01, 0xE2, 0x10, 0xBD, 0x00, 0x20],
    );
    bus.load(0x2010, &[0x5E]);
    bus.load(0x2110, &[0xE5]);

    for _ in 0..4 {
        cpu.step(&mut bus);
    }

    assert_eq!(cpu.regs.a & 0xFF, 0x5E, "narrowed X indexes by its low byte");
}

#[test]
fn ldx_sty_direct_page_indexed_y_and_x() {
    let mut bus = SimpleBus::new();
    let mut cpu = Wdc65816::new();
    cpu.regs.y = 0x04;
    bus.load(0x0024, &[0x31]);

    // LDX $20,Y; STX $40
    setup_program(&mut bus, &mut cpu, &[0xB6, 0x20, 0x86, 0x40]);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.x, 0x31);
    cpu.step(&mut bus);
    assert_eq!(bus.peek(0x0040), 0x31);
}
