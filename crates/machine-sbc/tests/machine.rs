//! End-to-end machine tests: programs in ROM driving the peripherals
//! through the bus.

use std::cell::RefCell;
use std::rc::Rc;

use machine_sbc::Machine;
use mos_acia_6551::SerialHost;
use wdc_65816::status;

// ACIA registers on the default board
const ACIA_DATA: u32 = 0x7F80;
const ACIA_STATUS: u32 = 0x7F81;
const ACIA_CONTROL: u32 = 0x7F83;

// VIA registers on the default board
const VIA_T1CL: u32 = 0x7FC4;
const VIA_T1CH: u32 = 0x7FC5;
const VIA_IER: u32 = 0x7FCE;

/// Machine with `program` in ROM at $8000 and the reset vector
/// pointing there, already reset.
fn machine_with_program(program: &[u8]) -> Machine {
    let mut machine = Machine::new();
    machine.load_rom(program, 0x8000);
    machine.load_rom(&[0x00, 0x80], 0xFFFC);
    machine.reset();
    machine
}

#[test]
fn reset_fetches_vector_in_emulation_mode() {
    let machine = machine_with_program(&[0xEA]);
    assert_eq!(machine.cpu().regs.pc, 0x8000);
    assert_eq!(machine.cpu().regs.s, 0x01FF);
    assert!(machine.cpu().regs.emulation);
    assert!(machine.cpu().regs.interrupts_disabled());
}

#[test]
fn mode_switch_sequence() {
    // CLC; XCE; REP #$30 (scenario: enter native, go 16/16)
    let mut machine = machine_with_program(&[0x18, 0xFB, 0xC2, 0x30, 0xDB]);
    machine.run_until_halt(10);

    let regs = &machine.cpu().regs;
    assert!(!regs.emulation);
    assert!(regs.p.is_set(status::C), "old E swapped into carry");
    assert!(!regs.p.is_set(status::M), "M clear");
    assert!(!regs.p.is_set(status::X), "X clear");
    assert_eq!(regs.s & 0xFF00, 0x0100, "SP high byte preserved");
}

#[test]
fn sixteen_bit_store_lands_little_endian() {
    // CLC; XCE; REP #$30; LDA #$1234; STA $2000; STP
    let mut machine = machine_with_program(&[
        0x18, 0xFB, 0xC2, 0x30, 0xA9, 0x34, 0x12, 0x8D, 0x00, 0x20, 0xDB,
    ]);
    machine.run_until_halt(10);

    assert_eq!(machine.read_byte(0x2000), 0x34);
    assert_eq!(machine.read_byte(0x2001), 0x12);
    assert!(!machine.cpu().regs.p.is_set(status::N), "N clear");
    assert!(!machine.cpu().regs.p.is_set(status::Z), "Z clear");
}

#[test]
fn stack_discipline_emulation_and_native() {
    // Emulation: LDA #$7E; PHA
    let mut machine = machine_with_program(&[0xA9, 0x7E, 0x48, 0xDB]);
    machine.run_until_halt(10);
    assert_eq!(machine.read_byte(0x01FF), 0x7E);
    assert_eq!(machine.cpu().regs.s, 0x01FE);

    // Native 16-bit: CLC; XCE; REP #$20; LDA #$1234; PHA; PLA
    let mut machine = machine_with_program(&[
        0x18, 0xFB, 0xC2, 0x20, 0xA9, 0x34, 0x12, 0x48, 0xA9, 0x00, 0x00, 0x68, 0xDB,
    ]);
    machine.run_until_halt(10);
    assert_eq!(machine.cpu().regs.a, 0x1234, "PLA restored 16 bits");
    assert_eq!(machine.cpu().regs.s, 0x01FF);
}

#[test]
fn block_move_forward() {
    // CLC; XCE; REP #$30; LDA #$0007; LDX #$1000; LDY #$2000;
    // MVN $00,$00; STP
    let mut machine = machine_with_program(&[
        0x18, 0xFB, 0xC2, 0x30, 0xA9, 0x07, 0x00, 0xA2, 0x00, 0x10, 0xA0, 0x00, 0x20, 0x54,
        0x00, 0x00, 0xDB,
    ]);
    let source = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    for (i, &byte) in source.iter().enumerate() {
        machine.write_byte(0x1000 + i as u32, byte);
    }

    machine.run_until_halt(10);

    for (i, &byte) in source.iter().enumerate() {
        assert_eq!(machine.read_byte(0x2000 + i as u32), byte);
    }
    let regs = &machine.cpu().regs;
    assert_eq!(regs.x, 0x1008);
    assert_eq!(regs.y, 0x2008);
    assert_eq!(regs.a, 0xFFFF);
    assert_eq!(regs.dbr, 0x00);
}

#[test]
fn peripherals_clock_by_retired_cycles() {
    // 5 NOPs (2 cycles each) then STP (3 cycles)
    let mut machine = machine_with_program(&[0xEA, 0xEA, 0xEA, 0xEA, 0xEA, 0xDB]);
    machine.write_byte(VIA_T1CL, 0x00);
    machine.write_byte(VIA_T1CH, 0x10); // start T1 at $1000

    let mut cycles = 0;
    for _ in 0..6 {
        cycles += machine.step().cycles;
    }

    let t1 = machine.read_word(VIA_T1CL);
    assert_eq!(u32::from(0x1000 - t1), cycles, "timer tracked every cycle");
}

struct RecordingHost {
    transmitted: Rc<RefCell<Vec<u8>>>,
}

impl SerialHost for RecordingHost {
    fn byte_transmitted(&mut self, byte: u8) {
        self.transmitted.borrow_mut().push(byte);
    }
}

#[test]
fn acia_round_trip_through_the_bus() {
    // LDA #$41; STA $7F80; then burn cycles until the byte shifts out
    let mut program = vec![0xA9, 0x41, 0x8D, 0x80, 0x7F];
    program.extend(std::iter::repeat(0xEA).take(1100)); // > 2000 cycles
    program.push(0xDB);

    let mut machine = machine_with_program(&program);
    machine.write_byte(ACIA_CONTROL, 0x1E); // 9600 baud, 8 data bits

    let transmitted = Rc::new(RefCell::new(Vec::new()));
    machine.set_serial_host(Box::new(RecordingHost {
        transmitted: Rc::clone(&transmitted),
    }));

    machine.run_until_halt(2000);
    assert_eq!(*transmitted.borrow(), vec![0x41], "host saw the byte");

    // Receive side: host pushes a byte, program reads it
    machine.acia_mut().receive_byte(0x58);
    assert_ne!(machine.read_byte(ACIA_STATUS) & 0x08, 0, "RDRF set");
    assert_eq!(machine.read_byte(ACIA_DATA), 0x58);
    assert_eq!(machine.read_byte(ACIA_STATUS) & 0x08, 0, "RDRF cleared");
}

#[test]
fn wai_stalls_until_via_timer_interrupt() {
    // CLC; XCE; CLI; WAI; handler = NOP at $8004
    let mut machine = machine_with_program(&[0x18, 0xFB, 0x58, 0xCB, 0xEA]);
    machine.load_rom(&[0x04, 0x80], 0xFFEE); // native IRQ vector

    machine.write_byte(VIA_IER, 0xC0); // enable T1 interrupt
    machine.write_byte(VIA_T1CL, 50);
    machine.write_byte(VIA_T1CH, 0); // start T1

    machine.step(); // CLC
    machine.step(); // XCE
    machine.step(); // CLI
    assert_eq!(machine.cpu().regs.pc, 0x8003);

    let result = machine.step(); // WAI: stalls, then vectors
    assert_eq!(machine.cpu().regs.pc, 0x8004, "PC at the handler");
    assert!(machine.cpu().regs.interrupts_disabled());
    assert!(!machine.cpu().is_waiting());
    assert!(
        result.cycles >= 40 && result.cycles <= 60,
        "waited out the timer ({} cycles)",
        result.cycles
    );
}

#[test]
fn cpu_reads_usb_byte_through_board_fifo() {
    // Configure the board FIFO VIA, strobe RD#, read the bus byte and
    // park it in RAM at $0200.
    let mut machine = machine_with_program(&[
        0xA9, 0x01, // LDA #$01
        0x8D, 0xE0, 0x7F, // STA $7FE0 (ORB: RD# high, WR low, idle)
        0xA9, 0x03, // LDA #$03
        0x8D, 0xE2, 0x7F, // STA $7FE2 (DDRB: RD#/WR outputs)
        0xA9, 0x00, // LDA #$00
        0x8D, 0xE3, 0x7F, // STA $7FE3 (DDRA: bus inputs)
        0x8D, 0xE0, 0x7F, // STA $7FE0 (ORB: RD# low, start read)
        0xEA, 0xEA, // wait out the FIFO latency
        0xAD, 0xE1, 0x7F, // LDA $7FE1 (Port A: the data bus)
        0x8D, 0x00, 0x02, // STA $0200
        0xA9, 0x01, // LDA #$01
        0x8D, 0xE0, 0x7F, // STA $7FE0 (release RD#)
        0xDB, // STP
    ]);

    machine.board_fifo_mut().usb_send_to_cpu(0x5A);
    machine.run_until_halt(32);

    assert_eq!(machine.read_byte(0x0200), 0x5A);
    assert_eq!(machine.board_fifo().rx_count(), 0, "FIFO byte consumed");
}

#[test]
fn open_bus_reads_ff() {
    let mut machine = Machine::new();
    assert_eq!(machine.read_byte(0x03_1234), 0xFF, "absent bank");
    assert_eq!(machine.read_byte(0x7F90), 0xFF, "gap between devices");
}

#[test]
fn stp_halts_and_run_until_halt_stops() {
    let mut machine = machine_with_program(&[0xEA, 0xDB, 0xEA]);
    let steps = machine.run_until_halt(100);
    assert_eq!(steps, 2, "NOP and STP, then halt observed");
    assert!(machine.cpu().is_halted());
}

#[test]
fn intel_hex_load_round_trips() {
    let mut machine = Machine::new();
    // Four bytes at $8000
    let summary = machine
        .load_ihex(":048000000102030472\n:00000001FF\n")
        .expect("valid image");
    assert_eq!(summary.bytes_loaded, 4);
    assert!(summary.warnings.is_empty());

    for (i, expected) in [1u8, 2, 3, 4].iter().enumerate() {
        assert_eq!(machine.read_byte(0x8000 + i as u32), *expected);
    }
}

#[test]
fn intel_hex_checksum_mismatch_warns_but_loads() {
    let mut machine = Machine::new();
    let summary = machine
        .load_ihex(":048000000102030400\n:00000001FF\n")
        .expect("parses");
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(machine.read_byte(0x8000), 0x01, "data still applied");
}

#[test]
fn srec_load_sets_entry_point() {
    let mut machine = Machine::new();
    // Two bytes at $8000, entry point $8000
    let summary = machine
        .load_srec("S10580000102 77\nS9038000 7C\n".replace(' ', "").as_str())
        .expect("valid image");
    assert_eq!(summary.entry_point, Some(0x8000));
    assert_eq!(machine.cpu().regs.pc, 0x8000);
    assert_eq!(machine.read_byte(0x8000), 0x01);
    assert_eq!(machine.read_byte(0x8001), 0x02);
}

#[test]
fn snapshot_restores_machine_state() {
    let mut machine = machine_with_program(&[0xA9, 0x11, 0xA9, 0x22, 0xA9, 0x33, 0xDB]);
    machine.step(); // LDA #$11
    let snapshot = machine.snapshot();

    machine.run_until_halt(10);
    assert_eq!(machine.cpu().regs.a & 0xFF, 0x33);

    machine.restore(&snapshot).expect("same layout");
    assert_eq!(machine.cpu().regs.a & 0xFF, 0x11);
    assert_eq!(machine.cpu().regs.pc, 0x8002);
    assert!(!machine.cpu().is_halted());

    // Replay from the restore point reaches the same end state
    machine.run_until_halt(10);
    assert_eq!(machine.cpu().regs.a & 0xFF, 0x33);
}
