//! Opcode byte -> handler dispatch.
//!
//! The source registers handlers into a 128-entry table keyed by the
//! 7-bit opcode (`MAP_OPCODE(byte, ...)`, `byte >> 1` as the index);
//! several of those registration call sites are copy-paste bugs in the
//! source (duplicate bytes, a skipped slot). This match reconstructs
//! the intended table from the distilled spec's prose opcode map; see
//! `DESIGN.md`'s "Opcode table reconstruction" entry for the specific
//! slots that needed resolving and why.
//!
//! Full table (raw top byte, matching the spec's hex listing):
//!
//! ALU family: `22` XOR, `24`/`c4` SUB (plain/carry), `26` AND, `2a` OR,
//! `2c`/`cc` ADD (plain/carry), `32`/`34`/`36`/`3a`/`3c` same five with
//! an immediate operand, `ec` ADD-imm with mode toggle (return-from-ISR
//! companion for opcodes that need to resume user execution inline).
//! Conditional ADD family: `20`/`30` if ZERO, `40`/`50` if not ZERO,
//! `60`/`70` if NEGATIVE, `80`/`90` if not(NEGATIVE|ZERO), `a0`/`b0` if
//! CARRY, `c0`/`d0` if OVERFLOW (each pair is plain/immediate).
//!
//! Memory family, kernel-only: `42`/`44` data word load (plain/imm),
//! `46`/`48` data word store (plain/imm), `4a`/`4c` code word load
//! (plain/imm), `4e`/`6e` code word store (plain/imm), `b2`/`bc` data
//! byte load unsigned (plain/imm), `b6`/`b8` data byte load signed
//! (plain/imm), `ba`/`b4` data byte store (plain/imm — `b4` carries the
//! store-immediate slot rather than continuing the otherwise-contiguous
//! load run, matching the literal scenario that names `0xb4` a store).
//!
//! Memory family, user-capable: `72`/`74` data word load (plain/imm),
//! `76`/`78` data word store (plain/imm), `7a`/`7c` data byte load
//! unsigned (plain/imm), `7e`/`8e` data byte load signed (plain/imm —
//! `80` is already the conditional-ALU "if not(NEGATIVE|ZERO)" slot, so
//! the signed-immediate load takes the spare `8e` byte instead of
//! continuing the otherwise-contiguous run), `82`/`84` data byte store
//! (plain/imm), `86`/`88` code word load (plain/imm), `8a`/`8c` code
//! word store (plain/imm).
//!
//! Atomic test-and-set: `6c`.
//!
//! Special-register read (trap in user mode except where noted):
//! `e0` status, `e2` cause, `e4` exc_addr, `e6` eret, `e8` eret with
//! mode-toggle (return-from-interrupt), `ea` context.
//!
//! Special-register write (always kernel-only): `f2` ptb, `f4` timer
//! (immediate), `f6` isr, `f8` status.
//!
//! Mode: `f0` enters user mode. Page-table write: `fa` code PTE, `fc`
//! data PTE. `00` is the explicit no-op. Every other byte traps
//! `ILL_INST`.

use mpce_core::InterruptSignal;

use super::{alu, mem, special_ops};
use crate::cpu::Cpu;

#[allow(clippy::too_many_lines)]
pub fn dispatch(cpu: &mut Cpu, opcode_byte: u8, x: usize, y: usize, z: usize) {
    match opcode_byte {
        0x00 => {}

        // ALU family.
        0x22 => alu::execute(cpu, &alu::XOR, x, y, z),
        0x24 => alu::execute(cpu, &alu::SUB, x, y, z),
        0xc4 => alu::execute(cpu, &alu::SUB_CARRY, x, y, z),
        0x26 => alu::execute(cpu, &alu::AND, x, y, z),
        0x2a => alu::execute(cpu, &alu::OR, x, y, z),
        0x2c => alu::execute(cpu, &alu::ADD, x, y, z),
        0xcc => alu::execute(cpu, &alu::ADD_CARRY, x, y, z),
        0x32 => alu::execute(cpu, &alu::XOR_IMM, x, y, z),
        0x34 => alu::execute(cpu, &alu::SUB_IMM, x, y, z),
        0x36 => alu::execute(cpu, &alu::AND_IMM, x, y, z),
        0x3a => alu::execute(cpu, &alu::OR_IMM, x, y, z),
        0x3c => alu::execute(cpu, &alu::ADD_IMM, x, y, z),
        0xec => alu::execute(cpu, &alu::ADD_IMM_TOGGLE_MODE, x, y, z),

        0x20 => alu::execute(cpu, &alu::ADD_IF_ZERO, x, y, z),
        0x30 => alu::execute(cpu, &alu::ADD_IF_ZERO_IMM, x, y, z),
        0x40 => alu::execute(cpu, &alu::ADD_IF_NOT_ZERO, x, y, z),
        0x50 => alu::execute(cpu, &alu::ADD_IF_NOT_ZERO_IMM, x, y, z),
        0x60 => alu::execute(cpu, &alu::ADD_IF_NEGATIVE, x, y, z),
        0x70 => alu::execute(cpu, &alu::ADD_IF_NEGATIVE_IMM, x, y, z),
        0x80 => alu::execute(cpu, &alu::ADD_IF_POSITIVE, x, y, z),
        0x90 => alu::execute(cpu, &alu::ADD_IF_POSITIVE_IMM, x, y, z),
        0xa0 => alu::execute(cpu, &alu::ADD_IF_CARRY, x, y, z),
        0xb0 => alu::execute(cpu, &alu::ADD_IF_CARRY_IMM, x, y, z),
        0xc0 => alu::execute(cpu, &alu::ADD_IF_OVERFLOW, x, y, z),
        0xd0 => alu::execute(cpu, &alu::ADD_IF_OVERFLOW_IMM, x, y, z),

        // Memory family, kernel-only.
        0x42 => mem::execute(cpu, &mem::LOAD_W_KERN, x, y, z),
        0x44 => mem::execute(cpu, &mem::LOAD_W_KERN_IMM, x, y, z),
        0x46 => mem::execute(cpu, &mem::STORE_W_KERN, x, y, z),
        0x48 => mem::execute(cpu, &mem::STORE_W_KERN_IMM, x, y, z),
        0x4a => mem::execute(cpu, &mem::LOAD_W_CODE_KERN, x, y, z),
        0x4c => mem::execute(cpu, &mem::LOAD_W_CODE_KERN_IMM, x, y, z),
        0x4e => mem::execute(cpu, &mem::STORE_W_CODE_KERN, x, y, z),
        0x6e => mem::execute(cpu, &mem::STORE_W_CODE_KERN_IMM, x, y, z),
        0xb2 => mem::execute(cpu, &mem::LOAD_B_KERN, x, y, z),
        0xb4 => mem::execute(cpu, &mem::STORE_B_KERN_IMM, x, y, z),
        0xb6 => mem::execute(cpu, &mem::LOAD_B_KERN_SIGNED, x, y, z),
        0xb8 => mem::execute(cpu, &mem::LOAD_B_KERN_SIGNED_IMM, x, y, z),
        0xba => mem::execute(cpu, &mem::STORE_B_KERN, x, y, z),
        0xbc => mem::execute(cpu, &mem::LOAD_B_KERN_IMM, x, y, z),

        // Memory family, user-capable.
        0x72 => mem::execute(cpu, &mem::LOAD_W, x, y, z),
        0x74 => mem::execute(cpu, &mem::LOAD_W_IMM, x, y, z),
        0x76 => mem::execute(cpu, &mem::STORE_W, x, y, z),
        0x78 => mem::execute(cpu, &mem::STORE_W_IMM, x, y, z),
        0x7a => mem::execute(cpu, &mem::LOAD_B, x, y, z),
        0x7c => mem::execute(cpu, &mem::LOAD_B_IMM, x, y, z),
        0x7e => mem::execute(cpu, &mem::LOAD_B_SIGNED, x, y, z),
        0x8e => mem::execute(cpu, &mem::LOAD_B_SIGNED_IMM, x, y, z),
        0x82 => mem::execute(cpu, &mem::STORE_B, x, y, z),
        0x84 => mem::execute(cpu, &mem::STORE_B_IMM, x, y, z),
        0x86 => mem::execute(cpu, &mem::LOAD_W_CODE, x, y, z),
        0x88 => mem::execute(cpu, &mem::LOAD_W_CODE_IMM, x, y, z),
        0x8a => mem::execute(cpu, &mem::STORE_W_CODE, x, y, z),
        0x8c => mem::execute(cpu, &mem::STORE_W_CODE_IMM, x, y, z),

        // Atomic test-and-set.
        0x6c => mem::execute_test_and_set(cpu, x, y, z),

        // Special-register read.
        0xe0 => special_ops::execute_read(cpu, &special_ops::READ_STATUS, x),
        0xe2 => special_ops::execute_read(cpu, &special_ops::READ_CAUSE, x),
        0xe4 => special_ops::execute_read(cpu, &special_ops::READ_EXC_ADDR, x),
        0xe6 => special_ops::execute_read(cpu, &special_ops::READ_ERET, x),
        0xe8 => special_ops::execute_read(cpu, &special_ops::READ_ERET_RETURN, x),
        0xea => special_ops::execute_read(cpu, &special_ops::READ_CONTEXT, x),

        // Special-register write.
        0xf2 => special_ops::execute_write(cpu, &special_ops::WRITE_PTB, y, z),
        0xf4 => special_ops::execute_write(cpu, &special_ops::WRITE_TIMER_IMM, y, z),
        0xf6 => special_ops::execute_write(cpu, &special_ops::WRITE_ISR, y, z),
        0xf8 => special_ops::execute_write(cpu, &special_ops::WRITE_STATUS, y, z),

        // Mode and page-table-write.
        0xf0 => special_ops::execute_set_mode(cpu),
        0xfa => special_ops::execute_store_pte(cpu, false, x, y, z),
        0xfc => special_ops::execute_store_pte(cpu, true, x, y, z),

        _ => {
            log::trace!("illegal instruction: opcode byte 0x{opcode_byte:02x}");
            cpu.interrupts.signal(InterruptSignal::IllInst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    #[test]
    fn unmapped_opcode_signals_illegal_instruction() {
        let mut cpu = Cpu::new();
        dispatch(&mut cpu, 0x02, 0, 0, 0);
        assert!(cpu.interrupts.is_signalled(&[InterruptSignal::IllInst]));
    }

    #[test]
    fn noop_opcode_does_nothing_observable() {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, 0x4242);
        dispatch(&mut cpu, 0x00, 1, 2, 3);
        assert_eq!(cpu.registers.read(1), 0x4242);
        assert!(!cpu.interrupts.is_signalled(&[InterruptSignal::IllInst]));
    }
}
