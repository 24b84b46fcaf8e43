//! Memory family: byte/word load and store, plus the atomic
//! test-and-set opcode.
//!
//! Load/store opcodes come in two families: kernel-only (trap if issued
//! from user mode) and user-capable (valid in either mode). Both compute
//! the target address as `reg_y + reg_z`, resolve it through the MMU
//! when in user mode, and leave kernel-mode addressing as a direct
//! physical reference — mirroring `op_mem`'s own `is_user_mode() ?
//! mmu_.resolve(...) : virt_addr` branch.

use mpce_core::InterruptSignal;

use crate::cpu::Cpu;
use crate::mmu::Space;
use crate::register::index;

/// Parameters for one load/store opcode.
pub struct MemOp {
    /// Byte-sized access (vs. word-sized).
    pub byte: bool,
    /// Valid from user mode as well as kernel mode.
    pub user_capable: bool,
    /// Data memory (vs. code memory).
    pub is_data: bool,
    pub is_store: bool,
    pub load_imm: bool,
    /// Sign-extend a byte load into the destination register.
    pub sign_extend: bool,
}

impl MemOp {
    const fn new(byte: bool, user_capable: bool, is_data: bool, is_store: bool) -> Self {
        Self {
            byte,
            user_capable,
            is_data,
            is_store,
            load_imm: false,
            sign_extend: false,
        }
    }

    const fn imm(mut self) -> Self {
        self.load_imm = true;
        self
    }

    const fn sign_extended(mut self) -> Self {
        self.sign_extend = true;
        self
    }
}

pub const LOAD_W_KERN: MemOp = MemOp::new(false, false, true, false);
pub const LOAD_W_KERN_IMM: MemOp = MemOp::new(false, false, true, false).imm();
pub const STORE_W_KERN: MemOp = MemOp::new(false, false, true, true);
pub const STORE_W_KERN_IMM: MemOp = MemOp::new(false, false, true, true).imm();
pub const LOAD_B_KERN: MemOp = MemOp::new(true, false, true, false);
pub const LOAD_B_KERN_IMM: MemOp = MemOp::new(true, false, true, false).imm();
pub const LOAD_B_KERN_SIGNED: MemOp = MemOp::new(true, false, true, false).sign_extended();
pub const LOAD_B_KERN_SIGNED_IMM: MemOp = MemOp::new(true, false, true, false)
    .imm()
    .sign_extended();
pub const STORE_B_KERN: MemOp = MemOp::new(true, false, true, true);
pub const STORE_B_KERN_IMM: MemOp = MemOp::new(true, false, true, true).imm();
pub const LOAD_W_CODE_KERN: MemOp = MemOp::new(false, false, false, false);
pub const LOAD_W_CODE_KERN_IMM: MemOp = MemOp::new(false, false, false, false).imm();
pub const STORE_W_CODE_KERN: MemOp = MemOp::new(false, false, false, true);
pub const STORE_W_CODE_KERN_IMM: MemOp = MemOp::new(false, false, false, true).imm();

pub const LOAD_W: MemOp = MemOp::new(false, true, true, false);
pub const LOAD_W_IMM: MemOp = MemOp::new(false, true, true, false).imm();
pub const STORE_W: MemOp = MemOp::new(false, true, true, true);
pub const STORE_W_IMM: MemOp = MemOp::new(false, true, true, true).imm();
pub const LOAD_B: MemOp = MemOp::new(true, true, true, false);
pub const LOAD_B_IMM: MemOp = MemOp::new(true, true, true, false).imm();
pub const LOAD_B_SIGNED: MemOp = MemOp::new(true, true, true, false).sign_extended();
pub const LOAD_B_SIGNED_IMM: MemOp = MemOp::new(true, true, true, false).imm().sign_extended();
pub const STORE_B: MemOp = MemOp::new(true, true, true, true);
pub const STORE_B_IMM: MemOp = MemOp::new(true, true, true, true).imm();
pub const LOAD_W_CODE: MemOp = MemOp::new(false, true, false, false);
pub const LOAD_W_CODE_IMM: MemOp = MemOp::new(false, true, false, false).imm();
pub const STORE_W_CODE: MemOp = MemOp::new(false, true, false, true);
pub const STORE_W_CODE_IMM: MemOp = MemOp::new(false, true, false, true).imm();

/// Executes a load/store opcode against register selectors `x, y, z`.
pub fn execute(cpu: &mut Cpu, op: &MemOp, x: usize, y: usize, z: usize) {
    let user_mode = cpu.special.is_user_mode();
    if user_mode && !op.user_capable {
        cpu.interrupts.signal(InterruptSignal::IllInst);
        return;
    }

    if op.load_imm {
        let Some(word) = cpu.fetch_word() else {
            return;
        };
        cpu.registers.write(index::IMM, word);
    }

    let virt = cpu
        .registers
        .read(y)
        .wrapping_add(cpu.registers.read(z));

    let phys = if user_mode {
        let space = if op.is_data { Space::Data } else { Space::Code };
        let phys = cpu
            .mmu
            .resolve(virt, cpu.special.ptb(), space, op.is_store, &cpu.interrupts);
        if cpu
            .interrupts
            .is_signalled(&[InterruptSignal::PgFault, InterruptSignal::RoFault])
        {
            return;
        }
        phys
    } else {
        u32::from(virt)
    };

    if op.is_store {
        let value = cpu.registers.read(x);
        let mem = if op.is_data {
            cpu.mmio.get_data_mut(user_mode)
        } else {
            cpu.mmio.get_code_mut(user_mode)
        };
        if op.byte {
            mem.store_b(phys, value as u8);
        } else {
            mem.store_w(phys, value);
        }
        return;
    }

    let mem = if op.is_data {
        cpu.mmio.get_data(user_mode)
    } else {
        cpu.mmio.get_code(user_mode)
    };
    let value = if op.byte {
        let byte = mem.load_b(phys);
        if op.sign_extend {
            (byte as i8) as i16 as u16
        } else {
            u16::from(byte)
        }
    } else {
        mem.load_w(phys)
    };
    cpu.registers.write(x, value);
}

/// Atomic test-and-set (`0x6c`): fetches an immediate word, resolves
/// `reg_y + reg_z` against the user data view regardless of the current
/// mode, then swaps the immediate into memory while returning the old
/// value in `reg_x`. Has no named counterpart in the source this is
/// ported from; built directly from the documented contract, using the
/// same fetch/resolve/load/store primitives every other memory opcode
/// uses.
pub fn execute_test_and_set(cpu: &mut Cpu, x: usize, y: usize, z: usize) {
    let Some(word) = cpu.fetch_word() else {
        return;
    };
    cpu.registers.write(index::IMM, word);
    let imm = cpu.registers.read(index::IMM);

    let virt = cpu
        .registers
        .read(y)
        .wrapping_add(cpu.registers.read(z));
    let phys = cpu
        .mmu
        .resolve(virt, cpu.special.ptb(), Space::Data, true, &cpu.interrupts);
    if cpu
        .interrupts
        .is_signalled(&[InterruptSignal::PgFault, InterruptSignal::RoFault])
    {
        return;
    }

    let mem = cpu.mmio.get_data_mut(true);
    let old = mem.load_w(phys);
    mem.store_w(phys, imm);
    cpu.registers.write(x, old);
}
