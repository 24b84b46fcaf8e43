//! Special-register read/write, mode-set, and page-table-store opcodes.

use mpce_core::InterruptSignal;

use crate::cpu::Cpu;
use crate::mmu::Space;
use crate::register::index;

/// Which privileged register a read opcode pulls from.
#[derive(Clone, Copy)]
pub enum ReadSrc {
    Status,
    Cause,
    ExcAddr,
    Eret,
    Context,
}

pub struct ReadOp {
    pub src: ReadSrc,
    /// Kernel-only; traps if issued from user mode.
    pub protected: bool,
    pub load_imm: bool,
    /// Flips the mode bit after the read — used by the return-from-ISR
    /// opcode that reads `eret` back into a register and resumes user
    /// mode in the same instruction.
    pub toggle_mode: bool,
}

pub const READ_STATUS: ReadOp = ReadOp {
    src: ReadSrc::Status,
    protected: false,
    load_imm: false,
    toggle_mode: false,
};
pub const READ_CAUSE: ReadOp = ReadOp {
    src: ReadSrc::Cause,
    protected: false,
    load_imm: false,
    toggle_mode: false,
};
pub const READ_EXC_ADDR: ReadOp = ReadOp {
    src: ReadSrc::ExcAddr,
    protected: false,
    load_imm: false,
    toggle_mode: false,
};
pub const READ_ERET: ReadOp = ReadOp {
    src: ReadSrc::Eret,
    protected: false,
    load_imm: false,
    toggle_mode: false,
};
/// Return-from-interrupt: reads `eret` and resumes user mode.
pub const READ_ERET_RETURN: ReadOp = ReadOp {
    src: ReadSrc::Eret,
    protected: true,
    load_imm: false,
    toggle_mode: true,
};
pub const READ_CONTEXT: ReadOp = ReadOp {
    src: ReadSrc::Context,
    protected: false,
    load_imm: false,
    toggle_mode: false,
};

pub fn execute_read(cpu: &mut Cpu, op: &ReadOp, x: usize) {
    if op.protected && cpu.special.is_user_mode() {
        cpu.interrupts.signal(InterruptSignal::IllInst);
        return;
    }

    if op.load_imm {
        let Some(word) = cpu.fetch_word() else {
            return;
        };
        cpu.registers.write(index::IMM, word);
    }

    let value = match op.src {
        ReadSrc::Status => u16::from(cpu.special.status()),
        ReadSrc::Cause => u16::from(cpu.special.cause()),
        ReadSrc::ExcAddr => cpu.special.exc_addr(),
        ReadSrc::Eret => cpu.special.eret(),
        ReadSrc::Context => cpu.special.context(),
    };
    cpu.registers.write(x, value);

    if op.toggle_mode {
        cpu.special.toggle_mode();
    }
}

/// Which privileged register a write opcode targets.
#[derive(Clone, Copy)]
pub enum WriteDst {
    Ptb,
    Timer,
    Isr,
    Status,
}

pub struct WriteOp {
    pub dst: WriteDst,
    pub load_imm: bool,
}

pub const WRITE_PTB: WriteOp = WriteOp {
    dst: WriteDst::Ptb,
    load_imm: false,
};
pub const WRITE_TIMER_IMM: WriteOp = WriteOp {
    dst: WriteDst::Timer,
    load_imm: true,
};
pub const WRITE_ISR: WriteOp = WriteOp {
    dst: WriteDst::Isr,
    load_imm: false,
};
pub const WRITE_STATUS: WriteOp = WriteOp {
    dst: WriteDst::Status,
    load_imm: false,
};

/// Special-register writes are always kernel-only.
pub fn execute_write(cpu: &mut Cpu, op: &WriteOp, y: usize, z: usize) {
    if cpu.special.is_user_mode() {
        cpu.interrupts.signal(InterruptSignal::IllInst);
        return;
    }

    if op.load_imm {
        let Some(word) = cpu.fetch_word() else {
            return;
        };
        cpu.registers.write(index::IMM, word);
    }

    let value = cpu
        .registers
        .read(y)
        .wrapping_add(cpu.registers.read(z));

    match op.dst {
        WriteDst::Ptb => cpu.special.set_ptb(value),
        WriteDst::Timer => cpu.special.set_timer(value),
        WriteDst::Isr => cpu.special.set_isr(value),
        WriteDst::Status => cpu.special.set_status(value as u8),
    }
}

/// `mode <- 1` (`0xf0`): enters user mode. Kernel-only; a no-op trap if
/// already in user mode since there would be nothing to transition from.
pub fn execute_set_mode(cpu: &mut Cpu) {
    if cpu.special.is_user_mode() {
        cpu.interrupts.signal(InterruptSignal::IllInst);
        return;
    }
    cpu.special.set_user_mode(true);
}

/// Kernel-only page-table-entry store: `page_table[reg_y + reg_z] <-
/// reg_x`.
pub fn execute_store_pte(cpu: &mut Cpu, is_data: bool, x: usize, y: usize, z: usize) {
    if cpu.special.is_user_mode() {
        cpu.interrupts.signal(InterruptSignal::IllInst);
        return;
    }
    let addr = cpu
        .registers
        .read(y)
        .wrapping_add(cpu.registers.read(z));
    let pte = cpu.registers.read(x);
    let space = if is_data { Space::Data } else { Space::Code };
    cpu.mmu.store_entry(space, addr, pte);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    #[test]
    fn read_status_copies_into_register() {
        let mut cpu = Cpu::new();
        cpu.special.set_status(0x04);
        execute_read(&mut cpu, &READ_STATUS, 1);
        assert_eq!(cpu.registers.read(1), 0x04);
    }

    #[test]
    fn return_from_interrupt_resumes_user_mode() {
        let mut cpu = Cpu::new();
        cpu.special.set_eret(0x1000);
        execute_read(&mut cpu, &READ_ERET_RETURN, 1);
        assert_eq!(cpu.registers.read(1), 0x1000);
        assert!(cpu.special.is_user_mode());
    }

    #[test]
    fn write_ops_trap_from_user_mode() {
        let mut cpu = Cpu::new();
        cpu.special.set_user_mode(true);
        execute_write(&mut cpu, &WRITE_PTB, 1, 2);
        assert!(cpu.interrupts.is_signalled(&[InterruptSignal::IllInst]));
    }

    #[test]
    fn set_mode_enters_user_mode_once() {
        let mut cpu = Cpu::new();
        execute_set_mode(&mut cpu);
        assert!(cpu.special.is_user_mode());
    }

    #[test]
    fn store_pte_writes_into_mmu_table() {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, 0x1999); // mapped, writable, frame 0x1999
        cpu.registers.write(2, 0);
        cpu.registers.write(3, 0);
        execute_store_pte(&mut cpu, true, 1, 2, 3);

        let interrupts = mpce_core::InterruptController::new();
        let phys = cpu.mmu.resolve(0, 0, Space::Data, false, &interrupts);
        assert_eq!(phys, 0x1999u32 << 14);
        assert!(!interrupts.is_signalled(&[InterruptSignal::PgFault]));
    }
}
