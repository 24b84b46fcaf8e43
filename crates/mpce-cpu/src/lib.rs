//! Register file, paged memory, MMU, MMIO routing, and the CPU
//! fetch/dispatch/interrupt loop for the simulated 16-bit instruction
//! set.

mod cpu;
mod mmio_fabric;
mod mmu;
mod ram;
mod register;
mod special;

pub use cpu::Cpu;
pub use cpu::dispatch::dispatch;
pub use mmio_fabric::{KERN_DATA_IO_BEGIN, MmioFabric};
pub use mmu::{Mmu, Space};
pub use ram::Ram;
pub use register::{RegisterFile, index};
pub use special::{SpecialRegisters, STATUS_CARRY, STATUS_NEGATIVE, STATUS_OVERFLOW, STATUS_USER, STATUS_ZERO};
