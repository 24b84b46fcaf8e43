//! Shared primitive types and cross-cutting abstractions for the mpce
//! simulator.
//!
//! The architecture is a 16-bit word machine with a 32-bit physical
//! address space. Every crate in this workspace that needs to talk about
//! an instruction word, a physical address, a pending interrupt, or an
//! MMIO-mapped device depends on this crate rather than redefining its
//! own notion of those things.

mod interrupt;
mod mmio_device;
mod types;

pub use interrupt::{InterruptController, InterruptSignal};
pub use mmio_device::MmioDevice;
pub use types::{PhysAddr, VirtAddr};
