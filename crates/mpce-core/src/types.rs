//! Address-space type aliases.
//!
//! The machine itself works in plain `u16`/`u8` words and bytes; those
//! need no wrapper type. Addresses are distinguished only by width, so
//! they get aliases rather than newtypes to keep arithmetic on them
//! ordinary integer arithmetic.

/// A physical address. Up to 23 significant bits in user space (the MMU
/// assembles a 13-bit frame number with a 9-bit page offset, placed at
/// bit 14 and up), but kept as a full `u32` for headroom and alignment.
pub type PhysAddr = u32;

/// A virtual address, as seen by a running program before MMU translation.
pub type VirtAddr = u16;
