//! Page-table-walk MMU.

use mpce_core::{InterruptController, InterruptSignal, PhysAddr, VirtAddr};

/// PTE bit: page is unmapped.
const PTE_UNMAPPED: u16 = 0x8000;
/// PTE bit: page is read-only.
const PTE_READ_ONLY: u16 = 0x4000;
/// Mask over the physical frame-number field of a PTE.
const PTE_FRAME_MASK: u16 = 0x1fff;

/// Number of page-table entries per table (one per 7-bit virtual page
/// number).
const PAGE_TABLE_SIZE: usize = 0x1_0000;

/// Which address space a resolve/store targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Code,
    Data,
}

/// Two word-addressable page tables (code, data) and the translation
/// logic that walks them.
pub struct Mmu {
    code_table: Vec<u16>,
    data_table: Vec<u16>,
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

impl Mmu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_table: vec![0; PAGE_TABLE_SIZE],
            data_table: vec![0; PAGE_TABLE_SIZE],
        }
    }

    fn table(&self, space: Space) -> &[u16] {
        match space {
            Space::Code => &self.code_table,
            Space::Data => &self.data_table,
        }
    }

    fn table_mut(&mut self, space: Space) -> &mut [u16] {
        match space {
            Space::Code => &mut self.code_table,
            Space::Data => &mut self.data_table,
        }
    }

    /// Resolves `virt` against page-table base `ptb`, signaling
    /// `PG_FAULT`/`RO_FAULT` on the interrupt controller rather than
    /// returning a `Result` — callers must check
    /// `interrupt.is_signalled(&[PgFault, RoFault])` after the call.
    #[must_use]
    pub fn resolve(
        &self,
        virt: VirtAddr,
        ptb: u16,
        space: Space,
        is_write: bool,
        interrupts: &InterruptController,
    ) -> PhysAddr {
        let page_num = (virt >> 9) & 0x7f;
        let offset = virt & 0x1ff;
        let index = ((ptb as usize) << 7) | page_num as usize;

        let pte = self
            .table(space)
            .get(index)
            .copied()
            .unwrap_or(PTE_UNMAPPED);

        if pte & PTE_UNMAPPED != 0 {
            interrupts.signal(InterruptSignal::PgFault);
            log::debug!("page fault: virt=0x{virt:04x} ptb=0x{ptb:04x}");
            return 0;
        }

        if pte & PTE_READ_ONLY != 0 && is_write {
            interrupts.signal(InterruptSignal::RoFault);
            log::debug!("read-only fault: virt=0x{virt:04x} ptb=0x{ptb:04x}");
            return 0;
        }

        (u32::from(pte & PTE_FRAME_MASK) << 14) | u32::from(offset & 0x1ff)
    }

    /// Writes a raw PTE word at virtual address `virt` into the chosen
    /// table. Used by the kernel-only page-table-write opcodes; the CPU
    /// is responsible for enforcing the kernel-only restriction.
    pub fn store_entry(&mut self, space: Space, virt: VirtAddr, pte: u16) {
        if let Some(slot) = self.table_mut(space).get_mut(virt as usize) {
            *slot = pte;
        }
        log::debug!("page table store: space={space:?} virt=0x{virt:04x} pte=0x{pte:04x}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_assembles_physical_address_from_pte_and_offset() {
        let mut mmu = Mmu::new();
        // ptb=0, page_num=0 -> index 0.
        mmu.store_entry(Space::Data, 0, 0x0005);
        let interrupts = InterruptController::new();
        let phys = mmu.resolve(0x0042, 0, Space::Data, false, &interrupts);
        assert_eq!(phys, (0x0005u32 << 14) | 0x0042);
        assert!(!interrupts.is_signalled(&[InterruptSignal::PgFault, InterruptSignal::RoFault]));
    }

    #[test]
    fn unmapped_pte_signals_page_fault() {
        let mut mmu = Mmu::new();
        mmu.store_entry(Space::Data, 0, 0x8000);
        let interrupts = InterruptController::new();
        mmu.resolve(0, 0, Space::Data, false, &interrupts);
        assert!(interrupts.is_signalled(&[InterruptSignal::PgFault]));
    }

    #[test]
    fn read_only_pte_signals_fault_only_on_write() {
        let mut mmu = Mmu::new();
        mmu.store_entry(Space::Data, 0, 0x4000 | 0x0001);
        let interrupts = InterruptController::new();

        mmu.resolve(0, 0, Space::Data, false, &interrupts);
        assert!(!interrupts.is_signalled(&[InterruptSignal::RoFault]));

        mmu.resolve(0, 0, Space::Data, true, &interrupts);
        assert!(interrupts.is_signalled(&[InterruptSignal::RoFault]));
    }
}
