//! A flat word buffer with byte- and word-addressable views, and an
//! optional MMIO overlay that routes a tail slice of the address space
//! to a device instead of the buffer.
//!
//! A single buffer backs both views rather than keeping two copies in
//! sync, per the original's own comment that the word- and
//! byte-addressable variants should share one owner.

use std::sync::Arc;

use mpce_core::MmioDevice;

/// Width of the MMIO window routed to an overlay device.
pub const IO_SIZE: u32 = 0x1000;

/// Routes addresses past `io_begin` to `device` instead of the backing
/// word buffer.
pub struct RamOverlay {
    io_begin: u32,
    device: Arc<dyn MmioDevice>,
}

impl RamOverlay {
    #[must_use]
    pub fn new(io_begin: u32, device: Arc<dyn MmioDevice>) -> Self {
        Self { io_begin, device }
    }
}

/// A contiguous array of words, addressable either by word index or by
/// byte index (byte `a` lives in word `a >> 1`: low byte if `a` is even,
/// high byte if odd), with an optional MMIO overlay over its upper
/// addresses.
pub struct Ram {
    name: &'static str,
    words: Vec<u16>,
    overlay: Option<RamOverlay>,
}

impl Ram {
    #[must_use]
    pub fn new(name: &'static str, capacity_words: usize) -> Self {
        log::info!("initializing memory {name} of size {capacity_words}");
        Self {
            name,
            words: vec![0; capacity_words],
            overlay: None,
        }
    }

    pub fn set_overlay(&mut self, overlay: RamOverlay) {
        self.overlay = Some(overlay);
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.words.len() as u32
    }

    /// Routes `addr` to the overlay device if one is configured and `addr`
    /// falls past its window, returning the device offset to use.
    fn overlay_offset(&self, addr: u32) -> Option<u32> {
        self.overlay
            .as_ref()
            .filter(|o| addr > o.io_begin)
            .map(|o| addr - o.io_begin - 1)
    }

    #[must_use]
    pub fn load_w(&self, addr: u32) -> u16 {
        if let Some(offset) = self.overlay_offset(addr) {
            return self.overlay.as_ref().unwrap().device.load(offset);
        }
        let value = self.words.get(addr as usize).copied().unwrap_or(0);
        log::trace!("mem {}: load word 0x{addr:x} -> 0x{value:04x}", self.name);
        value
    }

    pub fn store_w(&mut self, addr: u32, value: u16) {
        if let Some(offset) = self.overlay_offset(addr) {
            self.overlay.as_ref().unwrap().device.store(offset, value);
            return;
        }
        if let Some(slot) = self.words.get_mut(addr as usize) {
            *slot = value;
        }
        log::trace!("mem {}: store word 0x{addr:x} <- 0x{value:04x}", self.name);
    }

    #[must_use]
    pub fn load_b(&self, addr: u32) -> u8 {
        if let Some(offset) = self.overlay_offset(addr) {
            return self.overlay.as_ref().unwrap().device.load(offset) as u8;
        }
        let word = self.load_w(addr >> 1);
        if addr % 2 == 0 { low_byte(word) } else { high_byte(word) }
    }

    pub fn store_b(&mut self, addr: u32, value: u8) {
        if let Some(offset) = self.overlay_offset(addr) {
            self.overlay
                .as_ref()
                .unwrap()
                .device
                .store(offset, u16::from(value));
            return;
        }
        let word_addr = addr >> 1;
        let existing = self.load_w(word_addr);
        let merged = if addr % 2 == 0 {
            (existing & 0xff00) | u16::from(value)
        } else {
            (existing & 0x00ff) | (u16::from(value) << 8)
        };
        self.store_w(word_addr, merged);
    }
}

#[must_use]
const fn low_byte(word: u16) -> u8 {
    (word & 0xff) as u8
}

#[must_use]
const fn high_byte(word: u16) -> u8 {
    (word >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_round_trip() {
        let mut ram = Ram::new("test", 16);
        ram.store_w(3, 0xbeef);
        assert_eq!(ram.load_w(3), 0xbeef);
    }

    #[test]
    fn byte_round_trip_even_and_odd() {
        let mut ram = Ram::new("test", 16);
        ram.store_b(4, 0x11);
        ram.store_b(5, 0x22);
        assert_eq!(ram.load_b(4), 0x11);
        assert_eq!(ram.load_b(5), 0x22);
        assert_eq!(ram.load_w(2), 0x2211);
    }

    #[test]
    fn byte_store_preserves_other_half() {
        let mut ram = Ram::new("test", 16);
        ram.store_w(0, 0xabcd);
        ram.store_b(0, 0xff);
        assert_eq!(ram.load_w(0), 0xabff);
    }

    #[test]
    fn out_of_range_access_is_zero_or_noop() {
        let mut ram = Ram::new("test", 4);
        assert_eq!(ram.load_w(100), 0);
        ram.store_w(100, 0x1234); // must not panic
        assert_eq!(ram.load_w(100), 0);
    }

    struct CountingDevice {
        value: std::sync::Mutex<u16>,
    }

    impl MmioDevice for CountingDevice {
        fn load(&self, _offset: u32) -> u16 {
            *self.value.lock().unwrap()
        }

        fn store(&self, _offset: u32, value: u16) {
            *self.value.lock().unwrap() = value;
        }

        fn irq_notify(&self, _interrupts: &mpce_core::InterruptController) {}
    }

    #[test]
    fn overlay_routes_addresses_past_io_begin() {
        let mut ram = Ram::new("test", 0x10);
        let device = Arc::new(CountingDevice {
            value: std::sync::Mutex::new(0),
        });
        ram.set_overlay(RamOverlay::new(0x08, device.clone()));

        ram.store_w(0x08, 0x1111); // still hits the backing buffer
        assert_eq!(ram.load_w(0x08), 0x1111);

        ram.store_w(0x09, 0x2222); // routed to the device
        assert_eq!(*device.value.lock().unwrap(), 0x2222);
        assert_eq!(ram.load_w(0x09), 0x2222);
    }
}
