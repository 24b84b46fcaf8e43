//! Address-space routing: selects one of four backing RAMs by
//! `(is_user_mode, is_data)`, and fans `irq_notify` out to every
//! registered MMIO device.

use std::sync::Arc;

use mpce_core::{InterruptController, MmioDevice};

use crate::ram::{Ram, RamOverlay};

/// Kernel code memory size in words.
pub const KERN_CODE_WORDS: usize = 0x1_0000;
/// Kernel data memory size in bytes.
pub const KERN_DATA_BYTES: usize = 0x1_0000;
/// User code memory size in words.
pub const USER_CODE_WORDS: usize = 0x80_0000;
/// User data memory size in bytes.
pub const USER_DATA_BYTES: usize = 0x80_0000;

/// Overlay threshold for kernel data memory: addresses *past* this value
/// are MMIO, i.e. `0xf000` and up (device offset 0x00 at 0xf000, 0x01 at
/// 0xf001, ...), since the overlay routes on strict `addr > io_begin`.
pub const KERN_DATA_IO_BEGIN: u32 = 0xefff;

pub struct MmioFabric {
    kern_code: Ram,
    kern_data: Ram,
    user_code: Ram,
    user_data: Ram,
    irq_notifiers: Vec<Arc<dyn MmioDevice>>,
}

impl MmioFabric {
    #[must_use]
    pub fn new() -> Self {
        log::info!("initializing mmio fabric");
        Self {
            kern_code: Ram::new("kern_code", KERN_CODE_WORDS),
            kern_data: Ram::new("kern_data", KERN_DATA_BYTES / 2),
            user_code: Ram::new("user_code", USER_CODE_WORDS),
            user_data: Ram::new("user_data", USER_DATA_BYTES / 2),
            irq_notifiers: Vec::new(),
        }
    }

    /// Routes kernel data memory's MMIO window to `device`, and registers
    /// it for per-cycle IRQ notification.
    pub fn register_mmio_device(&mut self, device: Arc<dyn MmioDevice>) {
        self.kern_data
            .set_overlay(RamOverlay::new(KERN_DATA_IO_BEGIN, Arc::clone(&device)));
        self.irq_notifiers.push(device);
    }

    #[must_use]
    pub fn get_code(&self, is_user_mode: bool) -> &Ram {
        if is_user_mode { &self.user_code } else { &self.kern_code }
    }

    pub fn get_code_mut(&mut self, is_user_mode: bool) -> &mut Ram {
        if is_user_mode { &mut self.user_code } else { &mut self.kern_code }
    }

    #[must_use]
    pub fn get_data(&self, is_user_mode: bool) -> &Ram {
        if is_user_mode { &self.user_data } else { &self.kern_data }
    }

    pub fn get_data_mut(&mut self, is_user_mode: bool) -> &mut Ram {
        if is_user_mode { &mut self.user_data } else { &mut self.kern_data }
    }

    /// Calls every registered device's `irq_notify`.
    pub fn irq_notify(&self, interrupts: &InterruptController) {
        for device in &self.irq_notifiers {
            device.irq_notify(interrupts);
        }
    }
}

impl Default for MmioFabric {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpce_core::InterruptSignal;
    use std::sync::Mutex;

    struct FlagDevice {
        signal: Mutex<bool>,
    }

    impl MmioDevice for FlagDevice {
        fn load(&self, _offset: u32) -> u16 {
            0
        }

        fn store(&self, _offset: u32, _value: u16) {}

        fn irq_notify(&self, interrupts: &InterruptController) {
            if *self.signal.lock().unwrap() {
                interrupts.signal(InterruptSignal::Irq1);
            }
        }
    }

    #[test]
    fn selects_memory_by_mode_and_kind() {
        let mut fabric = MmioFabric::new();
        fabric.get_code_mut(false).store_w(0, 0xaaaa);
        fabric.get_code_mut(true).store_w(0, 0xbbbb);
        assert_eq!(fabric.get_code(false).load_w(0), 0xaaaa);
        assert_eq!(fabric.get_code(true).load_w(0), 0xbbbb);
    }

    #[test]
    fn irq_notify_fans_out_to_all_registered_devices() {
        let mut fabric = MmioFabric::new();
        let device = Arc::new(FlagDevice {
            signal: Mutex::new(true),
        });
        fabric.register_mmio_device(device);

        let interrupts = InterruptController::new();
        fabric.irq_notify(&interrupts);
        assert!(interrupts.is_signalled(&[InterruptSignal::Irq1]));
    }

    #[test]
    fn kernel_data_mmio_window_routes_to_registered_device() {
        let mut fabric = MmioFabric::new();
        let device = Arc::new(RecordingDevice::default());
        fabric.register_mmio_device(device.clone());

        fabric.get_data_mut(false).store_b(0xf000, b'M');
        assert_eq!(*device.last_store.lock().unwrap(), Some((0, u16::from(b'M'))));

        fabric.get_data_mut(false).store_b(0xf001, b'N');
        assert_eq!(*device.last_store.lock().unwrap(), Some((1, u16::from(b'N'))));
    }

    #[derive(Default)]
    struct RecordingDevice {
        last_store: Mutex<Option<(u32, u16)>>,
    }

    impl MmioDevice for RecordingDevice {
        fn load(&self, _offset: u32) -> u16 {
            0
        }

        fn store(&self, offset: u32, value: u16) {
            *self.last_store.lock().unwrap() = Some((offset, value));
        }

        fn irq_notify(&self, _interrupts: &InterruptController) {}
    }
}
