//! A two-queue serial console, driven by a pair of worker threads that
//! exchange bytes with the host's standard input and output.
//!
//! Mapped into the kernel data MMIO window at offset 0x00 (read: pop a
//! byte off the input queue; write: push a byte onto the output queue)
//! and 0x01 (read: 1 if input is available, else 0).

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mpce_core::{InterruptController, InterruptSignal, MmioDevice};

/// MMIO offset for the data register (both directions).
pub const OFFSET_DATA: u32 = 0x00;

/// MMIO offset for the input-available status register.
pub const OFFSET_STATUS: u32 = 0x01;

/// Poll interval for both worker loops.
const SLEEP_DURATION: Duration = Duration::from_millis(5);

/// Byte that, read from the host's standard input, stops both console
/// threads.
const STOP_BYTE: u8 = b'Q';

struct Queues {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<VecDeque<u8>>,
}

/// Threaded serial console. Construct with [`SerialConsole::new`], start
/// its worker threads with [`SerialConsole::start_console`], and join them
/// with [`SerialConsole::join_console`] once the host loop is done.
pub struct SerialConsole {
    queues: Arc<Queues>,
    running: Arc<AtomicBool>,
    input_thread: Mutex<Option<JoinHandle<()>>>,
    output_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Default for SerialConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialConsole {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Queues {
                input: Mutex::new(VecDeque::new()),
                output: Mutex::new(VecDeque::new()),
            }),
            running: Arc::new(AtomicBool::new(false)),
            input_thread: Mutex::new(None),
            output_thread: Mutex::new(None),
        }
    }

    /// Spawns the input and output worker threads.
    pub fn start_console(&self) {
        self.running.store(true, Ordering::SeqCst);

        let queues = Arc::clone(&self.queues);
        let running = Arc::clone(&self.running);
        *self.input_thread.lock().unwrap() =
            Some(thread::spawn(move || input_loop(&queues, &running)));

        let queues = Arc::clone(&self.queues);
        let running = Arc::clone(&self.running);
        *self.output_thread.lock().unwrap() =
            Some(thread::spawn(move || output_loop(&queues, &running)));

        log::info!("serial console threads started");
    }

    /// Clears the running flag; both loops exit on their next iteration.
    pub fn stop_console(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Blocks until both worker threads have exited.
    pub fn join_console(&self) {
        if let Some(handle) = self.input_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.output_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        log::info!("serial console threads joined");
    }
}

fn input_loop(queues: &Arc<Queues>, running: &Arc<AtomicBool>) {
    let mut stdin = std::io::stdin().lock();
    let mut byte = [0u8; 1];

    while running.load(Ordering::SeqCst) {
        match stdin.read_exact(&mut byte) {
            Ok(()) => {
                let b = byte[0];
                queues.input.lock().unwrap().push_back(b);
                log::trace!("serial in: {b:#04x}");
                if b == STOP_BYTE {
                    running.store(false, Ordering::SeqCst);
                }
            }
            Err(_) => {
                // End of input stream; stop rather than spin.
                running.store(false, Ordering::SeqCst);
            }
        }

        thread::sleep(SLEEP_DURATION);
    }
}

fn output_loop(queues: &Arc<Queues>, running: &Arc<AtomicBool>) {
    let mut stdout = std::io::stdout();

    while running.load(Ordering::SeqCst) {
        let byte_out = queues.output.lock().unwrap().pop_front();

        if let Some(b) = byte_out {
            log::trace!("serial out: {b:#04x}");
            let _ = stdout.write_all(&[b]);
            let _ = stdout.flush();
        }

        thread::sleep(SLEEP_DURATION);
    }
}

impl MmioDevice for SerialConsole {
    fn load(&self, offset: u32) -> u16 {
        match offset {
            OFFSET_DATA => {
                let byte = self.queues.input.lock().unwrap().pop_front();
                u16::from(byte.unwrap_or(0))
            }
            OFFSET_STATUS => {
                let nonempty = !self.queues.input.lock().unwrap().is_empty();
                u16::from(nonempty)
            }
            _ => 0,
        }
    }

    fn store(&self, offset: u32, value: u16) {
        if offset == OFFSET_DATA {
            self.queues.output.lock().unwrap().push_back(value as u8);
        }
    }

    fn irq_notify(&self, interrupts: &InterruptController) {
        let nonempty = !self.queues.input.lock().unwrap().is_empty();
        if nonempty {
            interrupts.signal(InterruptSignal::Irq1);
        }
    }
}
