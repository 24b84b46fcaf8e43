//! Pending-interrupt set and cause-byte encoding.

use std::collections::HashSet;
use std::sync::Mutex;

/// A synchronous fault or asynchronous device request the CPU may need to
/// act on at the next interrupt-check point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSignal {
    Irq0,
    Irq1,
    Irq2,
    Irq3,
    TimeOut,
    RoFault,
    PgFault,
    IllInst,
}

/// Exception priority order, lowest first. Used to compute the high
/// nibble of the cause byte: the highest-priority pending exception wins.
const EXCEPTION_PRIORITY: [InterruptSignal; 4] = [
    InterruptSignal::TimeOut,
    InterruptSignal::RoFault,
    InterruptSignal::PgFault,
    InterruptSignal::IllInst,
];

/// Thread-safe set of pending interrupt signals, shared between the CPU
/// core and whichever device threads call [`InterruptController::signal`]
/// (currently just the serial console's input-availability notifier).
///
/// Every method takes the internal mutex for the duration of the call and
/// releases it before returning; no other lock is ever held while this
/// one is.
#[derive(Debug, Default)]
pub struct InterruptController {
    pending: Mutex<HashSet<InterruptSignal>>,
}

impl InterruptController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Marks `signal` pending.
    pub fn signal(&self, signal: InterruptSignal) {
        self.pending.lock().unwrap().insert(signal);
        log::trace!("interrupt signalled: {signal:?}");
    }

    /// True iff any signal in `signals` is currently pending.
    #[must_use]
    pub fn is_signalled(&self, signals: &[InterruptSignal]) -> bool {
        let pending = self.pending.lock().unwrap();
        signals.iter().any(|s| pending.contains(s))
    }

    /// Clears all pending signals.
    pub fn clear(&self) {
        self.pending.lock().unwrap().clear();
    }

    /// Encodes the pending set as a cause byte: bits 0..3 mirror
    /// IRQ0..IRQ3, bits 4..7 carry the priority code (1..4) of the
    /// highest-priority pending exception, or 0 if none are pending.
    #[must_use]
    pub fn cause(&self) -> u8 {
        let pending = self.pending.lock().unwrap();
        let mut byte = 0u8;

        for (bit, irq) in [
            InterruptSignal::Irq0,
            InterruptSignal::Irq1,
            InterruptSignal::Irq2,
            InterruptSignal::Irq3,
        ]
        .iter()
        .enumerate()
        {
            if pending.contains(irq) {
                byte |= 1 << bit;
            }
        }

        let mut priority = 0u8;
        for (i, exception) in EXCEPTION_PRIORITY.iter().enumerate() {
            if pending.contains(exception) {
                priority = i as u8 + 1;
            }
        }
        byte |= priority << 4;

        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_encodes_irq_bits_independently() {
        let interrupt = InterruptController::new();
        interrupt.signal(InterruptSignal::Irq0);
        interrupt.signal(InterruptSignal::Irq2);
        assert_eq!(interrupt.cause() & 0x0f, 0b0101);
    }

    #[test]
    fn cause_picks_highest_priority_exception() {
        let interrupt = InterruptController::new();
        interrupt.signal(InterruptSignal::TimeOut);
        interrupt.signal(InterruptSignal::RoFault);
        interrupt.signal(InterruptSignal::Irq2);
        // RO_FAULT (priority 2) beats TIME_OUT (priority 1); IRQ2 stays in
        // the low nibble independently.
        assert_eq!(interrupt.cause(), 0b0100 | (2 << 4));
    }

    #[test]
    fn clear_empties_pending_set() {
        let interrupt = InterruptController::new();
        interrupt.signal(InterruptSignal::IllInst);
        interrupt.clear();
        assert!(!interrupt.is_signalled(&[
            InterruptSignal::IllInst,
            InterruptSignal::PgFault,
            InterruptSignal::RoFault,
        ]));
        assert_eq!(interrupt.cause(), 0);
    }

    #[test]
    fn is_signalled_checks_any_of_list() {
        let interrupt = InterruptController::new();
        interrupt.signal(InterruptSignal::PgFault);
        assert!(interrupt.is_signalled(&[InterruptSignal::RoFault, InterruptSignal::PgFault]));
        assert!(!interrupt.is_signalled(&[InterruptSignal::RoFault, InterruptSignal::IllInst]));
    }
}
