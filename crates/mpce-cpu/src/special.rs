//! Special-purpose registers: status, cause, and the rest of the
//! privileged-state cells a context switch or ISR touches.

/// Status bit: CPU is in user mode.
pub const STATUS_USER: u8 = 0x08;
/// Status bit: result was zero.
pub const STATUS_ZERO: u8 = 0x04;
/// Status bit: carry out of the last ALU op. Aliases [`STATUS_OVERFLOW`] —
/// the original implementation gives both the same bit value; preserved
/// here as a documented quirk rather than split into two bits.
pub const STATUS_CARRY: u8 = 0x02;
/// Status bit: overflow from the last ALU op. See [`STATUS_CARRY`].
pub const STATUS_OVERFLOW: u8 = 0x02;
/// Status bit: result was negative. Same bit value as [`STATUS_USER`].
/// Unlike the CARRY/OVERFLOW alias, this collision is not inert: an ALU
/// op that updates status flags and computes a negative result also
/// flips the CPU into user mode as a side effect, since it's the same
/// bit. Inherited verbatim from the source encoding rather than split
/// into two bits — see `cpu::alu`.
pub const STATUS_NEGATIVE: u8 = 0x08;

/// Only the low nibble of `status` is writable.
const STATUS_MASK: u16 = 0xfff0;
/// Only bit 0 of `mode` is meaningful.
const MODE_MASK: u16 = 0xfffe;

/// A typed special-purpose cell: a plain masked word, distinguished only
/// by name, mirroring [`crate::register::Register`] but for the smaller,
/// heterogeneously-sized privileged registers.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    data: u16,
}

impl Cell {
    const fn read(self) -> u16 {
        self.data
    }

    fn write(&mut self, value: u16, mask: u16) {
        self.data = value & !mask;
    }
}

/// The privileged registers a context switch and the special-register
/// read/write opcodes manipulate.
#[derive(Debug, Default)]
pub struct SpecialRegisters {
    status: Cell,
    cause: Cell,
    eret: Cell,
    context: Cell,
    timer: Cell,
    isr: Cell,
    ptb: Cell,
    exc_addr: Cell,
    inst: Cell,
    mode: Cell,
}

impl SpecialRegisters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn status(&self) -> u8 {
        self.status.read() as u8
    }

    pub fn set_status(&mut self, value: u8) {
        self.status.write(u16::from(value), STATUS_MASK);
    }

    #[must_use]
    pub const fn is_user_mode(&self) -> bool {
        self.status() & STATUS_USER != 0
    }

    /// Flips the user-mode bit in both `status` and its `mode` mirror.
    pub fn toggle_mode(&mut self) {
        let flipped = self.status() ^ STATUS_USER;
        self.set_status(flipped);
        self.mode.write(u16::from(flipped & 0x01), MODE_MASK);
    }

    /// Sets user mode on (used by the `mode <- 1` opcode and context
    /// switches returning to user code).
    pub fn set_user_mode(&mut self, user: bool) {
        let status = if user {
            self.status() | STATUS_USER
        } else {
            self.status() & !STATUS_USER
        };
        self.set_status(status);
        self.mode.write(u16::from(user), MODE_MASK);
    }

    #[must_use]
    pub const fn cause(&self) -> u8 {
        self.cause.read() as u8
    }

    pub fn set_cause(&mut self, value: u8) {
        self.cause.write(u16::from(value), 0);
    }

    #[must_use]
    pub const fn eret(&self) -> u16 {
        self.eret.read()
    }

    pub fn set_eret(&mut self, value: u16) {
        self.eret.write(value, 0);
    }

    #[must_use]
    pub const fn context(&self) -> u16 {
        self.context.read()
    }

    pub fn set_context(&mut self, value: u16) {
        self.context.write(value, 0);
    }

    #[must_use]
    pub const fn timer(&self) -> u16 {
        self.timer.read()
    }

    pub fn set_timer(&mut self, value: u16) {
        self.timer.write(value, 0);
    }

    #[must_use]
    pub const fn isr(&self) -> u16 {
        self.isr.read()
    }

    pub fn set_isr(&mut self, value: u16) {
        self.isr.write(value, 0);
    }

    #[must_use]
    pub const fn ptb(&self) -> u16 {
        self.ptb.read()
    }

    pub fn set_ptb(&mut self, value: u16) {
        self.ptb.write(value, 0);
    }

    #[must_use]
    pub const fn exc_addr(&self) -> u16 {
        self.exc_addr.read()
    }

    pub fn set_exc_addr(&mut self, value: u16) {
        self.exc_addr.write(value, 0);
    }

    #[must_use]
    pub const fn inst(&self) -> u16 {
        self.inst.read()
    }

    pub fn set_inst(&mut self, value: u16) {
        self.inst.write(value, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_low_nibble_is_writable() {
        let mut regs = SpecialRegisters::new();
        regs.set_status(0xff);
        assert_eq!(regs.status(), 0x0f);
    }

    #[test]
    fn user_mode_tracks_status_bit_three() {
        let mut regs = SpecialRegisters::new();
        assert!(!regs.is_user_mode());
        regs.set_user_mode(true);
        assert!(regs.is_user_mode());
        assert_eq!(regs.status() & STATUS_USER, STATUS_USER);
    }

    #[test]
    fn toggle_mode_flips_user_bit() {
        let mut regs = SpecialRegisters::new();
        regs.set_user_mode(true);
        regs.toggle_mode();
        assert!(!regs.is_user_mode());
    }

    #[test]
    fn carry_and_overflow_share_the_same_bit() {
        assert_eq!(STATUS_CARRY, STATUS_OVERFLOW);
    }
}
