// CLASSIFICATION: COMMUNITY
// Filename: status.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! The printer status byte exposed to the 1022 on every poll reply.

use bitflags::bitflags;

bitflags! {
    /// Bit layout of the single status byte the emulator returns on a
    /// printer poll. Only the four named bits are ever toggled by the
    /// engine; the rest are reserved and stay clear.
    #[derive(Default)]
    pub struct Status: u8 {
        /// Printer power-on.
        const PRWON = 0b0100_0000;
        /// Log mode is currently active.
        const LOGMODE = 0b0001_0000;
        /// Printer is busy with an in-flight transaction.
        const PRBUSY = 0b0000_1000;
        /// Printer is ready to accept a poll.
        const READY = 0b0000_0100;
    }
}

impl Status {
    /// Status at emulator startup: powered on and ready, nothing pending.
    pub fn initial() -> Self {
        Status::PRWON | Status::READY
    }

    pub fn get(&self) -> u8 {
        self.bits()
    }

    pub fn set_logmode(&mut self) {
        self.insert(Status::LOGMODE);
    }

    pub fn clear_logmode(&mut self) {
        self.remove(Status::LOGMODE);
    }

    pub fn is_logmode(&self) -> bool {
        self.contains(Status::LOGMODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_is_prwon_ready() {
        let s = Status::initial();
        assert_eq!(s.get(), 0b0100_0100);
        assert!(!s.is_logmode());
    }

    #[test]
    fn logmode_round_trips() {
        let mut s = Status::initial();
        s.set_logmode();
        assert!(s.is_logmode());
        s.clear_logmode();
        assert!(!s.is_logmode());
    }
}
