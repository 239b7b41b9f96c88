// CLASSIFICATION: COMMUNITY
// Filename: clock.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Time source abstraction for the snapshot gate, so the 5-second cadence
//! is testable without real sleeps.

use std::time::{Duration, Instant};

pub trait Clock: Send {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock a test can step manually. Starts at an arbitrary fixed instant
/// and only moves forward when told to, never via wall-clock time.
pub struct SteppableClock {
    now: std::cell::Cell<Instant>,
}

impl SteppableClock {
    pub fn new() -> Self {
        SteppableClock {
            now: std::cell::Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d);
    }

    /// Simulates a backward clock jump (e.g. an RTC correction).
    pub fn rewind(&self, d: Duration) {
        self.now.set(self.now.get() - d);
    }
}

impl Default for SteppableClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SteppableClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Rate-limits the `readings.txt` snapshot: arms a one-shot flag once at
/// least 5 seconds have passed since the last snapshot, or immediately if
/// the clock has visibly jumped backwards (a stuck/rebooted RTC should not
/// wedge the gate shut for hours).
pub struct SnapshotGate {
    last: Instant,
    armed: bool,
}

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);
const BACKWARD_JUMP_TOLERANCE: Duration = Duration::from_secs(1);

impl SnapshotGate {
    pub fn new(clock: &dyn Clock) -> Self {
        SnapshotGate {
            last: clock.now(),
            armed: false,
        }
    }

    /// Re-evaluates the gate against the current time. Call once per
    /// inbound read, before feeding bytes to the engine.
    pub fn poll(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        if now >= self.last {
            if now.duration_since(self.last) >= SNAPSHOT_INTERVAL {
                self.armed = true;
                self.last = now;
            }
        } else if self.last.duration_since(now) > BACKWARD_JUMP_TOLERANCE {
            self.armed = true;
            self.last = now;
        }
    }

    /// Consumes the armed flag, if set. The next display-frame terminator
    /// after a `true` result should write `readings.txt`.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arms_after_five_seconds() {
        let clock = SteppableClock::new();
        let mut gate = SnapshotGate::new(&clock);
        gate.poll(&clock);
        assert!(!gate.take());

        clock.advance(Duration::from_secs(6));
        gate.poll(&clock);
        assert!(gate.take());
        assert!(!gate.take());
    }

    #[test]
    fn stays_unarmed_before_interval() {
        let clock = SteppableClock::new();
        let mut gate = SnapshotGate::new(&clock);
        clock.advance(Duration::from_secs(2));
        gate.poll(&clock);
        assert!(!gate.take());
    }

    #[test]
    fn arms_on_backward_jump() {
        let clock = SteppableClock::new();
        let mut gate = SnapshotGate::new(&clock);
        clock.rewind(Duration::from_secs(2));
        gate.poll(&clock);
        assert!(gate.take());
    }
}
