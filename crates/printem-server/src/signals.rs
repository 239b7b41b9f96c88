// CLASSIFICATION: COMMUNITY
// Filename: signals.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! SIGINT/SIGUSR1/SIGUSR2 bridge. The original installed handlers that
//! called `_exit()` directly from signal-handler context; here the handler
//! only flips a flag (`signal_hook`'s async-signal-safe registration), and
//! the driver loop polls the flags cooperatively at the top of every
//! iteration, so shutdown gets to flush and close open payload files
//! rather than relying on raw process-exit semantics.
//!
//! A flag alone cannot interrupt a blocking serial read: the driver loop's
//! `port.read()` is a plain blocking syscall, and a signal delivered while
//! it's parked will not be observed until a byte actually arrives. A real
//! self-pipe closes that gap: `signal_hook::low_level::pipe` writes one
//! byte to `wake_write` from signal-handler context (async-signal-safe),
//! and the driver loop's `poll()` waits on the serial fd and `wake_read`
//! together, so a pending signal wakes the read immediately.

use std::io::Read;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGUSR1, SIGUSR2};
use signal_hook::{flag, low_level::pipe};

/// Latching flags set by the signal handlers, polled by the driver loop,
/// plus a self-pipe so a blocked serial read can be woken immediately.
pub struct Signals {
    interrupt: Arc<AtomicBool>,
    trigger1: Arc<AtomicBool>,
    trigger2: Arc<AtomicBool>,
    wake_read: UnixStream,
    // Kept alive only so `signal_hook::low_level::pipe`'s registration stays valid.
    _wake_write: UnixStream,
}

impl Signals {
    pub fn install() -> std::io::Result<Self> {
        let interrupt = Arc::new(AtomicBool::new(false));
        let trigger1 = Arc::new(AtomicBool::new(false));
        let trigger2 = Arc::new(AtomicBool::new(false));

        flag::register(SIGINT, Arc::clone(&interrupt))?;
        flag::register(SIGUSR1, Arc::clone(&trigger1))?;
        flag::register(SIGUSR2, Arc::clone(&trigger2))?;

        let (wake_read, wake_write) = UnixStream::pair()?;
        wake_read.set_nonblocking(true)?;
        pipe::register(SIGINT, wake_write.try_clone()?)?;
        pipe::register(SIGUSR1, wake_write.try_clone()?)?;
        pipe::register(SIGUSR2, wake_write.try_clone()?)?;

        Ok(Signals { interrupt, trigger1, trigger2, wake_read, _wake_write: wake_write })
    }

    pub fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Consumes and clears the SIGUSR1 trigger (used for testing: requests
    /// a Report or History sequence).
    pub fn take_trigger1(&self) -> bool {
        self.trigger1.swap(false, Ordering::Relaxed)
    }

    /// Consumes and clears the SIGUSR2 trigger.
    pub fn take_trigger2(&self) -> bool {
        self.trigger2.swap(false, Ordering::Relaxed)
    }

    /// Read end of the self-pipe, readable the instant SIGINT/SIGUSR1/SIGUSR2
    /// is delivered. Pass alongside a serial fd to `libc::poll` so a signal
    /// breaks a blocked read instead of waiting for the next byte.
    pub fn wake_fd(&self) -> RawFd {
        self.wake_read.as_raw_fd()
    }

    /// Drains bytes buffered in the wake pipe after a poll() wakeup, so the
    /// next wakeup reflects a fresh signal rather than a stale one.
    pub fn drain_wake_pipe(&mut self) {
        let mut buf = [0u8; 64];
        loop {
            match self.wake_read.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(_) => break,
            }
        }
    }
}
