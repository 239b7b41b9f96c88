// CLASSIFICATION: COMMUNITY
// Filename: wire.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Writes emulator replies back onto the serial wire. The emulator only
//! ever emits 1 or 3 bytes: `[status]` or `[status, command, 0x0D]`.

use crate::error::Error;

pub const CR: u8 = 0x0D;

/// Command bytes the emulator can follow a status byte with.
pub mod command {
    pub const REPORT: u8 = 0x52; // 'R'
    pub const IDLE_HISTORY: u8 = 0x49; // 'I'
    pub const HISTORY_FIRST: u8 = 0x54; // 'T'
    pub const HISTORY_NEXT: u8 = 0x48; // 'H'
    pub const LOG_NEXT: u8 = 0x4C; // 'L'
}

pub trait WireSink {
    /// Writes `bytes` to the wire. Implementations that cannot write the
    /// full slice must report how many bytes actually made it out; the
    /// caller turns a short count into `Error::ShortWrite`.
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<usize>;
}

/// Wraps any `std::io::Write` as a `WireSink`, turning a short write into
/// `Error::ShortWrite` rather than silently dropping bytes.
pub struct IoWireSink<W> {
    inner: W,
}

impl<W: std::io::Write> IoWireSink<W> {
    pub fn new(inner: W) -> Self {
        IoWireSink { inner }
    }
}

impl<W: std::io::Write> WireSink for IoWireSink<W> {
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.inner.write(bytes)
    }
}

/// Sends `bytes`, mapping a short write to `Error::ShortWrite`.
pub fn send_checked(sink: &mut dyn WireSink, bytes: &[u8]) -> Result<(), Error> {
    let n = sink.send(bytes)?;
    if n != bytes.len() {
        return Err(Error::ShortWrite {
            expected: bytes.len(),
            actual: n,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_write_succeeds() {
        let mut buf = Vec::new();
        let mut sink = IoWireSink::new(&mut buf);
        send_checked(&mut sink, &[0x44, command::REPORT, CR]).unwrap();
        assert_eq!(buf, vec![0x44, 0x52, 0x0D]);
    }

    struct ShortSink;
    impl WireSink for ShortSink {
        fn send(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            Ok(bytes.len().saturating_sub(1))
        }
    }

    #[test]
    fn short_write_is_reported() {
        let mut sink = ShortSink;
        let err = send_checked(&mut sink, &[0x44, 0x52, 0x0D]).unwrap_err();
        match err {
            Error::ShortWrite { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
