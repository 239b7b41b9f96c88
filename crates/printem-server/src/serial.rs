// CLASSIFICATION: COMMUNITY
// Filename: serial.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Serial transport. Thin on purpose: termios tuning is an external
//! collaborator, not a core concern, and isn't unit-tested beyond "does it
//! compile and open a path".

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

/// A byte-oriented transport the driver loop reads from and the wire sink
/// writes to.
pub trait SerialPort: Read + Write + Send {
    /// Raw fd to multiplex against the signal self-pipe via `poll()`, if
    /// this port is backed by a real file descriptor. `None` for in-memory
    /// test doubles, which have no blocking read to interrupt.
    fn poll_fd(&self) -> Option<RawFd> {
        None
    }
}

/// Termios-backed serial port, configured for 9600 8N1 raw mode with
/// VMIN=1/VTIME=0 blocking reads, matching the original `serial_port_open`.
pub struct TermiosSerialPort {
    file: std::fs::File,
}

impl TermiosSerialPort {
    pub fn open(path: &Path, low_latency: bool) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new().read(true).write(true).open(path)?;
        configure_termios(file.as_raw_fd())?;
        if low_latency {
            set_low_latency(path);
        }
        Ok(TermiosSerialPort { file })
    }
}

impl Read for TermiosSerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for TermiosSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl SerialPort for TermiosSerialPort {
    fn poll_fd(&self) -> Option<RawFd> {
        Some(self.file.as_raw_fd())
    }
}

fn configure_termios(fd: RawFd) -> io::Result<()> {
    unsafe {
        let mut tty: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tty) != 0 {
            return Err(io::Error::last_os_error());
        }

        tty.c_cflag &= !libc::PARENB;
        tty.c_cflag &= !libc::CSTOPB;
        tty.c_cflag &= !libc::CSIZE;
        tty.c_cflag |= libc::CS8;
        tty.c_cflag &= !libc::CRTSCTS;
        tty.c_cflag |= libc::CREAD | libc::CLOCAL;

        tty.c_lflag &= !libc::ICANON;
        tty.c_lflag &= !libc::ECHO;
        tty.c_lflag &= !libc::ECHOE;
        tty.c_lflag &= !libc::ECHONL;
        tty.c_lflag &= !libc::ISIG;

        tty.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        tty.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL);

        tty.c_oflag &= !libc::OPOST;
        tty.c_oflag &= !libc::ONLCR;

        tty.c_cc[libc::VTIME] = 0;
        tty.c_cc[libc::VMIN] = 1;

        libc::cfsetispeed(&mut tty, libc::B9600);
        libc::cfsetospeed(&mut tty, libc::B9600);

        if libc::tcsetattr(fd, libc::TCSANOW, &tty) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Shells out to `setserial <device> low_latency`, matching the original's
/// `system()` call. Failure is logged by the caller, not fatal.
fn set_low_latency(path: &Path) {
    let status = std::process::Command::new("setserial")
        .arg(path)
        .arg("low_latency")
        .status();
    match status {
        Ok(s) if s.success() => log::debug!("serial port {} set for low_latency", path.display()),
        Ok(s) => log::warn!("setserial exited with {s} for {}", path.display()),
        Err(e) => log::warn!("failed to run setserial for {}: {e}", path.display()),
    }
}

/// Wraps any `SerialPort`, duplicating every read byte to a capture file.
pub struct CaptureTee<S> {
    inner: S,
    capture: std::fs::File,
}

impl<S: SerialPort> CaptureTee<S> {
    pub fn new(inner: S, capture: std::fs::File) -> Self {
        CaptureTee { inner, capture }
    }
}

impl<S: SerialPort> Read for CaptureTee<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            if let Err(e) = self.capture.write_all(&buf[..n]) {
                log::warn!("capture file write failed: {e}");
            }
        }
        Ok(n)
    }
}

impl<S: SerialPort> Write for CaptureTee<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: SerialPort> SerialPort for CaptureTee<S> {
    fn poll_fd(&self) -> Option<RawFd> {
        self.inner.poll_fd()
    }
}

/// `Cursor<Vec<u8>>`-backed test double, for driver-loop tests that don't
/// need a real serial port.
pub struct MemSerialPort {
    cursor: io::Cursor<Vec<u8>>,
    written: Vec<u8>,
}

impl MemSerialPort {
    pub fn new(data: Vec<u8>) -> Self {
        MemSerialPort { cursor: io::Cursor::new(data), written: Vec::new() }
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Read for MemSerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for MemSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialPort for MemSerialPort {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_serial_port_reads_preloaded_bytes() {
        let mut port = MemSerialPort::new(vec![0x91, 0x44, 0x98]);
        let mut buf = [0u8; 8];
        let n = port.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x91, 0x44, 0x98]);
    }

    #[test]
    fn mem_serial_port_records_writes() {
        let mut port = MemSerialPort::new(vec![]);
        port.write_all(&[0x44]).unwrap();
        assert_eq!(port.written(), &[0x44]);
    }
}
