// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Interactive console client: puts the terminal into raw mode, dispatches
//! single keystrokes to the server, and prints responses as they arrive.
//! Grounded in the original `PE-Console/main.c`'s `kbhit`/`getch` busy loop.

use std::io::Read;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use printem_core::error::Error;
use printem_core::ipc::posixmq::PosixMqClient;
use printem_core::ipc::{ClientRequest, IpcClient, IpcRequestKind, ServerResponse};

/// Interactive console client: no flags, just connects and dispatches
/// keystrokes. Parsed with `clap` regardless, matching the corpus's
/// `#[derive(Parser)]` idiom across every binary.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Cli::parse();

    println!("\nPrinter Emulator Console");
    println!("(c) 2025 Liquid Solids Control\n");

    let client_id = std::process::id();
    let mut client = PosixMqClient::open(client_id)?;

    client.send_request(&ClientRequest {
        kind: IpcRequestKind::Init,
        client_id,
        command: "init".into(),
    })?;
    info!("client init requested");

    let _raw = RawTerminal::enable()?;

    loop {
        match poll_response(&mut client) {
            Some(ServerResponse::RequestSuccess(body)) if body == "exit" => {
                println!("server exiting, goodbye\r");
                return Ok(());
            }
            Some(response) => print_response(&response),
            None => {}
        }

        if let Some(c) = read_key()? {
            if !dispatch(&mut client, client_id, c)? {
                return Ok(());
            }
        } else {
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

fn poll_response(client: &mut PosixMqClient) -> Option<ServerResponse> {
    match client.recv_response() {
        Ok(r) => Some(r),
        Err(Error::WouldBlock) => None,
        Err(e) => {
            warn!("failed to read server response: {e}");
            None
        }
    }
}

fn print_response(response: &ServerResponse) {
    match response {
        ServerResponse::RequestSuccess(body) => println!("SERVER_REQUEST_SUCCESS: {body}\r"),
        ServerResponse::RequestFailure(body) => println!("SERVER_REQUEST_FAILURE: {body}\r"),
        ServerResponse::ActionSuccess(body) => println!("SERVER_ACTION_SUCCESS: {body}\r"),
        ServerResponse::ActionFailure(body) => println!("SERVER_ACTION_FAILURE: {body}\r"),
        ServerResponse::Reset => println!("SERVER_RESET\r"),
    }
}

/// Dispatches one keystroke. Returns `Ok(false)` to exit the console.
fn dispatch(client: &mut PosixMqClient, client_id: u32, c: u8) -> anyhow::Result<bool> {
    let (kind, cmd) = match c {
        b'h' | b'H' => (IpcRequestKind::ReqHistory, "history"),
        b'r' | b'R' => (IpcRequestKind::ReqReport, "report"),
        b'l' | b'L' => (IpcRequestKind::ReqLog, "log"),
        b'q' | b'Q' | 27 => {
            println!("\r");
            return Ok(false);
        }
        other => {
            println!("Unknown character {} hit: IGNORED\r", other as char);
            return Ok(true);
        }
    };

    let request = ClientRequest { kind, client_id, command: cmd.into() };
    match client.send_request(&request) {
        Ok(()) => println!("{cmd} requested\r"),
        Err(e) => {
            warn!("{cmd} request FAILED: {e}");
            println!("{cmd} request FAILED\r");
        }
    }
    Ok(true)
}

/// Reads one byte from stdin if available, non-blocking.
fn read_key() -> std::io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match std::io::stdin().read(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
        Err(e) => Err(e),
    }
}

/// Puts stdin into raw, non-blocking, no-echo mode for the lifetime of the
/// guard, restoring the previous settings on drop.
struct RawTerminal {
    original: libc::termios,
}

impl RawTerminal {
    fn enable() -> std::io::Result<Self> {
        let fd = std::io::stdin().as_raw_fd();
        unsafe {
            let mut original: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut original) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            let mut raw = original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            raw.c_cc[libc::VMIN] = 0;
            raw.c_cc[libc::VTIME] = 0;
            if libc::tcsetattr(fd, libc::TCSANOW, &raw) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            let flags = libc::fcntl(fd, libc::F_GETFL, 0);
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
            Ok(RawTerminal { original })
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let fd = std::io::stdin().as_raw_fd();
        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, &self.original);
        }
    }
}
