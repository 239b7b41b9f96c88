// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! One-shot control program: sends a single command code to the server and
//! waits for its responses, exiting 0 on success and 1 on any failure.
//! Grounded in `PE-Control/main.c`'s `action()`/response-wait loop.

use std::time::Duration;

use clap::Parser;
use log::warn;

use printem_core::error::Error;
use printem_core::ipc::posixmq::PosixMqClient;
use printem_core::ipc::{ClientRequest, IpcClient, IpcRequestKind, ServerResponse};

/// One-shot control tool: a single positional command code character
/// (`r`, `h`, or `l`). Parsed with `clap`, matching the corpus's
/// `#[derive(Parser)]` idiom across every binary.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Command code: r/R report, h/H history, l/L toggle log mode.
    command: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("\nPrinter Emulator Control v1.3.1");
    println!("(c) 2025 Liquid Solids Control\n");

    let cli = Cli::parse();
    let mut chars = cli.command.chars();
    let (Some(code), None) = (chars.next(), chars.next()) else {
        println!("Error - too many command code characters");
        std::process::exit(1);
    };

    std::process::exit(run(code));
}

fn run(code: char) -> i32 {
    let client_id = std::process::id();
    let mut client = match PosixMqClient::open(client_id) {
        Ok(c) => c,
        Err(e) => {
            println!("Unable to open printem message queue");
            warn!("{e}");
            return 1;
        }
    };

    let Some((kind, cmd)) = dispatch(code) else {
        println!("Unknown character {code} received: IGNORED");
        return 1;
    };

    println!("Command code in: {code}");
    let request = ClientRequest { kind, client_id, command: cmd.into() };
    if client.send_request(&request).is_err() {
        println!("{cmd} request FAILED");
        return 1;
    }
    println!("{cmd} requested");

    wait_for_completion(&mut client)
}

fn dispatch(code: char) -> Option<(IpcRequestKind, &'static str)> {
    match code {
        'h' | 'H' => Some((IpcRequestKind::ReqHistory, "history")),
        'l' | 'L' => Some((IpcRequestKind::ReqLog, "log")),
        'r' | 'R' => Some((IpcRequestKind::ReqReport, "report")),
        _ => None,
    }
}

/// Waits out the server's response sequence: `RequestSuccess`/`Reset` are
/// intermediary and keep the loop going, `ActionSuccess`/`ActionFailure`/
/// `RequestFailure` end it.
fn wait_for_completion(client: &mut PosixMqClient) -> i32 {
    loop {
        match client.recv_response() {
            Ok(ServerResponse::RequestSuccess(_)) => {
                println!("SERVER_REQUEST_SUCCESS");
            }
            Ok(ServerResponse::RequestFailure(body)) => {
                println!("SERVER_REQUEST_FAILURE");
                println!("Server response: {body}");
                return 1;
            }
            Ok(ServerResponse::ActionSuccess(body)) => {
                println!("SERVER_ACTION_SUCCESS");
                println!("Server response: {body}");
                return 0;
            }
            Ok(ServerResponse::ActionFailure(body)) => {
                println!("SERVER_ACTION_FAILURE");
                println!("Server response: {body}");
                return 1;
            }
            Ok(ServerResponse::Reset) => {
                println!("SERVER_RESET");
            }
            Err(Error::WouldBlock) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                println!("Server response FAILED");
                warn!("{e}");
                return 1;
            }
        }
    }
}
