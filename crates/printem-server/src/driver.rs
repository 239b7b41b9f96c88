// CLASSIFICATION: COMMUNITY
// Filename: driver.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Top-level driver loop: poll IPC, read serial, feed the protocol engine.
//! Grounded in the corpus's own daemon `run()` shape
//! (`src/net/cohesix_netd.rs`), adapted from a TCP-accept loop to a
//! blocking-serial-read loop.

use std::io::{self, Read};

use log::{debug, error, info, warn};

use printem_core::clock::Clock;
use printem_core::control::{Origin, RequestKind};
use printem_core::ipc::{ClientRequest, IpcRequestKind, IpcTransport, ServerResponse};
use printem_core::state::Engine;
use printem_core::wire::IoWireSink;

use crate::serial::SerialPort;
use crate::signals::Signals;

/// Runs the driver loop until an `Exit` request, SIGINT, or a fatal
/// transport/serial error. Returns normally on a clean shutdown. Reads and
/// replies share the one serial port, matching the original's single
/// read/write file descriptor.
pub fn run(
    engine: &mut Engine,
    port: &mut dyn SerialPort,
    ipc: &mut dyn IpcTransport,
    clock: &dyn Clock,
    signals: &mut Signals,
) -> anyhow::Result<()> {
    let mut read_buf = [0u8; 256];
    loop {
        if signals.interrupted() {
            info!("SIGINT received, shutting down");
            return Ok(());
        }
        if signals.take_trigger1() {
            debug!("SIGUSR1 trigger: requesting report");
            engine.control_mut().insert(RequestKind::Report, Origin::Wire);
        }
        if signals.take_trigger2() {
            debug!("SIGUSR2 trigger: requesting history");
            engine.control_mut().insert(RequestKind::History, Origin::Wire);
        }

        match ipc.try_recv_request() {
            Ok(Some(request)) => {
                if let Some(reply) = handle_request(engine, &request) {
                    if let Err(e) = ipc.send_response(request.client_id, &reply) {
                        warn!("failed to send IPC response: {e}");
                    }
                }
                if request.kind == IpcRequestKind::ReqExit {
                    info!("ReqExit received, shutting down");
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("IPC transport lost: {e}");
                return Err(e.into());
            }
        }

        engine.poll_clock(clock);

        if let Some(serial_fd) = port.poll_fd() {
            match wait_readable(serial_fd, signals.wake_fd()) {
                Ok(Readiness::Serial) => {}
                Ok(Readiness::Wake) => {
                    signals.drain_wake_pipe();
                    continue;
                }
                Err(e) => {
                    error!("poll() on serial port failed: {e}");
                    return Err(e.into());
                }
            }
        }

        let n = match port.read(&mut read_buf) {
            Ok(n) => n,
            Err(e) => {
                error!("serial read failed: {e}");
                return Err(e.into());
            }
        };
        if n == 0 {
            continue;
        }
        let mut wire = IoWireSink::new(&mut *port);
        for &b in &read_buf[..n] {
            match engine.step(b, &mut wire) {
                Ok(effects) => {
                    for effect in effects {
                        if let printem_core::state::Effect::Notified { client_id, response } =
                            effect
                        {
                            if let Err(e) = ipc.send_response(client_id, &response) {
                                warn!("failed to send IPC completion reply: {e}");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("protocol engine error: {e}");
                }
            }
        }
    }
}

enum Readiness {
    Serial,
    Wake,
}

/// Blocks until either the serial fd or the signal self-pipe has data
/// ready, so a SIGINT/SIGUSR1/SIGUSR2 delivered while the serial line is
/// idle wakes the loop immediately instead of waiting for the next byte.
fn wait_readable(serial_fd: std::os::unix::io::RawFd, wake_fd: std::os::unix::io::RawFd) -> io::Result<Readiness> {
    let mut fds = [
        libc::pollfd { fd: serial_fd, events: libc::POLLIN, revents: 0 },
        libc::pollfd { fd: wake_fd, events: libc::POLLIN, revents: 0 },
    ];
    loop {
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
    if fds[1].revents & libc::POLLIN != 0 {
        Ok(Readiness::Wake)
    } else {
        Ok(Readiness::Serial)
    }
}

/// Reacts to an inbound client request, returning the immediate reply (not
/// the later completion reply, which the state machine emits itself).
fn handle_request(engine: &mut Engine, request: &ClientRequest) -> Option<ServerResponse> {
    match request.kind {
        IpcRequestKind::Init => {
            let body = format!("logmode {}", engine.status().is_logmode() as u8);
            Some(ServerResponse::ActionSuccess(body))
        }
        IpcRequestKind::ReqHistory => {
            engine
                .control_mut()
                .insert(RequestKind::History, Origin::Client(request.client_id));
            Some(ServerResponse::RequestSuccess("history".into()))
        }
        IpcRequestKind::ReqReport => {
            engine
                .control_mut()
                .insert(RequestKind::Report, Origin::Client(request.client_id));
            Some(ServerResponse::RequestSuccess("report".into()))
        }
        IpcRequestKind::ReqLog => {
            let kind = if engine.status().is_logmode() {
                RequestKind::LogModeOff
            } else {
                RequestKind::LogModeOn
            };
            engine.control_mut().insert(kind, Origin::Client(request.client_id));
            Some(ServerResponse::RequestSuccess(String::new()))
        }
        IpcRequestKind::ReqExit => Some(ServerResponse::RequestSuccess("exit".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printem_core::clock::SystemClock;
    use printem_core::ipc::inprocess::pair;
    use printem_core::ipc::IpcClient;
    use printem_core::state::Mode;
    use printem_core::writer::PathLayout;
    use tempfile::tempdir;

    use crate::serial::MemSerialPort;

    #[test]
    fn req_exit_stops_the_loop_and_replies() {
        let dir = tempdir().unwrap();
        let layout = PathLayout {
            target: false,
            target_disk_dir: dir.path().join("target-disk"),
            target_ram_dir: dir.path().join("target-ram"),
            desktop_dir: dir.path().to_path_buf(),
        };
        let clock = SystemClock;
        let mut engine = Engine::new(Mode::Active, layout, &clock);
        let (mut server, mut client) = pair(3);
        client
            .send_request(&ClientRequest {
                kind: IpcRequestKind::ReqExit,
                client_id: 3,
                command: "exit".into(),
            })
            .unwrap();

        let mut port = MemSerialPort::new(vec![0x91, 0x44, 0x98]);
        let mut signals = Signals::install().unwrap();
        run(&mut engine, &mut port, &mut server, &clock, &mut signals).unwrap();

        let response = client.recv_response().unwrap();
        assert_eq!(response.body(), "exit");
    }
}
