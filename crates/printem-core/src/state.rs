// CLASSIFICATION: COMMUNITY
// Filename: state.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! The 18-state protocol engine. The 1022 drives a half-duplex cycle
//! built from three delimiter bytes with no length fields or checksums:
//! `0x90` opens a printer-status poll, `0x91` opens a VFD display record,
//! `0x98` closes a display segment / opens a printer response. Which of
//! those means what is entirely a function of which state the machine is
//! in, which is what this module exists to track.

use log::{debug, trace, warn};

use crate::accumulator::Accumulator;
use crate::clock::{Clock, SnapshotGate};
use crate::control::{Origin, PendingRequests, RequestKind};
use crate::error::Error;
use crate::ipc::ServerResponse;
use crate::status::Status;
use crate::wire::{command, WireSink, CR};
use crate::writer::{PathLayout, PayloadWriters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    SsUnknown,
    SsPause,
    SsDisplay,
    SsPrinter,
    RptStart,
    RptData,
    RptDisplay,
    RptPrinter,
    HstStart,
    HstDisplay,
    HstPrinter,
    HstPrinterActive,
    HstData,
    LogStart,
    LogData,
    LogDisplay,
    LogPrinter,
    LogPrinterActive,
}

/// A record of what happened while processing one byte, for debug-dump
/// logging and for tests to assert against without reaching into the
/// engine's private fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Emitted(Vec<u8>),
    OpenedReport,
    OpenedHistory,
    OpenedLog,
    ClosedReport(Option<String>),
    ClosedHistory(Option<String>),
    ClosedLog(Option<String>),
    SnapshotWritten,
    LogmodeSet,
    LogmodeCleared,
    Notified { client_id: u32, response: ServerResponse },
}

const END_SENTINEL: &[u8] = b";end\r";

/// The 1022 protocol engine. Owns every piece of mutable state except the
/// wire sink and the IPC endpoint, which are supplied by the caller so
/// the engine itself stays testable without a serial port or a running
/// message queue.
pub struct Engine {
    state: ProtocolState,
    mode: Mode,
    debug_dump: bool,
    status: Status,
    acc: Accumulator,
    control: PendingRequests,
    writers: PayloadWriters,
    gate: SnapshotGate,
    hst_first: bool,
}

impl Engine {
    pub fn new(mode: Mode, layout: PathLayout, clock: &dyn Clock) -> Self {
        Engine {
            state: ProtocolState::SsUnknown,
            mode,
            debug_dump: false,
            status: Status::initial(),
            acc: Accumulator::new(),
            control: PendingRequests::new(),
            writers: PayloadWriters::new(layout),
            gate: SnapshotGate::new(clock),
            hst_first: false,
        }
    }

    pub fn set_debug_dump(&mut self, on: bool) {
        self.debug_dump = on;
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn control_mut(&mut self) -> &mut PendingRequests {
        &mut self.control
    }

    /// Re-evaluates the snapshot gate against the current time. Call once
    /// per inbound read, before feeding the read's bytes through [`step`].
    pub fn poll_clock(&mut self, clock: &dyn Clock) {
        self.gate.poll(clock);
    }

    /// Processes one inbound byte, returning the effects it produced.
    /// Mutates the engine's own accumulator/status/control-bus state and
    /// performs file I/O through the owned [`PayloadWriters`]; wire writes
    /// go through `wire`. IPC responses are returned rather than sent
    /// directly, since the engine has no IPC endpoint of its own.
    pub fn step(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        if self.debug_dump {
            trace!("state={:?} byte={:#04x}", self.state, byte);
        }
        let result = self.dispatch(byte, wire);
        match result {
            Ok(effects) => Ok(effects),
            Err(Error::BufferOverflow { len, capacity }) => {
                warn!(
                    "accumulator overflow in state {:?} ({len}/{capacity} bytes); resyncing to SsUnknown",
                    self.state
                );
                self.acc.reset();
                self.state = ProtocolState::SsUnknown;
                Err(Error::BufferOverflow { len, capacity })
            }
            Err(other) => Err(other),
        }
    }

    fn dispatch(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        use ProtocolState::*;
        match self.state {
            SsUnknown => self.on_ss_unknown(byte),
            SsPause => self.on_ss_pause(byte, wire),
            SsDisplay => self.on_ss_display(byte),
            SsPrinter => self.on_ss_printer(byte),
            RptStart => self.on_rpt_start(byte),
            RptData => self.on_rpt_data(byte),
            RptDisplay => self.on_rpt_display(byte, wire),
            RptPrinter => self.on_rpt_printer(byte),
            HstStart => self.on_hst_start(byte),
            HstDisplay => self.on_hst_display(byte, wire),
            HstPrinter => self.on_hst_printer(byte),
            HstPrinterActive => self.on_hst_printer_active(byte),
            HstData => self.on_hst_data(byte),
            LogStart => self.on_log_start(byte),
            LogData => self.on_log_data(byte),
            LogDisplay => self.on_log_display(byte, wire),
            LogPrinter => self.on_log_printer(byte),
            LogPrinterActive => self.on_log_printer_active(byte),
        }
    }

    fn transition(&mut self, to: ProtocolState) {
        debug!("{:?} -> {:?}", self.state, to);
        self.state = to;
    }

    // ---- steady state -------------------------------------------------

    fn on_ss_unknown(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x91 {
            self.acc.reset_with(byte);
            self.transition(ProtocolState::SsDisplay);
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }

    fn on_ss_display(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x98 {
            if self.gate.take() {
                self.writers.snapshot_readings(self.acc.as_slice());
                effects.push(Effect::SnapshotWritten);
            }
            self.acc.reset_with(byte);
            self.transition(ProtocolState::SsPause);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_ss_pause(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x90 {
            if self.mode == Mode::Active {
                effects = self.ss_pause_active(byte, wire)?;
            } else {
                self.acc.reset_with(byte);
                self.transition(ProtocolState::SsPrinter);
            }
        } else if self.acc.len() >= 2 && self.acc.at(self.acc.len() - 2) == Some(0x40) && byte == CR
        {
            // An `@X\r` directive embedded in display text. Only actioned
            // in Active mode, matching the original (passive listeners
            // have no printer identity to act as).
            if self.mode == Mode::Active {
                match self.acc.at(self.acc.len() - 1) {
                    Some(command::REPORT) => self.control.insert(RequestKind::Report, Origin::Wire),
                    Some(0x48) => self.control.insert(RequestKind::History, Origin::Wire),
                    Some(0x4c) => self.control.insert(RequestKind::LogModeOn, Origin::Wire),
                    other => warn!("SsPause: invalid @ directive byte {other:?}"),
                }
            }
            self.acc.reset();
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn ss_pause_active(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if self.control.contains(RequestKind::Report) {
            self.control.take(RequestKind::Report);
            let frame = [self.status.get(), command::REPORT, CR];
            crate::wire::send_checked(wire, &frame)?;
            effects.push(Effect::Emitted(frame.to_vec()));
            self.acc.reset_seeded(&[byte, self.status.get(), command::REPORT, CR]);
            self.transition(ProtocolState::RptStart);
        } else if self.control.contains(RequestKind::History) {
            self.control.take(RequestKind::History);
            let frame = [self.status.get(), command::IDLE_HISTORY, CR];
            crate::wire::send_checked(wire, &frame)?;
            effects.push(Effect::Emitted(frame.to_vec()));
            self.acc
                .reset_seeded(&[byte, self.status.get(), command::IDLE_HISTORY, CR]);
            self.transition(ProtocolState::HstStart);
        } else if self.control.contains(RequestKind::LogModeOn) {
            let origin = self.control.take(RequestKind::LogModeOn);
            self.status.set_logmode();
            effects.push(Effect::LogmodeSet);
            if let Some(Origin::Client(client_id)) = origin {
                effects.push(Effect::Notified {
                    client_id,
                    response: ServerResponse::ActionSuccess("logmode 1".into()),
                });
            }
            let frame = [self.status.get(), command::HISTORY_FIRST, CR];
            crate::wire::send_checked(wire, &frame)?;
            effects.push(Effect::Emitted(frame.to_vec()));
            self.acc
                .reset_seeded(&[byte, self.status.get(), command::HISTORY_FIRST, CR]);
            self.transition(ProtocolState::LogStart);
        } else {
            let frame = [self.status.get()];
            crate::wire::send_checked(wire, &frame)?;
            effects.push(Effect::Emitted(frame.to_vec()));
            self.acc.reset_seeded(&[byte, self.status.get()]);
            self.transition(ProtocolState::SsPrinter);
        }
        Ok(effects)
    }

    fn on_ss_printer(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x98 {
            self.acc.reset_with(byte);
            self.transition(ProtocolState::SsPause);
        } else if self.acc.at(self.acc.len().wrapping_sub(1)) == Some(command::REPORT) && byte == CR
        {
            self.acc.append(byte)?;
            self.transition(ProtocolState::RptStart);
        } else if self.acc.at(self.acc.len().wrapping_sub(1)) == Some(command::IDLE_HISTORY)
            && byte == CR
        {
            self.acc.append(byte)?;
            self.transition(ProtocolState::HstStart);
        } else if self.acc.at(self.acc.len().wrapping_sub(1)) == Some(command::HISTORY_FIRST)
            && byte == CR
        {
            self.acc.append(byte)?;
            self.transition(ProtocolState::LogStart);
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }

    // ---- report transaction --------------------------------------------

    fn on_rpt_start(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x98 {
            self.writers.open_report()?;
            effects.push(Effect::OpenedReport);
            self.acc.reset_with(byte);
            self.transition(ProtocolState::RptData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_rpt_data(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x91 {
            self.writers.write_report(self.acc.as_slice());
            if self.acc.ends_with(END_SENTINEL) {
                let path = self.writers.report_path_string();
                self.writers.close_report();
                effects.push(Effect::ClosedReport(path.clone()));
                if let Some(Origin::Client(client_id)) = self.control.take(RequestKind::Report) {
                    effects.push(Effect::Notified {
                        client_id,
                        response: ServerResponse::ActionSuccess(format!(
                            "report {}",
                            path.unwrap_or_default()
                        )),
                    });
                }
                self.acc.reset_with(byte);
                if self.status.is_logmode() {
                    self.transition(ProtocolState::LogDisplay);
                } else {
                    self.transition(ProtocolState::SsDisplay);
                }
            } else {
                self.acc.reset_with(byte);
                self.transition(ProtocolState::RptDisplay);
            }
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_rpt_display(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if self.acc.ends_with(&[0x98]) && byte == 0x90 {
            if self.gate.take() {
                self.writers.snapshot_readings(self.acc.as_slice());
                effects.push(Effect::SnapshotWritten);
            }
            if self.mode == Mode::Active {
                let frame = [self.status.get()];
                crate::wire::send_checked(wire, &frame)?;
                effects.push(Effect::Emitted(frame.to_vec()));
                self.acc.reset_seeded(&[0x98, byte, self.status.get()]);
            } else {
                self.acc.reset_seeded(&[0x98, byte]);
            }
            self.transition(ProtocolState::RptPrinter);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_rpt_printer(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x98 {
            self.acc.reset_with(byte);
            self.transition(ProtocolState::RptData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }

    // ---- history transaction -------------------------------------------

    fn on_hst_start(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x98 {
            self.writers.open_history()?;
            effects.push(Effect::OpenedHistory);
            self.hst_first = true;
            self.acc.reset_with(byte);
            self.transition(ProtocolState::HstDisplay);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_hst_display(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if self.acc.ends_with(&[0x98]) && byte == 0x90 {
            if self.gate.take() {
                self.writers.snapshot_readings(self.acc.as_slice());
                effects.push(Effect::SnapshotWritten);
            }
            if self.mode == Mode::Active {
                let cmd = if self.hst_first {
                    self.hst_first = false;
                    command::HISTORY_FIRST
                } else {
                    command::HISTORY_NEXT
                };
                let frame = [self.status.get(), cmd, CR];
                crate::wire::send_checked(wire, &frame)?;
                effects.push(Effect::Emitted(frame.to_vec()));
                self.acc.reset_seeded(&[0x98, byte, self.status.get(), cmd, CR]);
                self.transition(ProtocolState::HstPrinterActive);
            } else {
                self.acc.reset_seeded(&[0x98, byte]);
                self.transition(ProtocolState::HstPrinter);
            }
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_hst_printer(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x98 {
            if self.acc.ends_with(&[command::HISTORY_NEXT, CR])
                || self.acc.ends_with(&[command::HISTORY_FIRST, CR])
            {
                self.acc.reset_with(0x98);
                self.transition(ProtocolState::HstData);
            } else {
                self.acc.reset_with(byte);
                self.transition(ProtocolState::HstDisplay);
            }
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }

    fn on_hst_printer_active(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x98 {
            self.acc.reset_with(byte);
            self.transition(ProtocolState::HstData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }

    fn on_hst_data(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x91 {
            self.writers.write_history(self.acc.as_slice());
            if self.acc.ends_with(END_SENTINEL) {
                let path = self.writers.history_path_string();
                self.writers.close_history();
                effects.push(Effect::ClosedHistory(path.clone()));
                if let Some(Origin::Client(client_id)) = self.control.take(RequestKind::History) {
                    effects.push(Effect::Notified {
                        client_id,
                        response: ServerResponse::ActionSuccess(format!(
                            "history {}",
                            path.unwrap_or_default()
                        )),
                    });
                }
                self.acc.reset_with(byte);
                if self.status.is_logmode() {
                    self.transition(ProtocolState::LogDisplay);
                } else {
                    self.transition(ProtocolState::SsDisplay);
                }
            } else {
                self.acc.reset_seeded(&[0x98, byte]);
                self.transition(ProtocolState::HstDisplay);
            }
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    // ---- log mode --------------------------------------------------------

    fn on_log_start(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x98 {
            self.writers.open_log()?;
            effects.push(Effect::OpenedLog);
            self.status.set_logmode();
            effects.push(Effect::LogmodeSet);
            self.acc.reset_with(byte);
            self.transition(ProtocolState::LogData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_log_data(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x91 {
            // buffer[0] == 0x98 (the seed byte); buffer[1]/[2] are the
            // first two real payload bytes, inspected here for an
            // embedded `@L`/`@R`/`@H` directive in Active mode.
            if self.mode == Mode::Active && self.acc.at(1) == Some(0x40) {
                match self.acc.at(2) {
                    Some(0x4c) => self.control.insert(RequestKind::LogModeOff, Origin::Wire),
                    Some(command::REPORT) => self.control.insert(RequestKind::Report, Origin::Wire),
                    Some(0x48) => self.control.insert(RequestKind::History, Origin::Wire),
                    other => warn!("LogData: invalid @ directive byte {other:?}"),
                }
            }
            // Not a ";wait" marker (second byte != ';') -> write to log,
            // stripping the leading 0x98 seed byte.
            if self.writers.log_is_open() && self.acc.at(1) != Some(0x3B) {
                let payload = if self.acc.at(0) == Some(0x98) {
                    &self.acc.as_slice()[1..]
                } else {
                    self.acc.as_slice()
                };
                self.writers.write_log(payload);
            }
            self.acc.reset_with(byte);
            self.transition(ProtocolState::LogDisplay);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_log_display(&mut self, byte: u8, wire: &mut dyn WireSink) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        let last_is_98 = self.acc.ends_with(&[0x98]);
        if last_is_98 && byte == 0x90 {
            if self.gate.take() {
                self.writers.snapshot_readings(self.acc.as_slice());
                effects.push(Effect::SnapshotWritten);
            }
            if self.mode == Mode::Active {
                if self.control.contains(RequestKind::LogModeOff) {
                    let origin = self.control.take(RequestKind::LogModeOff);
                    self.status.clear_logmode();
                    effects.push(Effect::LogmodeCleared);
                    let frame = [self.status.get()];
                    crate::wire::send_checked(wire, &frame)?;
                    effects.push(Effect::Emitted(frame.to_vec()));
                    let path = self.writers.log_path_string();
                    self.writers.close_log();
                    effects.push(Effect::ClosedLog(path.clone()));
                    if let Some(Origin::Client(client_id)) = origin {
                        effects.push(Effect::Notified {
                            client_id,
                            response: ServerResponse::ActionSuccess(format!(
                                "logmode 0 {}",
                                path.unwrap_or_default()
                            )),
                        });
                    }
                    self.acc.reset_seeded(&[0x98, byte, self.status.get()]);
                    self.transition(ProtocolState::SsPrinter);
                } else if self.control.contains(RequestKind::Report) {
                    self.control.take(RequestKind::Report);
                    let frame = [self.status.get(), command::REPORT, CR];
                    crate::wire::send_checked(wire, &frame)?;
                    effects.push(Effect::Emitted(frame.to_vec()));
                    self.acc
                        .reset_seeded(&[0x98, byte, self.status.get(), command::REPORT, CR]);
                    self.transition(ProtocolState::RptStart);
                } else if self.control.contains(RequestKind::History) {
                    self.control.take(RequestKind::History);
                    let frame = [self.status.get(), command::IDLE_HISTORY, CR];
                    crate::wire::send_checked(wire, &frame)?;
                    effects.push(Effect::Emitted(frame.to_vec()));
                    self.acc.reset_seeded(&[
                        0x98,
                        byte,
                        self.status.get(),
                        command::IDLE_HISTORY,
                        CR,
                    ]);
                    self.transition(ProtocolState::HstStart);
                } else {
                    let frame = [self.status.get(), command::LOG_NEXT, CR];
                    crate::wire::send_checked(wire, &frame)?;
                    effects.push(Effect::Emitted(frame.to_vec()));
                    self.acc
                        .reset_seeded(&[0x98, byte, self.status.get(), command::LOG_NEXT, CR]);
                    self.transition(ProtocolState::LogPrinterActive);
                }
            } else {
                self.acc.reset_seeded(&[0x98, byte]);
                self.transition(ProtocolState::LogPrinter);
            }
        } else if last_is_98 && byte == 0x91 {
            // Back-to-back display records: stay in LogDisplay.
            self.acc.reset_seeded(&[0x98, byte]);
        } else if last_is_98 && byte == 0x3B {
            // A ";wait" frame opens — transition into LogData.
            self.acc.reset_seeded(&[0x98, byte]);
            self.transition(ProtocolState::LogData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(effects)
    }

    fn on_log_printer(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        let mut effects = vec![];
        if byte == 0x98 {
            // buffer layout here is [0x98, 0x90, status, ...]; offset 2
            // is the real printer's status byte, passively observed.
            let printer_status = self.acc.at(2).unwrap_or(0);
            if printer_status & Status::LOGMODE.get() == 0 {
                let path = self.writers.log_path_string();
                self.writers.close_log();
                effects.push(Effect::ClosedLog(path));
                self.status.clear_logmode();
                effects.push(Effect::LogmodeCleared);
                self.acc.reset_with(byte);
                self.transition(ProtocolState::SsDisplay);
            } else {
                self.acc.reset_with(byte);
                self.transition(ProtocolState::LogDisplay);
            }
        } else {
            let last = self.acc.at(self.acc.len().wrapping_sub(1));
            if last == Some(command::LOG_NEXT) && byte == CR {
                // The real printer pulled the next log record; its data
                // follows immediately with no further start gate (the
                // log file is already open from LogStart).
                self.acc.reset();
                self.transition(ProtocolState::LogData);
            } else if last == Some(command::REPORT) && byte == CR {
                self.acc.append(byte)?;
                self.transition(ProtocolState::RptStart);
            } else if last == Some(command::IDLE_HISTORY) && byte == CR {
                self.acc.append(byte)?;
                self.transition(ProtocolState::HstStart);
            } else {
                self.acc.append(byte)?;
            }
        }
        Ok(effects)
    }

    fn on_log_printer_active(&mut self, byte: u8) -> Result<Vec<Effect>, Error> {
        if byte == 0x98 {
            self.acc.reset_with(byte);
            self.transition(ProtocolState::LogData);
        } else {
            self.acc.append(byte)?;
        }
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppableClock;
    use crate::wire::IoWireSink;
    use std::time::Duration;
    use tempfile::tempdir;

    fn engine_in(dir: &std::path::Path, mode: Mode) -> (Engine, SteppableClock) {
        let clock = SteppableClock::new();
        let layout = PathLayout {
            target: false,
            target_disk_dir: dir.join("target-disk"),
            target_ram_dir: dir.join("target-ram"),
            desktop_dir: dir.to_path_buf(),
        };
        (Engine::new(mode, layout, &clock), clock)
    }

    fn feed(engine: &mut Engine, wire: &mut dyn WireSink, bytes: &[u8]) -> Vec<u8> {
        let mut emitted = Vec::new();
        for &b in bytes {
            let effects = engine.step(b, wire).unwrap();
            for e in effects {
                if let Effect::Emitted(bytes) = e {
                    emitted.extend(bytes);
                }
            }
        }
        emitted
    }

    #[test]
    fn idle_cycle_emits_status_once() {
        let dir = tempdir().unwrap();
        let (mut engine, _clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        let emitted = feed(&mut engine, &mut wire, &[0x91, 0x44, 0x98, 0x90, 0x44, 0x98]);
        assert_eq!(emitted, vec![0x44]);
        assert_eq!(engine.state(), ProtocolState::SsPause);
    }

    #[test]
    fn client_report_request_drives_transaction_and_notifies() {
        let dir = tempdir().unwrap();
        let (mut engine, _clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        feed(&mut engine, &mut wire, &[0x91, 0x44, 0x98]);
        engine
            .control_mut()
            .insert(RequestKind::Report, Origin::Client(9));

        let effects = engine.step(0x90, &mut wire).unwrap();
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emitted(b) if b == &vec![engine.status().get(), 0x52, 0x0D])));
        assert_eq!(engine.state(), ProtocolState::RptStart);

        engine.step(0x98, &mut wire).unwrap(); // open report file, -> RptData
        for &b in b";end\r" {
            engine.step(b, &mut wire).unwrap();
        }
        let effects = engine.step(0x91, &mut wire).unwrap();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notified { client_id: 9, response: ServerResponse::ActionSuccess(body) }
                if body.starts_with("report ")
        )));
    }

    #[test]
    fn wire_directive_sets_control_bit_without_client_reply() {
        let dir = tempdir().unwrap();
        let (mut engine, _clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        feed(&mut engine, &mut wire, &[0x91, 0x44, 0x98]);
        feed(&mut engine, &mut wire, b"@R\r");
        assert_eq!(
            engine.control_mut().take(RequestKind::Report),
            Some(Origin::Wire)
        );
    }

    #[test]
    fn log_data_at_directive_requests_logmode_off() {
        let dir = tempdir().unwrap();
        let (mut engine, _clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        feed(&mut engine, &mut wire, &[0x91, 0x44, 0x98]);
        engine
            .control_mut()
            .insert(RequestKind::LogModeOn, Origin::Wire);
        engine.step(0x90, &mut wire).unwrap(); // -> LogStart
        engine.step(0x98, &mut wire).unwrap(); // open log, -> LogData
        for &b in &[0x40u8, 0x4c, 0x0D] {
            engine.step(b, &mut wire).unwrap();
        }
        let effects = engine.step(0x91, &mut wire).unwrap();
        let _ = effects;
        assert_eq!(
            engine.control_mut().take(RequestKind::LogModeOff),
            Some(Origin::Wire)
        );
    }

    #[test]
    fn snapshot_gate_arms_after_six_seconds() {
        let dir = tempdir().unwrap();
        let (mut engine, clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        clock.advance(Duration::from_secs(6));
        engine.poll_clock(&clock);
        let effects = feed_with_effects(&mut engine, &mut wire, &[0x91, 0x44, 0x98]);
        assert!(effects.iter().any(|e| matches!(e, Effect::SnapshotWritten)));
        let readings = std::fs::read(dir.path().join("readings.txt")).unwrap();
        assert_eq!(readings, vec![0x91, 0x44]);
    }

    fn feed_with_effects(
        engine: &mut Engine,
        wire: &mut dyn WireSink,
        bytes: &[u8],
    ) -> Vec<Effect> {
        let mut all = Vec::new();
        for &b in bytes {
            all.extend(engine.step(b, wire).unwrap());
        }
        all
    }

    #[test]
    fn overflow_resyncs_to_unknown() {
        let dir = tempdir().unwrap();
        let (mut engine, _clock) = engine_in(dir.path(), Mode::Active);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        // SsUnknown accumulates everything that isn't 0x91; overrun it.
        for _ in 0..crate::accumulator::ACCUMULATOR_CAPACITY {
            engine.step(0xAA, &mut wire).unwrap();
        }
        let err = engine.step(0xAA, &mut wire).unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { .. }));
        assert_eq!(engine.state(), ProtocolState::SsUnknown);
    }
}
