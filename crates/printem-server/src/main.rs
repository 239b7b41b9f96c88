// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Printer Module Emulator for the 1022 diverter system.

mod cli;
mod driver;
mod serial;
mod signals;

use std::io::Cursor;

use clap::Parser;
use log::info;

use printem_core::clock::SystemClock;
use printem_core::hexdump::parse_bytes;
use printem_core::ipc::posixmq::PosixMqTransport;
use printem_core::replay;
use printem_core::state::{Engine, Mode};
use printem_core::wire::IoWireSink;
use printem_core::writer::PathLayout;

use crate::cli::Cli;
use crate::serial::{CaptureTee, TermiosSerialPort};
use crate::signals::Signals;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Printer Module Emulator starting");

    let mode = if cli.active_mode() { Mode::Active } else { Mode::Passive };
    let layout = resolve_layout(cli.output_dir.as_deref());
    let clock = SystemClock;
    let mut engine = Engine::new(mode, layout, &clock);
    engine.set_debug_dump(cli.debug_dump);

    if let Some(spec) = &cli.unit_test {
        return run_unit_test(&mut engine, spec);
    }

    let mut signals = Signals::install()?;
    let mut ipc = PosixMqTransport::open()?;

    if let Some(capture_path) = &cli.capture {
        let cap_file = std::fs::File::create(capture_path)?;
        let port = TermiosSerialPort::open(&cli.device, cli.low_latency())?;
        let mut tee = CaptureTee::new(port, cap_file);
        driver::run(&mut engine, &mut tee, &mut ipc, &clock, &mut signals)
    } else {
        let mut port = TermiosSerialPort::open(&cli.device, cli.low_latency())?;
        driver::run(&mut engine, &mut port, &mut ipc, &clock, &mut signals)
    }
}

fn run_unit_test(engine: &mut Engine, spec: &str) -> anyhow::Result<()> {
    let path = if spec.chars().all(|c| c.is_ascii_digit()) {
        format!("./Captures/{spec}.txt")
    } else {
        spec.to_string()
    };
    let bytes = std::fs::read_to_string(&path)?;
    let decoded = parse_bytes(&bytes);
    let mut sink = Cursor::new(Vec::new());
    let mut wire = IoWireSink::new(&mut sink);
    replay::run_bytes(&decoded, engine, &mut wire)?;
    info!("unit test replay of {path} complete, final state {:?}", engine.state());
    Ok(())
}

/// Resolves the on-disk layout for report/history/log/readings files,
/// matching the original's target-vs-desktop detection via `uname -a`.
fn resolve_layout(output_dir: Option<&std::path::Path>) -> PathLayout {
    let mut layout = PathLayout::default();
    if let Ok(output) = std::process::Command::new("uname").arg("-a").output() {
        let uname = String::from_utf8_lossy(&output.stdout);
        if uname.contains("rpi") {
            layout.target = true;
        }
    }
    if let Some(dir) = output_dir {
        layout.target_disk_dir = dir.to_path_buf();
        layout.target_ram_dir = dir.to_path_buf();
        layout.desktop_dir = dir.to_path_buf();
    }
    layout
}
