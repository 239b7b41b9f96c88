// CLASSIFICATION: COMMUNITY
// Filename: cli.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Command-line surface for `printem-server`, in the corpus's
//! `#[derive(Parser)]` idiom.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "printem-server",
    version,
    about = "Printer Module Emulator for the 1022 diverter system"
)]
pub struct Cli {
    /// Capture data on the wire to a file for testing. Implies passive mode.
    #[arg(short = 'c', long = "capture", value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Debug dump of parser state machine transitions.
    #[arg(short = 'd', long = "debug-dump")]
    pub debug_dump: bool,

    /// Passive mode: act as a listener between the real printer module and
    /// the 1022. Default is active (emulator responds on the wire).
    #[arg(short = 'p', long = "passive")]
    pub passive: bool,

    /// "Slow" / regular-latency serial port mode. Default is low latency.
    #[arg(short = 's', long = "slow")]
    pub slow: bool,

    /// Run a unit test replaying a hex-dump capture file at <idx|file>.
    #[arg(short = 'u', long = "unit-test", value_name = "IDX_OR_FILE")]
    pub unit_test: Option<String>,

    /// Serial device to open.
    #[arg(long = "device", default_value = "/dev/ttyUSB0")]
    pub device: PathBuf,

    /// Override the desktop-host output directory for report/history/log
    /// payloads and the readings snapshot. Defaults to the compiled-in
    /// target layout when unset.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    pub fn active_mode(&self) -> bool {
        !self.passive && self.capture.is_none()
    }

    pub fn low_latency(&self) -> bool {
        !self.slow
    }
}
