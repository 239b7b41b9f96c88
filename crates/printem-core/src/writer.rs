// CLASSIFICATION: COMMUNITY
// Filename: writer.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Open-on-demand payload files: report, history, log-mode, and the
//! periodically-rewritten `readings.txt` snapshot.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::warn;

use crate::error::Error;

/// Compiled-in target layout, overridable for tests.
#[derive(Debug, Clone)]
pub struct PathLayout {
    /// True when running on the embedded target (fixed paths, no
    /// timestamp suffix on report/history); false on a desktop/dev host
    /// (timestamp-suffixed filenames so repeated runs don't clobber).
    pub target: bool,
    pub target_disk_dir: PathBuf,
    pub target_ram_dir: PathBuf,
    pub desktop_dir: PathBuf,
}

impl Default for PathLayout {
    fn default() -> Self {
        PathLayout {
            target: false,
            target_disk_dir: PathBuf::from("/var/log/lsc"),
            target_ram_dir: PathBuf::from("/mnt/ramdisk/lsc"),
            desktop_dir: PathBuf::from("./Data"),
        }
    }
}

impl PathLayout {
    fn readings_path(&self) -> PathBuf {
        if self.target {
            self.target_ram_dir.join("readings.txt")
        } else {
            self.desktop_dir.join("readings.txt")
        }
    }

    fn report_path(&self) -> PathBuf {
        if self.target {
            self.target_ram_dir.join("report.txt")
        } else {
            self.desktop_dir.join(unique_filename("report-"))
        }
    }

    fn history_path(&self) -> PathBuf {
        if self.target {
            self.target_ram_dir.join("history.txt")
        } else {
            self.desktop_dir.join(unique_filename("history-"))
        }
    }

    fn log_path(&self) -> PathBuf {
        let base = if self.target {
            &self.target_disk_dir
        } else {
            &self.desktop_dir
        };
        base.join(unique_filename("logmode-"))
    }
}

/// Appends a `YYYYMMDDhhmmss` local-time suffix to a filename base. Always
/// applied for log-mode files (both target and desktop); applied for
/// report/history only on desktop, matching the original layout.
fn unique_filename(base: &str) -> String {
    format!("{base}{}.txt", Local::now().format("%Y%m%d%H%M%S"))
}

/// Owns the open payload file handles. Exclusive to the state machine;
/// never shared across threads.
#[derive(Default)]
pub struct PayloadWriters {
    layout: PathLayout,
    report: Option<OpenFile>,
    history: Option<OpenFile>,
    log: Option<OpenFile>,
}

struct OpenFile {
    path: PathBuf,
    file: File,
}

impl PayloadWriters {
    pub fn new(layout: PathLayout) -> Self {
        PayloadWriters {
            layout,
            report: None,
            history: None,
            log: None,
        }
    }

    pub fn open_report(&mut self) -> Result<(), Error> {
        let path = self.layout.report_path();
        self.report = Some(open_for_write(path)?);
        Ok(())
    }

    pub fn open_history(&mut self) -> Result<(), Error> {
        let path = self.layout.history_path();
        self.history = Some(open_for_write(path)?);
        Ok(())
    }

    pub fn open_log(&mut self) -> Result<(), Error> {
        let path = self.layout.log_path();
        self.log = Some(open_for_write(path)?);
        Ok(())
    }

    pub fn report_path_string(&self) -> Option<String> {
        self.report.as_ref().map(|f| path_to_string(&f.path))
    }

    pub fn history_path_string(&self) -> Option<String> {
        self.history.as_ref().map(|f| path_to_string(&f.path))
    }

    pub fn log_path_string(&self) -> Option<String> {
        self.log.as_ref().map(|f| path_to_string(&f.path))
    }

    pub fn write_report(&mut self, buf: &[u8]) {
        write_checked(&mut self.report, buf, "report");
    }

    pub fn write_history(&mut self, buf: &[u8]) {
        write_checked(&mut self.history, buf, "history");
    }

    pub fn write_log(&mut self, buf: &[u8]) {
        write_checked(&mut self.log, buf, "log");
    }

    pub fn close_report(&mut self) {
        self.report = None;
    }

    pub fn close_history(&mut self) {
        self.history = None;
    }

    pub fn close_log(&mut self) {
        self.log = None;
    }

    pub fn log_is_open(&self) -> bool {
        self.log.is_some()
    }

    /// Truncates and rewrites `readings.txt` with the latest display
    /// frame. Called only when the snapshot gate has armed.
    pub fn snapshot_readings(&self, buf: &[u8]) {
        let path = self.layout.readings_path();
        match File::create(&path) {
            Ok(mut f) => {
                if let Err(e) = f.write_all(buf) {
                    warn!("readings.txt write failed: {e}");
                }
            }
            Err(e) => warn!("readings.txt open failed at {}: {e}", path.display()),
        }
    }
}

fn open_for_write(path: PathBuf) -> Result<OpenFile, Error> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .map_err(|source| Error::PayloadWrite {
            path: path_to_string(&path),
            source,
        })?;
    Ok(OpenFile { path, file })
}

fn write_checked(slot: &mut Option<OpenFile>, buf: &[u8], kind: &str) {
    if let Some(open) = slot {
        match open.file.write(buf) {
            Ok(n) if n != buf.len() => {
                warn!(
                    "{kind} write short: wrote {n} of {} bytes to {}",
                    buf.len(),
                    open.path.display()
                );
            }
            Ok(_) => {}
            Err(e) => warn!("{kind} write error at {}: {e}", open.path.display()),
        }
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layout_in(dir: &Path) -> PathLayout {
        PathLayout {
            target: false,
            target_disk_dir: dir.join("target-disk"),
            target_ram_dir: dir.join("target-ram"),
            desktop_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn report_round_trips_on_desktop() {
        let dir = tempdir().unwrap();
        let mut writers = PayloadWriters::new(layout_in(dir.path()));
        writers.open_report().unwrap();
        writers.write_report(b"data;end\r");
        let path = writers.report_path_string().unwrap();
        writers.close_report();
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"data;end\r");
    }

    #[test]
    fn readings_snapshot_truncates() {
        let dir = tempdir().unwrap();
        let writers = PayloadWriters::new(layout_in(dir.path()));
        writers.snapshot_readings(b"first");
        writers.snapshot_readings(b"second-reading");
        let contents = std::fs::read(dir.path().join("readings.txt")).unwrap();
        assert_eq!(contents, b"second-reading");
    }

    #[test]
    fn target_mode_uses_fixed_report_path() {
        let dir = tempdir().unwrap();
        let mut layout = layout_in(dir.path());
        layout.target = true;
        let mut writers = PayloadWriters::new(layout);
        writers.open_report().unwrap();
        assert!(writers
            .report_path_string()
            .unwrap()
            .ends_with("target-ram/report.txt"));
    }
}
