// CLASSIFICATION: COMMUNITY
// Filename: replay.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Replays a captured hex-dump of wire traffic through the engine, for
//! `-u <idx|file>` unit-test mode. The capture format is the same
//! chunked hex dump [`crate::hexdump::format_bytes`] produces, so a
//! capture taken with `-c` is directly replayable.

use std::path::Path;

use crate::error::Error;
use crate::hexdump::parse_bytes;
use crate::state::{Effect, Engine};
use crate::wire::WireSink;

/// Reads `path`, decodes it as a hex-dump capture, and feeds every byte
/// through `engine`. Returns the concatenated effects from every byte
/// processed, in order. Stops (returning what was accumulated so far
/// plus the error) on the first `Err` from the engine, matching the
/// driver loop's own resync-and-continue posture would be the caller's
/// job, not this harness's.
pub fn run_capture(
    path: &Path,
    engine: &mut Engine,
    wire: &mut dyn WireSink,
) -> Result<Vec<Effect>, Error> {
    let text = std::fs::read_to_string(path)?;
    run_bytes(&parse_bytes(&text), engine, wire)
}

/// Like [`run_capture`] but takes already-decoded bytes, for tests that
/// don't want to round-trip through a file.
pub fn run_bytes(
    bytes: &[u8],
    engine: &mut Engine,
    wire: &mut dyn WireSink,
) -> Result<Vec<Effect>, Error> {
    let mut effects = Vec::new();
    for &b in bytes {
        effects.extend(engine.step(b, wire)?);
    }
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::hexdump::format_bytes;
    use crate::state::{Mode, ProtocolState};
    use crate::wire::IoWireSink;
    use crate::writer::PathLayout;
    use tempfile::tempdir;

    #[test]
    fn capture_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let capture = dir.path().join("capture.txt");
        std::fs::write(&capture, format_bytes(&[0x91, 0x44, 0x98, 0x90, 0x44, 0x98])).unwrap();

        let clock = SystemClock;
        let mut engine = Engine::new(Mode::Active, PathLayout::default(), &clock);
        let mut buf = Vec::new();
        let mut wire = IoWireSink::new(&mut buf);
        run_capture(&capture, &mut engine, &mut wire).unwrap();

        assert_eq!(engine.state(), ProtocolState::SsPause);
        assert_eq!(buf, vec![0x44]);
    }
}
