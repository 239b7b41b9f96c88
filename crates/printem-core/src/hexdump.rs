// CLASSIFICATION: COMMUNITY
// Filename: hexdump.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Chunked hex pretty-printer used by `-d` debug-dump and by capture-file
//! writing, mirroring the original `DumpHex` layout: 16 bytes per line,
//! grouped in eights, with an ASCII gutter.

/// Formats `bytes` the way the original debug dump did: two-digit hex
/// pairs, a double space after every 8th byte, and a printable-ASCII
/// (or `.`) gutter at the end of each 16-byte line.
pub fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut ascii = String::new();

    for (i, &b) in bytes.iter().enumerate() {
        out.push_str(&format!("{b:02X} "));
        ascii.push(if (b' '..=b'~').contains(&b) { b as char } else { '.' });

        let at_row_end = (i + 1) % 16 == 0;
        let at_last = i + 1 == bytes.len();

        if (i + 1) % 8 == 0 || at_last {
            out.push(' ');
            if at_row_end {
                out.push_str(&format!("|  {ascii} \n"));
                ascii.clear();
            } else if at_last {
                let col = (i + 1) % 16;
                if col <= 8 {
                    out.push(' ');
                }
                for _ in col..16 {
                    out.push_str("   ");
                }
                out.push_str(&format!("|  {ascii} \n"));
                ascii.clear();
            }
        }
    }
    out
}

/// Extracts the raw bytes back out of a [`format_bytes`] dump (or any
/// text with two-digit hex byte pairs on each line, ignoring anything
/// after a `|`). Used by the replay harness to load capture files.
pub fn parse_bytes(text: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in text.lines() {
        let payload = line.split('|').next().unwrap_or("");
        for tok in payload.split_whitespace() {
            if let Ok(b) = u8::from_str_radix(tok, 16) {
                bytes.push(b);
            }
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_parse() {
        let data: Vec<u8> = (0..40u8).collect();
        let dumped = format_bytes(&data);
        let parsed = parse_bytes(&dumped);
        assert_eq!(parsed, data);
    }

    #[test]
    fn short_line_is_padded_with_ascii_gutter() {
        let dumped = format_bytes(&[0x90, 0x44]);
        assert!(dumped.contains("90 44"));
        assert!(dumped.contains('|'));
    }
}
