// CLASSIFICATION: COMMUNITY
// Filename: control.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Pending-request set consulted by the state machine at `SsPause` and
//! `LogDisplay`. Replaces the original's single MESSAGE_SRC bit with a
//! per-request origin tag, so "who do we owe a reply to?" is answered by
//! the type rather than a side-channel flag (see REDESIGN FLAGS).

use std::collections::HashMap;

/// Identifies who is owed a completion reply for a request, if anyone.
/// `Wire` requests (the 1022 sent `@R`/`@H`/`@L` on the display text) get
/// no reply at all; only `Client` requests do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Wire,
    Client(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Report,
    History,
    LogModeOn,
    LogModeOff,
}

/// A small set of at-most-one-pending-per-kind requests, each carrying the
/// origin that raised it. Mutated only from the driver thread; no locking.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: HashMap<RequestKind, Origin>,
}

impl PendingRequests {
    pub fn new() -> Self {
        PendingRequests {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, kind: RequestKind, origin: Origin) {
        self.entries.insert(kind, origin);
    }

    pub fn contains(&self, kind: RequestKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Removes and returns the origin of a pending request, if any. The
    /// state machine calls this the moment it acts on the request.
    pub fn take(&mut self, kind: RequestKind) -> Option<Origin> {
        self.entries.remove(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_origin_is_taken_once() {
        let mut pending = PendingRequests::new();
        pending.insert(RequestKind::Report, Origin::Client(7));
        assert!(pending.contains(RequestKind::Report));
        assert_eq!(pending.take(RequestKind::Report), Some(Origin::Client(7)));
        assert!(!pending.contains(RequestKind::Report));
        assert_eq!(pending.take(RequestKind::Report), None);
    }

    #[test]
    fn wire_origin_carries_no_client_id() {
        let mut pending = PendingRequests::new();
        pending.insert(RequestKind::LogModeOn, Origin::Wire);
        assert_eq!(pending.take(RequestKind::LogModeOn), Some(Origin::Wire));
    }
}
