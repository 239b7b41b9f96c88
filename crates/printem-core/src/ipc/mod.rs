// CLASSIFICATION: COMMUNITY
// Filename: ipc/mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Client IPC endpoint: a pair of unidirectional message queues between
//! the server and local control clients.
//!
//! Transport is abstracted behind [`IpcTransport`] with two
//! implementations: [`posixmq::PosixMqTransport`], the production
//! transport (POSIX message queues, the closest portable equivalent to
//! the original SysV `msgget`/`msgsnd`/`msgrcv` design), and
//! [`inprocess::InProcessTransport`], a paired in-process channel
//! transport used by tests — grounded in the corpus's own in-process vs.
//! real transport split for its protocol server.

pub mod inprocess;
pub mod posixmq;

use crate::error::Error;

pub use inprocess::InProcessTransport;
pub use posixmq::PosixMqTransport;

/// Maximum length of the informational command string carried in a
/// request frame, matching the original message payload size.
pub const MAX_COMMAND_LEN: usize = 256;

/// A request kind as carried on the wire between client and server.
/// Distinct from [`crate::control::RequestKind`]: that one names a
/// *pending protocol action*; this one names an *IPC message type*, and
/// the two do not map one-to-one (`ReqLog` becomes either `LogModeOn` or
/// `LogModeOff` depending on current state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcRequestKind {
    Init,
    ReqReport,
    ReqHistory,
    ReqLog,
    ReqExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    pub kind: IpcRequestKind,
    pub client_id: u32,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerResponse {
    RequestSuccess(String),
    RequestFailure(String),
    ActionSuccess(String),
    ActionFailure(String),
    Reset,
}

impl ServerResponse {
    pub fn body(&self) -> &str {
        match self {
            ServerResponse::RequestSuccess(s) => s,
            ServerResponse::RequestFailure(s) => s,
            ServerResponse::ActionSuccess(s) => s,
            ServerResponse::ActionFailure(s) => s,
            ServerResponse::Reset => "",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            ServerResponse::RequestSuccess(_) | ServerResponse::ActionSuccess(_)
        )
    }
}

/// Server-side half of the IPC endpoint: non-blocking receive, unicast
/// send to the most recently observed client.
pub trait IpcTransport: Send {
    /// Drains at most one pending request. Returns `Ok(None)` if none is
    /// queued. `Err(Error::TransportLost)` if the underlying queue has
    /// been removed out from under the server.
    fn try_recv_request(&mut self) -> Result<Option<ClientRequest>, Error>;

    /// Sends a response to `client_id`. A send failure is logged by the
    /// caller at `warn` and is not fatal.
    fn send_response(&mut self, client_id: u32, response: &ServerResponse) -> Result<(), Error>;
}

/// Client-side half, used by `printem-console` and `printem-ctl`.
pub trait IpcClient: Send {
    fn send_request(&mut self, request: &ClientRequest) -> Result<(), Error>;
    fn recv_response(&mut self) -> Result<ServerResponse, Error>;
}
