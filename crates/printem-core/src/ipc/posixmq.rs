// CLASSIFICATION: COMMUNITY
// Filename: ipc/posixmq.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Production IPC transport, backed by POSIX message queues via the
//! `posixmq` crate. This is the portable analogue of the original's
//! SysV `msgget`/`msgsnd`/`msgrcv` pair: one well-known server queue that
//! every client request lands on, and one per-client queue (named by the
//! client's own id, mirroring the original's use of the client's own mq
//! id as its "address") that the server unicasts responses to.

use posixmq::{OpenOptions, PosixMq};

use super::{ClientRequest, IpcClient, IpcRequestKind, IpcTransport, ServerResponse, MAX_COMMAND_LEN};
use crate::error::Error;

pub const SERVER_QUEUE_NAME: &str = "/printem-server";
const MAX_MSG_LEN: usize = 1 + 4 + MAX_COMMAND_LEN;

fn client_queue_name(client_id: u32) -> String {
    format!("/printem-client-{client_id}")
}

fn kind_to_tag(kind: IpcRequestKind) -> u8 {
    match kind {
        IpcRequestKind::Init => 1,
        IpcRequestKind::ReqReport => 2,
        IpcRequestKind::ReqHistory => 3,
        IpcRequestKind::ReqLog => 4,
        IpcRequestKind::ReqExit => 5,
    }
}

fn tag_to_kind(tag: u8) -> Option<IpcRequestKind> {
    match tag {
        1 => Some(IpcRequestKind::Init),
        2 => Some(IpcRequestKind::ReqReport),
        3 => Some(IpcRequestKind::ReqHistory),
        4 => Some(IpcRequestKind::ReqLog),
        5 => Some(IpcRequestKind::ReqExit),
        _ => None,
    }
}

fn response_tag(response: &ServerResponse) -> u8 {
    match response {
        ServerResponse::RequestSuccess(_) => 1,
        ServerResponse::RequestFailure(_) => 2,
        ServerResponse::ActionSuccess(_) => 3,
        ServerResponse::ActionFailure(_) => 4,
        ServerResponse::Reset => 5,
    }
}

fn encode_request(req: &ClientRequest) -> Vec<u8> {
    let mut msg = Vec::with_capacity(MAX_MSG_LEN);
    msg.push(kind_to_tag(req.kind));
    msg.extend_from_slice(&req.client_id.to_le_bytes());
    let cmd = req.command.as_bytes();
    let cmd = &cmd[..cmd.len().min(MAX_COMMAND_LEN)];
    msg.extend_from_slice(cmd);
    msg
}

fn decode_request(bytes: &[u8]) -> Option<ClientRequest> {
    if bytes.len() < 5 {
        return None;
    }
    let kind = tag_to_kind(bytes[0])?;
    let client_id = u32::from_le_bytes(bytes[1..5].try_into().ok()?);
    let command = String::from_utf8_lossy(&bytes[5..]).into_owned();
    Some(ClientRequest {
        kind,
        client_id,
        command,
    })
}

fn encode_response(response: &ServerResponse) -> Vec<u8> {
    let mut msg = Vec::with_capacity(MAX_MSG_LEN);
    msg.push(response_tag(response));
    msg.extend_from_slice(response.body().as_bytes());
    msg
}

fn decode_response(bytes: &[u8]) -> Option<ServerResponse> {
    if bytes.is_empty() {
        return None;
    }
    let body = String::from_utf8_lossy(&bytes[1..]).into_owned();
    Some(match bytes[0] {
        1 => ServerResponse::RequestSuccess(body),
        2 => ServerResponse::RequestFailure(body),
        3 => ServerResponse::ActionSuccess(body),
        4 => ServerResponse::ActionFailure(body),
        5 => ServerResponse::Reset,
        _ => return None,
    })
}

pub struct PosixMqTransport {
    server_mq: PosixMq,
}

impl PosixMqTransport {
    /// Creates (or reopens) the well-known server queue, non-blocking.
    pub fn open() -> Result<Self, Error> {
        let server_mq = OpenOptions::readwrite()
            .create()
            .nonblocking()
            .max_msg_len(MAX_MSG_LEN)
            .capacity(16)
            .open(SERVER_QUEUE_NAME)
            .map_err(|e| Error::TransportLost(format!("open {SERVER_QUEUE_NAME}: {e}")))?;
        Ok(PosixMqTransport { server_mq })
    }
}

impl IpcTransport for PosixMqTransport {
    fn try_recv_request(&mut self) -> Result<Option<ClientRequest>, Error> {
        let mut buf = [0u8; MAX_MSG_LEN];
        match self.server_mq.recv(&mut buf) {
            Ok((len, _priority)) => Ok(decode_request(&buf[..len])),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::TransportLost(format!("recv: {e}"))),
        }
    }

    fn send_response(&mut self, client_id: u32, response: &ServerResponse) -> Result<(), Error> {
        let name = client_queue_name(client_id);
        let client_mq = OpenOptions::writeonly()
            .nonblocking()
            .open(&name)
            .map_err(|e| Error::TransportLost(format!("open {name}: {e}")))?;
        let msg = encode_response(response);
        client_mq
            .send(0, &msg)
            .map_err(|e| Error::TransportLost(format!("send to {name}: {e}")))
    }
}

/// Client-side handle used by `printem-console` and `printem-ctl`.
pub struct PosixMqClient {
    server_mq: PosixMq,
    own_mq: PosixMq,
    client_id: u32,
}

impl PosixMqClient {
    pub fn open(client_id: u32) -> Result<Self, Error> {
        let server_mq = OpenOptions::writeonly()
            .open(SERVER_QUEUE_NAME)
            .map_err(|e| Error::TransportLost(format!("open {SERVER_QUEUE_NAME}: {e}")))?;
        let name = client_queue_name(client_id);
        let own_mq = OpenOptions::readonly()
            .create()
            .nonblocking()
            .max_msg_len(MAX_MSG_LEN)
            .capacity(4)
            .open(&name)
            .map_err(|e| Error::TransportLost(format!("open {name}: {e}")))?;
        Ok(PosixMqClient {
            server_mq,
            own_mq,
            client_id,
        })
    }
}

impl IpcClient for PosixMqClient {
    fn send_request(&mut self, request: &ClientRequest) -> Result<(), Error> {
        let msg = encode_request(request);
        self.server_mq
            .send(0, &msg)
            .map_err(|e| Error::TransportLost(format!("send: {e}")))
    }

    fn recv_response(&mut self) -> Result<ServerResponse, Error> {
        let mut buf = [0u8; MAX_MSG_LEN];
        let (len, _priority) = self.own_mq.recv(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::WouldBlock {
                Error::WouldBlock
            } else {
                Error::TransportLost(format!("recv: {e}"))
            }
        })?;
        decode_response(&buf[..len])
            .ok_or_else(|| Error::TransportLost("malformed response frame".into()))
    }
}

impl PosixMqClient {
    pub fn client_id(&self) -> u32 {
        self.client_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_encoding() {
        let req = ClientRequest {
            kind: IpcRequestKind::ReqHistory,
            client_id: 42,
            command: "history".into(),
        };
        let bytes = encode_request(&req);
        let decoded = decode_request(&bytes).unwrap();
        assert_eq!(decoded.kind, IpcRequestKind::ReqHistory);
        assert_eq!(decoded.client_id, 42);
        assert_eq!(decoded.command, "history");
    }

    #[test]
    fn response_round_trips_through_encoding() {
        let resp = ServerResponse::ActionSuccess("report report.txt".into());
        let bytes = encode_response(&resp);
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.body(), "report report.txt");
        assert!(decoded.is_ok());
    }
}
