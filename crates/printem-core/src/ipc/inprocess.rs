// CLASSIFICATION: COMMUNITY
// Filename: ipc/inprocess.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! In-process transport for tests and the replay harness: a paired
//! `crossbeam_channel` endpoint standing in for the real message-queue
//! pair, so the state machine and driver loop can be exercised without a
//! running `printem-server` process.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::{ClientRequest, IpcClient, IpcTransport, ServerResponse};
use crate::error::Error;

/// Server-side endpoint of an in-process transport pair.
pub struct InProcessTransport {
    requests: Receiver<ClientRequest>,
    responses: Sender<(u32, ServerResponse)>,
}

/// Client-side endpoint of an in-process transport pair.
pub struct InProcessClient {
    requests: Sender<ClientRequest>,
    responses: Receiver<(u32, ServerResponse)>,
    client_id: u32,
}

/// Builds a connected server/client pair.
pub fn pair(client_id: u32) -> (InProcessTransport, InProcessClient) {
    let (req_tx, req_rx) = crossbeam_channel::unbounded();
    let (rsp_tx, rsp_rx) = crossbeam_channel::unbounded();
    (
        InProcessTransport {
            requests: req_rx,
            responses: rsp_tx,
        },
        InProcessClient {
            requests: req_tx,
            responses: rsp_rx,
            client_id,
        },
    )
}

impl IpcTransport for InProcessTransport {
    fn try_recv_request(&mut self) -> Result<Option<ClientRequest>, Error> {
        match self.requests.try_recv() {
            Ok(req) => Ok(Some(req)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(Error::TransportLost("in-process request channel".into()))
            }
        }
    }

    fn send_response(&mut self, client_id: u32, response: &ServerResponse) -> Result<(), Error> {
        self.responses
            .send((client_id, response.clone()))
            .map_err(|_| Error::TransportLost("in-process response channel".into()))
    }
}

impl IpcClient for InProcessClient {
    fn send_request(&mut self, request: &ClientRequest) -> Result<(), Error> {
        self.requests
            .send(request.clone())
            .map_err(|_| Error::TransportLost("in-process request channel".into()))
    }

    fn recv_response(&mut self) -> Result<ServerResponse, Error> {
        let (_id, response) = self
            .responses
            .recv()
            .map_err(|_| Error::TransportLost("in-process response channel".into()))?;
        Ok(response)
    }
}

impl InProcessClient {
    pub fn client_id(&self) -> u32 {
        self.client_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::IpcRequestKind;

    #[test]
    fn request_observed_within_one_iteration() {
        let (mut server, mut client) = pair(1);
        client
            .send_request(&ClientRequest {
                kind: IpcRequestKind::ReqReport,
                client_id: client.client_id(),
                command: String::new(),
            })
            .unwrap();

        let received = server.try_recv_request().unwrap().expect("request queued");
        assert_eq!(received.kind, IpcRequestKind::ReqReport);

        server
            .send_response(
                received.client_id,
                &ServerResponse::RequestSuccess("report".into()),
            )
            .unwrap();
        let response = client.recv_response().unwrap();
        assert_eq!(response.body(), "report");
    }

    #[test]
    fn empty_queue_is_not_an_error() {
        let (mut server, _client) = pair(1);
        assert!(server.try_recv_request().unwrap().is_none());
    }
}
