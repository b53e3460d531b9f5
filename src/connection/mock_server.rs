//! Scripted admin-protocol server for unit tests

use crate::protocol::constants::{
    fields, result_codes, ADMIN_HEADER_SIZE, COMMAND_OFFSET, FIELD_COUNT_OFFSET, MSG_TYPE_ADMIN,
    MSG_VERSION, PROTO_HEADER_SIZE, RESULT_CODE_OFFSET,
};
use crate::protocol::decode::decode_fields;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the server does with the next request it reads
pub(crate) enum Reply {
    /// Answer with a result code and fields
    Respond {
        result_code: u8,
        fields: Vec<(u8, Vec<u8>)>,
    },
    /// Read the request and never answer
    Hang,
    /// Read the request and drop the socket
    Hangup,
}

impl Reply {
    pub(crate) fn ok() -> Self {
        Self::code(result_codes::OK)
    }

    pub(crate) fn code(result_code: u8) -> Self {
        Reply::Respond {
            result_code,
            fields: Vec::new(),
        }
    }

    pub(crate) fn login(token: &str, ttl_secs: u32) -> Self {
        Reply::Respond {
            result_code: result_codes::OK,
            fields: vec![
                (fields::SESSION_TOKEN, token.as_bytes().to_vec()),
                (fields::SESSION_TTL, ttl_secs.to_be_bytes().to_vec()),
            ],
        }
    }
}

/// A request as seen by the server
#[derive(Debug, Clone)]
pub(crate) struct ReceivedRequest {
    pub(crate) command: u8,
    pub(crate) fields: Vec<(u8, Bytes)>,
}

impl ReceivedRequest {
    pub(crate) fn field(&self, id: u8) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(field_id, _)| *field_id == id)
            .map(|(_, data)| data.as_ref())
    }
}

/// Server that accepts connections one after another and answers requests
/// from a shared script until it runs out.
pub(crate) struct MockServer {
    port: u16,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockServer {
    pub(crate) async fn spawn(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        tokio::spawn(async move {
            let mut script: VecDeque<Reply> = script.into();
            while !script.is_empty() {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                serve(socket, &mut script, &log).await;
            }
        });

        Self { port, received }
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Requests received so far, in order
    pub(crate) async fn requests(&self) -> Vec<ReceivedRequest> {
        tokio::task::yield_now().await;
        self.received.lock().unwrap().clone()
    }
}

async fn serve(
    mut socket: TcpStream,
    script: &mut VecDeque<Reply>,
    log: &Mutex<Vec<ReceivedRequest>>,
) {
    loop {
        let Some(request) = read_request(&mut socket).await else {
            return;
        };
        log.lock().unwrap().push(request);

        match script.pop_front() {
            Some(Reply::Respond {
                result_code,
                fields,
            }) => {
                let response = encode_response(result_code, &fields);
                if socket.write_all(&response).await.is_err() {
                    return;
                }
            }
            Some(Reply::Hang) => {
                // hold the socket open until the client goes away
                let mut sink = [0u8; 64];
                while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
                return;
            }
            Some(Reply::Hangup) | None => return,
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut header = [0u8; PROTO_HEADER_SIZE];
    socket.read_exact(&mut header).await.ok()?;
    let body_len = (u64::from_be_bytes(header) & 0xFFFF_FFFF_FFFF) as usize;

    let mut body = vec![0u8; body_len];
    socket.read_exact(&mut body).await.ok()?;

    let fields = decode_fields(
        &body[ADMIN_HEADER_SIZE..],
        body[FIELD_COUNT_OFFSET] as usize,
    )
    .ok()?;
    Some(ReceivedRequest {
        command: body[COMMAND_OFFSET],
        fields,
    })
}

fn encode_response(result_code: u8, fields: &[(u8, Vec<u8>)]) -> BytesMut {
    let mut header = [0u8; ADMIN_HEADER_SIZE];
    header[RESULT_CODE_OFFSET] = result_code;
    header[FIELD_COUNT_OFFSET] = fields.len() as u8;

    let mut body = BytesMut::new();
    body.put_slice(&header);
    for (id, data) in fields {
        body.put_u32(data.len() as u32 + 1);
        body.put_u8(*id);
        body.put_slice(data);
    }

    let mut buf = BytesMut::new();
    buf.put_u64(
        (u64::from(MSG_VERSION) << 56) | (u64::from(MSG_TYPE_ADMIN) << 48) | body.len() as u64,
    );
    buf.put_slice(&body);
    buf
}
