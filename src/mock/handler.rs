use crate::cache::store::Store;
use crate::mock::mock_server::MockSystemTimer;
use crate::protocol::binary::decoder;
use crate::protocol::binary::decoder::BinaryRequest;
use crate::protocol::binary::encoder;
use crate::protocol::binary::network;
use crate::server::handler::BinaryHandler;
use std::sync::Arc;

use bytes::Bytes;

pub const OPAQUE_VALUE: u32 = 0xABAD_CAFE;

/// Handler bound to a settable clock so tests can steer expiry.
pub struct BinaryHandlerWithTimer {
    pub handler: BinaryHandler,
    pub timer: Arc<MockSystemTimer>,
}

impl BinaryHandlerWithTimer {
    pub fn handle_request(&self, req: BinaryRequest) -> Option<encoder::BinaryResponse> {
        self.handler.handle_request(req)
    }
}

pub fn create_handler() -> BinaryHandlerWithTimer {
    let timer = Arc::new(MockSystemTimer::new());
    let store = Arc::new(Store::new(timer.clone()));
    BinaryHandlerWithTimer {
        handler: BinaryHandler::new(store, timer.clone()),
        timer,
    }
}

pub fn create_header(opcode: network::Command, key: &[u8]) -> network::RequestHeader {
    network::RequestHeader {
        magic: network::Magic::Request as u8,
        opcode: opcode as u8,
        key_length: key.len() as u16,
        extras_length: 0,
        data_type: 0,
        vbucket_id: 0,
        body_length: 0,
        opaque: OPAQUE_VALUE,
        cas: 0,
    }
}

pub fn get_value(handler: &BinaryHandlerWithTimer, key: Bytes) -> Bytes {
    let header = create_header(network::Command::Get, &key);
    let request = decoder::BinaryRequest::Get(network::GetRequest { header, key });

    let result = handler.handle_request(request);
    match result {
        Some(resp) => {
            if let encoder::BinaryResponse::Get(response) = resp {
                assert_ne!(response.header.cas, 0);
                response.value
            } else {
                unreachable!();
            }
        }
        None => unreachable!(),
    }
}

pub fn create_set_request(key: Bytes, value: Bytes) -> decoder::BinaryRequest {
    let header = create_header(network::Command::Set, &key);
    const FLAGS: u32 = 0xDEAD_BEEF;
    decoder::BinaryRequest::Set(network::SetRequest {
        header,
        key,
        flags: FLAGS,
        expiration: 0,
        value,
    })
}

pub fn insert_value(handler: &BinaryHandlerWithTimer, key: Bytes, value: Bytes) {
    let header = create_header(network::Command::SetQuiet, &key);
    const FLAGS: u32 = 0xDEAD_BEEF;
    let request = decoder::BinaryRequest::SetQuietly(network::SetRequest {
        header,
        key,
        flags: FLAGS,
        expiration: 0,
        value,
    });

    let result = handler.handle_request(request);
    assert!(result.is_none());
}

#[allow(clippy::too_many_arguments)]
pub fn check_header(
    response: &network::ResponseHeader,
    opcode: network::Command,
    key_length: u16,
    extras_length: u8,
    data_type: u8,
    status: u16,
    body_length: u32,
) {
    assert_eq!(response.magic, network::Magic::Response as u8);
    assert_eq!(response.opcode, opcode as u8);
    assert_eq!(response.key_length, key_length);
    assert_eq!(response.extras_length, extras_length);
    assert_eq!(response.data_type, data_type);
    assert_eq!(response.status, status);
    assert_eq!(response.body_length, body_length);
    assert_eq!(response.opaque, OPAQUE_VALUE);
}
