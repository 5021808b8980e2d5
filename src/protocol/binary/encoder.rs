use crate::cache::error::CacheError;
use crate::protocol::binary::network;
use bytes::{BufMut, Bytes, BytesMut};

/// Server response
#[derive(Debug)]
pub enum BinaryResponse {
    Error(network::ErrorResponse),
    Get(network::GetResponse),
    GetQuietly(network::GetQuietlyResponse),
    GetKey(network::GetKeyResponse),
    GetKeyQuietly(network::GetKeyQuietlyResponse),
    Set(network::SetResponse),
    Add(network::AddResponse),
    Replace(network::ReplaceResponse),
    Version(network::VersionResponse),
    Noop(network::NoopResponse),
    Quit(network::QuitResponse),
}

impl BinaryResponse {
    pub fn get_header(&'_ self) -> &'_ network::ResponseHeader {
        match self {
            BinaryResponse::Error(response) => &response.header,
            BinaryResponse::Get(response)
            | BinaryResponse::GetKey(response)
            | BinaryResponse::GetKeyQuietly(response)
            | BinaryResponse::GetQuietly(response) => &response.header,
            BinaryResponse::Set(response)
            | BinaryResponse::Add(response)
            | BinaryResponse::Replace(response) => &response.header,
            BinaryResponse::Version(response) => &response.header,
            BinaryResponse::Noop(response) => &response.header,
            BinaryResponse::Quit(response) => &response.header,
        }
    }
}

/// Maps a store failure to the error response carrying its wire status
/// and fixed ASCII body.
pub fn storage_error_to_response(
    err: CacheError,
    response_header: &mut network::ResponseHeader,
) -> BinaryResponse {
    let message = err.to_static_string();
    response_header.status = err as u16;
    response_header.body_length = message.len() as u32;
    BinaryResponse::Error(network::ErrorResponse {
        header: *response_header,
        error: message,
    })
}

pub struct ResponseMessage {
    // header+extras?+key?+value?
    pub(crate) data: Bytes,
}

pub struct BinaryEncoder {}

impl Default for BinaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryEncoder {
    const RESPONSE_HEADER_LEN: usize = 24;

    pub fn new() -> BinaryEncoder {
        BinaryEncoder {}
    }

    pub fn get_length(&self, msg: &BinaryResponse) -> usize {
        BinaryEncoder::RESPONSE_HEADER_LEN + (msg.get_header().body_length as usize)
    }

    pub fn encode_message(&self, msg: &BinaryResponse) -> ResponseMessage {
        let mut dst = BytesMut::with_capacity(self.get_length(msg));
        self.write_header(msg.get_header(), &mut dst);
        self.write_data(msg, dst)
    }

    fn write_header(&self, header: &network::ResponseHeader, dst: &mut BytesMut) {
        dst.put_u8(header.magic);
        dst.put_u8(header.opcode);
        dst.put_u16(header.key_length);
        dst.put_u8(header.extras_length);
        dst.put_u8(header.data_type);
        dst.put_u16(header.status);
        dst.put_u32(header.body_length);
        dst.put_u32(header.opaque);
        dst.put_u64(header.cas);
    }

    fn write_data(&self, msg: &BinaryResponse, mut dst: BytesMut) -> ResponseMessage {
        match msg {
            BinaryResponse::Error(response) => {
                dst.put(response.error.as_bytes());
            }
            BinaryResponse::Get(response)
            | BinaryResponse::GetKey(response)
            | BinaryResponse::GetKeyQuietly(response)
            | BinaryResponse::GetQuietly(response) => {
                dst.put_u32(response.flags);
                if !response.key.is_empty() {
                    dst.put_slice(&response.key[..]);
                }
                dst.put(response.value.clone());
            }
            BinaryResponse::Set(_response)
            | BinaryResponse::Add(_response)
            | BinaryResponse::Replace(_response) => {}
            BinaryResponse::Version(response) => {
                dst.put_slice(response.version.as_bytes());
            }
            BinaryResponse::Noop(_response) => {}
            BinaryResponse::Quit(_response) => {}
        }
        ResponseMessage { data: dst.freeze() }
    }
}
