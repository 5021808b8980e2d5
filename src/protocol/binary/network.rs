use bytes::Bytes;
use num_derive::{FromPrimitive, ToPrimitive};

#[derive(FromPrimitive, ToPrimitive, Debug)]
#[repr(u8)]
pub enum Magic {
    Request = 0x80,
    Response = 0x81,
}

#[derive(FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum ResponseStatus {
    NoError = 0x0000,
    KeyNotFound = 0x0001,
    KeyExists = 0x0002,
}

#[derive(FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum DataTypes {
    RawBytes = 0x00,
}

/// Opcodes this server dispatches on. Anything else on the wire is a
/// framing error that tears the connection down.
#[derive(FromPrimitive, ToPrimitive, Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Command {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Replace = 0x03,
    Quit = 0x07,
    GetQuiet = 0x09,
    Noop = 0x0a,
    Version = 0x0b,
    GetKey = 0x0c,
    GetKeyQuiet = 0x0d,
    SetQuiet = 0x11,
    AddQuiet = 0x12,
    ReplaceQuiet = 0x13,
}

/*
   Byte/     0       |       1       |       2       |       3       |
      /              |               |               |               |
     |0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|
     +---------------+---------------+---------------+---------------+
    0| Magic         | Opcode        | Key length                    |
     +---------------+---------------+---------------+---------------+
    4| Extras length | Data type     | vbucket id                    |
     +---------------+---------------+---------------+---------------+
    8| Total body length                                             |
     +---------------+---------------+---------------+---------------+
   12| Opaque                                                        |
     +---------------+---------------+---------------+---------------+
   16| CAS                                                           |
     |                                                               |
     +---------------+---------------+---------------+---------------+
     Total 24 bytes
*/
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RequestHeader {
    pub(crate) magic: u8,
    pub(crate) opcode: u8,
    pub(crate) key_length: u16,
    pub(crate) extras_length: u8,
    pub(crate) data_type: u8,
    pub(crate) vbucket_id: u16,
    pub(crate) body_length: u32,
    pub(crate) opaque: u32,
    pub(crate) cas: u64,
}

/// Response header, same 24-byte layout with status in place of the
/// vbucket id.
#[derive(Debug, Copy, Clone, Default)]
pub struct ResponseHeader {
    pub magic: u8,
    pub opcode: u8,
    pub key_length: u16,
    pub extras_length: u8,
    pub data_type: u8,
    pub status: u16,
    pub body_length: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl ResponseHeader {
    pub fn new(cmd: u8, opaque: u32) -> Self {
        ResponseHeader {
            magic: Magic::Response as u8,
            opcode: cmd,
            opaque,
            ..ResponseHeader::default()
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub(crate) header: RequestHeader,
}

#[derive(Debug)]
pub struct Response {
    pub header: ResponseHeader,
}

pub type NoopRequest = Request;
pub type NoopResponse = Response;

pub type QuitRequest = Request;
pub type QuitResponse = Response;

pub type VersionRequest = Request;
#[derive(Debug)]
pub struct VersionResponse {
    pub header: ResponseHeader,
    pub version: String,
}

#[derive(Debug)]
pub struct ErrorResponse {
    pub header: ResponseHeader,
    pub error: &'static str,
}

#[derive(Debug)]
pub struct GetRequest {
    pub(crate) header: RequestHeader,
    pub(crate) key: Bytes,
}

pub type GetQuietRequest = GetRequest;
pub type GetKeyRequest = GetRequest;
pub type GetKeyQuietRequest = GetRequest;

#[derive(Debug)]
pub struct GetResponse {
    pub(crate) header: ResponseHeader,
    pub(crate) flags: u32,
    pub(crate) key: Bytes,
    pub(crate) value: Bytes,
}

pub type GetQuietlyResponse = GetResponse;
pub type GetKeyResponse = GetResponse;
pub type GetKeyQuietlyResponse = GetResponse;

#[derive(Clone, Debug)]
pub struct SetRequest {
    pub(crate) header: RequestHeader,
    pub(crate) flags: u32,
    pub(crate) expiration: u32,
    pub(crate) key: Bytes,
    pub(crate) value: Bytes,
}

pub type AddRequest = SetRequest;
pub type ReplaceRequest = SetRequest;

pub type SetResponse = Response;
pub type AddResponse = Response;
pub type ReplaceResponse = Response;
