#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

pub const OP_GET: u8 = 0x00;
pub const OP_SET: u8 = 0x01;
pub const OP_ADD: u8 = 0x02;
pub const OP_REPLACE: u8 = 0x03;
pub const OP_QUIT: u8 = 0x07;
pub const OP_GETQ: u8 = 0x09;
pub const OP_NOOP: u8 = 0x0a;
pub const OP_VERSION: u8 = 0x0b;
pub const OP_GETK: u8 = 0x0c;
pub const OP_GETKQ: u8 = 0x0d;
pub const OP_SETQ: u8 = 0x11;
pub const OP_ADDQ: u8 = 0x12;
pub const OP_REPLACEQ: u8 = 0x13;

pub const STATUS_NO_ERROR: u16 = 0x0000;
pub const STATUS_KEY_NOT_FOUND: u16 = 0x0001;
pub const STATUS_KEY_EXISTS: u16 = 0x0002;

pub const OPAQUE: u32 = 0xDEAD_BEEF;

/// A decoded response frame with the body split into its extras, key and
/// value sections.
pub struct TestResponse {
    pub magic: u8,
    pub opcode: u8,
    pub key_length: u16,
    pub extras_length: u8,
    pub data_type: u8,
    pub status: u16,
    pub body_length: u32,
    pub opaque: u32,
    pub cas: u64,
    pub extras: Vec<u8>,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Frame-level test client. Everything is spelled out in raw bytes so the
/// assertions cover the exact wire layout.
pub struct BinaryClient {
    stream: TcpStream,
}

impl BinaryClient {
    pub fn connect(addr: SocketAddr) -> std::io::Result<BinaryClient> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(Duration::from_secs(10)))?;
        Ok(BinaryClient { stream })
    }

    pub fn request_header(
        opcode: u8,
        key_length: u16,
        extras_length: u8,
        body_length: u32,
        opaque: u32,
        cas: u64,
    ) -> Vec<u8> {
        let mut frame = Vec::with_capacity(24 + body_length as usize);
        frame.push(0x80); // magic
        frame.push(opcode);
        frame.extend_from_slice(&key_length.to_be_bytes());
        frame.push(extras_length);
        frame.push(0x00); // data type
        frame.extend_from_slice(&0u16.to_be_bytes()); // vbucket id
        frame.extend_from_slice(&body_length.to_be_bytes());
        frame.extend_from_slice(&opaque.to_be_bytes());
        frame.extend_from_slice(&cas.to_be_bytes());
        frame
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).unwrap();
    }

    pub fn send_store(
        &mut self,
        opcode: u8,
        key: &[u8],
        value: &[u8],
        flags: u32,
        ttl: u32,
        cas: u64,
    ) {
        let body_length = 8 + key.len() as u32 + value.len() as u32;
        let mut frame = Self::request_header(opcode, key.len() as u16, 8, body_length, OPAQUE, cas);
        frame.extend_from_slice(&flags.to_be_bytes());
        frame.extend_from_slice(&ttl.to_be_bytes());
        frame.extend_from_slice(key);
        frame.extend_from_slice(value);
        self.send_raw(&frame);
    }

    pub fn send_get(&mut self, opcode: u8, key: &[u8]) {
        let mut frame =
            Self::request_header(opcode, key.len() as u16, 0, key.len() as u32, OPAQUE, 0);
        frame.extend_from_slice(key);
        self.send_raw(&frame);
    }

    pub fn send_header_only(&mut self, opcode: u8) {
        let frame = Self::request_header(opcode, 0, 0, 0, OPAQUE, 0);
        self.send_raw(&frame);
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> TestResponse {
        self.send_store(OP_SET, key, value, 0, 0, 0);
        self.read_response()
    }

    pub fn set_with_flags(&mut self, key: &[u8], value: &[u8], flags: u32) -> TestResponse {
        self.send_store(OP_SET, key, value, flags, 0, 0);
        self.read_response()
    }

    pub fn set_with_ttl(&mut self, key: &[u8], value: &[u8], ttl: u32) -> TestResponse {
        self.send_store(OP_SET, key, value, 0, ttl, 0);
        self.read_response()
    }

    pub fn set_with_cas(&mut self, key: &[u8], value: &[u8], cas: u64) -> TestResponse {
        self.send_store(OP_SET, key, value, 0, 0, cas);
        self.read_response()
    }

    pub fn add(&mut self, key: &[u8], value: &[u8]) -> TestResponse {
        self.send_store(OP_ADD, key, value, 0, 0, 0);
        self.read_response()
    }

    pub fn replace(&mut self, key: &[u8], value: &[u8]) -> TestResponse {
        self.send_store(OP_REPLACE, key, value, 0, 0, 0);
        self.read_response()
    }

    pub fn replace_with_cas(&mut self, key: &[u8], value: &[u8], cas: u64) -> TestResponse {
        self.send_store(OP_REPLACE, key, value, 0, 0, cas);
        self.read_response()
    }

    pub fn get(&mut self, key: &[u8]) -> TestResponse {
        self.send_get(OP_GET, key);
        self.read_response()
    }

    pub fn get_key(&mut self, key: &[u8]) -> TestResponse {
        self.send_get(OP_GETK, key);
        self.read_response()
    }

    pub fn noop(&mut self) -> TestResponse {
        self.send_header_only(OP_NOOP);
        self.read_response()
    }

    pub fn version(&mut self) -> TestResponse {
        self.send_header_only(OP_VERSION);
        self.read_response()
    }

    pub fn quit(&mut self) -> TestResponse {
        self.send_header_only(OP_QUIT);
        self.read_response()
    }

    pub fn read_response(&mut self) -> TestResponse {
        let mut header = [0u8; 24];
        self.stream.read_exact(&mut header).unwrap();
        let key_length = u16::from_be_bytes([header[2], header[3]]);
        let extras_length = header[4];
        let body_length = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);

        let mut body = vec![0u8; body_length as usize];
        self.stream.read_exact(&mut body).unwrap();
        let extras_end = extras_length as usize;
        let key_end = extras_end + key_length as usize;

        TestResponse {
            magic: header[0],
            opcode: header[1],
            key_length,
            extras_length,
            data_type: header[5],
            status: u16::from_be_bytes([header[6], header[7]]),
            body_length,
            opaque: u32::from_be_bytes([header[12], header[13], header[14], header[15]]),
            cas: u64::from_be_bytes(header[16..24].try_into().unwrap()),
            extras: body[..extras_end].to_vec(),
            key: body[extras_end..key_end].to_vec(),
            value: body[key_end..].to_vec(),
        }
    }

    /// Drains the connection; used after a framing error, when the server
    /// answers with a plain text line and closes the socket.
    pub fn read_until_eof(&mut self) -> Vec<u8> {
        let mut data = Vec::new();
        self.stream.read_to_end(&mut data).unwrap();
        data
    }

    /// True once the server has closed its end of the connection.
    pub fn at_eof(&mut self) -> bool {
        let mut buf = [0u8; 1];
        matches!(self.stream.read(&mut buf), Ok(0))
    }
}
