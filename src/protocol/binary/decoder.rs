use crate::protocol::binary::network;
use bytes::{Buf, BytesMut};
use num_traits::FromPrimitive;
use std::io;
use std::io::{Error, ErrorKind};
use tokio_util::codec::Decoder;

/// Largest total body length accepted; a header announcing more is a
/// framing error and the connection is torn down.
pub const MAX_REQUEST_LEN: u32 = 1024 * 1024 * 1024;

/// Client request
#[derive(Debug)]
pub enum BinaryRequest {
    Get(network::GetRequest),
    GetQuietly(network::GetQuietRequest),
    GetKey(network::GetKeyRequest),
    GetKeyQuietly(network::GetKeyQuietRequest),
    Set(network::SetRequest),
    SetQuietly(network::SetRequest),
    Add(network::AddRequest),
    AddQuietly(network::AddRequest),
    Replace(network::ReplaceRequest),
    ReplaceQuietly(network::ReplaceRequest),
    Noop(network::NoopRequest),
    Version(network::VersionRequest),
    Quit(network::QuitRequest),
}

impl BinaryRequest {
    pub fn get_header(&'_ self) -> &'_ network::RequestHeader {
        match self {
            BinaryRequest::Get(request)
            | BinaryRequest::GetKey(request)
            | BinaryRequest::GetKeyQuietly(request)
            | BinaryRequest::GetQuietly(request) => &request.header,

            BinaryRequest::Set(request)
            | BinaryRequest::SetQuietly(request)
            | BinaryRequest::Add(request)
            | BinaryRequest::AddQuietly(request)
            | BinaryRequest::Replace(request)
            | BinaryRequest::ReplaceQuietly(request) => &request.header,

            BinaryRequest::Noop(request)
            | BinaryRequest::Version(request)
            | BinaryRequest::Quit(request) => &request.header,
        }
    }
}

#[derive(PartialEq, Debug)]
enum RequestParserState {
    None,
    HeaderParsed,
}

pub struct BinaryDecoder {
    header: network::RequestHeader,
    state: RequestParserState,
}

impl Default for BinaryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryDecoder {
    const HEADER_LEN: usize = 24;

    pub fn new() -> BinaryDecoder {
        BinaryDecoder {
            header: Default::default(),
            state: RequestParserState::None,
        }
    }

    fn init_parser(&mut self) {
        self.header = Default::default();
        self.state = RequestParserState::None;
    }

    fn parse_header(&mut self, src: &mut BytesMut) -> Result<(), io::Error> {
        if src.len() < BinaryDecoder::HEADER_LEN {
            error!("Buffer len is less than BinaryDecoder::HEADER_LEN");
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Buffer too small cannot parse header",
            ));
        }

        self.header = network::RequestHeader {
            magic: src.get_u8(),
            opcode: src.get_u8(),
            key_length: src.get_u16(),
            extras_length: src.get_u8(),
            data_type: src.get_u8(),
            vbucket_id: src.get_u16(),
            body_length: src.get_u32(),
            opaque: src.get_u32(),
            cas: src.get_u64(),
        };

        self.state = RequestParserState::HeaderParsed;
        if !self.header_valid() {
            return Err(Error::new(ErrorKind::InvalidData, "Incorrect header"));
        }

        if self.header.body_length > MAX_REQUEST_LEN {
            error!(
                "Request body length({}) larger than MAX_REQUEST_LEN({})",
                self.header.body_length, MAX_REQUEST_LEN
            );
            return Err(Error::new(ErrorKind::InvalidData, "Request body too large"));
        }

        src.reserve(self.header.body_length as usize);
        Ok(())
    }

    fn header_valid(&self) -> bool {
        if self.header.magic != network::Magic::Request as u8 {
            error!("Invalid header: magic != network::Magic::Request");
            return false;
        }

        if <network::Command as FromPrimitive>::from_u8(self.header.opcode).is_none() {
            error!("Invalid header: unknown opcode {:#04x}", self.header.opcode);
            return false;
        }

        if self.header.data_type != network::DataTypes::RawBytes as u8 {
            error!("Invalid header: data_type != network::DataTypes::RawBytes");
            return false;
        }

        if (self.header.body_length as u64)
            < self.header.key_length as u64 + self.header.extras_length as u64
        {
            error!(
                "Invalid header: body length({}) smaller than key length({}) + extras length({})",
                self.header.body_length, self.header.key_length, self.header.extras_length
            );
            return false;
        }
        true
    }

    fn parse_request(&mut self, src: &mut BytesMut) -> Result<Option<BinaryRequest>, io::Error> {
        if self.state != RequestParserState::HeaderParsed {
            error!("Incorrect parser state ({:?})", self.state);
            return Err(Error::other("Header is not parsed"));
        }

        if self.header.body_length as usize > src.len() {
            error!(
                "Header body length({:?}) larger than src buffer length({:?})",
                self.header.body_length,
                src.len()
            );
            return Err(Error::other("Header body length too large"));
        }

        let result = match FromPrimitive::from_u8(self.header.opcode) {
            Some(network::Command::Get)
            | Some(network::Command::GetQuiet)
            | Some(network::Command::GetKey)
            | Some(network::Command::GetKeyQuiet) => self.parse_get_request(src),

            Some(network::Command::Set)
            | Some(network::Command::SetQuiet)
            | Some(network::Command::Add)
            | Some(network::Command::AddQuiet)
            | Some(network::Command::Replace)
            | Some(network::Command::ReplaceQuiet) => self.parse_set_request(src),

            Some(network::Command::Noop)
            | Some(network::Command::Version)
            | Some(network::Command::Quit) => self.parse_header_only_request(src),

            None => {
                error!("Cannot parse command opcode: {:?}", self.header.opcode);
                Err(Error::new(ErrorKind::InvalidData, "Incorrect op code"))
            }
        };
        self.init_parser();
        result
    }

    fn get_value_len(&self) -> usize {
        (self.header.body_length as usize)
            - ((self.header.key_length + self.header.extras_length as u16) as usize)
    }

    fn parse_get_request(&self, src: &mut BytesMut) -> Result<Option<BinaryRequest>, io::Error> {
        if self.header.extras_length != 0
            || self.header.key_length == 0
            || self.header.body_length != self.header.key_length as u32
        {
            return Err(Error::new(ErrorKind::InvalidData, "Incorrect get request"));
        }

        let key = src.split_to(self.header.key_length as usize).freeze();
        if self.header.opcode == network::Command::Get as u8 {
            Ok(Some(BinaryRequest::Get(network::GetRequest {
                header: self.header,
                key,
            })))
        } else if self.header.opcode == network::Command::GetQuiet as u8 {
            Ok(Some(BinaryRequest::GetQuietly(network::GetQuietRequest {
                header: self.header,
                key,
            })))
        } else if self.header.opcode == network::Command::GetKey as u8 {
            Ok(Some(BinaryRequest::GetKey(network::GetKeyRequest {
                header: self.header,
                key,
            })))
        } else {
            Ok(Some(BinaryRequest::GetKeyQuietly(
                network::GetKeyQuietRequest {
                    header: self.header,
                    key,
                },
            )))
        }
    }

    fn parse_set_request(&self, src: &mut BytesMut) -> Result<Option<BinaryRequest>, io::Error> {
        if self.header.extras_length != 8 || self.header.key_length == 0 {
            return Err(Error::new(ErrorKind::InvalidData, "Incorrect set request"));
        }

        let value_len = self.get_value_len();
        let set_request = network::SetRequest {
            header: self.header,
            flags: src.get_u32(),
            expiration: src.get_u32(),
            key: src.split_to(self.header.key_length as usize).freeze(),
            value: src.split_to(value_len).freeze(),
        };

        match FromPrimitive::from_u8(self.header.opcode) {
            Some(network::Command::Set) => Ok(Some(BinaryRequest::Set(set_request))),
            Some(network::Command::SetQuiet) => Ok(Some(BinaryRequest::SetQuietly(set_request))),
            Some(network::Command::Add) => Ok(Some(BinaryRequest::Add(set_request))),
            Some(network::Command::AddQuiet) => Ok(Some(BinaryRequest::AddQuietly(set_request))),
            Some(network::Command::Replace) => Ok(Some(BinaryRequest::Replace(set_request))),
            Some(network::Command::ReplaceQuiet) => {
                Ok(Some(BinaryRequest::ReplaceQuietly(set_request)))
            }
            _ => {
                error!("Cannot parse set command opcode: {:?}", self.header.opcode);
                Err(Error::new(ErrorKind::InvalidData, "Incorrect op code"))
            }
        }
    }

    fn parse_header_only_request(
        &self,
        _src: &mut BytesMut,
    ) -> Result<Option<BinaryRequest>, io::Error> {
        if self.header.key_length != 0
            || self.header.extras_length != 0
            || self.header.body_length != 0
        {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Incorrect header only request",
            ));
        }

        if self.header.opcode == network::Command::Noop as u8 {
            Ok(Some(BinaryRequest::Noop(network::NoopRequest {
                header: self.header,
            })))
        } else if self.header.opcode == network::Command::Quit as u8 {
            Ok(Some(BinaryRequest::Quit(network::QuitRequest {
                header: self.header,
            })))
        } else {
            Ok(Some(BinaryRequest::Version(network::VersionRequest {
                header: self.header,
            })))
        }
    }
}

impl Decoder for BinaryDecoder {
    type Item = BinaryRequest;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BinaryRequest>, io::Error> {
        if self.state == RequestParserState::None {
            if src.len() < BinaryDecoder::HEADER_LEN {
                return Ok(None);
            }
            self.parse_header(src)?;
        }
        if (self.header.body_length as usize) > src.len() {
            return Ok(None);
        }
        self.parse_request(src)
    }
}
