use crate::cache::error::CacheError;
use crate::cache::store::{Record, Store};
use crate::protocol::binary::encoder::storage_error_to_response;
use crate::protocol::binary::{decoder, encoder, network};
use crate::server::timer;
use crate::version::ADVERTISED_VERSION;
use bytes::Bytes;
use std::sync::Arc;

const EXTRAS_LENGTH: u8 = 4;

/// Quiet gets suppress the miss response only; a hit is always sent.
fn into_quiet_get(response: encoder::BinaryResponse) -> Option<encoder::BinaryResponse> {
    if let encoder::BinaryResponse::Error(response) = &response {
        if response.header.status == CacheError::NotFound as u16 {
            return None;
        }
    }
    Some(response)
}

/// Quiet mutations suppress the success response only; failures are
/// always sent.
fn into_quiet_mutation(response: encoder::BinaryResponse) -> Option<encoder::BinaryResponse> {
    if let encoder::BinaryResponse::Error(_resp) = &response {
        return Some(response);
    }
    None
}

pub struct BinaryHandler {
    storage: Arc<Store>,
    timer: Arc<dyn timer::Timer + Send + Sync>,
}

impl BinaryHandler {
    pub fn new(store: Arc<Store>, timer: Arc<dyn timer::Timer + Send + Sync>) -> BinaryHandler {
        BinaryHandler {
            storage: store,
            timer,
        }
    }

    /// Maps a request to its response; None means the quiet variant
    /// suppressed it.
    pub fn handle_request(&self, req: decoder::BinaryRequest) -> Option<encoder::BinaryResponse> {
        let request_header = req.get_header();
        let mut response_header =
            network::ResponseHeader::new(request_header.opcode, request_header.opaque);

        match req {
            decoder::BinaryRequest::Get(get_request)
            | decoder::BinaryRequest::GetKey(get_request) => {
                Some(self.get(get_request, &mut response_header))
            }
            decoder::BinaryRequest::GetQuietly(get_quiet_req)
            | decoder::BinaryRequest::GetKeyQuietly(get_quiet_req) => {
                into_quiet_get(self.get(get_quiet_req, &mut response_header))
            }
            decoder::BinaryRequest::Set(set_req) => {
                let response = self.set(set_req, &mut response_header);
                Some(response)
            }
            decoder::BinaryRequest::SetQuietly(set_req) => {
                let response = self.set(set_req, &mut response_header);
                into_quiet_mutation(response)
            }
            decoder::BinaryRequest::Add(req) | decoder::BinaryRequest::Replace(req) => {
                Some(self.add_replace(req, &mut response_header))
            }
            decoder::BinaryRequest::AddQuietly(req)
            | decoder::BinaryRequest::ReplaceQuietly(req) => {
                into_quiet_mutation(self.add_replace(req, &mut response_header))
            }
            decoder::BinaryRequest::Noop(_noop_request) => {
                Some(encoder::BinaryResponse::Noop(network::NoopResponse {
                    header: response_header,
                }))
            }
            decoder::BinaryRequest::Version(_version_request) => {
                response_header.body_length = ADVERTISED_VERSION.len() as u32;
                Some(encoder::BinaryResponse::Version(network::VersionResponse {
                    header: response_header,
                    version: String::from(ADVERTISED_VERSION),
                }))
            }
            decoder::BinaryRequest::Quit(_quit_req) => {
                Some(encoder::BinaryResponse::Quit(network::QuitResponse {
                    header: response_header,
                }))
            }
        }
    }

    /// A ttl of 0 never expires; anything else becomes an absolute
    /// deadline on the server clock.
    fn deadline(&self, expiration: u32) -> u64 {
        if expiration == 0 {
            return 0;
        }
        expiration as u64 + self.timer.timestamp()
    }

    fn set(
        &self,
        set_req: network::SetRequest,
        response_header: &mut network::ResponseHeader,
    ) -> encoder::BinaryResponse {
        let record = Record::new(
            set_req.value,
            set_req.header.cas,
            set_req.flags,
            self.deadline(set_req.expiration),
        );

        match self.storage.set(set_req.key, record) {
            Ok(status) => {
                response_header.cas = status.cas;
                encoder::BinaryResponse::Set(network::SetResponse {
                    header: *response_header,
                })
            }
            Err(err) => storage_error_to_response(err, response_header),
        }
    }

    fn add_replace(
        &self,
        request: network::SetRequest,
        response_header: &mut network::ResponseHeader,
    ) -> encoder::BinaryResponse {
        let record = Record::new(
            request.value,
            request.header.cas,
            request.flags,
            self.deadline(request.expiration),
        );
        let result = if self.is_add_command(request.header.opcode) {
            self.storage.add(request.key, record)
        } else {
            self.storage.replace(request.key, record)
        };

        match result {
            Ok(status) => {
                response_header.cas = status.cas;
                encoder::BinaryResponse::Set(network::SetResponse {
                    header: *response_header,
                })
            }
            Err(err) => storage_error_to_response(err, response_header),
        }
    }

    fn is_add_command(&self, opcode: u8) -> bool {
        opcode == network::Command::Add as u8 || opcode == network::Command::AddQuiet as u8
    }

    fn get(
        &self,
        get_request: network::GetRequest,
        response_header: &mut network::ResponseHeader,
    ) -> encoder::BinaryResponse {
        let result = self.storage.get(&get_request.key);

        match result {
            Ok(record) => {
                let include_key = self.is_get_key_command(get_request.header.opcode);
                let mut key: Bytes = Bytes::new();
                if include_key {
                    key = get_request.key
                }
                response_header.body_length =
                    record.value.len() as u32 + EXTRAS_LENGTH as u32 + key.len() as u32;
                response_header.key_length = key.len() as u16;
                response_header.extras_length = EXTRAS_LENGTH;
                response_header.cas = record.header.cas;
                encoder::BinaryResponse::Get(network::GetResponse {
                    header: *response_header,
                    flags: record.header.flags,
                    key,
                    value: record.value,
                })
            }
            Err(err) => storage_error_to_response(err, response_header),
        }
    }

    fn is_get_key_command(&self, opcode: u8) -> bool {
        opcode == network::Command::GetKey as u8 || opcode == network::Command::GetKeyQuiet as u8
    }
}
