use crate::protocol::binary::decoder::{BinaryDecoder, BinaryRequest};
use crate::protocol::binary::encoder::{BinaryEncoder, BinaryResponse, ResponseMessage};
use bytes::BytesMut;
use std::io;
use std::io::{Error, ErrorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Decoder;

const INITIAL_READ_BUFFER_SIZE: usize = 4096;

/// A client socket together with the codec pair and the read buffer. The
/// buffer starts small and grows with the largest request seen on the
/// connection; it is released when the connection closes.
pub struct BinaryConnection {
    stream: TcpStream,
    decoder: BinaryDecoder,
    encoder: BinaryEncoder,
    buffer: BytesMut,
}

impl BinaryConnection {
    pub fn new(socket: TcpStream) -> Self {
        BinaryConnection {
            stream: socket,
            decoder: BinaryDecoder::new(),
            encoder: BinaryEncoder::new(),
            buffer: BytesMut::with_capacity(INITIAL_READ_BUFFER_SIZE),
        }
    }

    /// Reads a complete request frame, buffering socket data until the
    /// decoder can produce one. Ok(None) is a clean EOF observed on a
    /// frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<BinaryRequest>, io::Error> {
        loop {
            if let Some(frame) = self.decoder.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            // `0` read bytes indicates end of stream. A clean shutdown
            // leaves nothing in the read buffer; leftover bytes mean the
            // peer died mid-frame.
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(Error::new(
                    ErrorKind::ConnectionReset,
                    "Connection reset by peer",
                ));
            }
        }
    }

    pub async fn write(&mut self, msg: &BinaryResponse) -> io::Result<()> {
        let message = self.encoder.encode_message(msg);
        self.write_data_to_stream(message).await
    }

    /// A framing violation cannot be answered with a binary response (the
    /// opcode and expected response shape are untrusted at that point),
    /// so a readable line is sent before teardown. Best effort; the peer
    /// may already be gone.
    pub async fn write_error_line(&mut self, err: &io::Error) {
        let line = format!("Error {}\n", err);
        let _ = self.stream.write_all(line.as_bytes()).await;
    }

    async fn write_data_to_stream(&mut self, msg: ResponseMessage) -> io::Result<()> {
        self.stream.write_all(&msg.data[..]).await
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
