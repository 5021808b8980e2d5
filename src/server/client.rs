use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::io;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::handler::BinaryHandler;
use super::timer;
use crate::cache::store::Store;
use crate::protocol::binary::connection::BinaryConnection;
use crate::protocol::binary::decoder::BinaryRequest;
use crate::protocol::binary::encoder::BinaryResponse;

/// Process-wide connection sequence; every accepted connection takes the
/// next id for log correlation.
static CONNECTION_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct Client {
    stream: BinaryConnection,
    addr: SocketAddr,
    id: u64,
    start_time: SystemTime,
    last_request: Instant,
    command_seq: u64,
    handler: BinaryHandler,
    /// Max connection semaphore.
    ///
    /// When the client is dropped, a permit is returned to this
    /// semaphore. If the listener is waiting for connections to close, it
    /// will be notified of the newly available permit and resume
    /// accepting connections.
    limit_connections: Arc<Semaphore>,
}

impl Client {
    pub fn new(
        store: Arc<Store>,
        timer: Arc<dyn timer::Timer + Send + Sync>,
        socket: TcpStream,
        addr: SocketAddr,
        limit_connections: Arc<Semaphore>,
    ) -> Self {
        Client {
            stream: BinaryConnection::new(socket),
            addr,
            id: CONNECTION_SEQ.fetch_add(1, Ordering::SeqCst) + 1,
            start_time: SystemTime::now(),
            last_request: Instant::now(),
            command_seq: 0,
            handler: BinaryHandler::new(store, timer),
            limit_connections,
        }
    }

    pub async fn handle(&mut self) {
        debug!("New client connected: {} (connection {})", self.addr, self.id);

        loop {
            match self.stream.read_frame().await {
                Ok(Some(request)) => {
                    self.command_seq += 1;
                    self.last_request = Instant::now();
                    if self.handle_request(request).await {
                        return;
                    }
                }
                Ok(None) => {
                    info!(
                        "Client {} closed connection {}: connected at {:?}, idle {:?}, handled {} commands",
                        self.addr,
                        self.id,
                        self.start_time,
                        self.last_request.elapsed(),
                        self.command_seq
                    );
                    return;
                }
                Err(err) => {
                    if err.kind() == io::ErrorKind::InvalidData {
                        error!("Error parsing frame from {}: {}", self.addr, err);
                        self.stream.write_error_line(&err).await;
                    } else {
                        error!("Error when reading frame from {}: {}", self.addr, err);
                    }
                    return;
                }
            }
        }
    }

    /// Handles a single request. Returns true when the receive loop
    /// should end.
    async fn handle_request(&mut self, request: BinaryRequest) -> bool {
        debug!("Got request {:?}", request.get_header());

        let resp = self.handler.handle_request(request);
        match resp {
            Some(response) => {
                let mut socket_close = false;
                if let BinaryResponse::Quit(_resp) = &response {
                    socket_close = true;
                }

                debug!("Sending response {:?}", response);
                if let Err(e) = self.stream.write(&response).await {
                    error!("error on sending response; error = {:?}", e);
                    return true;
                }

                if socket_close {
                    debug!("Closing connection {} on quit command", self.id);
                    if let Err(e) = self.stream.shutdown().await {
                        log_shutdown_error(e);
                    }
                    return true;
                }
                false
            }
            None => false,
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Returning the permit here rather than at the end of `handle`
        // guarantees it comes back even if the connection task panics.
        self.limit_connections.add_permits(1);
    }
}

fn log_shutdown_error(e: io::Error) {
    // in most cases not an error, the client may simply have dropped the
    // connection already
    if e.kind() == io::ErrorKind::NotConnected {
        info!("Error: {}", e);
    } else {
        error!("Error: {}", e);
    }
}
