use std::sync::Arc;
use std::time::Duration;
use tokio::io;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Semaphore;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::client::Client;
use super::timer;
use super::timer::{SetableTimer, Timer};
use crate::cache::store::Store;

pub struct TcpServer {
    timer: Arc<timer::SystemTimer>,
    storage: Arc<Store>,
    limit_connections: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl TcpServer {
    pub fn new(connection_limit: u32, cancellation_token: CancellationToken) -> TcpServer {
        let timer = Arc::new(timer::SystemTimer::new());
        TcpServer {
            timer: timer.clone(),
            storage: Arc::new(Store::new(timer)),
            limit_connections: Arc::new(Semaphore::new(connection_limit as usize)),
            cancellation_token,
        }
    }

    pub async fn run<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;

        let start = Instant::now();
        let mut interval = interval_at(start, Duration::from_secs(1));
        loop {
            tokio::select! {
                connection = listener.accept() => {
                    match connection {
                        Ok((socket, peer_addr)) => {
                            socket.set_nodelay(true)?;
                            socket.set_linger(None)?;
                            let mut client = Client::new(
                                self.storage.clone(),
                                self.timer.clone(),
                                socket,
                                peer_addr,
                                self.limit_connections.clone(),
                            );

                            self.limit_connections.acquire().await.unwrap().forget();
                            // Every client is spawned so it runs
                            // concurrently with all other clients.
                            tokio::spawn(async move { client.handle().await });
                        }
                        Err(err) => {
                            error!("{}", err);
                        }
                    }
                },
                _ = interval.tick() => {
                    self.timer.add_second();
                    debug!("Server tick: {}", self.timer.timestamp());
                },
                _ = self.cancellation_token.cancelled() => {
                    info!("Server shutting down");
                    return Ok(());
                },
            }
        }
    }
}
