use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use super::cli::BinkvdConfig;
use super::tcp::TcpServer;

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("binkvd-wrk-{}", id)
}

fn create_multi_thread_runtime(worker_threads: usize) -> tokio::runtime::Runtime {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap()
}

fn register_ctrlc_handler(
    runtime: &tokio::runtime::Runtime,
    cancellation_token: CancellationToken,
) {
    runtime.handle().spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c signal");
        info!("Ctrl-C received, shutting down...");
        cancellation_token.cancel();
    });
}

/// Starts the server and blocks until ctrl-c.
pub fn start_server(config: BinkvdConfig) {
    let cancellation_token = CancellationToken::new();
    let addr = SocketAddr::new(config.listen_address, config.port);
    let runtime = create_multi_thread_runtime(config.threads);
    register_ctrlc_handler(&runtime, cancellation_token.clone());
    let mut tcp_server = TcpServer::new(config.connection_limit, cancellation_token);
    runtime.block_on(tcp_server.run(addr)).unwrap()
}

/// Starts the server and blocks until the given token is cancelled.
pub fn start_server_with_token(config: BinkvdConfig, cancellation_token: CancellationToken) {
    let addr = SocketAddr::new(config.listen_address, config.port);
    let runtime = create_multi_thread_runtime(config.threads);
    let mut tcp_server = TcpServer::new(config.connection_limit, cancellation_token);
    runtime.block_on(tcp_server.run(addr)).unwrap()
}
