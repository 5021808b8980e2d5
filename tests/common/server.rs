use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::random_port::PSEUDO_RANDOM_PORT;

pub struct TestServer {
    thread_join_handle: Option<thread::JoinHandle<()>>,
    cancellation_token: CancellationToken,
    port: u16,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        format!("127.0.0.1:{}", self.port).parse().unwrap()
    }

    pub fn get_connection_string(&self) -> String {
        format!(
            "memcache://127.0.0.1:{}?timeout=5&tcp_nodelay=true&protocol=binary",
            self.port
        )
    }

    fn kill(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            thread_join_handle.join().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.kill();
    }
}

pub fn spawn_server() -> TestServer {
    let port = PSEUDO_RANDOM_PORT.lock().unwrap().get_next_port();
    let args = vec![
        String::from("./target/debug/binkvd"),
        String::from("--port"),
        port.to_string(),
        String::from("--threads"),
        String::from("2"),
    ];
    let config = binkv::server::cli::parse(args).unwrap();
    let cancellation_token = CancellationToken::new();
    let token = cancellation_token.clone();
    let thread_join_handle =
        thread::spawn(move || binkv::server::runtime::start_server_with_token(config, token));
    wait_until_listening(port);
    TestServer {
        thread_join_handle: Some(thread_join_handle),
        cancellation_token,
        port,
    }
}

fn wait_until_listening(port: u16) {
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    for _ in 0..500 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("server did not start listening on port {}", port);
}
