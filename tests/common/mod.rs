//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use host_router::admin::ControlPlane;
use host_router::store::RouteStore;
use host_router::{Application, ProxyConfig, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Config bound to an ephemeral port with short timeouts and no static root.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.store.path = String::new();
    config.static_files.root = "/nonexistent-static-root".into();
    config.timeouts.connect_secs = 1;
    config.timeouts.upstream_secs = 1;
    config.timeouts.request_secs = 5;
    config
}

/// A running router.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub control: Arc<ControlPlane>,
    pub shutdown: Arc<Shutdown>,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_router(config: ProxyConfig, store: Arc<dyn RouteStore>) -> TestRouter {
    let app = Application::build_with_store(config, store).await.unwrap();
    let addr = app.local_addr().unwrap();
    let control = app.control().clone();
    let shutdown = Arc::new(Shutdown::new());

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = app.run(&server_shutdown).await;
    });

    TestRouter {
        addr,
        control,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// GET `path` on the router with the given Host header.
pub async fn get_with_host(router: &TestRouter, host: &str, path: &str) -> (u16, String) {
    let res = client()
        .get(router.url(path))
        .header("host", host)
        .send()
        .await
        .expect("router unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (200, response.to_string()) }).await
}

/// Backend that answers with the Host header it received.
pub async fn start_host_echo_backend() -> SocketAddr {
    start_programmable_backend(|host| async move { (200, host) }).await
}

/// Start a programmable mock backend. The closure receives the request's
/// Host header and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let host = read_host_header(&mut socket).await;
                        let (status, body) = f(host).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    l.local_addr().unwrap()
}

async fn read_host_header(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("host")
                .then(|| value.trim().to_string())
        })
        .unwrap_or_default()
}
