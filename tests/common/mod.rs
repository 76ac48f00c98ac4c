#![allow(dead_code)]

use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Minimal HTTP/1.1 server answering GETs from a fixed path table.
/// Unknown paths get a 404.
pub struct TestServer {
    addr: SocketAddr,
}

impl TestServer {
    pub async fn start(pages: Vec<(&str, u16, &str)>) -> Self {
        let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
            pages
                .into_iter()
                .map(|(path, status, body)| (path.to_string(), (status, body.to_string())))
                .collect(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match sock.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let path = request
                        .lines()
                        .next()
                        .and_then(|l| l.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();

                    let (status, body) = routes
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, "not found".to_string()));
                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = sock.write_all(response.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });

        Self { addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// A URL nobody is listening on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/gone", addr)
}

pub const STATS_PAGE: &str = r#"<html><body>
<table id="stats_standard">
  <thead>
    <tr><th></th><th colspan="2">Playing Time</th></tr>
    <tr><th>Player</th><th>MP</th><th>Min</th></tr>
  </thead>
  <tbody>
    <tr><td>Weverton</td><td>30</td><td>2700</td></tr>
    <tr><td>Gustavo Gómez</td><td>28</td><td>2480</td></tr>
  </tbody>
</table>
<table><tr><th>Date</th><th>Result</th></tr><tr><td>2024-04-13</td><td>W</td></tr></table>
</body></html>"#;

pub const MARKET_PAGE: &str = r#"<html><body>
<table>
  <tr><th>Jogador</th><th>Valor</th></tr>
  <tr><td>Estêvão</td><td>€ 3,5M</td></tr>
  <tr><td>Vitor Reis</td><td>750K</td></tr>
</table>
</body></html>"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
