//! Throwaway HTTP responders on local ports.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Serve one HTTP response on a local port and return its URL.
pub async fn serve_once(status: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    Url::parse(&format!("http://{}/list.m3u", addr)).unwrap()
}

/// Answer `200 OK` with `head` followed by a body that never ends, like a
/// live stream. Writing stops once the client goes away.
pub async fn serve_endless(head: &'static [u8]) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let headers = "HTTP/1.1 200 OK\r\nContent-Type: video/mp2t\r\nConnection: close\r\n\r\n";
        if socket.write_all(headers.as_bytes()).await.is_err()
            || socket.write_all(head).await.is_err()
        {
            return;
        }
        let filler = [0x47u8; 4096];
        while socket.write_all(&filler).await.is_ok() {}
    });
    Url::parse(&format!("http://{}/live.ts", addr)).unwrap()
}
