//! `ReqwestClient` against a minimal HTTP/1.1 server on a loopback socket.
#![cfg(feature = "reqwest")]

use std::sync::Arc;
use std::time::Duration;

use segfetch::{
    ClientSetting, DownloadSession, Error, FetchError, FetchOptions, MemorySink, NoopProgress,
    ReqwestClient,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serves `data` with range support. With `stall` set, ranged responses send
/// their headers and then go silent.
async fn serve(data: Arc<Vec<u8>>, stall: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            tokio::spawn(handle(stream, Arc::clone(&data), stall));
        }
    });
    format!("http://{addr}/file.bin")
}

async fn handle(mut stream: TcpStream, data: Arc<Vec<u8>>, stall: bool) {
    let mut buf = Vec::new();
    loop {
        let head = loop {
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                buf.drain(..end + 4);
                break head;
            }
            let mut chunk = [0u8; 1024];
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        if head.starts_with("head ") {
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\naccept-ranges: bytes\r\n\r\n",
                data.len()
            );
            if stream.write_all(response.as_bytes()).await.is_err() {
                return;
            }
            continue;
        }

        let (start, end) = head
            .lines()
            .find_map(|line| line.strip_prefix("range: bytes="))
            .and_then(|range| range.split_once('-'))
            .and_then(|(s, e)| Some((s.trim().parse::<usize>().ok()?, e.trim().parse::<usize>().ok()?)))
            .unwrap_or((0, data.len() - 1));
        let response = format!(
            "HTTP/1.1 206 Partial Content\r\ncontent-length: {}\r\ncontent-range: bytes {start}-{end}/{}\r\n\r\n",
            end - start + 1,
            data.len()
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
        if stall {
            // hold the connection open without sending a byte
            std::future::pending::<()>().await;
        }
        if stream.write_all(&data[start..=end]).await.is_err() {
            return;
        }
    }
}

fn payload(len: usize) -> Vec<u8> { (0..len).map(|i| (i * 7 % 253) as u8).collect() }

#[tokio::test]
async fn test_downloads_over_http() {
    let data = Arc::new(payload(50_000));
    let url = serve(Arc::clone(&data), false).await;
    let sink = Arc::new(MemorySink::new());

    let report = DownloadSession::run(
        ReqwestClient::new().unwrap(),
        url,
        Arc::clone(&sink),
        FetchOptions::default().segments(4).use_default_headers(false),
        NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(report.downloaded_total, 50_000);
    assert_eq!(sink.to_vec(), *data);
}

#[tokio::test]
async fn test_read_timeout_turns_stall_into_bounded_retries() {
    let url = serve(Arc::new(payload(1000)), true).await;
    let client = ReqwestClient::with_setting(ClientSetting {
        read_timeout: Some(Duration::from_millis(200)),
        ..ClientSetting::default()
    })
    .unwrap();

    let options = FetchOptions::default()
        .segments(1)
        .max_retries(1)
        .retry_backoff(Duration::from_millis(1))
        .use_default_headers(false);
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        DownloadSession::run(client, url, MemorySink::new(), options, NoopProgress),
    )
    .await
    .expect("stalled body was never timed out");

    assert!(matches!(
        result,
        Err(Error::Fetch(FetchError::ConnectionExhausted { segment: 1, attempts: 2, .. }))
    ));
}
