#![allow(dead_code)]
//! A minimal HTTP/1.1 client over a Unix domain socket.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// A parsed response: status code and body text.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).context("response body is not JSON")
    }
}

/// Sends a single request and reads the response until the server closes.
pub async fn request(socket: &Path, method: &str, target: &str) -> Result<HttpResponse> {
    let mut stream = UnixStream::connect(socket)
        .await
        .with_context(|| format!("connecting to {}", socket.display()))?;

    let request = format!(
        "{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 0\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    let raw = String::from_utf8(raw)?;

    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| anyhow!("malformed response: {raw:?}"))?;
    let status = head
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("missing status line: {head:?}"))?
        .parse::<u16>()?;

    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

pub async fn get(socket: &Path, target: &str) -> Result<HttpResponse> {
    request(socket, "GET", target).await
}
