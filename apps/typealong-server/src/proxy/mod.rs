//! Remote EPUB download relay
//!
//! Fetches a book from a remote URL and hands the bytes back unchanged, so
//! browser clients can download from hosts that do not send CORS headers.

use futures::StreamExt;
use reqwest::Url;
use thiserror::Error;

const DEFAULT_CONTENT_TYPE: &str = "application/epub+zip";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid download URL: {0}")]
    InvalidUrl(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Download exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// A fully downloaded remote file
#[derive(Debug)]
pub struct Download {
    pub content_type: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Only absolute http(s) URLs are relayed
pub fn parse_url(raw: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(raw.trim()).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ProxyError::InvalidUrl(raw.to_string())),
    }
}

/// Download `url`, refusing bodies larger than `max_bytes`
pub async fn fetch(client: &reqwest::Client, url: Url, max_bytes: usize) -> Result<Download, ProxyError> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "Upstream download failed");
        return Err(ProxyError::Status(status.as_u16()));
    }

    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(ProxyError::TooLarge { limit: max_bytes });
    }

    let file_name = file_name_for(&url);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && !value.starts_with("application/octet-stream"))
        .map(str::to_string)
        .unwrap_or_else(|| guess_content_type(&file_name));

    let mut data = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if data.len() + chunk.len() > max_bytes {
            return Err(ProxyError::TooLarge { limit: max_bytes });
        }
        data.extend_from_slice(&chunk);
    }

    tracing::info!(url = %url, bytes = data.len(), "Relayed download");

    Ok(Download {
        content_type,
        file_name,
        data,
    })
}

fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .unwrap_or_else(|| "download.epub".to_string())
}

fn guess_content_type(file_name: &str) -> String {
    if file_name.to_ascii_lowercase().ends_with(".epub") {
        return DEFAULT_CONTENT_TYPE.to_string();
    }
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, routing::get, Router};

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/books/moby-dick.epub",
                get(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], "PK-epub-bytes") }),
            )
            .route("/big", get(|| async { "x".repeat(4096) }))
            .route(
                "/missing",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "gone") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/book.epub").is_ok());
        assert!(parse_url("http://example.com").is_ok());
        assert!(matches!(parse_url("ftp://example.com/a.epub"), Err(ProxyError::InvalidUrl(_))));
        assert!(matches!(parse_url("file:///etc/passwd"), Err(ProxyError::InvalidUrl(_))));
        assert!(matches!(parse_url("not a url"), Err(ProxyError::InvalidUrl(_))));
    }

    #[test]
    fn test_file_name_and_content_type() {
        let url = Url::parse("https://example.com/books/moby%20dick.epub?x=1").unwrap();
        assert_eq!(file_name_for(&url), "moby dick.epub");
        assert_eq!(guess_content_type("moby dick.epub"), "application/epub+zip");
        assert_eq!(guess_content_type("cover.png"), "image/png");

        let bare = Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name_for(&bare), "download.epub");
    }

    #[tokio::test]
    async fn test_fetch_relays_bytes() {
        let base = spawn_upstream().await;
        let client = reqwest::Client::new();

        let url = parse_url(&format!("{}/books/moby-dick.epub", base)).unwrap();
        let download = fetch(&client, url, 1024).await.unwrap();
        assert_eq!(download.data, b"PK-epub-bytes");
        assert_eq!(download.file_name, "moby-dick.epub");
        assert_eq!(download.content_type, "application/epub+zip");
    }

    #[tokio::test]
    async fn test_fetch_upstream_errors() {
        let base = spawn_upstream().await;
        let client = reqwest::Client::new();

        let missing = parse_url(&format!("{}/missing", base)).unwrap();
        assert!(matches!(
            fetch(&client, missing, 1024).await,
            Err(ProxyError::Status(404))
        ));

        let big = parse_url(&format!("{}/big", base)).unwrap();
        assert!(matches!(
            fetch(&client, big, 100).await,
            Err(ProxyError::TooLarge { limit: 100 })
        ));
    }
}
