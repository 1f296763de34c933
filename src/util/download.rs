//! Download utilities
//!
//! HTTP client setup, existence checks, and streaming archive downloads.

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Build the shared HTTP client from network settings
///
/// The timeout bounds connecting and each wait for data, not the whole
/// transfer.
pub fn build_client(network: &NetworkConfig) -> Result<Client> {
    let timeout = Duration::from_secs(network.timeout_seconds.max(1));
    Client::builder()
        .user_agent(network.user_agent.as_str())
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(Error::HttpClient)
}

/// Fetch a URL and return its body as text
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let network = |source| Error::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(network)?;
    if !response.status().is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(network)
}

/// Check whether a URL exists with a HEAD request, falling back to GET on 405
pub async fn url_exists(client: &Client, url: &str) -> bool {
    let status = match client.head(url).send().await {
        Ok(response) => response.status(),
        Err(e) => {
            tracing::debug!("HEAD {} failed: {}", url, e);
            return false;
        }
    };

    if status == StatusCode::METHOD_NOT_ALLOWED {
        return match client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                false
            }
        };
    }

    tracing::debug!("HEAD {} -> {}", url, status);
    status.is_success()
}

/// Download a file to the specified path
///
/// The body is streamed chunk by chunk. A partially written file is removed
/// when the transfer fails.
pub async fn download_file(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let result = stream_to_file(client, url, dest).await;

    if result.is_err() && dest.exists() {
        if let Err(e) = std::fs::remove_file(dest) {
            tracing::warn!("Failed to remove partial download {:?}: {}", dest, e);
        }
    }

    result
}

async fn stream_to_file(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let network = |source| Error::Network {
        url: url.to_string(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(network)?;
    if !response.status().is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let mut file = std::fs::File::create(dest).map_err(|e| Error::write(dest, e))?;
    while let Some(chunk) = response.chunk().await.map_err(network)? {
        file.write_all(&chunk).map_err(|e| Error::write(dest, e))?;
    }
    file.flush().map_err(|e| Error::write(dest, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_client(&NetworkConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_url_exists_head_ok() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/archive.zip"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/archive.zip", server.uri());
        assert!(url_exists(&client(), &url).await);
    }

    #[tokio::test]
    async fn test_url_exists_falls_back_to_get_on_405() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/archive.zip"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/archive.zip"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/archive.zip", server.uri());
        assert!(url_exists(&client(), &url).await);
    }

    #[tokio::test]
    async fn test_url_exists_missing() {
        let server = MockServer::start().await;
        let url = format!("{}/missing.zip", server.uri());
        assert!(!url_exists(&client(), &url).await);
    }

    #[tokio::test]
    async fn test_url_exists_invalid_url() {
        assert!(!url_exists(&client(), "(no official URL found)").await);
    }

    #[tokio::test]
    async fn test_download_file_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/archive.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("archive.zip");
        let url = format!("{}/archive.zip", server.uri());

        download_file(&client(), &url, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"zip-bytes");
    }

    #[tokio::test]
    async fn test_download_file_reports_status() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("archive.zip");
        let url = format!("{}/archive.zip", server.uri());

        let err = download_file(&client(), &url, &dest).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert!(!dest.exists());
    }

    /// Serve one response whose 8-byte body trickles out a byte at a time
    async fn serve_slow_body(listener: tokio::net::TcpListener, gap: Duration) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        for byte in b"slowbody" {
            tokio::time::sleep(gap).await;
            socket.write_all(&[*byte]).await.unwrap();
            socket.flush().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_download_outlasting_timeout_completes_while_data_flows() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/a.zip", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_slow_body(listener, Duration::from_millis(300)));

        let network = NetworkConfig {
            timeout_seconds: 1,
            ..NetworkConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.zip");

        download_file(&build_client(&network).unwrap(), &url, &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"slowbody");
        server.await.unwrap();
    }
}
