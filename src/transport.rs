//! Port-43 dialog: one connection, one query line, read until the peer closes.

use crate::{config::Config, errors::WhoisError};
use async_trait::async_trait;
use std::{net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

/// A single WHOIS round trip against `destination` (`host:port`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, destination: &str, query: &str) -> Result<String, WhoisError>;
}

#[derive(Debug, Clone)]
pub struct TcpTransport {
    read_timeout: Duration,
    write_timeout: Duration,
    max_response_size: usize,
}

impl TcpTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            max_response_size: config.max_response_size,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn fetch(&self, destination: &str, query: &str) -> Result<String, WhoisError> {
        // The caller's overall deadline bounds the connect; dropping this
        // future closes the socket.
        let mut stream = TcpStream::connect(destination).await.map_err(|e| WhoisError::Dial {
            server: destination.to_string(),
            source: e,
        })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        let query_line = format!("{}\r\n", query);
        timeout(self.write_timeout, stream.write_all(query_line.as_bytes())).await??;

        let mut response = Vec::new();
        let mut limited = (&mut stream).take(self.max_response_size as u64);
        timeout(self.read_timeout, limited.read_to_end(&mut response)).await??;

        debug!(server = %destination, bytes = response.len(), "whois response received");
        Ok(decode(response))
    }
}

/// UTF-8 when valid, Latin-1 otherwise; registries still emit both.
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Builds `host:port`, leaving servers that already name a port untouched.
pub fn destination(server: &str, port: u16) -> String {
    let server = server.trim();
    if server.parse::<SocketAddr>().is_ok() {
        return server.to_string();
    }
    if let Some((host, p)) = server.rsplit_once(':') {
        if !host.contains(':') && p.parse::<u16>().is_ok() {
            return server.to_string();
        }
    }
    if server.contains(':') {
        // bare IPv6 literal
        return format!("[{}]:{}", server.trim_matches(|c| c == '[' || c == ']'), port);
    }
    format!("{}:{}", server, port)
}

/// Host part of a `host:port` destination (or of a bare host).
pub fn host_only(server: &str) -> String {
    let server = server.trim();
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    match server.rsplit_once(':') {
        Some((host, p)) if !host.contains(':') && p.parse::<u16>().is_ok() => host.to_string(),
        _ => server.trim_matches(|c| c == '[' || c == ']').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn transport(read_secs: u64, max: usize) -> TcpTransport {
        TcpTransport {
            read_timeout: Duration::from_secs(read_secs),
            write_timeout: Duration::from_secs(1),
            max_response_size: max,
        }
    }

    #[test]
    fn test_destination() {
        assert_eq!(destination("whois.nic.io", 43), "whois.nic.io:43");
        assert_eq!(destination("127.0.0.1:4343", 43), "127.0.0.1:4343");
        assert_eq!(destination("whois.example:4343", 43), "whois.example:4343");
        assert_eq!(destination("2001:db8::1", 43), "[2001:db8::1]:43");
        assert_eq!(destination("[2001:db8::1]:4343", 43), "[2001:db8::1]:4343");
    }

    #[test]
    fn test_host_only() {
        assert_eq!(host_only("whois.nic.io:43"), "whois.nic.io");
        assert_eq!(host_only("whois.nic.io"), "whois.nic.io");
        assert_eq!(host_only("[2001:db8::1]:43"), "2001:db8::1");
        assert_eq!(host_only("2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode(vec![b'c', 0xe9]), "cé");
        assert_eq!(decode("ok".as_bytes().to_vec()), "ok");
    }

    #[tokio::test]
    async fn test_query_line_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(b"Domain Name: EXAMPLE.IO\n").await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });

        let body = transport(5, 1024).fetch(&addr.to_string(), "example.io").await.unwrap();
        assert_eq!(body, "Domain Name: EXAMPLE.IO\n");
        assert_eq!(server.await.unwrap(), "example.io\r\n");
    }

    #[tokio::test]
    async fn test_response_truncated_at_cap() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(&vec![b'x'; 4096]).await;
        });

        let body = transport(5, 100).fetch(&addr.to_string(), "q").await.unwrap();
        assert_eq!(body.len(), 100);
    }

    #[tokio::test]
    async fn test_read_deadline_is_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let err = transport(1, 1024).fetch(&addr.to_string(), "q").await.unwrap_err();
        assert!(matches!(err, WhoisError::Timeout));
    }

    #[tokio::test]
    async fn test_write_deadline_is_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept but never read so the socket buffers fill up.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let transport = TcpTransport {
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_millis(200),
            max_response_size: 1024,
        };
        let query = "a".repeat(64 * 1024 * 1024);
        let started = std::time::Instant::now();
        let err = transport.fetch(&addr.to_string(), &query).await.unwrap_err();
        assert!(matches!(err, WhoisError::Timeout), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_connection_refused_is_dial_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(1, 1024).fetch(&addr.to_string(), "q").await.unwrap_err();
        assert!(matches!(err, WhoisError::Dial { .. }));
    }
}
