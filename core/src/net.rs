/*
 * net.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a generic typed JSON-over-HTTP client.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Default transport: HTTP/1.1 over TCP or rustls TLS, one connection per
//! request. TLS validation goes through the registered trust policy; roots
//! are platform native certs first, webpki-roots as fallback.

use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::http1::ResponseParser;
use crate::request::WireRequest;
use crate::transport::{SendFuture, Transport, TransportError};
use crate::trust::{PolicyVerifier, TrustDecision, TrustPolicy};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Root certificate store: platform native certs first, webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// Policy used until the client registers one: defer everything to default
/// validation.
fn default_trust_policy() -> TrustPolicy {
    Arc::new(|_chain: &[CertificateDer<'static>]| TrustDecision::UseDefault)
}

/// Parsed request target: scheme, host, port, origin-form path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTarget {
    secure: bool,
    host: String,
    port: u16,
    path: String,
}

impl RequestTarget {
    fn parse(url: &str) -> Result<Self, TransportError> {
        let (secure, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(TransportError::new(format!(
                "unsupported URL scheme: {}",
                url
            )));
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err(TransportError::new(format!("URL has no host: {}", url)));
        }
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| TransportError::new(format!("invalid port in URL: {}", url)))?;
                (host.to_string(), port)
            }
            None => (authority.to_string(), if secure { 443 } else { 80 }),
        };
        Ok(Self {
            secure,
            host,
            port,
            path: path.to_string(),
        })
    }

    /// Host header value; the port is elided when it is the scheme default.
    fn host_header(&self) -> String {
        if (self.secure && self.port != 443) || (!self.secure && self.port != 80) {
            format!("{}:{}", self.host, self.port)
        } else {
            self.host.clone()
        }
    }
}

/// Default [`Transport`]: HTTP/1.1, no pooling, no retries. The trust policy
/// is stored once at registration; the TLS config is built on first use and
/// shared by all subsequent handshakes.
pub struct HttpTransport {
    policy: OnceLock<TrustPolicy>,
    tls_config: OnceLock<Arc<ClientConfig>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            policy: OnceLock::new(),
            tls_config: OnceLock::new(),
        }
    }

    fn tls_config(&self) -> Result<Arc<ClientConfig>, TransportError> {
        if let Some(config) = self.tls_config.get() {
            return Ok(config.clone());
        }
        let policy = self
            .policy
            .get()
            .cloned()
            .unwrap_or_else(default_trust_policy);
        let verifier = PolicyVerifier::new(policy, build_root_store())?;
        let mut config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();
        config.alpn_protocols = vec![b"http/1.1".to_vec()];
        let config = Arc::new(config);
        Ok(self.tls_config.get_or_init(|| config).clone())
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: WireRequest) -> SendFuture {
        let target = match RequestTarget::parse(&request.url) {
            Ok(target) => target,
            Err(e) => return Box::pin(async move { Err(e) }),
        };
        let tls = if target.secure {
            match self.tls_config() {
                Ok(config) => Some(config),
                Err(e) => return Box::pin(async move { Err(e) }),
            }
        } else {
            None
        };
        Box::pin(async move { dispatch(target, tls, request).await })
    }

    fn register_trust_policy(&self, policy: TrustPolicy) {
        // First registration wins; the client installs its policy once at
        // construction, before any send.
        let _ = self.policy.set(policy);
    }
}

/// One request round-trip: connect, optional TLS handshake, write, read.
async fn dispatch(
    target: RequestTarget,
    tls: Option<Arc<ClientConfig>>,
    request: WireRequest,
) -> Result<Bytes, TransportError> {
    let tcp = timeout(
        CONNECT_TIMEOUT,
        TcpStream::connect((target.host.as_str(), target.port)),
    )
    .await
    .map_err(|_| TransportError::new(format!("connect to {} timed out", target.host)))?
    .map_err(|e| TransportError::with_source(format!("connect to {} failed", target.host), e))?;

    let (status, body) = match tls {
        Some(config) => {
            let server_name = ServerName::try_from(target.host.clone())
                .map_err(|_| TransportError::new(format!("invalid host name: {}", target.host)))?;
            let connector = TlsConnector::from(config);
            let mut stream = connector.connect(server_name, tcp).await.map_err(|e| {
                TransportError::with_source(format!("TLS handshake with {} failed", target.host), e)
            })?;
            exchange(&mut stream, &target, &request).await?
        }
        None => {
            let mut stream = tcp;
            exchange(&mut stream, &target, &request).await?
        }
    };

    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(TransportError::http_status(status, &body))
    }
}

async fn exchange<S>(
    stream: &mut S,
    target: &RequestTarget,
    request: &WireRequest,
) -> Result<(u16, Bytes), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_request(stream, target, request)
        .await
        .map_err(|e| TransportError::with_source("request write failed", e))?;
    read_response(stream).await
}

fn has_header(request: &WireRequest, name: &str) -> bool {
    request.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

/// Write the request head and body. Host and Content-Length are supplied
/// unless the caller already set them; the connection is single-use.
async fn write_request<S: AsyncWrite + Unpin>(
    stream: &mut S,
    target: &RequestTarget,
    request: &WireRequest,
) -> io::Result<()> {
    let mut head = format!("{} {} HTTP/1.1\r\n", request.method.as_str(), target.path);
    if !has_header(request, "host") {
        head.push_str(&format!("Host: {}\r\n", target.host_header()));
    }
    for (name, value) in &request.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    if let Some(body) = &request.body {
        if !has_header(request, "content-length") {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
    }
    if !has_header(request, "connection") {
        head.push_str("Connection: close\r\n");
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await?;
    if let Some(body) = &request.body {
        stream.write_all(body).await?;
    }
    stream.flush().await
}

async fn read_response<S: AsyncRead + Unpin>(
    stream: &mut S,
) -> Result<(u16, Bytes), TransportError> {
    let mut parser = ResponseParser::new();
    let mut buf = BytesMut::with_capacity(8192);
    let mut tmp = [0u8; 8192];
    while !parser.is_complete() {
        let n = match stream.read(&mut tmp).await {
            Ok(n) => n,
            // rustls reports a close without close_notify as UnexpectedEof
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(TransportError::with_source("response read failed", e)),
        };
        if n == 0 {
            parser
                .finish_eof()
                .map_err(|e| TransportError::with_source("response truncated", e))?;
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        parser
            .feed(&mut buf)
            .map_err(|e| TransportError::with_source("malformed HTTP response", e))?;
    }
    let (status, _headers, body) = parser.into_parts();
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::request::{build_request, Method};

    #[test]
    fn parse_https_default_port() {
        let target = RequestTarget::parse("https://api.example.com/u/1").unwrap();
        assert!(target.secure);
        assert_eq!(target.host, "api.example.com");
        assert_eq!(target.port, 443);
        assert_eq!(target.path, "/u/1");
        assert_eq!(target.host_header(), "api.example.com");
    }

    #[test]
    fn parse_http_explicit_port_and_bare_host() {
        let target = RequestTarget::parse("http://localhost:8080").unwrap();
        assert!(!target.secure);
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 8080);
        assert_eq!(target.path, "/");
        assert_eq!(target.host_header(), "localhost:8080");
    }

    #[test]
    fn parse_keeps_query_in_path() {
        let target = RequestTarget::parse("http://h/items?page=2").unwrap();
        assert_eq!(target.path, "/items?page=2");
    }

    #[test]
    fn parse_rejects_bad_urls() {
        assert!(RequestTarget::parse("ftp://example.com/").is_err());
        assert!(RequestTarget::parse("example.com/").is_err());
        assert!(RequestTarget::parse("http://").is_err());
        assert!(RequestTarget::parse("http://host:notaport/").is_err());
    }

    #[tokio::test]
    async fn write_request_frames_head_and_body() {
        let request = build_request(
            "http://localhost:8080/notes",
            None,
            Method::Post,
            Some(&serde_json::json!({"text": "ciao"})),
            &JsonCodec,
        )
        .unwrap();
        let target = RequestTarget::parse(&request.url).unwrap();
        let (mut client, mut server) = tokio::io::duplex(4096);
        write_request(&mut client, &target, &request).await.unwrap();
        drop(client);
        let mut written = Vec::new();
        server.read_to_end(&mut written).await.unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.starts_with("POST /notes HTTP/1.1\r\n"));
        assert!(text.contains("Host: localhost:8080\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        let body = serde_json::to_string(&serde_json::json!({"text": "ciao"})).unwrap();
        assert!(text.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(text.ends_with(&body));
    }

    #[tokio::test]
    async fn read_response_handles_content_length() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        server
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
            .await
            .unwrap();
        drop(server);
        let (status, body) = read_response(&mut client).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn read_response_handles_read_to_close() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        server
            .write_all(b"HTTP/1.1 200 OK\r\n\r\nstreamed until close")
            .await
            .unwrap();
        drop(server);
        let (status, body) = read_response(&mut client).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(&body[..], b"streamed until close");
    }
}
