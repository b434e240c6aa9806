/*
 * transport.rs
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

//! Transport capability: dispatch one wire request, resolve with raw response
//! bytes. The default implementation is [`HttpTransport`](crate::net::HttpTransport).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::request::WireRequest;
use crate::trust::TrustPolicy;

/// Future-style handle for one dispatched request. Resolves exactly once with
/// the raw response bytes or a [`TransportError`]; no retry, no cancellation.
pub type SendFuture = Pin<Box<dyn Future<Output = Result<Bytes, TransportError>> + Send>>;

/// Network transport. One instance may carry many requests in flight
/// concurrently; implementations must not serialize callers.
pub trait Transport: Send + Sync {
    /// Dispatch `request` and resolve with the response body bytes.
    /// Interpretation of non-2xx responses is transport-defined.
    fn send(&self, request: WireRequest) -> SendFuture;

    /// Install the trust policy consulted during TLS handshakes. The client
    /// calls this exactly once at construction. Implementations that perform
    /// TLS must invoke the policy synchronously for each handshake and respect
    /// its decision; transports without TLS may keep the default no-op.
    fn register_trust_policy(&self, policy: TrustPolicy) {
        let _ = policy;
    }
}

/// Connection or protocol failure reported by a transport. Carries the HTTP
/// status when the transport chose to fail a response by status.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    status: Option<u16>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: msg.into(),
            status: None,
            source: Some(source.into()),
        }
    }

    /// Error for a response the transport rejects by status. The body snippet
    /// is kept short; it is context for the message, not the payload.
    pub fn http_status(status: u16, body: &[u8]) -> Self {
        let snippet = String::from_utf8_lossy(&body[..body.len().min(120)]);
        let message = if snippet.trim().is_empty() {
            format!("HTTP status {}", status)
        } else {
            format!("HTTP status {}: {}", status, snippet.trim())
        };
        Self {
            message,
            status: Some(status),
            source: None,
        }
    }

    /// HTTP status, when this error was raised for a status-rejected response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.source.as_ref() {
            Some(s) => Some(&**s),
            None => None,
        }
    }
}
