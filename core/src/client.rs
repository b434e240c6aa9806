/*
 * client.rs
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

//! Client: the request pipeline orchestrator.
//!
//! Owns one transport and one codec pair for its lifetime, registers the
//! trust policy with the transport at construction, and turns
//! (url, headers, method, optional body) into a decoded value of the
//! caller's type. Decoding runs on tokio's blocking pool so large payloads
//! never stall the context that issued the request or resolved the
//! transport future.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Decoder, Encoder, JsonCodec};
use crate::error::ClientError;
use crate::net::HttpTransport;
use crate::options::ClientOptions;
use crate::request::{build_request, Method, WireRequest};
use crate::transport::Transport;
use crate::trust::trust_policy_for;

/// Generic typed HTTP client. Capability defaults ([`HttpTransport`],
/// [`JsonCodec`] both ways) come from the type parameters; substitute any of
/// them at construction via [`Client::with_capabilities`].
///
/// All methods take `&self`: one client may carry many requests in flight
/// concurrently, with no ordering guarantee across them.
pub struct Client<Tr = HttpTransport, E = JsonCodec, D = JsonCodec> {
    transport: Arc<Tr>,
    encoder: Arc<E>,
    decoder: Arc<D>,
    options: ClientOptions,
}

impl Client {
    /// Client over the default transport and JSON codec.
    pub fn new(options: ClientOptions) -> Self {
        Self::with_capabilities(HttpTransport::new(), JsonCodec, JsonCodec, options)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl<Tr, E, D> Client<Tr, E, D>
where
    Tr: Transport,
    E: Encoder,
    D: Decoder + 'static,
{
    /// Client over the given capabilities. They are fixed for the client's
    /// lifetime; the trust policy derived from `options` is registered with
    /// the transport here, once.
    pub fn with_capabilities(transport: Tr, encoder: E, decoder: D, options: ClientOptions) -> Self {
        transport.register_trust_policy(trust_policy_for(options));
        Self {
            transport: Arc::new(transport),
            encoder: Arc::new(encoder),
            decoder: Arc::new(decoder),
            options,
        }
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    /// Issue a request without a body and decode the response as `T`.
    ///
    /// Failures of any stage surface through the returned future (an async
    /// fn body does not run before poll, so even a build failure is an
    /// already-failed future, never a panic).
    pub async fn request<T>(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        method: Method,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let wire = build_request::<(), E>(url, headers, method, None, self.encoder.as_ref())
            .map_err(ClientError::Build)?;
        self.dispatch(wire).await
    }

    /// Issue a request carrying an encodable body and decode the response as
    /// `T`. The body is encoded up front; an encode failure yields
    /// [`ClientError::Build`] and the transport is never invoked.
    pub async fn request_with_body<T, U>(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        body: &U,
        method: Method,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
        U: Serialize + ?Sized,
    {
        let wire = build_request(url, headers, method, Some(body), self.encoder.as_ref())
            .map_err(ClientError::Build)?;
        self.dispatch(wire).await
    }

    /// Transport round-trip, then decode on the blocking pool. One attempt;
    /// the future resolves exactly once. Within a request the order is
    /// strict: transport completes, then decode runs, then resolution.
    async fn dispatch<T>(&self, request: WireRequest) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let bytes = self
            .transport
            .send(request)
            .await
            .map_err(ClientError::Transport)?;
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode::<T>(&bytes))
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("decode task failed: {}", e)))?
            .map_err(ClientError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{SendFuture, TransportError};
    use crate::trust::{TrustDecision, TrustPolicy};
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Transport that records the registered policy and answers every send
    /// with canned bytes.
    struct CannedTransport {
        registered: Mutex<Option<TrustPolicy>>,
        reply: &'static [u8],
    }

    impl CannedTransport {
        fn new(reply: &'static [u8]) -> Self {
            Self {
                registered: Mutex::new(None),
                reply,
            }
        }
    }

    impl Transport for CannedTransport {
        fn send(&self, _request: WireRequest) -> SendFuture {
            let bytes = Bytes::from_static(self.reply);
            Box::pin(async move { Ok(bytes) })
        }

        fn register_trust_policy(&self, policy: TrustPolicy) {
            *self.registered.lock().unwrap() = Some(policy);
        }
    }

    /// Transport that always fails.
    struct DeadTransport;

    impl Transport for DeadTransport {
        fn send(&self, _request: WireRequest) -> SendFuture {
            Box::pin(async { Err(TransportError::new("connection refused")) })
        }
    }

    #[tokio::test]
    async fn construction_registers_trust_policy_once() {
        let client = Client::with_capabilities(
            CannedTransport::new(b"1"),
            JsonCodec,
            JsonCodec,
            ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES,
        );
        let registered = client.transport.registered.lock().unwrap();
        let policy = registered.as_ref().expect("policy registered");
        assert_eq!((**policy)(&[]), TrustDecision::AcceptPresented);
    }

    #[tokio::test]
    async fn transport_failure_maps_to_transport_error() {
        let client =
            Client::with_capabilities(DeadTransport, JsonCodec, JsonCodec, ClientOptions::empty());
        let err = client
            .request::<u64>("https://api.example.com/n", None, Method::Get)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn options_are_kept() {
        let client = Client::with_capabilities(
            CannedTransport::new(b"1"),
            JsonCodec,
            JsonCodec,
            ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES,
        );
        assert!(client
            .options()
            .contains(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES));
    }
}
