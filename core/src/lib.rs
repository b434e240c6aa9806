/*
 * lib.rs
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

//! Corriere core: a generic, typed JSON-over-HTTP client.
//!
//! Design:
//! - `Client` orchestrates the request pipeline: build → transport → decode,
//!   each stage failing into its own `ClientError` variant through the
//!   returned future.
//! - Transport, Encoder, and Decoder are capabilities injected at
//!   construction (default type parameters supply `HttpTransport` and
//!   `JsonCodec`); they are fixed for the client's lifetime.
//! - The certificate trust policy is a plain callback registered with the
//!   transport once at construction; the default transport routes rustls
//!   handshakes through it.
//! - Response decoding runs on tokio's blocking pool, off the caller's
//!   context.

pub mod client;
pub mod codec;
pub mod error;
pub mod http1;
pub mod net;
pub mod options;
pub mod request;
pub mod transport;
pub mod trust;

pub use client::Client;
pub use codec::{DecodeError, Decoder, EncodeError, Encoder, JsonCodec};
pub use error::ClientError;
pub use net::HttpTransport;
pub use options::ClientOptions;
pub use request::{build_request, Method, WireRequest};
pub use transport::{SendFuture, Transport, TransportError};
pub use trust::{trust_policy_for, PolicyVerifier, TrustDecision, TrustPolicy};
