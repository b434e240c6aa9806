/*
 * error.rs
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

//! Client errors, typed by the pipeline stage that failed.

use std::fmt;

use crate::codec::{DecodeError, EncodeError};
use crate::transport::TransportError;

/// Error from one request. Every failure surfaces through the returned
/// future (never a synchronous panic, never a silent default value), and the
/// variant identifies the stage that failed.
#[derive(Debug)]
pub enum ClientError {
    /// Request construction failed (body encoding). The transport was never
    /// invoked.
    Build(EncodeError),
    /// The transport failed; surfaced verbatim. The decoder was never invoked.
    Transport(TransportError),
    /// The response became unusable before decoding produced a verdict.
    InvalidResponse(String),
    /// The decoder rejected the response body.
    Decode(DecodeError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Build(e) => write!(f, "request build failed: {}", e),
            ClientError::Transport(e) => write!(f, "transport failed: {}", e),
            ClientError::InvalidResponse(m) => write!(f, "invalid response: {}", m),
            ClientError::Decode(e) => write!(f, "response decode failed: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Build(e) => Some(e),
            ClientError::Transport(e) => Some(e),
            ClientError::InvalidResponse(_) => None,
            ClientError::Decode(e) => Some(e),
        }
    }
}

impl From<EncodeError> for ClientError {
    fn from(e: EncodeError) -> Self {
        ClientError::Build(e)
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e)
    }
}

impl From<DecodeError> for ClientError {
    fn from(e: DecodeError) -> Self {
        ClientError::Decode(e)
    }
}
