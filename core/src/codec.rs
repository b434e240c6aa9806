/*
 * codec.rs
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

//! Encoder/Decoder capabilities and the default serde_json codec.
//!
//! Both traits are generic over the value shape, so a decoder can produce the
//! caller's target type directly without an intermediate JSON value.

use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value into request-body bytes. Fails on unsupported or invalid input.
pub trait Encoder: Send + Sync {
    fn encode<U: Serialize + ?Sized>(&self, value: &U) -> Result<Bytes, EncodeError>;
}

/// Decodes response-body bytes into the caller's target shape. Fails on
/// malformed input or shape mismatch.
pub trait Decoder: Send + Sync {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

/// Default codec: JSON via serde_json, both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Encoder for JsonCodec {
    fn encode<U: Serialize + ?Sized>(&self, value: &U) -> Result<Bytes, EncodeError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| EncodeError::with_source("JSON encode failed", e))
    }
}

impl Decoder for JsonCodec {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::with_source("JSON decode failed", e))
    }
}

/// Error while encoding a request body.
#[derive(Debug)]
pub struct EncodeError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EncodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            source: None,
        }
    }

    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: msg.into(),
            source: Some(source.into()),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.source.as_ref() {
            Some(s) => Some(&**s),
            None => None,
        }
    }
}

/// Error while decoding a response body; wraps the underlying cause.
#[derive(Debug)]
pub struct DecodeError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DecodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            source: None,
        }
    }

    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: msg.into(),
            source: Some(source.into()),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.source.as_ref() {
            Some(s) => Some(&**s),
            None => None,
        }
    }
}
