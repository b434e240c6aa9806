/*
 * request.rs
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

//! Wire request: method, URL, headers, optional encoded body.
//!
//! Built by `build_request`, which is pure (no I/O, no async): an optional
//! typed body is encoded through the Encoder capability up front, so a
//! `WireRequest` never encodes lazily at send time.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::{EncodeError, Encoder};

/// HTTP request method. Fixed enumeration; no custom verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

/// One wire-level request. Immutable once built: constructed only by
/// [`build_request`], no mutators.
///
/// Header keys are unique (last write wins on duplicates); key order carries
/// no meaning, so two requests that differ only in header order compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    /// Fully encoded body bytes, when a body was supplied.
    pub body: Option<Bytes>,
}

/// Build a wire request from its parts. Headers are copied verbatim (empty
/// map when none given). A present body is encoded through `encoder`; an
/// encoding failure propagates as [`EncodeError`] rather than degrading to an
/// empty body.
pub fn build_request<U, E>(
    url: &str,
    headers: Option<&HashMap<String, String>>,
    method: Method,
    body: Option<&U>,
    encoder: &E,
) -> Result<WireRequest, EncodeError>
where
    U: Serialize + ?Sized,
    E: Encoder + ?Sized,
{
    let body = match body {
        Some(value) => Some(encoder.encode(value)?),
        None => None,
    };
    Ok(WireRequest {
        url: url.to_string(),
        method,
        headers: headers.cloned().unwrap_or_default(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;

    #[derive(Serialize)]
    struct Note {
        text: String,
    }

    #[test]
    fn method_tokens() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Put.as_str(), "PUT");
        assert_eq!(Method::Delete.as_str(), "DELETE");
        assert_eq!(Method::Patch.as_str(), "PATCH");
    }

    #[test]
    fn no_body_produces_no_body() {
        let req = build_request::<(), _>("https://api.example.com/u/1", None, Method::Get, None, &JsonCodec)
            .unwrap();
        assert_eq!(req.method, Method::Get);
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn headers_are_copied_verbatim() {
        let mut headers = HashMap::new();
        headers.insert("X-Trace".to_string(), "abc".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        let req = build_request::<(), _>("https://api.example.com", Some(&headers), Method::Delete, None, &JsonCodec)
            .unwrap();
        assert_eq!(req.headers, headers);
    }

    #[test]
    fn body_equals_encoder_output() {
        let note = Note {
            text: "ciao".to_string(),
        };
        let req =
            build_request("https://api.example.com/notes", None, Method::Post, Some(&note), &JsonCodec).unwrap();
        let expected = serde_json::to_vec(&note).unwrap();
        assert_eq!(req.body.as_deref(), Some(expected.as_slice()));
    }

    #[test]
    fn encode_failure_propagates() {
        struct RefusingEncoder;
        impl Encoder for RefusingEncoder {
            fn encode<U: Serialize + ?Sized>(&self, _value: &U) -> Result<Bytes, EncodeError> {
                Err(EncodeError::new("rejected"))
            }
        }
        let note = Note {
            text: "ciao".to_string(),
        };
        let err = build_request("https://api.example.com", None, Method::Post, Some(&note), &RefusingEncoder)
            .unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn header_order_does_not_matter_for_equality() {
        let mut a = HashMap::new();
        a.insert("A".to_string(), "1".to_string());
        a.insert("B".to_string(), "2".to_string());
        let mut b = HashMap::new();
        b.insert("B".to_string(), "2".to_string());
        b.insert("A".to_string(), "1".to_string());
        let left =
            build_request::<(), _>("https://h/", Some(&a), Method::Get, None, &JsonCodec).unwrap();
        let right =
            build_request::<(), _>("https://h/", Some(&b), Method::Get, None, &JsonCodec).unwrap();
        assert_eq!(left, right);
    }
}
