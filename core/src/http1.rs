/*
 * http1.rs
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

//! HTTP/1.1 response parser: status line, headers, body (Content-Length,
//! chunked, or read-to-close). Accumulates the complete response; the
//! transport feeds it from the stream until `is_complete`.

use std::io;

use bytes::{Buf, Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    StatusLine,
    Headers,
    Body,
    ChunkSize,
    ChunkData,
    /// CRLF after a chunk's data.
    ChunkDataEnd,
    ChunkTrailer,
    Complete,
}

/// Parser for one HTTP/1.1 response. Feed bytes via `feed`; call
/// `finish_eof` when the peer closes; take the result with `into_parts`.
pub struct ResponseParser {
    state: ParseState,
    status: u16,
    headers: Vec<(String, String)>,
    body: BytesMut,
    content_length: Option<u64>,
    body_received: u64,
    read_to_close: bool,
    chunk_remaining: u64,
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            status: 0,
            headers: Vec::new(),
            body: BytesMut::new(),
            content_length: None,
            body_received: 0,
            read_to_close: false,
            chunk_remaining: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Find CRLF in buf; returns the byte count before it, or None.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i + 1 < buf.len() {
            if buf[i] == b'\r' && buf[i + 1] == b'\n' {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers done: pick the body mode from status and framing headers.
    fn begin_body(&mut self) {
        let chunked = self
            .header_value("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        let content_length = self
            .header_value("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok());
        if chunked {
            self.state = ParseState::ChunkSize;
        } else if self.status == 204 || self.status == 304 || content_length == Some(0) {
            self.state = ParseState::Complete;
        } else if let Some(cl) = content_length {
            self.content_length = Some(cl);
            self.state = ParseState::Body;
        } else {
            self.read_to_close = true;
            self.state = ParseState::Body;
        }
    }

    /// Consume as much of `buf` as possible. Partial data stays in `buf` for
    /// the next feed.
    pub fn feed(&mut self, buf: &mut BytesMut) -> io::Result<()> {
        while !buf.is_empty() && self.state != ParseState::Complete {
            match self.state {
                ParseState::StatusLine => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| invalid("status line is not UTF-8"))?;
                    let mut parts = line_str.splitn(3, ' ');
                    if !parts.next().unwrap_or("").starts_with("HTTP/1.") {
                        return Err(invalid("not an HTTP/1.x response"));
                    }
                    self.status = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .ok_or_else(|| invalid("malformed status code"))?;
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.begin_body();
                        continue;
                    }
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| invalid("header is not UTF-8"))?;
                    if let Some(colon) = line_str.find(':') {
                        self.headers.push((
                            line_str[..colon].trim().to_string(),
                            line_str[colon + 1..].trim().to_string(),
                        ));
                    }
                }
                ParseState::Body => {
                    if let Some(cl) = self.content_length {
                        let remaining = (cl - self.body_received) as usize;
                        let take = remaining.min(buf.len());
                        self.body.extend_from_slice(&buf.split_to(take));
                        self.body_received += take as u64;
                        if self.body_received >= cl {
                            self.state = ParseState::Complete;
                        }
                    } else {
                        // Read until close; finish_eof settles it.
                        self.body.extend_from_slice(&buf.split_to(buf.len()));
                    }
                }
                ParseState::ChunkSize => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| invalid("chunk size is not UTF-8"))?;
                    let hex_part = line_str.split(';').next().unwrap_or(line_str).trim();
                    self.chunk_remaining = u64::from_str_radix(hex_part, 16)
                        .map_err(|_| invalid("malformed chunk size"))?;
                    self.state = if self.chunk_remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let take = (self.chunk_remaining as usize).min(buf.len());
                    self.body.extend_from_slice(&buf.split_to(take));
                    self.chunk_remaining -= take as u64;
                    if self.chunk_remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.state = ParseState::Complete;
                    } else {
                        // Trailers are kept with the response headers.
                        let line = buf.split_to(line_end + 2);
                        let line_str = std::str::from_utf8(&line[..line_end])
                            .map_err(|_| invalid("trailer is not UTF-8"))?;
                        if let Some(colon) = line_str.find(':') {
                            self.headers.push((
                                line_str[..colon].trim().to_string(),
                                line_str[colon + 1..].trim().to_string(),
                            ));
                        }
                    }
                }
                ParseState::Complete => break,
            }
        }
        Ok(())
    }

    /// The peer closed the stream. A read-to-close body completes here; any
    /// other unfinished state means the response was truncated.
    pub fn finish_eof(&mut self) -> io::Result<()> {
        if self.state == ParseState::Complete {
            return Ok(());
        }
        if self.state == ParseState::Body && self.read_to_close {
            self.state = ParseState::Complete;
            return Ok(());
        }
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-response",
        ))
    }

    pub fn into_parts(self) -> (u16, Vec<(String, String)>, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
