//! Decoding of the raw HTTP/1.1 messages captured alongside an analytics record.
//!
//! Only `Content-Length` framing is understood: the body is the declared number of bytes
//! following the empty line that ends the header section.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error(transparent)]
    Decode(#[from] base64::DecodeError),
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),
}

/// Inconsistent framing of a raw HTTP message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMessage {
    #[error("the message is empty")]
    Empty,
    #[error("invalid header line {0:?}")]
    InvalidHeader(String),
    #[error("no empty line separates the headers from the body")]
    MissingDelimiter,
    #[error("no Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value {0:?}")]
    InvalidContentLength(String),
    #[error("the declared Content-Length of {declared} bytes exceeds the {available} bytes available")]
    Truncated { declared: usize, available: usize },
}

/// The body of a decoded HTTP/1.1 request or response.
///
/// The start line and headers are validated for framing, then dropped.
#[derive(Debug, Clone)]
pub struct RawMessage {
    body: Bytes,
}

impl RawMessage {
    /// Decodes a base64 payload and parses the message it contains.
    pub fn from_base64(encoded: &str) -> Result<Self, MessageError> {
        let bytes = STANDARD.decode(encoded)?;

        Ok(Self::parse(bytes)?)
    }

    pub fn parse(message: impl Into<Bytes>) -> Result<Self, MalformedMessage> {
        let message = message.into();

        if message.is_empty() {
            return Err(MalformedMessage::Empty);
        }

        let mut lines = Lines {
            input: &message,
            position: 0,
        };

        // request line or status line
        match lines.next() {
            Some(line) if !line.is_empty() => (),
            Some(_) => return Err(MalformedMessage::Empty),
            None => return Err(MalformedMessage::MissingDelimiter),
        }

        let mut headers = HeaderMap::new();

        loop {
            let Some(line) = lines.next() else {
                return Err(MalformedMessage::MissingDelimiter);
            };

            if line.is_empty() {
                break;
            }

            let (name, value) = parse_header(line)?;
            headers.append(name, value);
        }

        let declared = content_length(&headers)?;
        let rest = message.slice(lines.position..);

        if declared > rest.len() {
            return Err(MalformedMessage::Truncated {
                declared,
                available: rest.len(),
            });
        }

        Ok(RawMessage {
            body: rest.slice(..declared),
        })
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Lines of the header section. Accepts CRLF and bare LF endings, and only yields
/// terminated lines so the position always points past the last line returned.
struct Lines<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.position..];
        let end = rest.iter().position(|byte| *byte == b'\n')?;
        self.position += end + 1;

        let line = &rest[..end];

        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

fn parse_header(line: &[u8]) -> Result<(HeaderName, HeaderValue), MalformedMessage> {
    let invalid = || MalformedMessage::InvalidHeader(String::from_utf8_lossy(line).into_owned());

    let colon = line.iter().position(|byte| *byte == b':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(&line[..colon]).map_err(|_| invalid())?;
    let value = HeaderValue::from_bytes(line[colon + 1..].trim_ascii()).map_err(|_| invalid())?;

    Ok((name, value))
}

fn content_length(headers: &HeaderMap) -> Result<usize, MalformedMessage> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or(MalformedMessage::MissingContentLength)?;

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| MalformedMessage::InvalidContentLength(String::from_utf8_lossy(value.as_bytes()).into_owned()))
}
