//! Typed HTTP messages and wire serialization
use std::io::{Empty, Read, Write};

use crate::{
    error::{GeneralError, ProtocolError, ProtocolErrorKind},
    fields::HeaderMap,
    stream::{Feed, StreamParser},
};

/// Protocol version stamped by the convenience constructors.
pub const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub http_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub http_version: String,
    pub status_code: String,
    pub reason_phrase: String,
}

/// First line of a message, interpreted by direction.
///
/// Either way it serializes as three space-joined tokens. Only a response
/// reason phrase may contain embedded spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request(RequestLine),
    Status(StatusLine),
}

impl StartLine {
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(..))
    }

    pub fn as_request(&self) -> Option<&RequestLine> {
        if let Self::Request(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn try_into_request(self) -> Result<RequestLine, Self> {
        if let Self::Request(v) = self {
            Ok(v)
        } else {
            Err(self)
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status(..))
    }

    pub fn as_status(&self) -> Option<&StatusLine> {
        if let Self::Status(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn try_into_status(self) -> Result<StatusLine, Self> {
        if let Self::Status(v) = self {
            Ok(v)
        } else {
            Err(self)
        }
    }

    /// Returns the three tokens in wire order.
    pub fn tokens(&self) -> [&str; 3] {
        match self {
            Self::Request(line) => [&line.method, &line.target, &line.http_version],
            Self::Status(line) => [&line.http_version, &line.status_code, &line.reason_phrase],
        }
    }

    /// Rejects a start line that would not re-split into exactly three
    /// tokens on the wire. The reason phrase is exempt since it is the
    /// remainder of the line.
    fn validate(&self) -> Result<(), ProtocolError> {
        let [first, second, _third] = self.tokens();

        for token in [first, second] {
            if token.is_empty() || token.contains(|c: char| c.is_ascii_whitespace()) {
                return Err(
                    ProtocolError::new(ProtocolErrorKind::InvalidStatusHeader).with_snippet(token)
                );
            }
        }

        Ok(())
    }
}

/// Message body, either fully materialized or deferred to the stream
/// parser the message was received from.
#[derive(Debug)]
pub enum Body<R: Read = Empty> {
    Complete(Vec<u8>),
    Pending(StreamParser<R>),
}

/// A complete inbound or outbound HTTP message.
///
/// Outbound messages carry a materialized body. Inbound messages built by
/// [`receive_request`](Self::receive_request) or
/// [`receive_response`](Self::receive_response) defer body access to their
/// parser until [`read_body`](Self::read_body) has run.
#[derive(Debug)]
pub struct Message<R: Read = Empty> {
    pub start_line: StartLine,
    pub fields: HeaderMap,
    body: Body<R>,
}

impl Message {
    /// Creates an outbound request with a materialized body.
    pub fn request<S1, S2>(method: S1, target: S2, fields: HeaderMap, body: Vec<u8>) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            start_line: StartLine::Request(RequestLine {
                method: method.into(),
                target: target.into(),
                http_version: HTTP_VERSION.to_string(),
            }),
            fields,
            body: Body::Complete(body),
        }
    }

    /// Creates an outbound response with a materialized body.
    pub fn response<S>(status_code: u16, reason_phrase: S, fields: HeaderMap, body: Vec<u8>) -> Self
    where
        S: Into<String>,
    {
        Self {
            start_line: StartLine::Status(StatusLine {
                http_version: HTTP_VERSION.to_string(),
                status_code: status_code.to_string(),
                reason_phrase: reason_phrase.into(),
            }),
            fields,
            body: Body::Complete(body),
        }
    }
}

impl<R: Read> Message<R> {
    /// Builds a message from parsed or constructed parts.
    ///
    /// Either a materialized body or a stream parser must be supplied;
    /// otherwise the message has no body source and construction fails
    /// with `MissingRequiredFields`. A materialized body wins when both
    /// are given.
    pub fn from_parts(
        start_line: StartLine,
        fields: HeaderMap,
        body: Option<Vec<u8>>,
        parser: Option<StreamParser<R>>,
    ) -> Result<Self, GeneralError> {
        let body = match (body, parser) {
            (Some(bytes), _) => Body::Complete(bytes),
            (None, Some(parser)) => Body::Pending(parser),
            (None, None) => {
                return Err(ProtocolError::new(ProtocolErrorKind::MissingRequiredFields).into());
            }
        };

        Ok(Self {
            start_line,
            fields,
            body,
        })
    }

    /// Reads a request's start line and headers from the transport.
    ///
    /// The returned message defers body access to its parser; call
    /// [`read_body`](Self::read_body) or
    /// [`discard_body`](Self::discard_body) before touching
    /// [`body`](Self::body).
    pub fn receive_request(transport: R, chunk_len: usize) -> Result<Self, GeneralError> {
        let parser = receive_headers(transport, chunk_len)?;
        let [method, target, http_version] = start_line_tokens(&parser)?;
        let start_line = StartLine::Request(RequestLine {
            method,
            target,
            http_version,
        });

        Self::from_parts(start_line, parser.headers().clone(), None, Some(parser))
    }

    /// Reads a response's start line and headers from the transport.
    pub fn receive_response(transport: R, chunk_len: usize) -> Result<Self, GeneralError> {
        let parser = receive_headers(transport, chunk_len)?;
        let [http_version, status_code, reason_phrase] = start_line_tokens(&parser)?;
        let start_line = StartLine::Status(StatusLine {
            http_version,
            status_code,
            reason_phrase,
        });

        Self::from_parts(start_line, parser.headers().clone(), None, Some(parser))
    }

    /// Returns the body bytes.
    ///
    /// A deferred body propagates `IncompleteBody` until it has been read.
    pub fn body(&self) -> Result<&[u8], GeneralError> {
        match &self.body {
            Body::Complete(bytes) => Ok(bytes),
            Body::Pending(parser) => parser.body(),
        }
    }

    /// Reads the deferred body from the message's parser.
    pub fn read_body(&mut self, max_chunk: usize) -> Result<u64, GeneralError> {
        match &mut self.body {
            Body::Pending(parser) => parser.read_body(max_chunk),
            Body::Complete(_) => {
                Err(ProtocolError::new(ProtocolErrorKind::BodyAlreadyRead).into())
            }
        }
    }

    /// Drains the deferred body without retaining it.
    pub fn discard_body(&mut self, max_chunk: usize) -> Result<(), GeneralError> {
        match &mut self.body {
            Body::Pending(parser) => parser.discard_body(max_chunk),
            Body::Complete(_) => {
                Err(ProtocolError::new(ProtocolErrorKind::BodyAlreadyRead).into())
            }
        }
    }

    /// Writes the message in wire format.
    pub fn serialize<W: Write>(&self, mut buf: W) -> Result<(), GeneralError> {
        self.serialize_start_line(&mut buf)?;
        self.fields.serialize(&mut buf)?;
        buf.write_all(self.body()?)?;

        Ok(())
    }

    /// Serializes the whole message and writes it to the transport in a
    /// single call.
    pub fn send<W: Write>(&self, transport: &mut W) -> Result<(), GeneralError> {
        let mut wire = Vec::new();
        self.serialize(&mut wire)?;
        transport.write_all(&wire)?;

        tracing::trace!(wire_len = wire.len(), "send message");

        Ok(())
    }

    fn serialize_start_line<W: Write>(&self, mut buf: W) -> Result<(), GeneralError> {
        self.start_line.validate()?;

        let [first, second, third] = self.start_line.tokens();

        buf.write_all(first.as_bytes())?;
        buf.write_all(b" ")?;
        buf.write_all(second.as_bytes())?;
        buf.write_all(b" ")?;
        buf.write_all(third.as_bytes())?;
        buf.write_all(b"\r\n")?;

        Ok(())
    }
}

fn receive_headers<R: Read>(transport: R, chunk_len: usize) -> Result<StreamParser<R>, GeneralError> {
    let mut parser = StreamParser::new(transport);

    while parser.fill(chunk_len)? != Feed::HeadersComplete {}

    Ok(parser)
}

fn start_line_tokens<R: Read>(parser: &StreamParser<R>) -> Result<[String; 3], GeneralError> {
    parser
        .start_line()
        .cloned()
        .ok_or_else(|| ProtocolError::new(ProtocolErrorKind::InvalidStatusHeader).into())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_request_serialize() {
        let mut fields = HeaderMap::new();
        fields.insert("Host", "example.com");
        fields.insert("Content-Length", "5");

        let message = Message::request("GET", "/hello", fields, b"hello".to_vec());

        let mut buf = Vec::new();
        message.serialize(&mut buf).unwrap();

        assert_eq!(
            buf,
            b"GET /hello HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn test_response_serialize_reason_with_spaces() {
        let message = Message::response(404, "Not Found", HeaderMap::new(), Vec::new());

        let mut buf = Vec::new();
        message.serialize(&mut buf).unwrap();

        assert_eq!(buf, b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn test_from_parts_requires_body_source() {
        let start_line = StartLine::Request(RequestLine {
            method: "GET".to_string(),
            target: "/".to_string(),
            http_version: HTTP_VERSION.to_string(),
        });

        let error =
            Message::<Empty>::from_parts(start_line, HeaderMap::new(), None, None).unwrap_err();

        assert_eq!(
            error.as_protocol().unwrap().kind(),
            ProtocolErrorKind::MissingRequiredFields
        );
    }

    #[test]
    fn test_from_parts_concrete_body_wins() {
        let start_line = StartLine::Request(RequestLine {
            method: "GET".to_string(),
            target: "/".to_string(),
            http_version: HTTP_VERSION.to_string(),
        });
        let parser = StreamParser::new(Cursor::new(Vec::new()));

        let message = Message::from_parts(
            start_line,
            HeaderMap::new(),
            Some(b"concrete".to_vec()),
            Some(parser),
        )
        .unwrap();

        assert_eq!(message.body().unwrap(), b"concrete");
    }

    #[test]
    fn test_receive_request() {
        let wire = b"POST /submit HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata".to_vec();
        let mut message = Message::receive_request(Cursor::new(wire), 8).unwrap();

        let request_line = message.start_line.as_request().unwrap();
        assert_eq!(request_line.method, "POST");
        assert_eq!(request_line.target, "/submit");
        assert_eq!(request_line.http_version, "HTTP/1.1");
        assert_eq!(message.fields.get("Content-Length"), Some("4"));

        let error = message.body().unwrap_err();
        assert_eq!(
            error.as_protocol().unwrap().kind(),
            ProtocolErrorKind::IncompleteBody
        );

        message.read_body(8).unwrap();
        assert_eq!(message.body().unwrap(), b"data");
    }

    #[test]
    fn test_receive_response() {
        let wire = b"HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\n\r\n".to_vec();
        let mut message = Message::receive_response(Cursor::new(wire), 16).unwrap();

        let status_line = message.start_line.as_status().unwrap();
        assert_eq!(status_line.http_version, "HTTP/1.1");
        assert_eq!(status_line.status_code, "301");
        assert_eq!(status_line.reason_phrase, "Moved Permanently");
        assert_eq!(message.fields.get("Location"), Some("/new"));

        message.read_body(16).unwrap();
        assert_eq!(message.body().unwrap(), b"");
    }

    #[test]
    fn test_read_body_on_materialized_message() {
        let error = Message::request("GET", "/", HeaderMap::new(), Vec::new())
            .read_body(16)
            .unwrap_err();

        assert_eq!(
            error.as_protocol().unwrap().kind(),
            ProtocolErrorKind::BodyAlreadyRead
        );
    }

    #[test]
    fn test_send_writes_once() {
        let message = Message::response(200, "OK", HeaderMap::new(), b"ok".to_vec());

        let mut transport = Vec::new();
        message.send(&mut transport).unwrap();

        assert_eq!(transport, b"HTTP/1.1 200 OK\r\n\r\nok");
    }

    #[test]
    fn test_send_rejects_malformed_start_line() {
        let message = Message::request("BAD METHOD", "/", HeaderMap::new(), Vec::new());

        let error = message.send(&mut Vec::new()).unwrap_err();

        assert_eq!(
            error.as_protocol().unwrap().kind(),
            ProtocolErrorKind::InvalidStatusHeader
        );
    }

    #[test]
    fn test_send_pending_unread_body() {
        let wire = b"GET / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc".to_vec();
        let message = Message::receive_request(Cursor::new(wire), 8).unwrap();

        let error = message.send(&mut Vec::new()).unwrap_err();

        assert_eq!(
            error.as_protocol().unwrap().kind(),
            ProtocolErrorKind::IncompleteBody
        );
    }
}
