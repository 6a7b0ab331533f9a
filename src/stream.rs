//! Incremental stream parsing
use std::io::Read;

use crate::{
    error::{GeneralError, ProtocolError, ProtocolErrorKind},
    fields::HeaderMap,
    parse,
};

const MAX_HEADER_LENGTH: usize = 32768;

/// Parsing progress of a [`StreamParser`].
///
/// Transitions are monotonic; a parser never returns to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    AwaitingStartLine,
    AwaitingHeaders,
    HeadersComplete,
    BodyPending,
    BodyComplete,
}

/// Outcome of pushing bytes into a [`StreamParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The bytes were absorbed; the header section is not yet terminated
    /// and the caller should read more data.
    Consumed(usize),
    /// The header section is already terminated; the call was a no-op and
    /// the caller should switch to body reading.
    HeadersComplete,
}

/// Incremental parser reconstructing one message from fragmented reads.
///
/// Bytes are accumulated in an internal buffer with a cursor marking the
/// first unconsumed byte, so arbitrarily-split reads never require
/// re-scanning consumed data. Each parser is tied to a single message on a
/// single connection direction; it is not reusable.
#[derive(Debug)]
pub struct StreamParser<R: Read> {
    transport: R,
    buffer: Vec<u8>,
    cursor: usize,
    state: ParseState,
    start_line: Option<[String; 3]>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl<R: Read> StreamParser<R> {
    /// Creates a new parser reading from the given transport.
    pub fn new(transport: R) -> Self {
        Self {
            transport,
            buffer: Vec::new(),
            cursor: 0,
            state: ParseState::AwaitingStartLine,
            start_line: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.transport
    }

    pub fn into_inner(self) -> R {
        self.transport
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Returns the three raw start-line tokens once parsed.
    pub fn start_line(&self) -> Option<&[String; 3]> {
        self.start_line.as_ref()
    }

    /// Returns the headers parsed so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body bytes.
    ///
    /// Fails with `IncompleteBody` until [`read_body`](Self::read_body) has
    /// run to completion.
    pub fn body(&self) -> Result<&[u8], GeneralError> {
        if self.state < ParseState::BodyComplete {
            return Err(ProtocolError::new(ProtocolErrorKind::IncompleteBody).into());
        }

        Ok(&self.body)
    }

    /// Pushes bytes into the parser and consumes any complete lines.
    ///
    /// Partial lines stay buffered across calls. Once the empty line
    /// terminating the header section has been consumed, further calls are
    /// no-ops returning [`Feed::HeadersComplete`].
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Feed, GeneralError> {
        if self.state >= ParseState::HeadersComplete {
            return Ok(Feed::HeadersComplete);
        }

        self.buffer.extend_from_slice(chunk);
        self.consume_lines()?;

        if self.state < ParseState::HeadersComplete {
            self.check_max_header_length()?;
        }

        Ok(Feed::Consumed(chunk.len()))
    }

    /// Reads from the transport and feeds the parser.
    ///
    /// A zero-length read while the header section is incomplete means the
    /// peer closed the connection and fails with `ConnectionClosed`.
    pub fn fill(&mut self, max_len: usize) -> Result<Feed, GeneralError> {
        if self.state >= ParseState::HeadersComplete {
            return Ok(Feed::HeadersComplete);
        }

        let mut chunk = vec![0; max_len];
        let read_len = self.transport.read(&mut chunk)?;

        if read_len == 0 {
            return Err(ProtocolError::new(ProtocolErrorKind::ConnectionClosed).into());
        }

        tracing::trace!(read_len, buf_len = self.buffer.len(), "fill");

        self.feed(&chunk[0..read_len])
    }

    /// Reads the message body from the transport until `Content-Length`
    /// bytes (counting bytes staged during header parsing) are collected.
    ///
    /// An absent or non-numeric `Content-Length` means no body: the state
    /// becomes `BodyComplete` immediately and no read is performed. Valid
    /// only once per parser; a second call fails with `BodyAlreadyRead`
    /// regardless of the first call's outcome.
    ///
    /// Returns the number of bytes read from the transport by this call.
    pub fn read_body(&mut self, max_chunk: usize) -> Result<u64, GeneralError> {
        let target = self.begin_body()?;
        let mut read_total: u64 = 0;
        let mut buf: Vec<u8> = Vec::new();

        loop {
            let remaining = target - self.body.len() as u64;

            if remaining == 0 {
                break;
            }

            let buf_len = remaining.min(max_chunk as u64) as usize;
            buf.resize(buf_len, 0);
            let read_len = self.read_body_chunk(&mut buf)?;
            self.body.extend_from_slice(&buf[0..read_len]);
            read_total += read_len as u64;

            tracing::trace!(read_len, remaining, "read body");
        }

        self.state = ParseState::BodyComplete;

        Ok(read_total)
    }

    /// Drains the message body without retaining it.
    ///
    /// Same target length, one-shot guard, and closed-connection handling
    /// as [`read_body`](Self::read_body). Used to leave the transport at a
    /// clean message boundary when the body content is irrelevant.
    pub fn discard_body(&mut self, max_chunk: usize) -> Result<(), GeneralError> {
        let target = self.begin_body()?;
        let mut remaining = target - (self.body.len() as u64).min(target);
        let mut buf: Vec<u8> = Vec::new();

        self.body.clear();

        while remaining > 0 {
            let buf_len = remaining.min(max_chunk as u64) as usize;
            buf.resize(buf_len, 0);
            let read_len = self.read_body_chunk(&mut buf)?;
            remaining -= read_len as u64;

            tracing::trace!(read_len, remaining, "discard body");
        }

        self.state = ParseState::BodyComplete;

        Ok(())
    }

    /// Guards the one-shot body read and resolves the target length.
    fn begin_body(&mut self) -> Result<u64, GeneralError> {
        if self.state >= ParseState::BodyPending {
            return Err(ProtocolError::new(ProtocolErrorKind::BodyAlreadyRead).into());
        }

        let target = match self.headers.get_u64_strict("Content-Length") {
            Some(Ok(length)) => length,
            _ => 0,
        };

        // Header parsing may have staged bytes past the target already.
        self.body.truncate(target as usize);
        self.state = ParseState::BodyPending;

        tracing::trace!(target, staged = self.body.len(), "begin body");

        Ok(target)
    }

    fn read_body_chunk(&mut self, buf: &mut [u8]) -> Result<usize, GeneralError> {
        let read_len = self.transport.read(buf)?;

        if read_len == 0 {
            return Err(ProtocolError::new(ProtocolErrorKind::ConnectionClosed).into());
        }

        Ok(read_len)
    }

    fn consume_lines(&mut self) -> Result<(), GeneralError> {
        while let Some(index) = parse::find_crlf(&self.buffer[self.cursor..]) {
            let line_range = self.cursor..self.cursor + index;
            self.cursor += index + parse::CRLF.len();

            if self.start_line.is_none() {
                let line = self.buffer[line_range].to_vec();
                self.parse_start_line(&line)?;
                self.state = ParseState::AwaitingHeaders;
            } else if !line_range.is_empty() {
                let line = self.buffer[line_range].to_vec();
                self.parse_field_line(&line)?;
            } else {
                self.finish_headers();
                break;
            }
        }

        Ok(())
    }

    /// Terminates the header section and stages any buffered overrun bytes
    /// as the beginning of the body.
    fn finish_headers(&mut self) {
        self.state = ParseState::HeadersComplete;
        self.body.extend_from_slice(&self.buffer[self.cursor..]);
        self.buffer.clear();
        self.cursor = 0;

        tracing::trace!(staged = self.body.len(), "headers complete");
    }

    fn parse_start_line(&mut self, line: &[u8]) -> Result<(), GeneralError> {
        let (_remain, (first, second, third)) = parse::start_line(line).map_err(|_error| {
            ProtocolError::new(ProtocolErrorKind::InvalidStatusHeader)
                .with_snippet(parse::snippet(line))
        })?;

        self.start_line = Some([
            decode_utf8(first, ProtocolErrorKind::InvalidStatusHeader)?,
            decode_utf8(second, ProtocolErrorKind::InvalidStatusHeader)?,
            decode_utf8(third, ProtocolErrorKind::InvalidStatusHeader)?,
        ]);

        Ok(())
    }

    fn parse_field_line(&mut self, line: &[u8]) -> Result<(), GeneralError> {
        let (_remain, (name, value)) = parse::field_pair(line).map_err(|_error| {
            ProtocolError::new(ProtocolErrorKind::InvalidHeader).with_snippet(parse::snippet(line))
        })?;

        let name = decode_utf8(name, ProtocolErrorKind::InvalidHeader)?;
        let value = decode_utf8(value, ProtocolErrorKind::InvalidHeader)?;
        self.headers.insert(name, value);

        Ok(())
    }

    fn check_max_header_length(&self) -> Result<(), GeneralError> {
        if self.buffer.len() - self.cursor > MAX_HEADER_LENGTH {
            Err(ProtocolError::new(ProtocolErrorKind::HeaderTooBig).into())
        } else {
            Ok(())
        }
    }
}

fn decode_utf8(bytes: &[u8], kind: ProtocolErrorKind) -> Result<String, ProtocolError> {
    String::from_utf8(bytes.to_vec()).map_err(|error| {
        ProtocolError::new(kind)
            .with_snippet(parse::snippet(bytes))
            .with_source(error)
    })
}
