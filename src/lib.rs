//! Incremental HTTP/1.1 message framing over blocking byte streams.
pub mod error;
pub mod fields;
pub mod message;
mod parse;
pub mod stream;
