//! Parsing utilities.
use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till1, take_until},
    combinator::{map, rest},
    sequence::separated_pair,
};

/// Line delimiter of the wire format.
pub(crate) const CRLF: &[u8] = b"\r\n";

/// Gets the index of the next CRLF in the data, if one is present.
pub fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}

/// Splits a start line into its three tokens.
///
/// The third token is the remainder of the line: it may be empty and may
/// contain further spaces (a response reason phrase is not re-split).
pub fn start_line(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8], &[u8])> {
    let parts = (token, tag(" "), token, tag(" "), rest);

    #[allow(clippy::type_complexity)]
    map(parts, |output: (&[u8], &[u8], &[u8], &[u8], &[u8])| {
        (output.0, output.2, output.4)
    })
    .parse(input)
}

/// Splits a header line on the first `": "` occurrence.
pub fn field_pair(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    separated_pair(take_until(": "), tag(": "), rest).parse(input)
}

fn token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_till1(|b| b == b' ')(input)
}

/// Parses a value into a `u64`.
///
/// Unlike [`str::parse()`], only ASCII digits are permitted. Signs and
/// unicode digits are rejected.
pub fn parse_u64_strict(value: &str) -> Result<u64, std::num::ParseIntError> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return "?".parse();
    }

    value.parse()
}

/// Shortens a line for use as error context.
pub(crate) fn snippet(line: &[u8]) -> String {
    line[0..line.len().min(16)].escape_ascii().to_string()
}
