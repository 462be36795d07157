//! Utility functions and constants for RESP protocol.

use crate::error::ParseError;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Reply type markers
pub const STATUS: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK: u8 = b'$';
pub const MULTI_BULK: u8 = b'*';

/// Default capacity of the reply line buffer.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Largest bulk payload accepted, matching the server's `proto-max-bulk-len`.
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Deepest multi-bulk nesting accepted in one reply.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Find the position of CRLF in a byte slice
#[inline]
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
	memchr::memmem::find(buf, CRLF)
}

/// Peek a line from the buffer (without CRLF).
///
/// Returns the line and the number of bytes it occupies including the
/// terminator, or `None` if the terminator has not arrived yet.
#[inline]
pub fn peek_line(buf: &[u8]) -> Option<(&[u8], usize)> {
	find_crlf(buf).map(|pos| (&buf[..pos], pos + 2))
}

/// Parse a signed base-10 integer from a byte slice
#[inline]
pub fn parse_integer(buf: &[u8]) -> Result<i64, ParseError> {
	let s = std::str::from_utf8(buf)?;
	s.parse::<i64>()
		.map_err(|e| ParseError::InvalidInteger(format!("{:?}: {}", s, e)))
}
