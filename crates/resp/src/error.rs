//! Error types for RESP decoding, encoding and transport failures.

use std::io;

use thiserror::Error;

/// Errors carried by a [`Reply::Invalid`](crate::Reply::Invalid) and returned
/// by the async [`Encoder`](crate::Encoder) / [`Decoder`](crate::Decoder).
///
/// The type is `Clone` so a poisoned decoder can hand out the same error on
/// every call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RespError {
	/// The reply stream could not be decoded.
	#[error("Parse error: {0}")]
	Parse(#[from] ParseError),

	/// Reading from or writing to the transport failed.
	#[error("I/O error: {message}")]
	Io { kind: io::ErrorKind, message: String },

	/// The server closed the connection between replies.
	#[error("Connection closed by peer")]
	ConnectionClosed,

	/// The command has no name or arguments, so no server would answer it.
	#[error("Command has no arguments")]
	EmptyCommand,

	/// The command was dropped before a reply could be delivered.
	#[error("Command canceled before a reply was received")]
	Canceled,
}

impl From<io::Error> for RespError {
	fn from(e: io::Error) -> Self {
		RespError::Io {
			kind: e.kind(),
			message: e.to_string(),
		}
	}
}

impl RespError {
	/// True for failures that leave the reply stream unsynchronized.
	pub fn is_protocol(&self) -> bool {
		matches!(self, RespError::Parse(_))
	}
}

/// Errors that can occur during RESP parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
	/// Unexpected end of input while parsing
	#[error("Unexpected end of input")]
	UnexpectedEOF,

	/// Invalid type marker encountered
	#[error("Invalid reply type marker: {0:?}")]
	InvalidTypeMarker(char),

	/// Invalid format for the current type
	#[error("Invalid format: {0}")]
	InvalidFormat(String),

	/// Invalid integer value
	#[error("Invalid integer: {0}")]
	InvalidInteger(String),

	/// Invalid bulk length
	#[error("Invalid bulk length: {0}")]
	InvalidBulkLength(i64),

	/// Invalid multi-bulk element count
	#[error("Invalid multi-bulk count: {0}")]
	InvalidMultiBulkLength(i64),

	/// A reply line did not fit in the line buffer
	#[error("Reply line exceeds {0} bytes")]
	LineTooLong(usize),

	/// Multi-bulk replies nested deeper than the parser accepts
	#[error("Multi-bulk nesting exceeds {0} levels")]
	NestingTooDeep(usize),

	/// UTF-8 conversion error
	#[error("UTF-8 error: {0}")]
	Utf8Error(String),
}

impl From<std::str::Utf8Error> for ParseError {
	fn from(e: std::str::Utf8Error) -> Self {
		ParseError::Utf8Error(e.to_string())
	}
}

impl From<std::num::ParseIntError> for ParseError {
	fn from(e: std::num::ParseIntError) -> Self {
		ParseError::InvalidInteger(e.to_string())
	}
}

/// Errors that can occur while encoding a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
	/// The value has no wire representation
	#[error("Invalid value: {0}")]
	InvalidValue(String),
}
