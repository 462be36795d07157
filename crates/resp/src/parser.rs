//! Streaming RESP reply parser.

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;

use crate::error::ParseError;
use crate::types::Reply;
use crate::utils::*;

/// Result of a parsing attempt.
#[derive(Debug)]
pub enum RespParseResult {
	/// A complete reply was parsed.
	Complete(Reply),
	/// The buffer does not contain enough data to parse a complete reply.
	Incomplete,
	/// An error occurred during parsing.
	Error(ParseError),
}

/// A stateful RESP parser that supports streaming.
///
/// Multi-bulk replies are assembled on an explicit frame stack, so a reply
/// split across many reads is resumed where it stopped instead of being
/// re-parsed from its first byte.
pub struct RespParser {
	frames: Vec<Frame>,
	max_line_len: usize,
}

#[derive(Debug)]
enum Frame {
	Root,
	MultiBulk {
		expected: usize,
		elements: Vec<Reply>,
	},
}

impl Default for RespParser {
	fn default() -> Self {
		Self::new()
	}
}

// Helper enum for parse_step
enum ParsedItem {
	Value(Reply),
	FramePushed,
}

impl RespParser {
	pub fn new() -> Self {
		Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
	}

	/// Create a parser whose line buffer holds at most `max_line_len` bytes.
	pub fn with_max_line_len(max_line_len: usize) -> Self {
		Self {
			frames: Vec::new(),
			max_line_len,
		}
	}

	pub fn max_line_len(&self) -> usize {
		self.max_line_len
	}

	/// True when no partially assembled reply is pending.
	pub fn is_idle(&self) -> bool {
		self.frames.len() <= 1
	}

	/// Parse a reply from a mutable BytesMut buffer.
	///
	/// If successful, consumes the parsed bytes and returns
	/// `RespParseResult::Complete(reply)`. If incomplete, returns
	/// `RespParseResult::Incomplete` and keeps any nested progress. If an
	/// error occurs, returns `RespParseResult::Error(error)`.
	pub fn parse(&mut self, buf: &mut BytesMut) -> RespParseResult {
		if self.frames.is_empty() {
			self.frames.push(Frame::Root);
		}

		loop {
			match self.parse_step(buf) {
				Ok(Some(ParsedItem::FramePushed)) => continue,
				Ok(Some(ParsedItem::Value(val))) => match self.handle_parsed_value(val) {
					Ok(Some(final_value)) => return RespParseResult::Complete(final_value),
					Ok(None) => continue,
					Err(e) => return RespParseResult::Error(e),
				},
				Ok(None) => return RespParseResult::Incomplete,
				Err(e) => return RespParseResult::Error(e),
			}
		}
	}

	// Injects a finished value into the top frame, folding every multi-bulk
	// it completes into the frame below. Returns the root value once it is
	// complete.
	fn handle_parsed_value(&mut self, mut value: Reply) -> Result<Option<Reply>, ParseError> {
		loop {
			let frame = self
				.frames
				.last_mut()
				.ok_or_else(|| ParseError::InvalidFormat("Internal stack error".into()))?;

			match frame {
				Frame::Root => {
					// `parse` pushes a fresh root for the next reply.
					self.frames.pop();
					return Ok(Some(value));
				}
				Frame::MultiBulk { expected, elements } => {
					elements.push(value);
					*expected -= 1;
					if *expected > 0 {
						return Ok(None);
					}
					let items = std::mem::take(elements);
					self.frames.pop();
					value = Reply::MultiBulk(items);
				}
			}
		}
	}

	/// Tries to parse the next token.
	/// If it's a scalar, returns `Ok(Some(ParsedItem::Value(v)))`.
	/// If it's a multi-bulk header, pushes a frame and returns
	/// `Ok(Some(ParsedItem::FramePushed))`. If incomplete, returns `Ok(None)`.
	fn parse_step(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		if buf.is_empty() {
			return Ok(None);
		}

		match buf[0] {
			STATUS => self.parse_status(buf),
			ERROR => self.parse_error(buf),
			INTEGER => self.parse_integer(buf),
			BULK => self.parse_bulk(buf),
			MULTI_BULK => self.start_multi_bulk(buf),
			other => Err(ParseError::InvalidTypeMarker(other as char)),
		}
	}

	/// Peek the line after the type marker, enforcing the line capacity
	/// whether or not the terminator has arrived.
	fn peek_payload<'a>(&self, buf: &'a [u8]) -> Result<Option<(&'a [u8], usize)>, ParseError> {
		match peek_line(&buf[1..]) {
			Some((line, _)) if line.len() + 1 > self.max_line_len => {
				Err(ParseError::LineTooLong(self.max_line_len))
			}
			Some(found) => Ok(Some(found)),
			None if buf.len() > self.max_line_len + 1 => {
				Err(ParseError::LineTooLong(self.max_line_len))
			}
			None => Ok(None),
		}
	}

	fn parse_status(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		if let Some((line, total_len)) = self.peek_payload(buf)? {
			let value = Bytes::copy_from_slice(line);
			buf.advance(1 + total_len);
			Ok(Some(ParsedItem::Value(Reply::Status(value))))
		} else {
			Ok(None)
		}
	}

	fn parse_error(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		if let Some((line, total_len)) = self.peek_payload(buf)? {
			let value = Bytes::copy_from_slice(line);
			buf.advance(1 + total_len);
			Ok(Some(ParsedItem::Value(Reply::Error(value))))
		} else {
			Ok(None)
		}
	}

	fn parse_integer(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		if let Some((line, total_len)) = self.peek_payload(buf)? {
			let num = crate::utils::parse_integer(line)?;
			buf.advance(1 + total_len);
			Ok(Some(ParsedItem::Value(Reply::Integer(num))))
		} else {
			Ok(None)
		}
	}

	fn parse_bulk(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		// $6\r\nfoobar\r\n
		if let Some((line, len_consumed)) = self.peek_payload(buf)? {
			let length = crate::utils::parse_integer(line)?;

			// Any negative length is the null bulk.
			if length < 0 {
				buf.advance(1 + len_consumed);
				return Ok(Some(ParsedItem::Value(Reply::Nil)));
			}
			if length > MAX_BULK_LEN {
				return Err(ParseError::InvalidBulkLength(length));
			}

			let length = length as usize;
			let total_needed = 1 + len_consumed + length + 2; // +2 for CRLF

			if buf.len() < total_needed {
				buf.reserve(total_needed - buf.len());
				return Ok(None);
			}

			buf.advance(1 + len_consumed);
			let data = buf.split_to(length).freeze();
			if &buf[0..2] != CRLF {
				return Err(ParseError::InvalidFormat(
					"Missing CRLF after bulk data".to_string(),
				));
			}
			buf.advance(2);

			Ok(Some(ParsedItem::Value(Reply::Bulk(data))))
		} else {
			Ok(None)
		}
	}

	fn start_multi_bulk(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedItem>, ParseError> {
		if let Some((line, total_len)) = self.peek_payload(buf)? {
			let length = crate::utils::parse_integer(line)?;

			if length == -1 {
				buf.advance(1 + total_len);
				return Ok(Some(ParsedItem::Value(Reply::Nil)));
			}
			if length < -1 {
				return Err(ParseError::InvalidMultiBulkLength(length));
			}
			buf.advance(1 + total_len);

			let length = length as usize;
			if length == 0 {
				return Ok(Some(ParsedItem::Value(Reply::MultiBulk(Vec::new()))));
			}

			// Every frame above the root is an open multi-bulk.
			if self.frames.len() > MAX_NESTING_DEPTH {
				return Err(ParseError::NestingTooDeep(MAX_NESTING_DEPTH));
			}

			// The count is untrusted; grow the vector as elements arrive.
			self.frames.push(Frame::MultiBulk {
				expected: length,
				elements: Vec::with_capacity(length.min(1024)),
			});
			Ok(Some(ParsedItem::FramePushed))
		} else {
			Ok(None)
		}
	}
}

/// Convenience function for one-off parsing of a complete buffer.
/// If streaming is needed, use `RespParser` directly.
pub fn parse(buf: &mut BytesMut) -> Result<Reply, ParseError> {
	let mut parser = RespParser::new();
	match parser.parse(buf) {
		RespParseResult::Complete(val) => Ok(val),
		RespParseResult::Incomplete => Err(ParseError::UnexpectedEOF),
		RespParseResult::Error(e) => Err(e),
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn test_parse_status() {
		let mut buf = BytesMut::from(&b"+OK\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Reply::Status(Bytes::from("OK")));
		assert!(buf.is_empty());
	}

	#[test]
	fn test_parse_error() {
		let mut buf = BytesMut::from(&b"-ERR unknown command\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Reply::Error(Bytes::from("ERR unknown command")));
	}

	#[test]
	fn test_parse_integer() {
		let mut buf = BytesMut::from(&b":1000\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Reply::Integer(1000));
	}

	#[test]
	fn test_parse_bulk() {
		let mut buf = BytesMut::from(&b"$6\r\nfoobar\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Reply::Bulk(Bytes::from("foobar")));
	}

	#[test]
	fn test_parse_bulk_with_crlf_inside() {
		let mut buf = BytesMut::from(&b"$4\r\na\r\nb\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Reply::Bulk(Bytes::from("a\r\nb")));
	}

	#[test]
	fn test_parse_multi_bulk() {
		let mut buf = BytesMut::from(&b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(
			value,
			Reply::MultiBulk(vec![
				Reply::Bulk(Bytes::from("foo")),
				Reply::Bulk(Bytes::from("bar")),
			])
		);
	}

	#[test]
	fn test_parse_nested_multi_bulk() {
		let mut buf = BytesMut::from(&b"*2\r\n*2\r\n:1\r\n:2\r\n*1\r\n+x\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(
			value,
			Reply::MultiBulk(vec![
				Reply::MultiBulk(vec![Reply::Integer(1), Reply::Integer(2)]),
				Reply::MultiBulk(vec![Reply::Status(Bytes::from("x"))]),
			])
		);
	}

	fn nested(depth: usize) -> BytesMut {
		let mut buf = BytesMut::from("*1\r\n".repeat(depth).as_bytes());
		buf.extend_from_slice(b":1\r\n");
		buf
	}

	#[test]
	fn test_parse_nesting_at_limit() {
		let mut buf = nested(MAX_NESTING_DEPTH);
		let mut value = parse(&mut buf).unwrap();
		let mut depth = 0;
		while let Reply::MultiBulk(mut items) = value {
			assert_eq!(items.len(), 1);
			value = items.pop().unwrap();
			depth += 1;
		}
		assert_eq!(depth, MAX_NESTING_DEPTH);
		assert_eq!(value, Reply::Integer(1));
	}

	#[test]
	fn test_parse_nesting_too_deep() {
		let mut buf = nested(MAX_NESTING_DEPTH + 1);
		assert_eq!(
			parse(&mut buf),
			Err(ParseError::NestingTooDeep(MAX_NESTING_DEPTH))
		);
	}

	#[rstest]
	#[case(b"$-1\r\n", Reply::Nil)]
	#[case(b"$-2\r\n", Reply::Nil)]
	#[case(b"*-1\r\n", Reply::Nil)]
	#[case(b"*0\r\n", Reply::MultiBulk(vec![]))]
	#[case(b"$0\r\n\r\n", Reply::Bulk(Bytes::new()))]
	#[case(b"*2\r\n$-1\r\n:7\r\n", Reply::MultiBulk(vec![Reply::Nil, Reply::Integer(7)]))]
	fn test_parse_nil_and_empty(#[case] input: &[u8], #[case] expected: Reply) {
		let mut buf = BytesMut::from(input);
		assert_eq!(parse(&mut buf).unwrap(), expected);
	}

	#[rstest]
	#[case(b"?what\r\n", ParseError::InvalidTypeMarker('?'))]
	#[case(b"\r\n", ParseError::InvalidTypeMarker('\r'))]
	#[case(b"$536870913\r\n", ParseError::InvalidBulkLength(536870913))]
	#[case(b"*-5\r\n", ParseError::InvalidMultiBulkLength(-5))]
	#[case(b"$3\r\nfoobar\r\n", ParseError::InvalidFormat("Missing CRLF after bulk data".into()))]
	fn test_parse_invalid(#[case] input: &[u8], #[case] expected: ParseError) {
		let mut buf = BytesMut::from(input);
		assert_eq!(parse(&mut buf), Err(expected));
	}

	#[rstest]
	#[case(b":12x\r\n")]
	#[case(b"$abc\r\nabc\r\n")]
	#[case(b"*two\r\n")]
	fn test_parse_invalid_integer(#[case] input: &[u8]) {
		let mut buf = BytesMut::from(input);
		assert!(matches!(
			parse(&mut buf),
			Err(ParseError::InvalidInteger(_))
		));
	}

	#[test]
	fn test_parse_line_too_long_without_terminator() {
		let mut parser = RespParser::with_max_line_len(8);
		let mut buf = BytesMut::from(&b"+0123456789"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Error(ParseError::LineTooLong(8))
		));
	}

	#[test]
	fn test_parse_line_too_long_with_terminator() {
		let mut parser = RespParser::with_max_line_len(8);
		let mut buf = BytesMut::from(&b"-0123456789\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Error(ParseError::LineTooLong(8))
		));
	}

	#[test]
	fn test_line_limit_ignores_bulk_payload() {
		let mut parser = RespParser::with_max_line_len(8);
		let mut buf = BytesMut::from(&b"$20\r\n01234567890123456789\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Complete(Reply::Bulk(_))
		));
	}

	#[test]
	fn test_parse_incomplete_keeps_buffer() {
		let mut parser = RespParser::new();
		let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
		assert!(matches!(parser.parse(&mut buf), RespParseResult::Incomplete));
		assert_eq!(&buf[..], b"$5\r\nhel");

		buf.extend_from_slice(b"lo\r\n");
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Complete(Reply::Bulk(b)) if b == "hello"
		));
		assert!(parser.is_idle());
	}

	#[test]
	fn test_parse_consecutive_replies() {
		let mut parser = RespParser::new();
		let mut buf = BytesMut::from(&b"+OK\r\n:1\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Complete(Reply::Status(_))
		));
		assert!(matches!(
			parser.parse(&mut buf),
			RespParseResult::Complete(Reply::Integer(1))
		));
		assert!(matches!(parser.parse(&mut buf), RespParseResult::Incomplete));
	}
}
