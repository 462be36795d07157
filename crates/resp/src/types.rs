//! The reply model.

use std::fmt;

use bytes::Bytes;

use crate::error::RespError;

/// A reply decoded from the server, or the failure that replaced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
	/// Status reply: `+OK\r\n`
	Status(Bytes),

	/// Server error: `-ERR message\r\n`
	Error(Bytes),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Bulk string: `$6\r\nfoobar\r\n`
	Bulk(Bytes),

	/// Null bulk `$-1\r\n` or null multi-bulk `*-1\r\n`
	Nil,

	/// Multi-bulk: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
	MultiBulk(Vec<Reply>),

	/// Encoding, decoding or the transport failed. Never produced by the
	/// decoder itself.
	Invalid(RespError),
}

impl Reply {
	/// Check if the server answered with an error
	pub fn is_error(&self) -> bool {
		matches!(self, Reply::Error(_))
	}

	/// Check if the value is nil
	pub fn is_nil(&self) -> bool {
		matches!(self, Reply::Nil)
	}

	/// Check if this reply stands in for a failure
	pub fn is_invalid(&self) -> bool {
		matches!(self, Reply::Invalid(_))
	}

	/// The failure behind an invalid reply
	pub fn as_invalid(&self) -> Option<&RespError> {
		match self {
			Reply::Invalid(e) => Some(e),
			_ => None,
		}
	}

	/// Try to convert to a string slice
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Reply::Status(s) | Reply::Error(s) | Reply::Bulk(s) => std::str::from_utf8(s).ok(),
			_ => None,
		}
	}

	/// Try to convert to bytes
	pub fn as_bytes(&self) -> Option<&Bytes> {
		match self {
			Reply::Status(b) | Reply::Bulk(b) => Some(b),
			_ => None,
		}
	}

	/// Try to convert to integer
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Reply::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// Try to convert to the elements of a multi-bulk
	pub fn as_array(&self) -> Option<&[Reply]> {
		match self {
			Reply::MultiBulk(a) => Some(a),
			_ => None,
		}
	}

	/// Convert to String with lossy UTF-8 conversion
	pub fn to_string_lossy(&self) -> Option<String> {
		match self {
			Reply::Status(s) | Reply::Error(s) | Reply::Bulk(s) => {
				Some(String::from_utf8_lossy(s).into_owned())
			}
			_ => None,
		}
	}

	/// Try to consume and convert to Vec<Reply>
	pub fn into_vec(self) -> Option<Vec<Reply>> {
		match self {
			Reply::MultiBulk(a) => Some(a),
			_ => None,
		}
	}

	/// Turn an invalid reply into an `Err`, leaving everything else as `Ok`.
	pub fn into_result(self) -> Result<Reply, RespError> {
		match self {
			Reply::Invalid(e) => Err(e),
			reply => Ok(reply),
		}
	}

	// Convenience constructors

	/// Create a status value
	pub fn status(s: impl Into<Bytes>) -> Self {
		Reply::Status(s.into())
	}

	/// Create an error value
	pub fn error(e: impl Into<Bytes>) -> Self {
		Reply::Error(e.into())
	}

	/// Create a bulk value
	pub fn bulk(s: impl Into<Bytes>) -> Self {
		Reply::Bulk(s.into())
	}

	/// Create an integer value
	pub fn integer(i: i64) -> Self {
		Reply::Integer(i)
	}

	/// Create a multi-bulk value from an iterator
	pub fn multi_bulk(items: impl IntoIterator<Item = Reply>) -> Self {
		Reply::MultiBulk(items.into_iter().collect())
	}

	/// Create a nil value
	pub fn nil() -> Self {
		Reply::Nil
	}

	fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
		match self {
			Reply::Status(s) => write!(f, "{}", String::from_utf8_lossy(s)),
			Reply::Error(e) => write!(f, "(error) {}", String::from_utf8_lossy(e)),
			Reply::Integer(i) => write!(f, "(integer) {}", i),
			Reply::Bulk(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
			Reply::Nil => write!(f, "(nil)"),
			Reply::MultiBulk(items) if items.is_empty() => write!(f, "(empty array)"),
			Reply::MultiBulk(items) => {
				let width = items.len().to_string().len();
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						writeln!(f)?;
						write!(f, "{:indent$}", "", indent = depth)?;
					}
					write!(f, "{:>width$}) ", i + 1, width = width)?;
					item.fmt_indented(f, depth + width + 2)?;
				}
				Ok(())
			}
			Reply::Invalid(e) => write!(f, "(invalid) {}", e),
		}
	}
}

/// Renders replies the way `redis-cli` prints them.
impl fmt::Display for Reply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.fmt_indented(f, 0)
	}
}

impl From<RespError> for Reply {
	fn from(e: RespError) -> Self {
		Reply::Invalid(e)
	}
}

impl From<Result<Reply, RespError>> for Reply {
	fn from(result: Result<Reply, RespError>) -> Self {
		result.unwrap_or_else(Reply::Invalid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ParseError;

	#[test]
	fn test_is_error() {
		let err = Reply::Error(Bytes::from("ERR"));
		assert!(err.is_error());

		let ok = Reply::Status(Bytes::from("OK"));
		assert!(!ok.is_error());
		assert!(!Reply::Invalid(RespError::Canceled).is_error());
	}

	#[test]
	fn test_as_str() {
		let val = Reply::Status(Bytes::from("hello"));
		assert_eq!(val.as_str(), Some("hello"));

		let num = Reply::Integer(42);
		assert_eq!(num.as_str(), None);
	}

	#[test]
	fn test_convenience_constructors() {
		let s = Reply::status("OK");
		assert_eq!(s.as_str(), Some("OK"));

		let b = Reply::bulk("hello");
		assert_eq!(b.as_bytes(), Some(&Bytes::from("hello")));

		let e = Reply::error("ERR");
		assert!(e.is_error());

		let i = Reply::integer(42);
		assert_eq!(i.as_integer(), Some(42));

		let arr = Reply::multi_bulk(vec![Reply::integer(1), Reply::integer(2)]);
		assert_eq!(arr.as_array().map(|a| a.len()), Some(2));

		assert!(Reply::nil().is_nil());
	}

	#[test]
	fn test_into_result() {
		let invalid = Reply::Invalid(ParseError::UnexpectedEOF.into());
		assert_eq!(
			invalid.into_result(),
			Err(RespError::Parse(ParseError::UnexpectedEOF))
		);
		assert_eq!(Reply::integer(1).into_result(), Ok(Reply::Integer(1)));
	}

	#[test]
	fn test_from_result() {
		let reply: Reply = Err::<Reply, _>(RespError::ConnectionClosed).into();
		assert_eq!(reply.as_invalid(), Some(&RespError::ConnectionClosed));
	}

	#[test]
	fn test_display_scalars() {
		assert_eq!(Reply::status("OK").to_string(), "OK");
		assert_eq!(Reply::error("ERR no").to_string(), "(error) ERR no");
		assert_eq!(Reply::integer(-3).to_string(), "(integer) -3");
		assert_eq!(Reply::bulk("v").to_string(), "\"v\"");
		assert_eq!(Reply::Nil.to_string(), "(nil)");
		assert_eq!(Reply::multi_bulk(vec![]).to_string(), "(empty array)");
	}

	#[test]
	fn test_display_nested() {
		let reply = Reply::multi_bulk(vec![
			Reply::bulk("a"),
			Reply::multi_bulk(vec![Reply::integer(1), Reply::Nil]),
		]);
		assert_eq!(
			reply.to_string(),
			"1) \"a\"\n2) 1) (integer) 1\n   2) (nil)"
		);
	}
}
