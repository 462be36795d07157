use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::Command;
use crate::Reply;
use crate::error::EncodeError;
use crate::utils::*;

/// Trait for encoding values into RESP wire form.
pub trait RespEncoder {
	fn encode_to(&self, buf: &mut BytesMut) -> Result<(), EncodeError>;

	fn encode(&self) -> Result<Bytes, EncodeError> {
		let mut buf = BytesMut::new();
		self.encode_to(&mut buf)?;
		Ok(buf.freeze())
	}
}

/// Requests always go out as a multi-bulk of bulk strings.
impl RespEncoder for Command {
	fn encode_to(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
		if self.is_empty() {
			return Err(EncodeError::InvalidValue("command has no arguments".into()));
		}
		encode_command(buf, self.as_slice());
		Ok(())
	}
}

/// Reply encoding, used by tooling and fake servers.
impl RespEncoder for Reply {
	fn encode_to(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
		match self {
			Reply::Status(s) => encode_line(buf, STATUS, s)?,
			Reply::Error(e) => encode_line(buf, ERROR, e)?,
			Reply::Integer(i) => encode_integer(buf, *i),
			Reply::Bulk(s) => encode_bulk(buf, s),
			Reply::Nil => buf.put_slice(b"$-1\r\n"),
			Reply::MultiBulk(items) => {
				encode_length(buf, MULTI_BULK, items.len());
				for item in items {
					item.encode_to(buf)?;
				}
			}
			Reply::Invalid(e) => {
				return Err(EncodeError::InvalidValue(format!(
					"invalid reply has no wire form: {}",
					e
				)));
			}
		}
		Ok(())
	}
}

/// Encode `*<N>\r\n` followed by `$<len>\r\n<bytes>\r\n` per argument.
pub fn encode_command(buf: &mut BytesMut, args: &[Bytes]) {
	let payload: usize = args.iter().map(|a| a.len() + 16).sum();
	buf.reserve(payload + 16);
	encode_length(buf, MULTI_BULK, args.len());
	for arg in args {
		encode_bulk(buf, arg);
	}
}

// Simple strings end at the first CRLF, so the text may hold neither byte.
#[inline]
fn encode_line(buf: &mut BytesMut, marker: u8, s: &Bytes) -> Result<(), EncodeError> {
	if memchr::memchr2(b'\r', b'\n', s).is_some() {
		return Err(EncodeError::InvalidValue(format!(
			"line reply contains CR or LF: {:?}",
			String::from_utf8_lossy(s)
		)));
	}
	buf.put_u8(marker);
	buf.put_slice(s);
	buf.put_slice(CRLF);
	Ok(())
}

#[inline]
fn encode_integer(buf: &mut BytesMut, i: i64) {
	buf.put_u8(INTEGER);
	buf.put_slice(i.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_length(buf: &mut BytesMut, marker: u8, length: usize) {
	buf.put_u8(marker);
	buf.put_slice(length.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_bulk(buf: &mut BytesMut, s: &Bytes) {
	encode_length(buf, BULK, s.len());
	buf.put_slice(s);
	buf.put_slice(CRLF);
}
