//! Async encoder and decoder bound to a byte stream.

use bytes::BytesMut;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::Command;
use crate::Reply;
use crate::encode::encode_command;
use crate::error::ParseError;
use crate::error::RespError;
use crate::parser::RespParseResult;
use crate::parser::RespParser;
use crate::utils::DEFAULT_MAX_LINE_LEN;

/// Writes commands to the write half of a connection.
///
/// A failed write is reported to the caller and leaves the encoder usable.
pub struct Encoder<W> {
	writer: W,
	buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> Encoder<W> {
	pub fn new(writer: W) -> Self {
		Self {
			writer,
			buf: BytesMut::with_capacity(256),
		}
	}

	/// Write one command and flush it.
	pub async fn encode(&mut self, cmd: &Command) -> Result<(), RespError> {
		self.write_command(cmd).await?;
		self.flush().await
	}

	/// Write one command without flushing.
	///
	/// The whole command goes out through a single `write_all`, so a failure
	/// belongs to exactly this command.
	pub async fn write_command(&mut self, cmd: &Command) -> Result<(), RespError> {
		if cmd.is_empty() {
			return Err(RespError::EmptyCommand);
		}
		self.buf.clear();
		encode_command(&mut self.buf, cmd.as_slice());
		self.writer.write_all(&self.buf).await?;
		Ok(())
	}

	pub async fn flush(&mut self) -> Result<(), RespError> {
		self.writer.flush().await?;
		Ok(())
	}

	/// Close the write half.
	pub async fn shutdown(&mut self) -> Result<(), RespError> {
		self.writer.shutdown().await?;
		Ok(())
	}

	pub fn get_ref(&self) -> &W {
		&self.writer
	}

	pub fn into_inner(self) -> W {
		self.writer
	}
}

/// Reads replies from the read half of a connection.
///
/// The first decode error poisons the decoder: the stream position can no
/// longer be trusted, so every later call returns that same error without
/// reading again.
pub struct Decoder<R> {
	reader: R,
	buf: BytesMut,
	parser: RespParser,
	poisoned: Option<RespError>,
}

impl<R: AsyncRead + Unpin> Decoder<R> {
	pub fn new(reader: R) -> Self {
		Self::with_max_line_len(reader, DEFAULT_MAX_LINE_LEN)
	}

	pub fn with_max_line_len(reader: R, max_line_len: usize) -> Self {
		Self {
			reader,
			buf: BytesMut::with_capacity(4096),
			parser: RespParser::with_max_line_len(max_line_len),
			poisoned: None,
		}
	}

	/// Decode exactly one reply, including every nested element.
	///
	/// Cancel safe: dropping the future keeps bytes already read, and the
	/// next call resumes from them.
	pub async fn decode(&mut self) -> Result<Reply, RespError> {
		if let Some(err) = &self.poisoned {
			return Err(err.clone());
		}

		match self.read_reply().await {
			Ok(reply) => Ok(reply),
			Err(err) => {
				self.poisoned = Some(err.clone());
				Err(err)
			}
		}
	}

	async fn read_reply(&mut self) -> Result<Reply, RespError> {
		loop {
			match self.parser.parse(&mut self.buf) {
				RespParseResult::Complete(reply) => return Ok(reply),
				RespParseResult::Error(e) => return Err(e.into()),
				RespParseResult::Incomplete => {}
			}

			let n = self.reader.read_buf(&mut self.buf).await?;
			if n == 0 {
				if self.buf.is_empty() && self.parser.is_idle() {
					return Err(RespError::ConnectionClosed);
				}
				return Err(ParseError::UnexpectedEOF.into());
			}
		}
	}

	pub fn is_poisoned(&self) -> bool {
		self.poisoned.is_some()
	}

	/// The error that poisoned this decoder, if any.
	pub fn poison_error(&self) -> Option<&RespError> {
		self.poisoned.as_ref()
	}

	pub fn get_ref(&self) -> &R {
		&self.reader
	}
}
