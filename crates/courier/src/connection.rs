use std::time::Duration;

use log::debug;
use log::error;
use log::warn;
use resp::Command;
use resp::Decoder;
use resp::Encoder;
use resp::Reply;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::error::ClientError;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One bidirectional byte stream with its codec.
///
/// A connection is owned by exactly one dispatcher.
pub struct Connection {
	pub(crate) encoder: Encoder<BoxedWriter>,
	pub(crate) decoder: Decoder<BoxedReader>,
}

impl Connection {
	/// Connect over TCP using the address and socket options in `config`.
	pub async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
		let addr = config.addr();
		let stream = match config.connect_timeout_ms {
			Some(timeout_ms) => {
				tokio::time::timeout(Duration::from_millis(timeout_ms), connect(&addr))
					.await
					.map_err(|_| ClientError::ConnectTimeout {
						addr: addr.clone(),
						timeout_ms,
					})??
			}
			None => connect(&addr).await?,
		};

		if config.nodelay {
			stream.set_nodelay(true)?;
		}
		debug!("Connected to {}", addr);

		let (reader, writer) = stream.into_split();
		Ok(Self::from_parts(reader, writer, config.max_line_len))
	}

	/// Wrap any bidirectional stream.
	pub fn from_stream<S>(stream: S, max_line_len: usize) -> Self
	where
		S: AsyncRead + AsyncWrite + Send + 'static,
	{
		let (reader, writer) = tokio::io::split(stream);
		Self::from_parts(reader, writer, max_line_len)
	}

	/// Build a connection from separate read and write halves.
	pub fn from_parts<R, W>(reader: R, writer: W, max_line_len: usize) -> Self
	where
		R: AsyncRead + Send + Unpin + 'static,
		W: AsyncWrite + Send + Unpin + 'static,
	{
		Self {
			encoder: Encoder::new(Box::new(writer)),
			decoder: Decoder::with_max_line_len(Box::new(reader), max_line_len),
		}
	}

	/// True once a decode failure has made the read side unusable.
	pub fn is_poisoned(&self) -> bool {
		self.decoder.is_poisoned()
	}

	pub(crate) fn into_parts(self) -> (Encoder<BoxedWriter>, Decoder<BoxedReader>) {
		(self.encoder, self.decoder)
	}

	/// Send one command and read its reply.
	///
	/// A command that cannot be written gets an invalid reply and nothing is
	/// read for it.
	pub(crate) async fn round_trip(&mut self, cmd: &Command) -> Reply {
		if let Err(e) = self.encoder.encode(cmd).await {
			warn!("Failed to send '{}': {}", cmd.display_name(), e);
			return Reply::Invalid(e);
		}
		self.read_reply().await
	}

	pub(crate) async fn read_reply(&mut self) -> Reply {
		let already_poisoned = self.decoder.is_poisoned();
		match self.decoder.decode().await {
			Ok(reply) => reply,
			Err(e) => {
				if !already_poisoned {
					error!("Reply stream is unusable: {}", e);
				}
				Reply::Invalid(e)
			}
		}
	}
}

async fn connect(addr: &str) -> Result<TcpStream, ClientError> {
	let addrs = tokio::net::lookup_host(addr)
		.await
		.map_err(|_| ClientError::InvalidAddress(addr.to_string()))?;

	let mut last_err = None;
	for sock_addr in addrs {
		match TcpStream::connect(sock_addr).await {
			Ok(stream) => return Ok(stream),
			Err(e) => {
				debug!("Connect to {} failed: {}", sock_addr, e);
				last_err = Some(e);
			}
		}
	}

	Err(match last_err {
		Some(source) => ClientError::Connect {
			addr: addr.to_string(),
			source,
		},
		None => ClientError::InvalidAddress(addr.to_string()),
	})
}
