//! Scripted in-memory server and I/O wrappers shared by the dispatcher tests.
#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;

use bytes::BytesMut;
use courier::Connection;
use resp::Reply;
use resp::RespEncoder;
use resp::RespParseResult;
use resp::RespParser;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;

pub const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Every command the fake server has received, in arrival order.
pub type Received = Arc<Mutex<Vec<Vec<String>>>>;

/// Serve RESP requests on `stream`, answering each with the raw bytes
/// `handler` returns for it.
pub fn spawn_server<F>(mut stream: DuplexStream, handler: F) -> Received
where
	F: Fn(&[String]) -> Vec<u8> + Send + 'static,
{
	let received: Received = Arc::new(Mutex::new(Vec::new()));
	let log = received.clone();

	tokio::spawn(async move {
		let mut parser = RespParser::new();
		let mut buf = BytesMut::with_capacity(4096);
		loop {
			loop {
				match parser.parse(&mut buf) {
					RespParseResult::Complete(request) => {
						let args: Vec<String> = request
							.into_vec()
							.unwrap_or_default()
							.iter()
							.filter_map(|arg| arg.to_string_lossy())
							.collect();
						let response = handler(&args);
						log.lock().unwrap().push(args);
						if stream.write_all(&response).await.is_err() {
							return;
						}
					}
					RespParseResult::Incomplete => break,
					RespParseResult::Error(_) => return,
				}
			}
			match stream.read_buf(&mut buf).await {
				Ok(0) | Err(_) => return,
				Ok(_) => {}
			}
		}
	});

	received
}

/// A tiny subset of server behavior.
///
/// `GARBAGE` answers with bytes that are not a valid reply.
pub fn redis_like(args: &[String]) -> Vec<u8> {
	let name = args.first().map(|s| s.to_uppercase()).unwrap_or_default();
	let reply = match (name.as_str(), args) {
		("PING", _) => Reply::status("PONG"),
		("ECHO", [_, value]) => Reply::bulk(value.clone()),
		("SET", [_, _, _]) => Reply::status("OK"),
		("GARBAGE", _) => return b"!garbage\r\n".to_vec(),
		_ => Reply::error(format!("ERR unknown command '{}'", name.to_lowercase())),
	};
	reply.encode().unwrap().to_vec()
}

/// Client connection wired to a fresh fake server.
pub fn connect_fake() -> (Connection, Received) {
	let (client, server) = tokio::io::duplex(DUPLEX_CAPACITY);
	let received = spawn_server(server, redis_like);
	(
		Connection::from_stream(client, resp::DEFAULT_MAX_LINE_LEN),
		received,
	)
}

/// Client connection whose writes fail when they contain `marker`.
pub fn connect_failing(marker: &'static [u8], fail_flush: bool) -> (Connection, Received) {
	let (client, server) = tokio::io::duplex(DUPLEX_CAPACITY);
	let received = spawn_server(server, redis_like);
	let (reader, writer) = tokio::io::split(client);
	let writer = FailingWriter {
		inner: writer,
		marker,
		fail_flush,
	};
	(
		Connection::from_parts(reader, writer, resp::DEFAULT_MAX_LINE_LEN),
		received,
	)
}

/// Writer that rejects any write containing `marker` before passing a
/// single byte through.
pub struct FailingWriter<W> {
	inner: W,
	marker: &'static [u8],
	fail_flush: bool,
}

impl<W: AsyncWrite + Unpin> AsyncWrite for FailingWriter<W> {
	fn poll_write(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &[u8],
	) -> Poll<io::Result<usize>> {
		let this = self.get_mut();
		if buf.windows(this.marker.len()).any(|w| w == this.marker) {
			return Poll::Ready(Err(io::Error::other("injected write failure")));
		}
		Pin::new(&mut this.inner).poll_write(cx, buf)
	}

	fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		let this = self.get_mut();
		if this.fail_flush {
			return Poll::Ready(Err(io::Error::other("injected flush failure")));
		}
		Pin::new(&mut this.inner).poll_flush(cx)
	}

	fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
	}
}

pub fn received(log: &Received) -> Vec<Vec<String>> {
	log.lock().unwrap().clone()
}
