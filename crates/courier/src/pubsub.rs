//! Subscription mode: a long-lived listener that forwards every pushed
//! reply to a bounded message stream.

use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use bytes::Bytes;
use futures::Stream;
use log::debug;
use log::warn;
use resp::Command;
use resp::Decoder;
use resp::Encoder;
use resp::Reply;
use resp::RespError;
use resp::ToArg;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::connection::BoxedReader;
use crate::connection::BoxedWriter;
use crate::connection::Connection;
use crate::error::ClientError;

pub struct PubSub {
	writer: Mutex<Encoder<BoxedWriter>>,
	messages: mpsc::Receiver<Reply>,
	stop_tx: watch::Sender<bool>,
	listener: Option<JoinHandle<()>>,
}

impl PubSub {
	pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
		let conn = Connection::open(config).await?;
		Ok(Self::new(conn, config.pubsub_capacity))
	}

	/// Take over `conn` and start the listener task.
	///
	/// At most `capacity` messages are buffered; beyond that the listener
	/// stops reading until the consumer catches up.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn new(conn: Connection, capacity: usize) -> Self {
		let (encoder, decoder) = conn.into_parts();
		let (tx, messages) = mpsc::channel(capacity.max(1));
		let (stop_tx, stop_rx) = watch::channel(false);
		let listener = tokio::spawn(listen(decoder, tx, stop_rx));

		Self {
			writer: Mutex::new(encoder),
			messages,
			stop_tx,
			listener: Some(listener),
		}
	}

	pub async fn subscribe<I, A>(&self, channels: I) -> Result<(), RespError>
	where
		I: IntoIterator<Item = A>,
		A: ToArg,
	{
		self.send(Command::new("SUBSCRIBE").args(channels)).await
	}

	pub async fn psubscribe<I, A>(&self, patterns: I) -> Result<(), RespError>
	where
		I: IntoIterator<Item = A>,
		A: ToArg,
	{
		self.send(Command::new("PSUBSCRIBE").args(patterns)).await
	}

	/// An empty list unsubscribes from every channel.
	pub async fn unsubscribe<I, A>(&self, channels: I) -> Result<(), RespError>
	where
		I: IntoIterator<Item = A>,
		A: ToArg,
	{
		self.send(Command::new("UNSUBSCRIBE").args(channels)).await
	}

	/// An empty list unsubscribes from every pattern.
	pub async fn punsubscribe<I, A>(&self, patterns: I) -> Result<(), RespError>
	where
		I: IntoIterator<Item = A>,
		A: ToArg,
	{
		self.send(Command::new("PUNSUBSCRIBE").args(patterns)).await
	}

	// Confirmations come back through the message stream.
	async fn send(&self, cmd: Command) -> Result<(), RespError> {
		let mut writer = self.writer.lock().await;
		writer.encode(&cmd).await.inspect_err(|e| {
			warn!("Failed to send '{}': {}", cmd.display_name(), e);
		})
	}

	/// Wait for the next pushed reply. Returns `None` once the listener has
	/// stopped and everything it delivered has been consumed.
	pub async fn next_message(&mut self) -> Option<Reply> {
		self.messages.recv().await
	}

	/// True until the listener task has exited.
	pub fn is_running(&self) -> bool {
		self.listener.as_ref().is_some_and(|h| !h.is_finished())
	}

	/// Stop the listener and wait for it to exit. Messages still buffered are
	/// dropped. Calling `stop` again does nothing.
	pub async fn stop(&mut self) {
		self.stop_tx.send_replace(true);

		if let Some(listener) = self.listener.take() {
			if let Err(e) = listener.await {
				warn!("Subscription listener ended abnormally: {}", e);
			}
		}

		self.messages.close();
		while self.messages.try_recv().is_ok() {}
	}
}

impl Drop for PubSub {
	fn drop(&mut self) {
		self.stop_tx.send_replace(true);
	}
}

impl Stream for PubSub {
	type Item = Reply;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Reply>> {
		self.get_mut().messages.poll_recv(cx)
	}
}

async fn listen(
	mut decoder: Decoder<BoxedReader>,
	tx: mpsc::Sender<Reply>,
	mut stop: watch::Receiver<bool>,
) {
	debug!("Subscription listener started");

	loop {
		if *stop.borrow() {
			break;
		}

		let reply = tokio::select! {
			biased;
			_ = stop.changed() => break,
			result = decoder.decode() => match result {
				Ok(reply) => reply,
				Err(e) => Reply::Invalid(e),
			},
		};

		tokio::select! {
			biased;
			_ = stop.changed() => break,
			sent = tx.send(reply) => {
				if sent.is_err() {
					debug!("Message receiver dropped; listener exiting");
					break;
				}
			}
		}
	}

	debug!("Subscription listener stopped");
}

/// Typed view of a reply pushed to a subscribed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
	Subscribe {
		channel: Bytes,
		count: i64,
	},
	/// `channel` is absent when there was nothing left to unsubscribe from.
	Unsubscribe {
		channel: Option<Bytes>,
		count: i64,
	},
	PSubscribe {
		pattern: Bytes,
		count: i64,
	},
	PUnsubscribe {
		pattern: Option<Bytes>,
		count: i64,
	},
	Message {
		channel: Bytes,
		payload: Bytes,
	},
	PMessage {
		pattern: Bytes,
		channel: Bytes,
		payload: Bytes,
	},
}

impl Message {
	/// Interpret a pushed reply. Anything that is not a pub/sub push yields
	/// `None`.
	pub fn from_reply(reply: &Reply) -> Option<Self> {
		let items = reply.as_array()?;
		let kind = items.first()?.as_bytes()?.to_ascii_lowercase();

		match (kind.as_slice(), items) {
			(b"subscribe", [_, channel, count]) => Some(Message::Subscribe {
				channel: text(channel)?,
				count: count.as_integer()?,
			}),
			(b"unsubscribe", [_, channel, count]) => Some(Message::Unsubscribe {
				channel: optional_text(channel)?,
				count: count.as_integer()?,
			}),
			(b"psubscribe", [_, pattern, count]) => Some(Message::PSubscribe {
				pattern: text(pattern)?,
				count: count.as_integer()?,
			}),
			(b"punsubscribe", [_, pattern, count]) => Some(Message::PUnsubscribe {
				pattern: optional_text(pattern)?,
				count: count.as_integer()?,
			}),
			(b"message", [_, channel, payload]) => Some(Message::Message {
				channel: text(channel)?,
				payload: text(payload)?,
			}),
			(b"pmessage", [_, pattern, channel, payload]) => Some(Message::PMessage {
				pattern: text(pattern)?,
				channel: text(channel)?,
				payload: text(payload)?,
			}),
			_ => None,
		}
	}

	/// The channel a message or (un)subscription refers to.
	pub fn channel(&self) -> Option<&Bytes> {
		match self {
			Message::Subscribe { channel, .. } => Some(channel),
			Message::Unsubscribe { channel, .. } => channel.as_ref(),
			Message::Message { channel, .. } => Some(channel),
			Message::PMessage { channel, .. } => Some(channel),
			Message::PSubscribe { .. } | Message::PUnsubscribe { .. } => None,
		}
	}
}

fn text(reply: &Reply) -> Option<Bytes> {
	reply.as_bytes().cloned()
}

// Outer `None` means malformed, inner `None` means nil.
fn optional_text(reply: &Reply) -> Option<Option<Bytes>> {
	match reply {
		Reply::Nil => Some(None),
		other => text(other).map(Some),
	}
}
