use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use log::debug;
use resp::Command;
use resp::Reply;
use resp::RespError;
use tokio::sync::oneshot;

/// A submitted command together with the channel its reply goes to.
pub(crate) struct Request {
	pub(crate) command: Command,
	reply_tx: oneshot::Sender<Reply>,
}

impl Request {
	pub(crate) fn new(command: Command) -> (Self, ReplyHandle) {
		let (reply_tx, rx) = oneshot::channel();
		(Self { command, reply_tx }, ReplyHandle { rx })
	}

	/// Deliver the outcome. Never blocks, even if the caller is gone.
	pub(crate) fn complete(self, reply: Reply) {
		let Request { command, reply_tx } = self;
		if let Err(reply) = reply_tx.send(reply) {
			debug!(
				"Reply for '{}' dropped; receiver gone. Dropped reply: {:?}",
				command.display_name(),
				reply
			);
		}
	}
}

/// Single-use notification for the reply to one submitted command.
///
/// Awaiting the handle yields exactly one [`Reply`]: the decoded reply or a
/// [`Reply::Invalid`] describing what failed. If the dispatcher drops the
/// request without answering, the handle resolves to
/// `Reply::Invalid(RespError::Canceled)`.
#[derive(Debug)]
pub struct ReplyHandle {
	rx: oneshot::Receiver<Reply>,
}

impl ReplyHandle {
	/// Block the current thread until the reply arrives.
	///
	/// # Panics
	///
	/// Panics when called from inside an async execution context.
	pub fn blocking_wait(self) -> Reply {
		self.rx
			.blocking_recv()
			.unwrap_or(Reply::Invalid(RespError::Canceled))
	}

	/// Take the reply if it has already been delivered.
	pub fn try_take(&mut self) -> Option<Reply> {
		match self.rx.try_recv() {
			Ok(reply) => Some(reply),
			Err(oneshot::error::TryRecvError::Empty) => None,
			Err(oneshot::error::TryRecvError::Closed) => {
				Some(Reply::Invalid(RespError::Canceled))
			}
		}
	}
}

impl Future for ReplyHandle {
	type Output = Reply;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Reply> {
		Pin::new(&mut self.rx)
			.poll(cx)
			.map(|result| result.unwrap_or(Reply::Invalid(RespError::Canceled)))
	}
}
