use std::sync::Arc;

use log::debug;
use resp::Command;
use resp::Reply;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::queue::CommandQueue;
use crate::request::ReplyHandle;
use crate::request::Request;

/// Dispatches one command at a time over a single connection.
///
/// Any number of tasks may submit concurrently. Commands are written, and
/// their replies handed back, in submission order, with at most one
/// request/reply exchange in flight. Cloning a `Client` shares the same
/// connection and queue.
#[derive(Clone)]
pub struct Client {
	shared: Arc<Shared>,
}

struct Shared {
	queue: CommandQueue<Request>,
	conn: Mutex<Connection>,
	runtime: Handle,
}

impl Client {
	pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
		Ok(Self::new(Connection::open(config).await?))
	}

	/// Create a client whose drain tasks run on the current runtime.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn new(conn: Connection) -> Self {
		Self::with_runtime(conn, Handle::current())
	}

	pub fn with_runtime(conn: Connection, runtime: Handle) -> Self {
		Self {
			shared: Arc::new(Shared {
				queue: CommandQueue::new(),
				conn: Mutex::new(conn),
				runtime,
			}),
		}
	}

	/// Queue a command and return the handle its reply will arrive on.
	///
	/// Never waits for I/O.
	pub fn submit(&self, command: Command) -> ReplyHandle {
		let (request, handle) = Request::new(command);
		if self.shared.queue.push(request) {
			self.shared.runtime.spawn(drain(self.shared.clone()));
		}
		handle
	}

	/// Submit and wait for the reply.
	pub async fn execute(&self, command: Command) -> Reply {
		self.submit(command).await
	}

	/// Submit and block the calling thread until the reply arrives.
	///
	/// # Panics
	///
	/// Panics when called from inside an async execution context.
	pub fn execute_blocking(&self, command: Command) -> Reply {
		self.submit(command).blocking_wait()
	}

	/// Commands queued but not yet sent.
	pub fn pending(&self) -> usize {
		self.shared.queue.len()
	}
}

async fn drain(shared: Arc<Shared>) {
	let Some(mut request) = shared.queue.try_claim() else {
		return;
	};
	debug!("Command drain started");

	let mut conn = shared.conn.lock().await;
	let mut sent = 0usize;
	loop {
		let reply = conn.round_trip(&request.command).await;
		request.complete(reply);
		sent += 1;

		match shared.queue.next() {
			Some(next) => request = next,
			None => break,
		}
	}

	debug!("Command drain finished after {} commands", sent);
}
