use std::sync::Arc;
use std::sync::MutexGuard;

use log::debug;
use log::warn;
use resp::Command;
use resp::Reply;
use resp::RespError;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::queue::CommandQueue;
use crate::request::ReplyHandle;
use crate::request::Request;

/// Sends commands in batches: every command of a batch is written and
/// flushed together, then the replies are read back in the same order.
///
/// Commands accumulate with [`enqueue`](Pipeline::enqueue) until
/// [`exec`](Pipeline::exec) commits them. Committed batches run one at a
/// time in commit order.
#[derive(Clone)]
pub struct Pipeline {
	shared: Arc<Shared>,
}

struct Shared {
	building: std::sync::Mutex<Vec<Request>>,
	batches: CommandQueue<Vec<Request>>,
	conn: Mutex<Connection>,
	runtime: Handle,
}

impl Shared {
	fn building(&self) -> MutexGuard<'_, Vec<Request>> {
		self.building.lock().unwrap_or_else(|e| e.into_inner())
	}
}

impl Pipeline {
	pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
		Ok(Self::new(Connection::open(config).await?))
	}

	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn new(conn: Connection) -> Self {
		Self::with_runtime(conn, Handle::current())
	}

	pub fn with_runtime(conn: Connection, runtime: Handle) -> Self {
		Self {
			shared: Arc::new(Shared {
				building: std::sync::Mutex::new(Vec::new()),
				batches: CommandQueue::new(),
				conn: Mutex::new(conn),
				runtime,
			}),
		}
	}

	/// Add a command to the batch being built.
	pub fn enqueue(&self, command: Command) -> ReplyHandle {
		let (request, handle) = Request::new(command);
		self.shared.building().push(request);
		handle
	}

	/// Drop the batch being built. Its handles resolve to
	/// `Reply::Invalid(RespError::Canceled)`.
	pub fn discard(&self) -> usize {
		let batch = std::mem::take(&mut *self.shared.building());
		let discarded = batch.len();
		for request in batch {
			request.complete(Reply::Invalid(RespError::Canceled));
		}
		if discarded > 0 {
			debug!("Discarded {} uncommitted commands", discarded);
		}
		discarded
	}

	/// Commit the batch being built and start executing it. Returns the
	/// number of commands committed; an empty batch commits nothing.
	pub fn exec(&self) -> usize {
		let (needs_drain, size) = {
			// Held across the push so batches commit in the order they were taken.
			let mut building = self.shared.building();
			if building.is_empty() {
				return 0;
			}
			let batch = std::mem::take(&mut *building);
			let size = batch.len();
			(self.shared.batches.push(batch), size)
		};

		if needs_drain {
			self.shared.runtime.spawn(drain(self.shared.clone()));
		}
		size
	}

	/// Commands enqueued since the last `exec` or `discard`.
	pub fn buffered(&self) -> usize {
		self.shared.building().len()
	}

	/// Batches committed but not yet started.
	pub fn committed(&self) -> usize {
		self.shared.batches.len()
	}
}

async fn drain(shared: Arc<Shared>) {
	let Some(mut batch) = shared.batches.try_claim() else {
		return;
	};
	debug!("Pipeline drain started");

	let mut conn = shared.conn.lock().await;
	loop {
		run_batch(&mut conn, batch).await;
		match shared.batches.next() {
			Some(next) => batch = next,
			None => break,
		}
	}

	debug!("Pipeline drain finished");
}

async fn run_batch(conn: &mut Connection, batch: Vec<Request>) {
	debug!("Executing pipeline batch of {} commands", batch.len());

	let mut waiting = Vec::with_capacity(batch.len());
	for request in batch {
		match conn.encoder.write_command(&request.command).await {
			Ok(()) => waiting.push(request),
			Err(e) => {
				warn!(
					"Failed to send pipelined '{}': {}",
					request.command.display_name(),
					e
				);
				request.complete(Reply::Invalid(e));
			}
		}
	}

	if waiting.is_empty() {
		return;
	}

	if let Err(e) = conn.encoder.flush().await {
		warn!("Failed to flush pipeline batch: {}", e);
		for request in waiting {
			request.complete(Reply::Invalid(e.clone()));
		}
		return;
	}

	for request in waiting {
		let reply = conn.read_reply().await;
		request.complete(reply);
	}
}
