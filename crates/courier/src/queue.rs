//! FIFO of pending work shared by submitters and one active drain.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;

/// A lock-protected queue plus the flag that marks an active drain.
///
/// Producers `push` from any task. Exactly one drain at a time owns the
/// items it takes out: `try_claim` starts a drain and `next` keeps it going
/// until the queue runs dry, at which point the flag is cleared in the same
/// critical section that observed the empty queue.
pub struct CommandQueue<T> {
	state: Mutex<QueueState<T>>,
}

struct QueueState<T> {
	items: VecDeque<T>,
	running: bool,
}

impl<T> CommandQueue<T> {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(QueueState {
				items: VecDeque::new(),
				running: false,
			}),
		}
	}

	fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Append an item. Returns `true` when no drain is active, meaning the
	/// caller has to start one.
	pub fn push(&self, item: T) -> bool {
		let mut state = self.lock();
		state.items.push_back(item);
		!state.running
	}

	/// Become the active drain and take the head item.
	///
	/// Returns `None` if a drain is already running or there is nothing to
	/// do.
	pub fn try_claim(&self) -> Option<T> {
		let mut state = self.lock();
		if state.running {
			return None;
		}
		let item = state.items.pop_front()?;
		state.running = true;
		Some(item)
	}

	/// Take the next item for the active drain, releasing the drain when the
	/// queue is empty.
	pub fn next(&self) -> Option<T> {
		let mut state = self.lock();
		let item = state.items.pop_front();
		if item.is_none() {
			state.running = false;
		}
		item
	}

	/// Remove every queued item without touching the drain flag.
	pub fn clear(&self) -> Vec<T> {
		self.lock().items.drain(..).collect()
	}

	pub fn len(&self) -> usize {
		self.lock().items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().items.is_empty()
	}

	pub fn is_running(&self) -> bool {
		self.lock().running
	}
}

impl<T> Default for CommandQueue<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn test_push_reports_idle_queue() {
		let queue = CommandQueue::new();
		assert!(queue.push(1));
		assert!(queue.push(2));

		assert_eq!(queue.try_claim(), Some(1));
		assert!(!queue.push(3));
	}

	#[test]
	fn test_claim_is_exclusive() {
		let queue = CommandQueue::new();
		queue.push("a");
		queue.push("b");

		assert_eq!(queue.try_claim(), Some("a"));
		assert!(queue.is_running());
		assert_eq!(queue.try_claim(), None);
		assert_eq!(queue.len(), 1);
	}

	#[test]
	fn test_claim_empty_stays_idle() {
		let queue: CommandQueue<u8> = CommandQueue::new();
		assert_eq!(queue.try_claim(), None);
		assert!(!queue.is_running());
	}

	#[test]
	fn test_next_drains_in_order_and_releases() {
		let queue = CommandQueue::new();
		for i in 0..4 {
			queue.push(i);
		}

		let mut seen = vec![queue.try_claim().unwrap()];
		while let Some(i) = queue.next() {
			seen.push(i);
		}
		assert_eq!(seen, vec![0, 1, 2, 3]);
		assert!(!queue.is_running());
		assert!(queue.is_empty());

		// The next push must start a fresh drain.
		assert!(queue.push(9));
		assert_eq!(queue.try_claim(), Some(9));
	}

	#[test]
	fn test_clear_keeps_drain_flag() {
		let queue = CommandQueue::new();
		queue.push(1);
		queue.push(2);
		queue.push(3);
		queue.try_claim();

		assert_eq!(queue.clear(), vec![2, 3]);
		assert!(queue.is_running());
		assert_eq!(queue.next(), None);
		assert!(!queue.is_running());
	}

	#[test]
	fn test_concurrent_producers_single_drain() {
		let queue = Arc::new(CommandQueue::new());
		let mut producers = Vec::new();
		for t in 0..4 {
			let queue = queue.clone();
			producers.push(std::thread::spawn(move || {
				let mut starts = 0;
				for i in 0..250 {
					if queue.push(t * 1000 + i) {
						starts += 1;
					}
				}
				starts
			}));
		}
		let starts: usize = producers.into_iter().map(|h| h.join().unwrap()).sum();
		assert!(starts >= 1);

		let mut drained = 0;
		if queue.try_claim().is_some() {
			drained += 1;
			while queue.next().is_some() {
				drained += 1;
			}
		}
		assert_eq!(drained, 1000);
		assert!(!queue.is_running());
	}
}
