//! Reference-counted network activity indicator.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

#[derive(Debug)]
struct Inner {
	in_flight: Mutex<usize>,
	active: watch::Sender<bool>,
}

/// Counts in-flight requests and publishes whether any are outstanding.
///
/// The published value flips to `true` only when the count goes from 0 to 1
/// and back to `false` only when it returns to 0, so overlapping requests
/// never produce duplicate or intermediate transitions.
#[derive(Debug, Clone)]
pub struct NetworkActivity {
	inner: Arc<Inner>,
}

impl Default for NetworkActivity {
	fn default() -> Self {
		Self::new()
	}
}

impl NetworkActivity {
	/// Creates an idle indicator.
	pub fn new() -> Self {
		let (active, _) = watch::channel(false);
		Self {
			inner: Arc::new(Inner {
				in_flight: Mutex::new(0),
				active,
			}),
		}
	}

	/// Marks one request as started until the returned guard is dropped.
	///
	/// Dropping covers completion, failure and cancellation alike.
	#[must_use = "activity ends when the guard is dropped"]
	pub fn begin(&self) -> ActivityGuard {
		let mut in_flight = self.inner.in_flight.lock();
		*in_flight += 1;
		if *in_flight == 1 {
			self.inner.active.send_replace(true);
		}
		ActivityGuard {
			inner: Arc::clone(&self.inner),
		}
	}

	/// Returns true while any request is in flight.
	pub fn is_active(&self) -> bool {
		*self.inner.active.borrow()
	}

	/// Number of requests currently in flight.
	pub fn in_flight(&self) -> usize {
		*self.inner.in_flight.lock()
	}

	/// Subscribes to activity transitions.
	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.inner.active.subscribe()
	}
}

/// Keeps one request counted as in flight.
#[derive(Debug)]
pub struct ActivityGuard {
	inner: Arc<Inner>,
}

impl Drop for ActivityGuard {
	fn drop(&mut self) {
		let mut in_flight = self.inner.in_flight.lock();
		let Some(remaining) = in_flight.checked_sub(1) else {
			return;
		};
		*in_flight = remaining;
		if remaining == 0 {
			self.inner.active.send_replace(false);
		}
	}
}
