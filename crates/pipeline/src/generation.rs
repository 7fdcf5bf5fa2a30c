use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Generation-scoped cancellation token for one compile request.
#[derive(Debug, Clone)]
pub(crate) struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	/// Returns generation ID.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when the request has been superseded or cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Future resolving when the request is superseded or cancelled.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

/// Hands out monotonically increasing generations where only the newest may
/// take effect.
///
/// Issuing a generation cancels the previous one, and
/// [`publish_if_current`](Self::publish_if_current) runs its closure only for
/// the newest generation, under the same lock that issuing takes.
#[derive(Debug, Default)]
pub(crate) struct Supersession {
	next: AtomicU64,
	current: Mutex<Option<GenerationToken>>,
}

impl Supersession {
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues the next generation and cancels the outstanding one.
	pub fn issue(&self) -> GenerationToken {
		let generation = self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
		let token = GenerationToken {
			generation,
			cancel: CancellationToken::new(),
		};
		if let Some(previous) = self.current.lock().replace(token.clone()) {
			previous.cancel.cancel();
		}
		token
	}

	/// Returns true if `generation` is the newest issued.
	pub fn is_current(&self, generation: u64) -> bool {
		self.current.lock().as_ref().is_some_and(|token| token.generation == generation)
	}

	/// Runs `publish` only if `generation` is still the newest.
	pub fn publish_if_current(&self, generation: u64, publish: impl FnOnce()) -> bool {
		let current = self.current.lock();
		if current.as_ref().is_some_and(|token| token.generation == generation) {
			publish();
			true
		} else {
			false
		}
	}

	/// Cancels the outstanding generation, if any.
	pub fn cancel_outstanding(&self) {
		if let Some(token) = self.current.lock().take() {
			token.cancel.cancel();
		}
	}
}
