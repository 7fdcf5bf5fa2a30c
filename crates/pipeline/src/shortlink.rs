//! Resolution of pasted shortlinks into saved sessions.

use std::sync::Arc;
use std::time::Duration;

use godbolt_client::shortlink::parse_shortlink;
use godbolt_client::{Client, SessionContainer};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::history::ShortlinkHistory;

/// Upper bound on waiting for a shortlink lookup.
pub const DEFAULT_SHORTLINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Error text shown after a failed resolution.
pub const INVALID_SHORTLINK_MESSAGE: &str = "Not a valid shortlink.";

#[derive(Debug, Default)]
struct FlowState {
	input: String,
	error_text: String,
	validating: bool,
	session: Option<SessionContainer>,
	in_flight: Option<CancellationToken>,
	/// Number of the newest `resolve` call.
	attempt: u64,
}

/// One `resolve` call. Dropping it cancels the lookup and, if the call still
/// owns the flow, returns the flow to idle.
struct Attempt<'a> {
	state: &'a Mutex<FlowState>,
	number: u64,
	token: CancellationToken,
}

impl Drop for Attempt<'_> {
	fn drop(&mut self) {
		self.token.cancel();
		let mut state = self.state.lock();
		if state.attempt == self.number && state.in_flight.take().is_some() {
			debug!(attempt = self.number, "shortlink resolution abandoned");
			state.validating = false;
		}
	}
}

/// Validates pasted shortlinks and fetches the sessions behind them.
///
/// Successfully resolved links are remembered in a [`ShortlinkHistory`].
#[derive(Debug)]
pub struct ShortlinkFlow {
	client: Arc<Client>,
	timeout: Duration,
	state: Mutex<FlowState>,
	history: Mutex<ShortlinkHistory>,
	/// Serializes history writes so the file always ends with the newest list.
	saving: tokio::sync::Mutex<()>,
}

impl ShortlinkFlow {
	/// Creates a flow waiting at most `timeout` per lookup.
	pub fn new(client: Arc<Client>, history: ShortlinkHistory, timeout: Duration) -> Self {
		Self {
			client,
			timeout,
			state: Mutex::new(FlowState::default()),
			history: Mutex::new(history),
			saving: tokio::sync::Mutex::new(()),
		}
	}

	/// Validates `input` and fetches its sessions.
	///
	/// Returns true once a session container was received. On failure the
	/// session is cleared and [`error_text`](Self::error_text) is set, unless
	/// the attempt was cancelled or superseded by a newer `resolve`.
	pub async fn resolve(&self, input: &str) -> bool {
		let attempt = {
			let mut state = self.state.lock();
			let token = CancellationToken::new();
			if let Some(previous) = state.in_flight.replace(token.clone()) {
				previous.cancel();
			}
			state.attempt = state.attempt.wrapping_add(1);
			state.input = input.to_string();
			state.error_text.clear();
			state.validating = true;
			Attempt {
				state: &self.state,
				number: state.attempt,
				token,
			}
		};

		let session = self.lookup(input, &attempt.token).await;

		let resolved = {
			let mut state = self.state.lock();
			// Cancelled tokens no longer own the state: `cancel` took it or a
			// newer resolve replaced it.
			if attempt.token.is_cancelled() {
				debug!(input, "shortlink resolution cancelled");
				return false;
			}
			state.in_flight = None;
			state.validating = false;
			match session {
				Some(session) => {
					state.session = Some(session);
					true
				}
				None => {
					state.session = None;
					state.error_text = INVALID_SHORTLINK_MESSAGE.to_string();
					false
				}
			}
		};

		if resolved {
			self.remember(input.trim()).await;
		}
		resolved
	}

	async fn lookup(&self, input: &str, token: &CancellationToken) -> Option<SessionContainer> {
		let link_id = match parse_shortlink(input, self.client.domain()) {
			Ok(link_id) => link_id,
			Err(err) => {
				debug!(input, error = %err, "rejected shortlink");
				return None;
			}
		};

		let (tx, rx) = oneshot::channel();
		let client = Arc::clone(&self.client);
		let task_token = token.clone();
		tokio::spawn(async move {
			tokio::select! {
				() = task_token.cancelled() => debug!(%link_id, "shortlink lookup cancelled"),
				result = client.shortlink_info(&link_id) => {
					let _ = tx.send(result);
				}
			}
		});

		match tokio::time::timeout(self.timeout, rx).await {
			Ok(Ok(Ok(container))) => Some(container),
			Ok(Ok(Err(err))) => {
				debug!(error = %err, "shortlink lookup failed");
				None
			}
			// Sender dropped: the lookup was cancelled.
			Ok(Err(_)) => None,
			Err(_) => {
				debug!(timeout = ?self.timeout, "shortlink lookup timed out");
				None
			}
		}
	}

	async fn remember(&self, link: &str) {
		self.history.lock().push(link);

		let _saving = self.saving.lock().await;
		let snapshot = self.history.lock().clone();
		match tokio::task::spawn_blocking(move || snapshot.save()).await {
			Ok(Ok(())) => {}
			Ok(Err(err)) => warn!(error = %err, "could not save shortlink history"),
			Err(err) => warn!(error = %err, "shortlink history writer failed"),
		}
	}

	/// Abandons the in-flight resolution and clears the input, error and session.
	pub fn cancel(&self) {
		let mut state = self.state.lock();
		if let Some(token) = state.in_flight.take() {
			token.cancel();
		}
		state.input.clear();
		state.error_text.clear();
		state.session = None;
		state.validating = false;
	}

	/// Sessions of the last resolved shortlink.
	pub fn session(&self) -> Option<SessionContainer> {
		self.state.lock().session.clone()
	}

	pub fn input(&self) -> String {
		self.state.lock().input.clone()
	}

	pub fn is_validating(&self) -> bool {
		self.state.lock().validating
	}

	/// Error text of the last failed resolution, empty otherwise.
	pub fn error_text(&self) -> String {
		self.state.lock().error_text.clone()
	}

	/// Resolved shortlinks, most recent first.
	pub fn history(&self) -> Vec<String> {
		self.history.lock().entries().to_vec()
	}
}

#[cfg(test)]
mod tests;
