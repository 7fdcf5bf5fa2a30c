//! In-memory transport that answers from a script.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;

use super::{HttpRequest, RawResponse, Transport};
use crate::error::{Error, Result};

/// How a [`ScriptedTransport`] answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
	/// Respond with a status and body after `delay`.
	Respond {
		status: StatusCode,
		body: Bytes,
		delay: Duration,
	},
	/// Fail at the network level.
	Fail(String),
	/// Never complete.
	Never,
}

impl Reply {
	/// A 200 response carrying `value` as JSON.
	pub fn ok(value: serde_json::Value) -> Self {
		Self::json(StatusCode::OK, value)
	}

	/// A response with `status` carrying `value` as JSON.
	pub fn json(status: StatusCode, value: serde_json::Value) -> Self {
		Self::raw(status, value.to_string())
	}

	/// A response with `status` and an arbitrary body.
	pub fn raw(status: StatusCode, body: impl Into<Bytes>) -> Self {
		Self::Respond {
			status,
			body: body.into(),
			delay: Duration::ZERO,
		}
	}

	/// Delays the response by `delay`. No effect on failures.
	pub fn after(self, delay: Duration) -> Self {
		match self {
			Self::Respond { status, body, .. } => Self::Respond { status, body, delay },
			other => other,
		}
	}
}

type Script = dyn Fn(&HttpRequest) -> Reply + Send + Sync;

/// [`Transport`] whose replies come from a closure, recording every request.
pub struct ScriptedTransport {
	script: Box<Script>,
	requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScriptedTransport").field("requests", &self.requests.lock().len()).finish()
	}
}

impl ScriptedTransport {
	/// Creates a transport answering each request with `script(request)`.
	pub fn new(script: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static) -> Self {
		Self {
			script: Box::new(script),
			requests: Mutex::new(Vec::new()),
		}
	}

	/// Requests received so far, in arrival order.
	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	/// Number of requests received so far.
	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}
}

#[async_trait]
impl Transport for ScriptedTransport {
	async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
		let reply = (self.script)(&request);
		let url = request.url.clone();
		self.requests.lock().push(request);

		match reply {
			Reply::Respond { status, body, delay } => {
				if !delay.is_zero() {
					tokio::time::sleep(delay).await;
				}
				Ok(RawResponse::new(url, status, body))
			}
			Reply::Fail(message) => Err(Error::Transport(message)),
			Reply::Never => std::future::pending().await,
		}
	}
}
