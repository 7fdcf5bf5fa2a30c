//! Error types for API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API operation.
///
/// Each variant marks the stage at which the operation stopped, so callers can
/// tell a request that never left the process apart from one the server
/// rejected.
#[derive(Debug, Error)]
pub enum Error {
	/// Pasted text is not a shortlink URL; no request was made.
	#[error("not a valid shortlink: {0}")]
	InvalidShortlink(String),
	/// The request body could not be serialized; no request was made.
	#[error("failed to encode request body: {0}")]
	Encode(#[source] serde_json::Error),
	/// The endpoint path did not form a valid URL against the base host.
	#[error("invalid request url: {0}")]
	InvalidUrl(#[from] url::ParseError),
	/// Network-level failure below HTTP (DNS, refused connection, timeout).
	#[error("transport error: {0}")]
	Transport(String),
	/// A success response whose body did not match the expected shape.
	#[error("failed to decode response: {0}")]
	Decode(#[source] serde_json::Error),
	/// A non-success status with a structured or status-derived message.
	#[error("{0}")]
	Server(#[from] ServerError),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by the server for a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("{description}")]
pub struct ServerError {
	/// Human-readable description of the failure.
	pub description: String,
}

impl ServerError {
	/// Creates an error with the given description.
	pub fn new(description: impl Into<String>) -> Self {
		Self {
			description: description.into(),
		}
	}

	/// Synthesizes the error used when the body carries no structured error.
	///
	/// The message is the canonical reason phrase for `status`, or a phrase
	/// naming its class when the code is unregistered.
	pub fn for_status(status: StatusCode) -> Self {
		let description = status.canonical_reason().unwrap_or_else(|| class_phrase(status));
		Self::new(description)
	}
}

fn class_phrase(status: StatusCode) -> &'static str {
	if status.is_informational() {
		"Informational"
	} else if status.is_success() {
		"Success"
	} else if status.is_redirection() {
		"Redirection"
	} else if status.is_client_error() {
		"Client Error"
	} else if status.is_server_error() {
		"Server Error"
	} else {
		"Unknown Status"
	}
}
