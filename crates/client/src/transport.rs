//! HTTP transports.
//!
//! A [`Transport`] performs exactly one exchange per call and reports only
//! network-level failures. It never judges a response by its status code;
//! that is [`Endpoint::extract`](crate::Endpoint::extract)'s job.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
pub use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use crate::endpoint::HttpMethod;
use crate::error::{Error, Result};

#[cfg(any(test, feature = "testing"))]
mod scripted;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{Reply, ScriptedTransport};

/// Content type attached to every request.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully built request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: HttpMethod,
	pub url: Url,
	pub headers: Vec<(&'static str, String)>,
	pub body: Option<Vec<u8>>,
}

impl HttpRequest {
	/// Multi-line dump of the request for trace logging.
	pub fn raw_description(&self) -> String {
		let mut headers: Vec<_> = self.headers.iter().map(|(name, value)| format!("{name}: {value}")).collect();
		headers.sort();
		let mut out = format!("{} {}\n", self.method, self.url);
		for header in headers {
			out.push_str(&header);
			out.push('\n');
		}
		if let Some(body) = &self.body {
			out.push_str(&pretty_json(body));
			out.push('\n');
		}
		out
	}
}

/// Status code and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
	pub url: Url,
	pub status: StatusCode,
	pub headers: Vec<(String, String)>,
	pub body: Bytes,
}

impl RawResponse {
	/// Creates a response without headers.
	pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
		Self {
			url,
			status,
			headers: Vec::new(),
			body: body.into(),
		}
	}

	/// Multi-line dump of the response for trace logging.
	pub fn raw_description(&self) -> String {
		let mut out = format!("{}\n{}\n", self.url, self.status);
		for (name, value) in &self.headers {
			out.push_str(&format!("{name}: {value}\n"));
		}
		out.push_str(&pretty_json(&self.body));
		out
	}
}

/// Re-serializes JSON with indentation and sorted keys.
///
/// Bodies that are not JSON are returned as lossy UTF-8.
pub fn pretty_json(body: &[u8]) -> String {
	serde_json::from_slice::<serde_json::Value>(body)
		.ok()
		.and_then(|value| serde_json::to_string_pretty(&value).ok())
		.unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

/// Performs HTTP exchanges.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Sends `request` once.
	///
	/// Fails only with [`Error::Transport`]; any status code is a success here.
	async fn send(&self, request: HttpRequest) -> Result<RawResponse>;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
}

impl HttpTransport {
	/// Builds a transport whose requests time out after `timeout`.
	pub fn new(timeout: Duration) -> Result<Self> {
		let mut headers = HeaderMap::new();
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = reqwest::Client::builder()
			.default_headers(headers)
			.user_agent(concat!("godbolt-rs/", env!("CARGO_PKG_VERSION")))
			.timeout(timeout)
			.build()
			.map_err(|e| Error::Transport(e.to_string()))?;

		Ok(Self { client })
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
		let method = match request.method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
		};

		let mut builder = self.client.request(method, request.url);
		for (name, value) in request.headers {
			builder = builder.header(name, value);
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await.map_err(|e| Error::Transport(e.to_string()))?;

		let url = response.url().clone();
		let status = response.status();
		let headers = response
			.headers()
			.iter()
			.map(|(name, value)| (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
			.collect();
		let body = response.bytes().await.map_err(|e| Error::Transport(e.to_string()))?;

		Ok(RawResponse {
			url,
			status,
			headers,
			body,
		})
	}
}
