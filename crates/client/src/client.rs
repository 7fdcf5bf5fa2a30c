//! The API client and its domain operations.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, trace};
use url::Url;

use crate::activity::NetworkActivity;
use crate::endpoint::{
	CompileRequest, CompilersRequest, CreateShortlinkRequest, Endpoint, LanguagesRequest, ShortlinkInfoRequest,
};
use crate::error::Result;
use crate::model::{CompilationResult, Compiler, Language, SessionContainer, Shortlink, Source};
use crate::shortlink::parse_shortlink;
use crate::transport::{HttpRequest, HttpTransport, JSON_CONTENT_TYPE, Transport};

/// Default service host.
pub const DEFAULT_BASE_URL: &str = "https://godbolt.org";

/// Default per-request timeout of the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for building a [`Client`] over HTTP.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Base URL every endpoint path is appended to. Parsed by [`Client::new`].
	pub base_url: String,
	/// Per-request timeout.
	pub request_timeout: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}
}

/// Client for the compiler service.
///
/// Build one per process and share it through an [`Arc`]; the underlying
/// transport pools connections.
#[derive(Clone)]
pub struct Client {
	transport: Arc<dyn Transport>,
	base_url: Url,
	activity: NetworkActivity,
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("base_url", &self.base_url.as_str())
			.field("in_flight", &self.activity.in_flight())
			.finish()
	}
}

impl Client {
	/// Creates a client talking HTTP to `config.base_url`.
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let base_url = Url::parse(&config.base_url)?;
		let transport = HttpTransport::new(config.request_timeout)?;
		Ok(Self::with_transport(base_url, Arc::new(transport)))
	}

	/// Creates a client over an arbitrary transport.
	pub fn with_transport(base_url: Url, transport: Arc<dyn Transport>) -> Self {
		Self {
			transport,
			base_url,
			activity: NetworkActivity::new(),
		}
	}

	/// Base URL of the service.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Host of the base URL, used to recognise shortlinks.
	pub fn domain(&self) -> &str {
		self.base_url.host_str().unwrap_or_default()
	}

	/// In-flight request indicator shared by every call on this client.
	pub fn activity(&self) -> &NetworkActivity {
		&self.activity
	}

	/// Builds the request for `endpoint` without sending it.
	pub fn build_request<E: Endpoint>(&self, endpoint: &E) -> Result<HttpRequest> {
		let body = endpoint.encode_body()?;
		let url = Url::parse(&format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint.path()))?;
		Ok(HttpRequest {
			method: E::METHOD,
			url,
			headers: vec![("Content-Type", JSON_CONTENT_TYPE.to_string())],
			body,
		})
	}

	/// Performs `endpoint` and extracts its result.
	///
	/// The request is sent at most once. Encoding failures return before
	/// anything is sent.
	pub async fn perform<E: Endpoint>(&self, endpoint: &E) -> Result<E::Output> {
		let request = match self.build_request(endpoint) {
			Ok(request) => request,
			Err(err) => {
				error!(path = %endpoint.path(), error = %err, "could not build request");
				return Err(err);
			}
		};
		trace!("performing HTTP request:\n{}", request.raw_description());

		let response = {
			let _activity = self.activity.begin();
			self.transport.send(request).await
		};

		let response = match response {
			Ok(response) => response,
			Err(err) => {
				trace!(error = %err, "request failed");
				return Err(err);
			}
		};
		trace!("received response:\n{}", response.raw_description());

		E::extract(response)
	}

	/// Lists languages.
	pub async fn languages(&self) -> Result<Vec<Language>> {
		self.perform(&LanguagesRequest).await
	}

	/// Lists compilers for `language`, or every compiler for `None`.
	pub async fn compilers(&self, language: Option<&Language>) -> Result<Vec<Compiler>> {
		self.perform(&CompilersRequest { language }).await
	}

	/// Compiles `source` with `compiler`.
	pub async fn compile(&self, compiler: &Compiler, source: &Source) -> Result<CompilationResult> {
		self.perform(&CompileRequest { compiler, source }).await
	}

	/// Fetches the sessions stored behind `link_id`.
	pub async fn shortlink_info(&self, link_id: &str) -> Result<SessionContainer> {
		self.perform(&ShortlinkInfoRequest { link_id }).await
	}

	/// Validates pasted text as a shortlink on this host, then fetches it.
	///
	/// Invalid input fails with [`Error::InvalidShortlink`](crate::Error::InvalidShortlink)
	/// without a request.
	pub async fn resolve_shortlink(&self, input: &str) -> Result<SessionContainer> {
		let link_id = parse_shortlink(input, self.domain())?;
		self.shortlink_info(&link_id).await
	}

	/// Stores `compiler` and `source` as a new shortlink.
	pub async fn create_shortlink(&self, compiler: &Compiler, source: &Source) -> Result<Shortlink> {
		self.perform(&CreateShortlinkRequest { compiler, source }).await
	}
}
