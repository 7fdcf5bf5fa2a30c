//! Declarative descriptions of API operations.
//!
//! An [`Endpoint`] fixes everything about one logical call: its path relative
//! to the base host, its method, the optional body and how to encode it, and
//! how to decode both the success payload and the structured error. It has no
//! behaviour of its own; [`Client::perform`](crate::Client::perform) turns it
//! into an HTTP exchange.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result, ServerError};
use crate::model::{CompilationResult, Compiler, Language, SessionContainer, Shortlink, Source};
use crate::transport::RawResponse;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	Get,
	Post,
}

impl HttpMethod {
	/// Returns the method name as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
		}
	}
}

impl std::fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Description of one API operation.
pub trait Endpoint {
	/// HTTP method.
	const METHOD: HttpMethod;

	/// Request body type. Endpoints without a body use `()`.
	type Body: Serialize;

	/// Decoded success payload.
	type Output: DeserializeOwned;

	/// Path relative to the base host, starting with `/`.
	fn path(&self) -> String;

	/// Request body, if any.
	fn body(&self) -> Option<Self::Body> {
		None
	}

	/// Serializes the body to JSON bytes.
	///
	/// A failure here is an [`Error::Encode`] and the request is never sent.
	fn encode_body(&self) -> Result<Option<Vec<u8>>> {
		self.body()
			.map(|body| serde_json::to_vec(&body))
			.transpose()
			.map_err(Error::Encode)
	}

	/// Decodes a success body.
	fn decode_output(body: &[u8]) -> serde_json::Result<Self::Output> {
		serde_json::from_slice(body)
	}

	/// Decodes a structured error body.
	fn decode_error(body: &[u8]) -> serde_json::Result<ServerError> {
		serde_json::from_slice(body)
	}

	/// Turns a raw response into the operation's outcome.
	///
	/// Any 2xx status decodes the success payload; a body that does not match
	/// is an [`Error::Decode`]. Any other status decodes a structured error,
	/// falling back to [`ServerError::for_status`] when the body is not one.
	fn extract(response: RawResponse) -> Result<Self::Output> {
		if response.status.is_success() {
			return Self::decode_output(&response.body).map_err(Error::Decode);
		}
		let error = Self::decode_error(&response.body).unwrap_or_else(|_| ServerError::for_status(response.status));
		Err(Error::Server(error))
	}
}

/// `GET /api/languages`
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguagesRequest;

impl Endpoint for LanguagesRequest {
	const METHOD: HttpMethod = HttpMethod::Get;
	type Body = ();
	type Output = Vec<Language>;

	fn path(&self) -> String {
		"/api/languages".to_string()
	}
}

/// `GET /api/compilers/{language}`; without a language, every compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompilersRequest<'a> {
	pub language: Option<&'a Language>,
}

impl Endpoint for CompilersRequest<'_> {
	const METHOD: HttpMethod = HttpMethod::Get;
	type Body = ();
	type Output = Vec<Compiler>;

	fn path(&self) -> String {
		format!("/api/compilers/{}", self.language.map_or("", |language| language.id.as_str()))
	}
}

/// `POST /api/compiler/{compiler}/compile`
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
	pub compiler: &'a Compiler,
	pub source: &'a Source,
}

impl<'a> Endpoint for CompileRequest<'a> {
	const METHOD: HttpMethod = HttpMethod::Post;
	type Body = &'a Source;
	type Output = CompilationResult;

	fn path(&self) -> String {
		format!("/api/compiler/{}/compile", self.compiler.id)
	}

	fn body(&self) -> Option<Self::Body> {
		Some(self.source)
	}
}

/// `GET /api/shortlinkinfo/{link}`
#[derive(Debug, Clone, Copy)]
pub struct ShortlinkInfoRequest<'a> {
	pub link_id: &'a str,
}

impl Endpoint for ShortlinkInfoRequest<'_> {
	const METHOD: HttpMethod = HttpMethod::Get;
	type Body = ();
	type Output = SessionContainer;

	fn path(&self) -> String {
		format!("/api/shortlinkinfo/{}", self.link_id)
	}
}

/// `POST /shortener` with a single-session container built from the inputs.
///
/// The body is a pure function of the compiler and source, so retrying with
/// the same inputs sends an identical request.
#[derive(Debug, Clone, Copy)]
pub struct CreateShortlinkRequest<'a> {
	pub compiler: &'a Compiler,
	pub source: &'a Source,
}

impl Endpoint for CreateShortlinkRequest<'_> {
	const METHOD: HttpMethod = HttpMethod::Post;
	type Body = SessionContainer;
	type Output = Shortlink;

	fn path(&self) -> String {
		"/shortener".to_string()
	}

	fn body(&self) -> Option<Self::Body> {
		Some(SessionContainer::single(self.compiler, self.source))
	}
}
