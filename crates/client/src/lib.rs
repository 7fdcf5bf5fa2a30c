//! Typed client for the [Compiler Explorer] HTTP API.
//!
//! [Compiler Explorer]: https://godbolt.org
//!
//! Every API operation is described declaratively by an [`Endpoint`]: its
//! path, method, body and result types. [`Client::perform`] turns a descriptor
//! into one HTTP exchange over a [`Transport`] and maps the raw response to
//! either the decoded payload or an [`Error`]:
//!
//! - 2xx: decode the success type, a mismatch is [`Error::Decode`].
//! - anything else: decode a structured [`ServerError`], falling back to the
//!   canonical reason phrase of the status code.
//!
//! The five domain operations ([`Client::languages`], [`Client::compilers`],
//! [`Client::compile`], [`Client::shortlink_info`] and
//! [`Client::create_shortlink`]) are thin instantiations of that machinery.
//!
//! ## Cargo features
//!
//! - `testing`: exports [`transport::ScriptedTransport`], an in-memory
//!   transport answering from a closure.

pub mod activity;
pub mod catalog;
mod client;
pub mod endpoint;
mod error;
pub mod filter;
pub mod model;
pub mod shortlink;
pub mod transport;

pub use activity::{ActivityGuard, NetworkActivity};
pub use client::{Client, ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use endpoint::{Endpoint, HttpMethod};
pub use error::{Error, Result, ServerError};
pub use filter::{AsmSyntax, Filter, FilterToggles};
pub use model::{CompilationResult, Compiler, Language, Options, Session, SessionCompiler, SessionContainer, Shortlink, Source};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use url::Url;
