//! Error types for pipeline and shortlink operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by explicit pipeline operations.
///
/// The live compile loop never returns these; its failures go to
/// [`CompilePipeline::subscribe_errors`](crate::CompilePipeline::subscribe_errors).
#[derive(Debug, Error)]
pub enum Error {
	/// No compiler is available for the current language.
	#[error("no compiler selected")]
	NoCompiler,
	/// An API operation failed.
	#[error(transparent)]
	Api(#[from] godbolt_client::Error),
	/// Reading the shortlink history file failed.
	#[error("I/O error on shortlink history {path}: {error}")]
	HistoryIo {
		/// Path of the history file.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
	/// The shortlink history file is not valid TOML.
	#[error("malformed shortlink history {path}: {error}")]
	HistoryParse {
		/// Path of the history file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},
	/// The shortlink history could not be serialized.
	#[error("failed to serialize shortlink history: {0}")]
	HistorySerialize(#[from] toml::ser::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
