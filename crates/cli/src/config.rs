//! TOML configuration for the command-line client.
//!
//! Every key is optional:
//!
//! ```toml
//! base_url = "https://godbolt.org"
//! request_timeout_secs = 30
//! debounce_ms = 500
//! shortlink_timeout_secs = 10
//! history_path = "/home/me/.local/share/godbolt/shortlinks.toml"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use godbolt_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use godbolt_pipeline::{DEFAULT_DEBOUNCE, DEFAULT_SHORTLINK_TIMEOUT, PipelineConfig};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const CONFIG_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "shortlinks.toml";
const APP_DIR: &str = "godbolt";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or values.
	#[error("invalid configuration in {path}: {error}")]
	Parse {
		path: PathBuf,
		error: toml::de::Error,
	},

	/// `base_url` is not a URL.
	#[error("invalid base_url {url:?}: {error}")]
	InvalidUrl { url: String, error: url::ParseError },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings read from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub base_url: String,
	pub request_timeout_secs: u64,
	pub debounce_ms: u64,
	pub shortlink_timeout_secs: u64,
	pub history_path: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
			debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(u64::MAX),
			shortlink_timeout_secs: DEFAULT_SHORTLINK_TIMEOUT.as_secs(),
			history_path: None,
		}
	}
}

/// Default location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl Config {
	/// Loads `explicit`, or the default file when it exists, or the defaults.
	///
	/// An explicitly named file must exist.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::read(path),
			None => match default_config_path() {
				Some(path) if path.is_file() => Self::read(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	fn read(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&content, path)
	}

	/// Parses TOML `content` read from `path`.
	pub fn parse(content: &str, path: &Path) -> Result<Self> {
		toml::from_str(content).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})
	}

	pub fn client_config(&self) -> Result<ClientConfig> {
		let base_url = Url::parse(&self.base_url).map_err(|error| ConfigError::InvalidUrl {
			url: self.base_url.clone(),
			error,
		})?;
		Ok(ClientConfig {
			base_url: base_url.into(),
			request_timeout: Duration::from_secs(self.request_timeout_secs),
		})
	}

	pub fn pipeline_config(&self) -> PipelineConfig {
		PipelineConfig {
			debounce: Duration::from_millis(self.debounce_ms),
		}
	}

	pub fn shortlink_timeout(&self) -> Duration {
		Duration::from_secs(self.shortlink_timeout_secs)
	}

	/// Shortlink history file, if one can be located.
	pub fn history_path(&self) -> Option<PathBuf> {
		self.history_path
			.clone()
			.or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join(HISTORY_FILE)))
	}
}
