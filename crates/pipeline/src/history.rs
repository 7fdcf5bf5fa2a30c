//! Most-recently-used shortlink list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of shortlinks remembered.
pub const HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
	#[serde(default)]
	previous_shortlinks: Vec<String>,
}

/// Shortlinks the user resolved, most recent first, optionally persisted to a
/// TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortlinkHistory {
	entries: Vec<String>,
	path: Option<PathBuf>,
}

impl ShortlinkHistory {
	/// Creates an empty history that is never written to disk.
	pub fn in_memory() -> Self {
		Self::default()
	}

	/// Loads the history stored at `path`; a missing file yields an empty list.
	///
	/// Later [`save`](Self::save) calls write back to `path`.
	pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let entries = match std::fs::read_to_string(&path) {
			Ok(content) => {
				let file: HistoryFile = toml::from_str(&content).map_err(|error| Error::HistoryParse {
					path: path.clone(),
					error,
				})?;
				file.previous_shortlinks
			}
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
			Err(error) => return Err(Error::HistoryIo { path, error }),
		};

		let mut history = Self {
			entries,
			path: Some(path),
		};
		history.entries.truncate(HISTORY_CAPACITY);
		Ok(history)
	}

	/// Remembered shortlinks, most recent first.
	pub fn entries(&self) -> &[String] {
		&self.entries
	}

	/// Backing file, if any.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Inserts `link` at the front, dropping the oldest beyond capacity.
	pub fn push(&mut self, link: impl Into<String>) {
		self.entries.insert(0, link.into());
		self.entries.truncate(HISTORY_CAPACITY);
	}

	/// Writes the list to the backing file. No-op for in-memory histories.
	pub fn save(&self) -> Result<()> {
		let Some(path) = &self.path else {
			return Ok(());
		};
		let content = toml::to_string(&HistoryFile {
			previous_shortlinks: self.entries.clone(),
		})?;
		let io_err = |error| Error::HistoryIo {
			path: path.clone(),
			error,
		};
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).map_err(io_err)?;
		}
		std::fs::write(path, content).map_err(io_err)
	}
}
