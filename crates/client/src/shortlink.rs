//! Local validation of pasted shortlink URLs.

use url::Url;

use crate::error::{Error, Result};

/// Path segment that marks a shortlink, as in `https://godbolt.org/z/abc123`.
pub const SHORTLINK_MARKER: &str = "z";

/// Validates `input` as a shortlink on `domain` and returns its link id.
///
/// The input must parse as a URL whose host contains `domain` and whose path
/// is exactly `/z/<id>` (a single trailing slash is tolerated). Nothing is
/// sent over the network.
pub fn parse_shortlink(input: &str, domain: &str) -> Result<String> {
	let invalid = || Error::InvalidShortlink(input.to_string());

	let url = Url::parse(input.trim()).map_err(|_| invalid())?;
	let host = url.host_str().ok_or_else(invalid)?;
	if !host.contains(domain) {
		return Err(invalid());
	}

	let mut segments: Vec<&str> = url.path_segments().ok_or_else(invalid)?.collect();
	if segments.last() == Some(&"") {
		segments.pop();
	}
	match segments.as_slice() {
		[marker, id] if *marker == SHORTLINK_MARKER && !id.is_empty() => Ok((*id).to_string()),
		_ => Err(invalid()),
	}
}
