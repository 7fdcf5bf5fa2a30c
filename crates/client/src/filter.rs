//! Output filters applied by the compiler service to generated assembly.
//!
//! In memory the six filters are a [`Filter`] bitset. On the wire they are a
//! JSON object with one named boolean per filter, so the bit layout never
//! leaks into the protocol. Encoding and decoding test and set each named flag
//! explicitly through [`FilterWire`].

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
	/// Set of assembly output filters.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Filter: u32 {
		/// Emit Intel syntax instead of AT&T.
		const INTEL = 1 << 0;
		/// Demangle symbol names.
		const DEMANGLE = 1 << 1;
		/// Strip assembler directives.
		const DIRECTIVES = 1 << 2;
		/// Strip comment-only lines.
		const COMMENTS = 1 << 3;
		/// Strip unused labels.
		const LABELS = 1 << 4;
		/// Collapse runs of whitespace.
		const TRIM = 1 << 5;
	}
}

/// Wire shape of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct FilterWire {
	intel: bool,
	demangle: bool,
	directives: bool,
	comments: bool,
	labels: bool,
	trim: bool,
}

impl From<Filter> for FilterWire {
	fn from(filter: Filter) -> Self {
		Self {
			intel: filter.contains(Filter::INTEL),
			demangle: filter.contains(Filter::DEMANGLE),
			directives: filter.contains(Filter::DIRECTIVES),
			comments: filter.contains(Filter::COMMENTS),
			labels: filter.contains(Filter::LABELS),
			trim: filter.contains(Filter::TRIM),
		}
	}
}

impl From<FilterWire> for Filter {
	fn from(wire: FilterWire) -> Self {
		let mut filter = Filter::empty();
		filter.set(Filter::INTEL, wire.intel);
		filter.set(Filter::DEMANGLE, wire.demangle);
		filter.set(Filter::DIRECTIVES, wire.directives);
		filter.set(Filter::COMMENTS, wire.comments);
		filter.set(Filter::LABELS, wire.labels);
		filter.set(Filter::TRIM, wire.trim);
		filter
	}
}

impl Serialize for Filter {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		FilterWire::from(*self).serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Filter {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		FilterWire::deserialize(deserializer).map(Self::from)
	}
}

/// Assembly syntax flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AsmSyntax {
	/// Intel operand order.
	#[default]
	Intel,
	/// AT&T operand order.
	Att,
}

/// The individual filter controls a user edits, collapsed into a [`Filter`]
/// per compile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterToggles {
	/// Assembly syntax.
	pub syntax: AsmSyntax,
	/// Strip unused labels.
	pub labels: bool,
	/// Strip assembler directives.
	pub directives: bool,
	/// Strip comment-only lines.
	pub comments: bool,
	/// Demangle symbol names.
	pub demangle: bool,
	/// Collapse runs of whitespace.
	pub trim: bool,
}

impl Default for FilterToggles {
	fn default() -> Self {
		Self {
			syntax: AsmSyntax::Intel,
			labels: true,
			directives: true,
			comments: false,
			demangle: false,
			trim: false,
		}
	}
}

impl FilterToggles {
	/// Collapses the toggles into a filter set.
	pub fn to_filter(self) -> Filter {
		let mut filter = Filter::empty();
		filter.set(Filter::INTEL, self.syntax == AsmSyntax::Intel);
		filter.set(Filter::LABELS, self.labels);
		filter.set(Filter::DIRECTIVES, self.directives);
		filter.set(Filter::COMMENTS, self.comments);
		filter.set(Filter::DEMANGLE, self.demangle);
		filter.set(Filter::TRIM, self.trim);
		filter
	}

	/// Expands a filter set back into toggles.
	pub fn from_filter(filter: Filter) -> Self {
		Self {
			syntax: if filter.contains(Filter::INTEL) { AsmSyntax::Intel } else { AsmSyntax::Att },
			labels: filter.contains(Filter::LABELS),
			directives: filter.contains(Filter::DIRECTIVES),
			comments: filter.contains(Filter::COMMENTS),
			demangle: filter.contains(Filter::DEMANGLE),
			trim: filter.contains(Filter::TRIM),
		}
	}
}
