//! Wire types exchanged with the compiler service.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// A source language known to the service. Unique by `id`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Language {
	/// Service identifier, e.g. `c++`.
	pub id: String,
	/// Display name, e.g. `C++`.
	pub name: String,
}

impl Language {
	/// Creates a language.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
		}
	}
}

impl PartialEq for Language {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Hash for Language {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

/// A compiler offered by the service. Unique by `id`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Compiler {
	/// Service identifier, e.g. `g132`.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Identifier of the language this compiler accepts.
	#[serde(rename = "lang")]
	pub language: String,
}

impl PartialEq for Compiler {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Hash for Compiler {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

/// Compiler invocation options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
	/// Free-form arguments passed to the compiler.
	pub user_arguments: String,
	/// Output filters.
	pub filters: Filter,
}

impl Options {
	/// Creates compiler options.
	pub fn new(user_arguments: impl Into<String>, filters: Filter) -> Self {
		Self {
			user_arguments: user_arguments.into(),
			filters,
		}
	}
}

/// Payload of a compile request: the source text and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
	/// Source text.
	pub source: String,
	/// Compiler options.
	pub options: Options,
}

impl Source {
	/// Creates a compile payload.
	pub fn new(source: impl Into<String>, options: Options) -> Self {
		Self {
			source: source.into(),
			options,
		}
	}
}

/// Location and text of a parsed compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub line: u32,
	pub column: u32,
	pub text: String,
}

/// One line of compiler stdout or stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoStreamLine {
	pub text: String,
	/// Present when the line is a diagnostic.
	#[serde(default)]
	pub tag: Option<Diagnostic>,
}

/// Source position an assembly line was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
	#[serde(default)]
	pub file: Option<String>,
	pub line: u32,
}

/// Column span of a label reference inside an assembly line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRange {
	pub start_col: u32,
	pub end_col: u32,
}

/// A label referenced by an assembly line, e.g. `.L2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
	pub name: String,
	pub range: LabelRange,
}

/// One line of generated assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyLine {
	pub text: String,
	#[serde(default)]
	pub source: Option<SourceLocation>,
	#[serde(default)]
	pub labels: Vec<Label>,
}

/// Result of a single compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
	/// Compiler exit code.
	pub code: i32,
	/// Generated assembly.
	pub asm: Vec<AssemblyLine>,
	#[serde(default)]
	pub stdout: Vec<IoStreamLine>,
	#[serde(default)]
	pub stderr: Vec<IoStreamLine>,
	/// Whether the service may cache this result.
	#[serde(default)]
	pub ok_to_cache: bool,
	#[serde(default)]
	pub input_filename: String,
	/// Full compiler command line.
	#[serde(default)]
	pub compilation_options: Vec<String>,
	/// Size of the generated assembly in bytes.
	#[serde(default)]
	pub asm_size: u64,
	/// Line number at which each label is defined.
	#[serde(default)]
	pub label_definitions: BTreeMap<String, u32>,
}

impl CompilationResult {
	/// Joins the assembly lines into display text.
	pub fn assembly_text(&self) -> String {
		self.asm.iter().map(|line| line.text.as_str()).collect::<Vec<_>>().join("\n")
	}
}

/// Saved compiler state inside a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCompiler {
	/// Compiler identifier.
	pub id: String,
	/// Compiler argument string.
	pub options: String,
	pub filters: Filter,
	#[serde(default)]
	pub libs: Vec<serde_json::Value>,
	#[serde(default)]
	pub specialoutputs: Vec<serde_json::Value>,
	#[serde(default)]
	pub tools: Vec<serde_json::Value>,
}

/// One restorable editor: source text plus its compilers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	pub id: i64,
	/// Language identifier.
	pub language: String,
	pub source: String,
	#[serde(default)]
	pub conformanceview: bool,
	pub compilers: Vec<SessionCompiler>,
}

impl Session {
	/// The first compiler of the session, which drives restoration.
	pub fn primary_compiler(&self) -> Option<&SessionCompiler> {
		self.compilers.first()
	}
}

/// Snapshot of one or more sessions, as stored behind a shortlink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContainer {
	pub sessions: Vec<Session>,
}

impl SessionContainer {
	/// Wraps a single compiler and source into a container.
	pub fn single(compiler: &Compiler, source: &Source) -> Self {
		let session_compiler = SessionCompiler {
			id: compiler.id.clone(),
			options: source.options.user_arguments.clone(),
			filters: source.options.filters,
			libs: Vec::new(),
			specialoutputs: Vec::new(),
			tools: Vec::new(),
		};
		let session = Session {
			id: 1,
			language: compiler.language.clone(),
			source: source.source.clone(),
			conformanceview: false,
			compilers: vec![session_compiler],
		};
		Self { sessions: vec![session] }
	}
}

/// A created shortlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortlink {
	pub url: String,
}
