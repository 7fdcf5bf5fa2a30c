use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use godbolt_client::{AsmSyntax, FilterToggles};

#[derive(Parser, Debug)]
#[command(name = "godbolt")]
#[command(about = "Compile snippets on Compiler Explorer and share them")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to <config dir>/godbolt/config.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Service URL, overriding the configuration
	#[arg(long, global = true, value_name = "URL")]
	pub base_url: Option<String>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// List languages known to the service
	Languages,
	/// List compilers, optionally for one language
	Compilers {
		/// Language id, e.g. `c++`
		#[arg(long, short)]
		language: Option<String>,
	},
	/// Compile a file once and print the assembly
	Compile(SourceArgs),
	/// Recompile a file whenever it changes
	Watch {
		#[command(flatten)]
		source: SourceArgs,

		/// How often to check the file for changes, in milliseconds
		#[arg(long, default_value_t = 250)]
		poll_ms: u64,
	},
	/// Open or create shortlinks
	Shortlink {
		/// Shortlink subcommand action.
		#[command(subcommand)]
		action: ShortlinkAction,
	},
	/// Show recently opened shortlinks
	History,
}

/// Shortlink subcommands.
#[derive(Subcommand, Debug)]
pub enum ShortlinkAction {
	/// Fetch the session behind a shortlink
	Open {
		/// Shortlink, e.g. https://godbolt.org/z/abc123
		url: String,

		/// Also compile the first session and print its assembly
		#[arg(long)]
		compile: bool,
	},
	/// Store a file and its compiler settings as a new shortlink
	Create(SourceArgs),
}

/// Source file and compiler settings shared by compiling commands.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
	/// Source file; its extension picks the language unless --language is given
	pub file: PathBuf,

	/// Compiler id, e.g. `g132`
	#[arg(long, short)]
	pub compiler: String,

	/// Language id, overriding the file extension
	#[arg(long, short)]
	pub language: Option<String>,

	/// Compiler arguments
	#[arg(long, short, default_value = "", allow_hyphen_values = true)]
	pub options: String,

	#[command(flatten)]
	pub filters: FilterArgs,
}

/// Output filter switches. Labels and directives are stripped unless kept.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FilterArgs {
	/// Emit AT&T syntax instead of Intel
	#[arg(long)]
	pub att: bool,
	/// Demangle symbol names
	#[arg(long)]
	pub demangle: bool,
	/// Strip comment-only lines
	#[arg(long)]
	pub strip_comments: bool,
	/// Collapse runs of whitespace
	#[arg(long)]
	pub trim: bool,
	/// Keep unused labels
	#[arg(long)]
	pub keep_labels: bool,
	/// Keep assembler directives
	#[arg(long)]
	pub keep_directives: bool,
}

impl FilterArgs {
	pub fn toggles(self) -> FilterToggles {
		FilterToggles {
			syntax: if self.att { AsmSyntax::Att } else { AsmSyntax::Intel },
			labels: !self.keep_labels,
			directives: !self.keep_directives,
			comments: self.strip_comments,
			demangle: self.demangle,
			trim: self.trim,
		}
	}
}
