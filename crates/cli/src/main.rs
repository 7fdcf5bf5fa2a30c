//! `godbolt`: a Compiler Explorer command-line client.

mod cli;
mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::Config;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
	if let Some(base_url) = cli.base_url {
		config.base_url = base_url;
	}
	debug!(?config, "configuration loaded");

	commands::run(cli.command, &config).await
}

/// Log directives used when `GODBOLT_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
	if verbose {
		"godbolt=debug,godbolt_client=debug,godbolt_pipeline=debug,info"
	} else {
		"godbolt=info,warn"
	}
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("GODBOLT_LOG").unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
	};

	// GODBOLT_LOG_DIR sends logs to a per-process file instead of stderr.
	if let Some(log_dir) = std::env::var("GODBOLT_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("godbolt.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
