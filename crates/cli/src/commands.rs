//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use godbolt_client::{Client, Language, SessionContainer, catalog};
use godbolt_pipeline::{CompilePipeline, ShortlinkFlow, ShortlinkHistory};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::cli::{Command, ShortlinkAction, SourceArgs};
use crate::config::Config;

pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
	let client = Arc::new(Client::new(&config.client_config()?).context("failed to build HTTP client")?);
	debug!(base_url = %client.base_url(), "client ready");

	match command {
		Command::Languages => languages(&client).await,
		Command::Compilers { language } => compilers(&client, language.as_deref()).await,
		Command::Compile(args) => compile(client, config, &args).await,
		Command::Watch { source, poll_ms } => watch(client, config, &source, Duration::from_millis(poll_ms)).await,
		Command::Shortlink {
			action: ShortlinkAction::Open { url, compile },
		} => open_shortlink(client, config, &url, compile).await,
		Command::Shortlink {
			action: ShortlinkAction::Create(args),
		} => create_shortlink(client, config, &args).await,
		Command::History => history(config),
	}
}

fn language_by_id(id: &str) -> Language {
	catalog::language(id).unwrap_or_else(|| Language::new(id, id))
}

async fn languages(client: &Client) -> anyhow::Result<()> {
	for language in client.languages().await.context("failed to list languages")? {
		println!("{}\t{}", language.id, language.name);
	}
	Ok(())
}

async fn compilers(client: &Client, language: Option<&str>) -> anyhow::Result<()> {
	let language = language.map(language_by_id);
	let compilers = client
		.compilers(language.as_ref())
		.await
		.context("failed to list compilers")?;
	for compiler in compilers {
		println!("{}\t{}\t{}", compiler.id, compiler.language, compiler.name);
	}
	Ok(())
}

async fn read_source(path: &Path) -> anyhow::Result<String> {
	tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("failed to read {}", path.display()))
}

/// Loads the compilers for the source's language and applies the compiler
/// settings from `args`.
async fn prepare(pipeline: &CompilePipeline, args: &SourceArgs) -> anyhow::Result<()> {
	match &args.language {
		Some(id) => {
			pipeline.set_language(Some(language_by_id(id)));
			pipeline.refresh_compilers().await?;
		}
		None => {
			let ext = args.file.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
			pipeline.update_file_extension(ext).await?;
		}
	}

	let index = pipeline
		.available_compilers()
		.iter()
		.position(|compiler| compiler.id == args.compiler)
		.with_context(|| {
			let language = pipeline.language().map_or_else(|| "any language".to_string(), |l| l.name);
			format!("compiler {} is not available for {language}", args.compiler)
		})?;
	pipeline.select_compiler(index);
	pipeline.set_compiler_options(args.options.clone());
	pipeline.set_toggles(args.filters.toggles());
	Ok(())
}

async fn compile(client: Arc<Client>, config: &Config, args: &SourceArgs) -> anyhow::Result<()> {
	let text = read_source(&args.file).await?;
	let pipeline = CompilePipeline::spawn(client, config.pipeline_config());
	pipeline.set_live_compile(false);
	prepare(&pipeline, args).await?;
	pipeline.set_text(text);
	compile_once(&pipeline).await
}

/// Forces one compile of the current inputs and prints the assembly.
async fn compile_once(pipeline: &CompilePipeline) -> anyhow::Result<()> {
	if pipeline.text().is_empty() {
		bail!("nothing to compile");
	}
	if pipeline.selected_compiler().is_none() {
		bail!("no compiler selected");
	}

	let mut output = pipeline.subscribe_output();
	let mut errors = pipeline.subscribe_errors();
	pipeline.recompile();

	tokio::select! {
		changed = output.changed() => {
			changed?;
			println!("{}", *output.borrow());
		}
		err = errors.recv() => bail!("compilation failed: {}", err?),
	}
	Ok(())
}

async fn watch(client: Arc<Client>, config: &Config, args: &SourceArgs, poll: Duration) -> anyhow::Result<()> {
	let pipeline = CompilePipeline::spawn(client, config.pipeline_config());
	prepare(&pipeline, args).await?;

	let mut output = pipeline.subscribe_output();
	let mut errors = pipeline.subscribe_errors();
	let mut ticker = tokio::time::interval(poll);
	let mut last_text = None;
	info!(file = %args.file.display(), "watching for changes, press Ctrl-C to stop");

	loop {
		tokio::select! {
			_ = ticker.tick() => match read_source(&args.file).await {
				Ok(text) if last_text.as_ref() != Some(&text) => {
					last_text = Some(text.clone());
					pipeline.set_text(text);
				}
				Ok(_) => {}
				Err(err) => warn!(error = %err, "could not read source"),
			},
			changed = output.changed() => {
				changed?;
				println!("{}\n", *output.borrow_and_update());
			}
			err = errors.recv() => match err {
				Ok(err) => eprintln!("compilation failed: {err}"),
				Err(RecvError::Lagged(skipped)) => debug!(skipped, "missed compile errors"),
				Err(RecvError::Closed) => break,
			},
			_ = tokio::signal::ctrl_c() => break,
		}
	}
	Ok(())
}

fn load_history(config: &Config) -> ShortlinkHistory {
	let Some(path) = config.history_path() else {
		return ShortlinkHistory::in_memory();
	};
	ShortlinkHistory::load(&path).unwrap_or_else(|err| {
		warn!(error = %err, "ignoring unreadable shortlink history");
		ShortlinkHistory::in_memory()
	})
}

fn print_sessions(container: &SessionContainer) {
	for session in &container.sessions {
		println!("language: {}", session.language);
		for compiler in &session.compilers {
			println!("compiler: {} {}", compiler.id, compiler.options);
		}
		println!("\n{}\n", session.source);
	}
}

async fn open_shortlink(client: Arc<Client>, config: &Config, url: &str, compile: bool) -> anyhow::Result<()> {
	let flow = ShortlinkFlow::new(Arc::clone(&client), load_history(config), config.shortlink_timeout());
	if !flow.resolve(url).await {
		bail!("{}", flow.error_text());
	}
	let Some(container) = flow.session() else {
		return Ok(());
	};
	print_sessions(&container);
	if !compile {
		return Ok(());
	}

	let session = container.sessions.first().context("shortlink holds no sessions")?;
	let compiler = session.primary_compiler().context("session has no compiler")?;
	let pipeline = CompilePipeline::spawn(client, config.pipeline_config());
	pipeline.set_live_compile(false);
	pipeline.load_session(session, compiler).await?;
	compile_once(&pipeline).await
}

async fn create_shortlink(client: Arc<Client>, config: &Config, args: &SourceArgs) -> anyhow::Result<()> {
	let text = read_source(&args.file).await?;
	let pipeline = CompilePipeline::spawn(client, config.pipeline_config());
	pipeline.set_live_compile(false);
	prepare(&pipeline, args).await?;
	pipeline.set_text(text);

	let mut errors = pipeline.subscribe_errors();
	match pipeline.compute_shortlink().await {
		Some(url) => {
			println!("{url}");
			Ok(())
		}
		None => match errors.try_recv() {
			Ok(err) => bail!("failed to create shortlink: {err}"),
			Err(_) => bail!("failed to create shortlink"),
		},
	}
}

fn history(config: &Config) -> anyhow::Result<()> {
	let history = match config.history_path() {
		Some(path) => ShortlinkHistory::load(path)?,
		None => ShortlinkHistory::in_memory(),
	};
	for link in history.entries() {
		println!("{link}");
	}
	Ok(())
}
