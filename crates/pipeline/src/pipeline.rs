//! Debounced live compilation.
//!
//! [`CompilePipeline`] owns the editor inputs (source text, language,
//! compiler selection, options, filter toggles). Every input change notifies a
//! driver task which waits for a quiet window, snapshots the inputs and
//! dispatches one compile. A newer dispatch cancels the previous one, and only
//! the newest generation may publish its assembly.

use std::sync::Arc;
use std::time::Duration;

use godbolt_client::{
	Client, CompilationResult, Compiler, FilterToggles, Language, Options, Session, SessionCompiler, Source, catalog,
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::generation::Supersession;

/// Quiet window after the last input change before a compile is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	/// Debounce window.
	pub debounce: Duration,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
	Edit,
	Force,
}

#[derive(Debug)]
struct EditorState {
	text: String,
	language: Option<Language>,
	compilers: Vec<Compiler>,
	selected: usize,
	options: String,
	toggles: FilterToggles,
	live: bool,
	shortlink: String,
	/// Bumped on every compile input change.
	revision: u64,
}

impl Default for EditorState {
	fn default() -> Self {
		Self {
			text: String::new(),
			language: None,
			compilers: Vec::new(),
			selected: 0,
			options: String::new(),
			toggles: FilterToggles::default(),
			live: true,
			shortlink: String::new(),
			revision: 0,
		}
	}
}

impl EditorState {
	/// Records a compile input change. Any shortlink belonged to the old inputs.
	fn touch(&mut self) {
		self.revision = self.revision.wrapping_add(1);
		self.shortlink.clear();
	}

	fn selected_compiler(&self) -> Option<&Compiler> {
		self.compilers.get(self.selected)
	}

	/// Swaps the compiler list, keeping the selection by id when still offered.
	fn replace_compilers(&mut self, compilers: Vec<Compiler>) {
		let selected = self.selected_compiler().map(|compiler| compiler.id.clone());
		self.selected = selected
			.and_then(|id| compilers.iter().position(|compiler| compiler.id == id))
			.unwrap_or(0);
		self.compilers = compilers;
		self.touch();
	}

	fn accepts(&self, trigger: Trigger) -> bool {
		!self.text.is_empty() && (self.live || trigger == Trigger::Force)
	}

	fn snapshot(&self) -> Option<(Compiler, Source)> {
		let compiler = self.selected_compiler()?.clone();
		let options = Options::new(self.options.clone(), self.toggles.to_filter());
		Some((compiler, Source::new(self.text.clone(), options)))
	}
}

struct Shared {
	client: Arc<Client>,
	state: Mutex<EditorState>,
	output: watch::Sender<String>,
	errors: broadcast::Sender<Arc<godbolt_client::Error>>,
	supersession: Supersession,
}

impl Shared {
	fn dispatch(self: &Arc<Self>) {
		let snapshot = {
			let state = self.state.lock();
			if state.text.is_empty() {
				debug!("source text is empty, skipping compile");
				return;
			}
			state.snapshot()
		};
		let Some((compiler, source)) = snapshot else {
			debug!("no compiler available, skipping compile");
			return;
		};

		let token = self.supersession.issue();
		debug!(generation = token.generation(), compiler = %compiler.id, "dispatching compile");

		let shared = Arc::clone(self);
		tokio::spawn(async move {
			let outcome = tokio::select! {
				() = token.cancelled() => {
					debug!(generation = token.generation(), "compile superseded");
					return;
				}
				outcome = shared.client.compile(&compiler, &source) => outcome,
			};
			shared.publish(token.generation(), outcome);
		});
	}

	fn publish(&self, generation: u64, outcome: godbolt_client::Result<CompilationResult>) {
		match outcome {
			Ok(result) => {
				let text = result.assembly_text();
				let published = self.supersession.publish_if_current(generation, || {
					self.output.send_replace(text);
				});
				if !published {
					debug!(generation, "discarding stale compile result");
				}
			}
			Err(err) if self.supersession.is_current(generation) => {
				debug!(generation, error = %err, "compile failed");
				self.report(err);
			}
			Err(err) => debug!(generation, error = %err, "discarding stale compile failure"),
		}
	}

	fn report(&self, err: godbolt_client::Error) {
		// No subscribers is fine.
		let _ = self.errors.send(Arc::new(err));
	}
}

async fn drive(shared: Arc<Shared>, mut triggers: mpsc::UnboundedReceiver<Trigger>, debounce: Duration) {
	while triggers.recv().await.is_some() {
		loop {
			match tokio::time::timeout(debounce, triggers.recv()).await {
				Ok(Some(trigger)) => trace!(?trigger, "quiet window restarted"),
				Ok(None) => return,
				Err(_) => break,
			}
		}
		shared.dispatch();
	}
}

/// Live compilation of one editor's inputs.
///
/// Must be created inside a tokio runtime. Dropping the pipeline stops the
/// driver and cancels the in-flight compile.
pub struct CompilePipeline {
	shared: Arc<Shared>,
	triggers: mpsc::UnboundedSender<Trigger>,
	driver: JoinHandle<()>,
}

impl std::fmt::Debug for CompilePipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompilePipeline").field("state", &*self.shared.state.lock()).finish()
	}
}

impl CompilePipeline {
	/// Starts a pipeline compiling through `client`.
	pub fn spawn(client: Arc<Client>, config: PipelineConfig) -> Self {
		let (output, _) = watch::channel(String::new());
		let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
		let shared = Arc::new(Shared {
			client,
			state: Mutex::new(EditorState::default()),
			output,
			errors,
			supersession: Supersession::new(),
		});
		let (triggers, rx) = mpsc::unbounded_channel();
		let driver = tokio::spawn(drive(Arc::clone(&shared), rx, config.debounce));
		Self {
			shared,
			triggers,
			driver,
		}
	}

	fn update(&self, trigger: Trigger, edit: impl FnOnce(&mut EditorState)) {
		let accepted = {
			let mut state = self.shared.state.lock();
			edit(&mut *state);
			state.accepts(trigger)
		};
		self.notify(trigger, accepted);
	}

	fn notify(&self, trigger: Trigger, accepted: bool) {
		if accepted {
			let _ = self.triggers.send(trigger);
		} else {
			trace!(?trigger, "trigger dropped");
		}
	}

	/// Replaces the source text.
	pub fn set_text(&self, text: impl Into<String>) {
		let text = text.into();
		self.update(Trigger::Edit, |state| {
			state.text = text;
			state.touch();
		});
	}

	/// Selects the compiler at `index` of the available list.
	pub fn select_compiler(&self, index: usize) {
		self.update(Trigger::Edit, |state| {
			state.selected = index;
			state.touch();
		});
	}

	/// Replaces the compiler argument string.
	pub fn set_compiler_options(&self, options: impl Into<String>) {
		let options = options.into();
		self.update(Trigger::Edit, |state| {
			state.options = options;
			state.touch();
		});
	}

	/// Replaces the filter toggles.
	pub fn set_toggles(&self, toggles: FilterToggles) {
		self.update_toggles(|current| *current = toggles);
	}

	/// Edits the filter toggles in place.
	pub fn update_toggles(&self, edit: impl FnOnce(&mut FilterToggles)) {
		self.update(Trigger::Edit, |state| {
			edit(&mut state.toggles);
			state.touch();
		});
	}

	/// Turns compile-on-edit on or off. [`recompile`](Self::recompile) works
	/// either way.
	pub fn set_live_compile(&self, live: bool) {
		self.shared.state.lock().live = live;
	}

	/// Replaces the compilers to choose from, keeping the selection when the
	/// selected compiler is still offered.
	pub fn set_available_compilers(&self, compilers: Vec<Compiler>) {
		self.update(Trigger::Edit, |state| state.replace_compilers(compilers));
	}

	/// Sets the source language. Call [`refresh_compilers`](Self::refresh_compilers)
	/// to load its compilers.
	pub fn set_language(&self, language: Option<Language>) {
		let mut state = self.shared.state.lock();
		state.language = language;
		state.touch();
	}

	/// Schedules a compile even when live compilation is off.
	pub fn recompile(&self) {
		self.update(Trigger::Force, |_| {});
	}

	/// Switches language by file extension and reloads its compilers.
	///
	/// Unknown extensions clear the language, which lists every compiler.
	pub async fn update_file_extension(&self, ext: &str) -> Result<()> {
		let language = catalog::language_for_extension(ext);
		debug!(ext, language = ?language.as_ref().map(|l| l.id.as_str()), "file extension changed");
		self.set_language(language);
		self.refresh_compilers().await
	}

	/// Fetches the compilers for the current language.
	///
	/// The result is dropped if the language changed meanwhile.
	pub async fn refresh_compilers(&self) -> Result<()> {
		let language = self.shared.state.lock().language.clone();
		let compilers = self.shared.client.compilers(language.as_ref()).await?;

		let accepted = {
			let mut state = self.shared.state.lock();
			if state.language != language {
				debug!("language changed while fetching compilers");
				return Ok(());
			}
			debug!(count = compilers.len(), "compilers loaded");
			state.replace_compilers(compilers);
			state.accepts(Trigger::Edit)
		};
		self.notify(Trigger::Edit, accepted);
		Ok(())
	}

	/// Restores an editor from a saved session and one of its compilers.
	///
	/// The compiler is selected by id, falling back to the first one offered
	/// for the session's language. Fails with [`Error::NoCompiler`] when the
	/// language has no compilers; the other inputs are still restored.
	pub async fn load_session(&self, session: &Session, compiler: &SessionCompiler) -> Result<()> {
		let language =
			catalog::language(&session.language).unwrap_or_else(|| Language::new(&session.language, &session.language));
		let compilers = self.shared.client.compilers(Some(&language)).await?;
		let selected = compilers.iter().position(|c| c.id == compiler.id).unwrap_or_else(|| {
			debug!(compiler = %compiler.id, "session compiler not offered, using first");
			0
		});
		let empty = compilers.is_empty();

		self.update(Trigger::Edit, |state| {
			state.text = session.source.clone();
			state.language = Some(language);
			state.compilers = compilers;
			state.selected = selected;
			state.options = compiler.options.clone();
			state.toggles = FilterToggles::from_filter(compiler.filters);
			state.touch();
		});

		if empty { Err(Error::NoCompiler) } else { Ok(()) }
	}

	/// Returns a shortlink for the current inputs, creating one if needed.
	///
	/// Failures return `None` and go to the error channel. A link created
	/// while the inputs changed is returned but not remembered.
	pub async fn compute_shortlink(&self) -> Option<String> {
		let (revision, snapshot) = {
			let state = self.shared.state.lock();
			if !state.shortlink.is_empty() {
				return Some(state.shortlink.clone());
			}
			(state.revision, state.snapshot())
		};
		let Some((compiler, source)) = snapshot else {
			debug!("no compiler selected, cannot create shortlink");
			return None;
		};

		match self.shared.client.create_shortlink(&compiler, &source).await {
			Ok(link) => {
				let mut state = self.shared.state.lock();
				if state.revision == revision {
					state.shortlink = link.url.clone();
				} else {
					debug!("inputs changed while creating shortlink");
				}
				Some(link.url)
			}
			Err(err) => {
				debug!(error = %err, "shortlink creation failed");
				self.shared.report(err);
				None
			}
		}
	}

	/// The client compiles go through.
	pub fn client(&self) -> &Arc<Client> {
		&self.shared.client
	}

	pub fn text(&self) -> String {
		self.shared.state.lock().text.clone()
	}

	pub fn language(&self) -> Option<Language> {
		self.shared.state.lock().language.clone()
	}

	pub fn available_compilers(&self) -> Vec<Compiler> {
		self.shared.state.lock().compilers.clone()
	}

	pub fn selected_compiler(&self) -> Option<Compiler> {
		self.shared.state.lock().selected_compiler().cloned()
	}

	pub fn compiler_options(&self) -> String {
		self.shared.state.lock().options.clone()
	}

	pub fn toggles(&self) -> FilterToggles {
		self.shared.state.lock().toggles
	}

	pub fn is_live(&self) -> bool {
		self.shared.state.lock().live
	}

	/// Shortlink for the current inputs, empty if none was created.
	pub fn shortlink(&self) -> String {
		self.shared.state.lock().shortlink.clone()
	}

	/// Last published assembly text.
	pub fn output(&self) -> String {
		self.shared.output.borrow().clone()
	}

	/// Observes published assembly text.
	pub fn subscribe_output(&self) -> watch::Receiver<String> {
		self.shared.output.subscribe()
	}

	/// Observes failures the live pipeline swallowed.
	pub fn subscribe_errors(&self) -> broadcast::Receiver<Arc<godbolt_client::Error>> {
		self.shared.errors.subscribe()
	}
}

impl Drop for CompilePipeline {
	fn drop(&mut self) {
		self.driver.abort();
		self.shared.supersession.cancel_outstanding();
	}
}

#[cfg(test)]
mod tests;
