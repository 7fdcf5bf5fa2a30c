use std::sync::Arc;
use std::time::Duration;

use godbolt_client::transport::{HttpRequest, Reply, ScriptedTransport, StatusCode};
use godbolt_client::{AsmSyntax, DEFAULT_BASE_URL, Filter, Url};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};

use super::*;

fn compilers_json() -> Value {
	json!([
		{ "id": "g132", "name": "x86-64 gcc 13.2", "lang": "c++" },
		{ "id": "clang1700", "name": "x86-64 clang 17.0.1", "lang": "c++" },
	])
}

fn compilers() -> Vec<Compiler> {
	serde_json::from_value(compilers_json()).unwrap()
}

fn request_source(request: &HttpRequest) -> String {
	let body: Value = serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap();
	body["source"].as_str().unwrap_or_default().to_string()
}

/// Answers compiles with `<compiler id>: <source>` as the assembly.
fn echo(request: &HttpRequest) -> Reply {
	let path = request.url.path();
	if path.starts_with("/api/compilers/") {
		return Reply::ok(compilers_json());
	}
	if path == "/shortener" {
		return Reply::ok(json!({ "url": "https://godbolt.org/z/abc123" }));
	}
	let compiler = path.trim_start_matches("/api/compiler/").trim_end_matches("/compile");
	Reply::ok(json!({
		"code": 0,
		"asm": [{ "text": format!("{compiler}: {}", request_source(request)) }],
	}))
}

fn pipeline_with(
	script: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static,
) -> (CompilePipeline, Arc<ScriptedTransport>) {
	let transport = Arc::new(ScriptedTransport::new(script));
	let client = Client::with_transport(Url::parse(DEFAULT_BASE_URL).unwrap(), transport.clone());
	(CompilePipeline::spawn(Arc::new(client), PipelineConfig::default()), transport)
}

fn compile_requests(transport: &ScriptedTransport) -> Vec<HttpRequest> {
	transport
		.requests()
		.into_iter()
		.filter(|request| request.url.path().ends_with("/compile"))
		.collect()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn bursts_of_edits_coalesce_into_one_compile() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers());
	let mut output = pipeline.subscribe_output();
	let start = Instant::now();

	for text in ["i", "in", "int", "int x;"] {
		pipeline.set_text(text);
		sleep(Duration::from_millis(100)).await;
	}
	assert!(compile_requests(&transport).is_empty());

	output.changed().await.unwrap();
	assert_eq!(*output.borrow_and_update(), "g132: int x;");
	let elapsed = start.elapsed();
	assert!(elapsed >= Duration::from_millis(800) && elapsed < Duration::from_millis(900), "{elapsed:?}");

	let requests = compile_requests(&transport);
	assert_eq!(requests.len(), 1);
	assert_eq!(request_source(&requests[0]), "int x;");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn newest_compile_wins() {
	let (pipeline, transport) = pipeline_with(|request| {
		let delay = if request_source(request) == "slow" { 5 } else { 1 };
		echo(request).after(Duration::from_secs(delay))
	});
	pipeline.set_available_compilers(compilers());
	let mut output = pipeline.subscribe_output();

	pipeline.set_text("slow");
	sleep(Duration::from_millis(600)).await;
	assert_eq!(compile_requests(&transport).len(), 1);

	pipeline.set_text("fast");
	output.changed().await.unwrap();
	assert_eq!(*output.borrow_and_update(), "g132: fast");

	sleep(Duration::from_secs(10)).await;
	assert!(!output.has_changed().unwrap());
	assert_eq!(pipeline.output(), "g132: fast");
	assert_eq!(compile_requests(&transport).len(), 2);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failures_keep_previous_output() {
	let (pipeline, _) = pipeline_with(|request| {
		if request.url.path().ends_with("/compile") && request_source(request) == "bad" {
			Reply::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "description": "compiler crashed" }))
		} else {
			echo(request)
		}
	});
	pipeline.set_available_compilers(compilers());
	let mut output = pipeline.subscribe_output();
	let mut errors = pipeline.subscribe_errors();

	pipeline.set_text("good");
	output.changed().await.unwrap();
	assert_eq!(*output.borrow_and_update(), "g132: good");

	pipeline.set_text("bad");
	let err = errors.recv().await.unwrap();
	assert_eq!(err.to_string(), "compiler crashed");
	assert!(!output.has_changed().unwrap());
	assert_eq!(pipeline.output(), "g132: good");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn empty_text_never_compiles() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers());

	pipeline.set_text("");
	pipeline.set_compiler_options("-O2");
	pipeline.update_toggles(|toggles| toggles.trim = true);
	pipeline.recompile();
	sleep(Duration::from_secs(2)).await;
	assert!(compile_requests(&transport).is_empty());

	// Cleared again before the quiet window ends.
	pipeline.set_text("int x;");
	pipeline.set_text("");
	sleep(Duration::from_secs(2)).await;
	assert!(compile_requests(&transport).is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn no_compiler_never_compiles() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_text("int x;");
	pipeline.recompile();
	sleep(Duration::from_secs(2)).await;
	assert_eq!(transport.request_count(), 0);
	assert_eq!(pipeline.output(), "");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn live_off_waits_for_recompile() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers());
	pipeline.set_live_compile(false);
	let mut output = pipeline.subscribe_output();

	pipeline.set_text("int x;");
	pipeline.set_compiler_options("-O1");
	sleep(Duration::from_secs(2)).await;
	assert!(compile_requests(&transport).is_empty());

	pipeline.recompile();
	output.changed().await.unwrap();
	assert_eq!(*output.borrow(), "g132: int x;");
	assert_eq!(compile_requests(&transport).len(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn compile_uses_current_inputs() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers());
	let mut output = pipeline.subscribe_output();

	pipeline.select_compiler(1);
	pipeline.set_compiler_options("-O3 -march=native");
	pipeline.update_toggles(|toggles| {
		toggles.demangle = true;
		toggles.syntax = AsmSyntax::Att;
	});
	pipeline.set_text("int square(int x) { return x * x; }");

	output.changed().await.unwrap();
	assert_eq!(*output.borrow(), "clang1700: int square(int x) { return x * x; }");

	let requests = compile_requests(&transport);
	let request = &requests[0];
	assert_eq!(request.url.path(), "/api/compiler/clang1700/compile");
	let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
	assert_eq!(body["options"]["userArguments"], "-O3 -march=native");
	assert_eq!(body["options"]["filters"]["demangle"], true);
	assert_eq!(body["options"]["filters"]["intel"], false);
	assert_eq!(body["options"]["filters"]["labels"], true);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shortlink_is_reused_until_inputs_change() {
	let (pipeline, transport) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers());
	pipeline.set_text("int x;");
	let shortener_calls = || {
		transport
			.requests()
			.iter()
			.filter(|request| request.url.path() == "/shortener")
			.count()
	};

	assert_eq!(pipeline.compute_shortlink().await.as_deref(), Some("https://godbolt.org/z/abc123"));
	assert_eq!(pipeline.shortlink(), "https://godbolt.org/z/abc123");
	assert_eq!(pipeline.compute_shortlink().await.as_deref(), Some("https://godbolt.org/z/abc123"));
	assert_eq!(shortener_calls(), 1);

	pipeline.select_compiler(1);
	assert_eq!(pipeline.shortlink(), "");

	pipeline.compute_shortlink().await;
	pipeline.set_compiler_options("-O2");
	assert_eq!(pipeline.shortlink(), "");

	pipeline.compute_shortlink().await;
	pipeline.set_toggles(FilterToggles::from_filter(Filter::INTEL));
	assert_eq!(pipeline.shortlink(), "");
	assert_eq!(shortener_calls(), 3);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shortlink_failure_is_reported() {
	let (pipeline, _) = pipeline_with(|request| {
		if request.url.path() == "/shortener" {
			Reply::raw(StatusCode::SERVICE_UNAVAILABLE, "try later")
		} else {
			echo(request)
		}
	});
	let mut errors = pipeline.subscribe_errors();

	assert_eq!(pipeline.compute_shortlink().await, None);
	assert!(errors.try_recv().is_err());

	pipeline.set_available_compilers(compilers());
	pipeline.set_text("int x;");
	assert_eq!(pipeline.compute_shortlink().await, None);
	assert_eq!(errors.try_recv().unwrap().to_string(), "Service Unavailable");
	assert_eq!(pipeline.shortlink(), "");
}

fn saved_session(compiler_id: &str) -> Session {
	serde_json::from_value(json!({
		"id": 1,
		"language": "c++",
		"source": "int main() {}",
		"conformanceview": false,
		"compilers": [{
			"id": compiler_id,
			"options": "-O2",
			"filters": {
				"intel": false, "demangle": true, "directives": true,
				"comments": false, "labels": true, "trim": false,
			},
		}],
	}))
	.unwrap()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn load_session_restores_inputs() {
	let (pipeline, transport) = pipeline_with(echo);
	let mut output = pipeline.subscribe_output();
	let session = saved_session("clang1700");

	pipeline
		.load_session(&session, session.primary_compiler().unwrap())
		.await
		.unwrap();

	assert_eq!(transport.requests()[0].url.path(), "/api/compilers/c++");
	assert_eq!(pipeline.text(), "int main() {}");
	assert_eq!(pipeline.language().map(|l| l.name), Some("C++".to_string()));
	assert_eq!(pipeline.selected_compiler().map(|c| c.id), Some("clang1700".to_string()));
	assert_eq!(pipeline.compiler_options(), "-O2");
	let toggles = pipeline.toggles();
	assert_eq!(toggles.syntax, AsmSyntax::Att);
	assert!(toggles.demangle && toggles.labels && toggles.directives);
	assert!(!toggles.comments && !toggles.trim);

	output.changed().await.unwrap();
	assert_eq!(*output.borrow(), "clang1700: int main() {}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn load_session_falls_back_to_first_compiler() {
	let (pipeline, _) = pipeline_with(echo);
	let session = saved_session("retired-compiler");
	pipeline
		.load_session(&session, session.primary_compiler().unwrap())
		.await
		.unwrap();
	assert_eq!(pipeline.selected_compiler().map(|c| c.id), Some("g132".to_string()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn load_session_without_compilers_fails() {
	let (pipeline, transport) = pipeline_with(|_| Reply::ok(json!([])));
	let session = saved_session("g132");
	let err = pipeline
		.load_session(&session, session.primary_compiler().unwrap())
		.await
		.unwrap_err();
	assert!(matches!(err, Error::NoCompiler), "{err:?}");
	assert_eq!(pipeline.text(), "int main() {}");

	sleep(Duration::from_secs(2)).await;
	assert_eq!(transport.request_count(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn file_extension_selects_language() {
	let (pipeline, transport) = pipeline_with(echo);

	pipeline.update_file_extension("RS").await.unwrap();
	assert_eq!(pipeline.language().map(|l| l.id), Some("rust".to_string()));
	assert_eq!(transport.requests()[0].url.path(), "/api/compilers/rust");
	assert_eq!(pipeline.available_compilers().len(), 2);

	pipeline.update_file_extension("unknown").await.unwrap();
	assert_eq!(pipeline.language(), None);
	assert_eq!(transport.requests()[1].url.path(), "/api/compilers/");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn refresh_keeps_selected_compiler() {
	let (pipeline, _) = pipeline_with(echo);
	pipeline.set_available_compilers(compilers().into_iter().rev().collect());
	pipeline.select_compiler(0);
	assert_eq!(pipeline.selected_compiler().map(|c| c.id), Some("clang1700".to_string()));

	pipeline.refresh_compilers().await.unwrap();
	assert_eq!(pipeline.selected_compiler().map(|c| c.id), Some("clang1700".to_string()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn compilers_for_a_replaced_language_are_dropped() {
	let (pipeline, transport) = pipeline_with(|request| echo(request).after(Duration::from_secs(1)));
	pipeline.set_text("int x;");
	pipeline.set_language(catalog::language("c++"));

	let (refreshed, ()) = tokio::join!(pipeline.refresh_compilers(), async {
		sleep(Duration::from_millis(100)).await;
		pipeline.set_language(catalog::language("rust"));
	});
	refreshed.unwrap();

	assert_eq!(transport.request_count(), 1);
	assert_eq!(pipeline.language().map(|l| l.id), Some("rust".to_string()));
	assert!(pipeline.available_compilers().is_empty());

	sleep(Duration::from_secs(5)).await;
	assert!(compile_requests(&transport).is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dropping_pipeline_cancels_in_flight_compile() {
	let (pipeline, transport) = pipeline_with(|request| {
		if request.url.path().ends_with("/compile") { Reply::Never } else { echo(request) }
	});
	pipeline.set_available_compilers(compilers());
	pipeline.set_text("int x;");
	sleep(Duration::from_millis(600)).await;

	let client = Arc::clone(pipeline.client());
	assert_eq!(compile_requests(&transport).len(), 1);
	assert_eq!(client.activity().in_flight(), 1);

	drop(pipeline);
	tokio::task::yield_now().await;
	assert_eq!(client.activity().in_flight(), 0);
}
