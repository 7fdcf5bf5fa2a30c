use std::sync::Arc;
use std::time::Duration;

use godbolt_client::transport::{HttpRequest, Reply, ScriptedTransport, StatusCode};
use godbolt_client::{DEFAULT_BASE_URL, Url};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};

use super::*;

fn container_json() -> Value {
	json!({
		"sessions": [{
			"id": 1,
			"language": "c++",
			"source": "int square(int num) {\n    return num * num;\n}",
			"conformanceview": false,
			"compilers": [{
				"id": "g132",
				"options": "-O2",
				"filters": {
					"intel": true, "demangle": true, "directives": true,
					"comments": true, "labels": true, "trim": false,
				},
				"libs": [],
				"specialoutputs": [],
				"tools": [],
			}],
		}],
	})
}

fn flow_with(script: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static) -> (Arc<ShortlinkFlow>, Arc<ScriptedTransport>) {
	let transport = Arc::new(ScriptedTransport::new(script));
	let client = Client::with_transport(Url::parse(DEFAULT_BASE_URL).unwrap(), transport.clone());
	let flow = ShortlinkFlow::new(Arc::new(client), ShortlinkHistory::in_memory(), DEFAULT_SHORTLINK_TIMEOUT);
	(Arc::new(flow), transport)
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn valid_link_resolves_to_session() {
	let (flow, transport) = flow_with(|_| Reply::ok(container_json()));

	assert!(flow.resolve("https://godbolt.org/z/wsh6Oh").await);

	assert_eq!(transport.requests()[0].url.path(), "/api/shortlinkinfo/wsh6Oh");
	let session = flow.session().unwrap();
	assert_eq!(session.sessions[0].compilers[0].id, "g132");
	assert_eq!(flow.error_text(), "");
	assert!(!flow.is_validating());
	assert_eq!(flow.history(), ["https://godbolt.org/z/wsh6Oh"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn invalid_links_fail_without_request() {
	let (flow, transport) = flow_with(|_| Reply::ok(container_json()));

	for input in ["https://example.com/z/xyz", "https://godbolt.org/a/b/c", "not a url", ""] {
		assert!(!flow.resolve(input).await, "{input}");
		assert_eq!(flow.error_text(), INVALID_SHORTLINK_MESSAGE);
		assert!(flow.session().is_none());
		assert!(!flow.is_validating());
	}
	assert_eq!(transport.request_count(), 0);
	assert!(flow.history().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn server_failure_clears_previous_session() {
	let (flow, _) = flow_with(|request| {
		if request.url.path().ends_with("missing") {
			Reply::json(StatusCode::NOT_FOUND, json!({ "description": "not found" }))
		} else {
			Reply::ok(container_json())
		}
	});

	assert!(flow.resolve("https://godbolt.org/z/found").await);
	assert!(flow.session().is_some());

	assert!(!flow.resolve("https://godbolt.org/z/missing").await);
	assert!(flow.session().is_none());
	assert_eq!(flow.error_text(), INVALID_SHORTLINK_MESSAGE);
	assert_eq!(flow.history(), ["https://godbolt.org/z/found"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unanswered_lookup_times_out() {
	let (flow, _) = flow_with(|_| Reply::Never);
	let start = Instant::now();

	assert!(!flow.resolve("https://godbolt.org/z/wsh6Oh").await);

	assert!(start.elapsed() >= DEFAULT_SHORTLINK_TIMEOUT);
	assert!(flow.session().is_none());
	assert_eq!(flow.error_text(), INVALID_SHORTLINK_MESSAGE);
	assert!(!flow.is_validating());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn late_answer_after_timeout_is_ignored() {
	let (flow, _) = flow_with(|_| Reply::ok(container_json()).after(Duration::from_secs(15)));

	assert!(!flow.resolve("https://godbolt.org/z/wsh6Oh").await);
	sleep(Duration::from_secs(10)).await;
	assert!(flow.session().is_none());
	assert!(flow.history().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_abandons_in_flight_lookup() {
	let (flow, transport) = flow_with(|_| Reply::ok(container_json()).after(Duration::from_secs(3)));

	let task = tokio::spawn({
		let flow = Arc::clone(&flow);
		async move { flow.resolve("https://godbolt.org/z/wsh6Oh").await }
	});
	sleep(Duration::from_secs(1)).await;
	assert!(flow.is_validating());
	assert_eq!(flow.input(), "https://godbolt.org/z/wsh6Oh");
	assert_eq!(transport.request_count(), 1);

	flow.cancel();
	assert!(!task.await.unwrap());
	assert!(!flow.is_validating());
	assert_eq!(flow.input(), "");
	assert_eq!(flow.error_text(), "");

	sleep(Duration::from_secs(5)).await;
	assert!(flow.session().is_none());
	assert!(flow.history().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn newer_resolve_supersedes_older() {
	let (flow, _) = flow_with(|request| {
		let delay = if request.url.path().ends_with("slow") { 5 } else { 1 };
		Reply::ok(container_json()).after(Duration::from_secs(delay))
	});

	let slow = tokio::spawn({
		let flow = Arc::clone(&flow);
		async move { flow.resolve("https://godbolt.org/z/slow").await }
	});
	sleep(Duration::from_millis(100)).await;

	assert!(flow.resolve("https://godbolt.org/z/fast").await);
	assert!(!slow.await.unwrap());
	assert_eq!(flow.history(), ["https://godbolt.org/z/fast"]);
	assert_eq!(flow.error_text(), "");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn history_keeps_five_most_recent() {
	let (flow, _) = flow_with(|_| Reply::ok(container_json()));
	for n in 1..=6 {
		assert!(flow.resolve(&format!("https://godbolt.org/z/link{n}")).await);
	}
	let history = flow.history();
	assert_eq!(history.len(), 5);
	assert_eq!(history.first().map(String::as_str), Some("https://godbolt.org/z/link6"));
	assert_eq!(history.last().map(String::as_str), Some("https://godbolt.org/z/link2"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn resolved_links_are_persisted() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("shortlinks.toml");
	let transport = Arc::new(ScriptedTransport::new(|_| Reply::ok(container_json())));
	let client = Arc::new(Client::with_transport(Url::parse(DEFAULT_BASE_URL).unwrap(), transport));

	let flow = ShortlinkFlow::new(client, ShortlinkHistory::load(&path).unwrap(), DEFAULT_SHORTLINK_TIMEOUT);
	assert!(flow.resolve("https://godbolt.org/z/kept").await);

	let reloaded = ShortlinkHistory::load(&path).unwrap();
	assert_eq!(reloaded.entries(), ["https://godbolt.org/z/kept"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dropped_resolve_returns_to_idle() {
	let (flow, transport) = flow_with(|_| Reply::Never);

	let outcome = tokio::time::timeout(Duration::from_secs(1), flow.resolve("https://godbolt.org/z/wsh6Oh")).await;
	assert!(outcome.is_err());
	assert_eq!(transport.request_count(), 1);
	assert!(!flow.is_validating());
	assert!(flow.state.lock().in_flight.is_none());

	sleep(Duration::from_millis(10)).await;
	assert_eq!(flow.client.activity().in_flight(), 0);
	assert_eq!(flow.error_text(), "");

	// The flow accepts new links afterwards.
	assert!(!flow.resolve("not a url").await);
	assert_eq!(flow.error_text(), INVALID_SHORTLINK_MESSAGE);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn history_stores_trimmed_link() {
	let (flow, _) = flow_with(|_| Reply::ok(container_json()));

	assert!(flow.resolve("  https://godbolt.org/z/wsh6Oh \n").await);
	assert_eq!(flow.history(), ["https://godbolt.org/z/wsh6Oh"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unwritable_history_still_remembers_link() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("shortlinks.toml");
	let history = ShortlinkHistory::load(&path).unwrap();
	// A directory in place of the file makes every save fail.
	std::fs::create_dir(&path).unwrap();

	let transport = Arc::new(ScriptedTransport::new(|_| Reply::ok(container_json())));
	let client = Arc::new(Client::with_transport(Url::parse(DEFAULT_BASE_URL).unwrap(), transport));
	let flow = ShortlinkFlow::new(client, history, DEFAULT_SHORTLINK_TIMEOUT);

	assert!(flow.resolve("https://godbolt.org/z/kept").await);
	assert_eq!(flow.history(), ["https://godbolt.org/z/kept"]);
	assert!(path.is_dir());
}
