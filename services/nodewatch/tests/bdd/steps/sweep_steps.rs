//! BDD step definitions for the alert sweep feature

use std::sync::Arc;

use cucumber::{given, then, when};

use nodewatch::config::FetchErrorPolicy;
use nodewatch::io::{HttpClient, HttpResponse};
use nodewatch::model::{NodeCategory, RecordKind};
use nodewatch::{NodewatchError, PollOrchestrator};

use crate::world::{NodewatchWorld, ScriptedHttpClient, SECURE_BASE, SUPER_BASE};

fn parse_category(s: &str) -> NodeCategory {
    match s {
        "secure" => NodeCategory::Secure,
        "super" => NodeCategory::Super,
        other => panic!("Unknown category: {}", other),
    }
}

fn parse_kind(s: &str) -> RecordKind {
    match s {
        "downtime" => RecordKind::Downtime,
        "exception" => RecordKind::Exception,
        other => panic!("Unknown kind: {}", other),
    }
}

fn endpoint(category: &str, kind: &str) -> String {
    let base = match parse_category(category) {
        NodeCategory::Secure => SECURE_BASE,
        NodeCategory::Super => SUPER_BASE,
    };
    format!("{}{}", base, parse_kind(kind).path())
}

fn pair_index(category: &str, kind: &str) -> usize {
    let c = NodeCategory::ALL
        .iter()
        .position(|c| *c == parse_category(category))
        .unwrap();
    let k = RecordKind::ALL
        .iter()
        .position(|k| *k == parse_kind(kind))
        .unwrap();
    c * RecordKind::ALL.len() + k
}

fn posted_bodies(world: &NodewatchWorld) -> Vec<String> {
    let http = world.http.as_ref().expect("sweep has not run");
    http.posts.lock().unwrap().clone()
}

#[given(regex = r"^(secure|super) node (downtime|exception)s report no open records$")]
fn no_open_records(world: &mut NodewatchWorld, category: String, kind: String) {
    world.get_responses.insert(
        endpoint(&category, &kind),
        HttpResponse {
            status: 200,
            body: r#"{"records": 0, "rows": []}"#.to_string(),
        },
    );
}

#[given(
    regex = r#"^(secure|super) node (downtime|exception)s report node (\d+) "([^"]*)" down for (\d+) ms because "([^"]*)"$"#
)]
fn one_open_record(
    world: &mut NodewatchWorld,
    category: String,
    kind: String,
    id: u64,
    fqdn: String,
    duration: u64,
    reason: String,
) {
    let reason_field = parse_kind(&kind).reason_field();
    let mut row = serde_json::Map::new();
    row.insert("id".to_string(), id.into());
    row.insert("nid".to_string(), id.into());
    row.insert("fqdn".to_string(), fqdn.into());
    row.insert("duration".to_string(), duration.into());
    row.insert(reason_field.to_string(), reason.into());
    let body = serde_json::json!({ "records": 1, "rows": [row] });
    world.get_responses.insert(
        endpoint(&category, &kind),
        HttpResponse {
            status: 200,
            body: body.to_string(),
        },
    );
}

#[given(regex = r"^(secure|super) node (downtime|exception)s fail with status (\d+)$")]
fn fetch_fails(world: &mut NodewatchWorld, category: String, kind: String, status: u16) {
    world.get_responses.insert(
        endpoint(&category, &kind),
        HttpResponse {
            status,
            body: "internal error".to_string(),
        },
    );
}

#[given(regex = r"^(secure|super) node (\d+) is ignored$")]
fn node_ignored(world: &mut NodewatchWorld, category: String, id: u64) {
    match parse_category(&category) {
        NodeCategory::Secure => world
            .config
            .secure
            .ignore
            .get_or_insert_with(Vec::new)
            .push(id),
        NodeCategory::Super => world
            .config
            .super_nodes
            .ignore
            .get_or_insert_with(Vec::new)
            .push(id),
    }
}

#[given("failed fetches do not stop the run")]
fn continue_on_fetch_error(world: &mut NodewatchWorld) {
    world.config.fetch.on_error = FetchErrorPolicy::Continue;
}

#[when("the sweep runs")]
async fn sweep_runs(world: &mut NodewatchWorld) {
    let http = Arc::new(ScriptedHttpClient {
        get_responses: world.get_responses.clone(),
        post_status: world.post_status,
        ..Default::default()
    });
    let client: Arc<dyn HttpClient> = Arc::clone(&http) as Arc<dyn HttpClient>;
    let orchestrator = PollOrchestrator::new(&world.config, client);
    world.run_result = Some(orchestrator.run().await);
    world.http = Some(http);
}

#[then("no alert is delivered")]
fn no_alert(world: &mut NodewatchWorld) {
    assert!(posted_bodies(world).is_empty());
}

#[then(expr = "{int} alert(s) is/are delivered")]
fn alerts_delivered(world: &mut NodewatchWorld, count: usize) {
    assert_eq!(posted_bodies(world).len(), count);
    let report = world
        .run_result
        .as_ref()
        .expect("sweep has not run")
        .as_ref()
        .expect("sweep failed");
    assert_eq!(report.delivered(), count);
}

#[then(expr = "the alert contains {string}")]
fn alert_contains(world: &mut NodewatchWorld, text: String) {
    let bodies = posted_bodies(world);
    assert!(
        bodies.iter().any(|b| b.contains(&text)),
        "no alert contains {text:?}: {bodies:?}"
    );
}

#[then(expr = "the sweep checks {int} pairs")]
fn sweep_checks_pairs(world: &mut NodewatchWorld, count: usize) {
    let report = world
        .run_result
        .as_ref()
        .expect("sweep has not run")
        .as_ref()
        .expect("sweep failed");
    assert_eq!(report.pairs.len(), count);
    let http = world.http.as_ref().unwrap();
    assert_eq!(http.gets.lock().unwrap().len(), count);
}

#[then(regex = r"^the (secure|super) (downtime|exception) pair reports (\d+) suppressed records?$")]
fn pair_suppressed(world: &mut NodewatchWorld, category: String, kind: String, count: usize) {
    let report = world
        .run_result
        .as_ref()
        .expect("sweep has not run")
        .as_ref()
        .expect("sweep failed");
    let pair = &report.pairs[pair_index(&category, &kind)];
    assert_eq!(pair.suppressed, count);
    assert_eq!(pair.found, 0);
}

#[then(regex = r"^the (secure|super) (downtime|exception) pair reports a fetch error$")]
fn pair_fetch_error(world: &mut NodewatchWorld, category: String, kind: String) {
    let report = world
        .run_result
        .as_ref()
        .expect("sweep has not run")
        .as_ref()
        .expect("sweep failed");
    let pair = &report.pairs[pair_index(&category, &kind)];
    assert!(pair.fetch_error.is_some());
    assert_eq!(pair.delivered, 0);
}

#[then("the sweep fails with a fetch error")]
fn sweep_fails_with_fetch_error(world: &mut NodewatchWorld) {
    let result = world.run_result.as_ref().expect("sweep has not run");
    match result {
        Err(NodewatchError::Fetch(msg)) => assert!(msg.contains("500"), "{msg}"),
        other => panic!("expected a fetch error, got {other:?}"),
    }
}

#[then(expr = "the sweep stops after {int} request(s)")]
fn sweep_stops_after(world: &mut NodewatchWorld, count: usize) {
    let http = world.http.as_ref().expect("sweep has not run");
    assert_eq!(http.gets.lock().unwrap().len(), count);
}
