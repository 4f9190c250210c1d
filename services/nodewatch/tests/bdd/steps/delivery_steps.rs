//! BDD step definitions for webhook delivery feature

use std::sync::Arc;

use cucumber::{given, then, when};

use nodewatch::dispatcher::WebhookDispatcher;
use nodewatch::formatter::AlertFormatter;
use nodewatch::io::HttpClient;
use nodewatch::model::{NodeCategory, RecordKind, StatusRecord};

use crate::world::{NodewatchWorld, ScriptedHttpClient, WEBHOOK};

#[given(expr = "a webhook that answers with status {int}")]
fn webhook_status(world: &mut NodewatchWorld, status: u16) {
    world.post_status = status;
}

#[when("an alert for one record is delivered")]
async fn deliver_one(world: &mut NodewatchWorld) {
    let record = StatusRecord {
        node_identifier: 7,
        detail_identifier: 7,
        host_name: "node7.example".to_string(),
        duration_millis: 185_000,
        reason_code: "disk-failure".to_string(),
    };
    let payloads = AlertFormatter::new(&world.config).format(
        &[record],
        NodeCategory::Secure,
        RecordKind::Downtime,
    );
    assert_eq!(payloads.len(), 1);

    let http = Arc::new(ScriptedHttpClient {
        post_status: world.post_status,
        ..Default::default()
    });
    let client: Arc<dyn HttpClient> = Arc::clone(&http) as Arc<dyn HttpClient>;
    let dispatcher = WebhookDispatcher::new(WEBHOOK, client);
    world.dispatch_result = Some(dispatcher.send(&payloads[0]).await);
    world.http = Some(http);
}

#[then(expr = "the delivery succeeds with status {int}")]
fn delivery_succeeds(world: &mut NodewatchWorld, status: u16) {
    let result = world.dispatch_result.as_ref().expect("nothing delivered");
    assert_eq!(*result.as_ref().unwrap(), status);
}

#[then(expr = "the delivery fails with status {int}")]
fn delivery_fails(world: &mut NodewatchWorld, status: u16) {
    let result = world.dispatch_result.as_ref().expect("nothing delivered");
    let err = result.as_ref().unwrap_err();
    assert_eq!(err.delivery_status(), Some(status));
}
