//! BDD step definitions for configuration feature

use cucumber::{given, then, when};

use nodewatch::config::Config;
use nodewatch::NodewatchError;

use crate::world::NodewatchWorld;

#[given(expr = "the environment variable {word} is {string}")]
fn env_var(world: &mut NodewatchWorld, name: String, value: String) {
    world.env.insert(name, value);
}

#[when("the configuration is resolved and validated")]
fn resolve_and_validate(world: &mut NodewatchWorld) {
    let mut config = Config::default();
    let env = world.env.clone();
    let result = config
        .resolve_secrets_with(|name| env.get(name).cloned())
        .and_then(|_| config.validate());
    if result.is_ok() {
        world.config = config;
    }
    world.config_result = Some(result);
}

#[then("the configuration is accepted")]
fn config_accepted(world: &mut NodewatchWorld) {
    let result = world.config_result.as_ref().expect("not validated");
    assert!(result.is_ok(), "{result:?}");
}

#[then(expr = "the configuration is rejected mentioning {string}")]
fn config_rejected(world: &mut NodewatchWorld, text: String) {
    let result = world.config_result.as_ref().expect("not validated");
    match result {
        Err(NodewatchError::Config(msg)) => assert!(msg.contains(&text), "{msg}"),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[then(regex = r"^secure node (\d+) is ignored by the configuration$")]
fn secure_ignored(world: &mut NodewatchWorld, id: u64) {
    let ignore = world.config.secure.ignore.as_deref().unwrap_or_default();
    assert!(ignore.contains(&id), "{ignore:?}");
}
