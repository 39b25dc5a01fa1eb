#![allow(deprecated)]
use cucumber::given;
use regex::Regex;

use crate::DeskWorld;

/// Run `taskdesk init` (plus any extra args) against a fresh temp database.
fn init_database(world: &mut DeskWorld, extra_args: &[&str]) {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("taskdesk.db");

    let output = assert_cmd::Command::cargo_bin("taskdesk")
        .expect("taskdesk binary not found")
        .env("TASKDESK_DB", &db_path)
        .arg("init")
        .args(extra_args)
        .output()
        .expect("failed to run taskdesk init");

    assert!(
        output.status.success(),
        "taskdesk init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    world.db_path = Some(db_path);
    // Keep the TempDir alive for the lifetime of the scenario.
    world.db_dir = Some(dir);
}

/// Replace `<task:alias>` and `<user:alias>` placeholders with stored ids.
pub fn resolve_aliases(world: &DeskWorld, text: &str) -> String {
    let re = Regex::new(r"<(task|user):([\w-]+)>").expect("alias pattern");
    re.replace_all(text, |caps: &regex::Captures| {
        let ids = if &caps[1] == "task" {
            &world.task_ids
        } else {
            &world.user_ids
        };
        ids.get(&caps[2])
            .unwrap_or_else(|| panic!("no {} with alias '{}'", &caps[1], &caps[2]))
            .to_string()
    })
    .into_owned()
}

#[given("a taskdesk database is initialized")]
async fn a_taskdesk_database_is_initialized(world: &mut DeskWorld) {
    init_database(world, &[]);
}

#[given("a taskdesk database is initialized with sample tasks")]
async fn a_taskdesk_database_with_samples(world: &mut DeskWorld) {
    init_database(world, &["--seed"]);
}

/// Point the world at a database path that does not exist yet.
#[given("no taskdesk database exists")]
async fn no_taskdesk_database_exists(world: &mut DeskWorld) {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    world.db_path = Some(dir.path().join("missing").join("taskdesk.db"));
    world.db_dir = Some(dir);
}
