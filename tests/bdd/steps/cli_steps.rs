#![allow(deprecated)]
use cucumber::{then, when};
use serde_json::Value;

use crate::DeskWorld;
use crate::steps::web_steps::json_at;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a command line on whitespace, keeping double-quoted runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }
    args
}

/// Run `taskdesk` against the world's database and record its output.
fn run_taskdesk(world: &mut DeskWorld, args: &[String]) {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set; did you forget 'Given a taskdesk database is initialized'?");

    let output = assert_cmd::Command::cargo_bin("taskdesk")
        .expect("taskdesk binary not found")
        .env("TASKDESK_DB", db_path)
        .args(args)
        .output()
        .expect("failed to run taskdesk");

    world.last_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    world.last_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    world.last_exit_code = output.status.code().unwrap_or(-1);
}

fn parse_stdout(world: &DeskWorld) -> Value {
    serde_json::from_str(&world.last_stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not valid JSON: {e}\nstdout: {}\nstderr: {}",
            world.last_stdout, world.last_stderr
        )
    })
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when(expr = "I run taskdesk {string}")]
async fn i_run_taskdesk(world: &mut DeskWorld, line: String) {
    let args = split_args(&line);
    run_taskdesk(world, &args);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the command succeeds")]
async fn the_command_succeeds(world: &mut DeskWorld) {
    assert_eq!(
        world.last_exit_code, 0,
        "expected success but got exit {}: {}",
        world.last_exit_code, world.last_stderr
    );
}

#[then("the command fails")]
async fn the_command_fails(world: &mut DeskWorld) {
    assert_ne!(
        world.last_exit_code, 0,
        "expected failure but the command succeeded:\n{}",
        world.last_stdout
    );
}

#[then(expr = "stdout contains {string}")]
async fn stdout_contains(world: &mut DeskWorld, expected: String) {
    assert!(
        world.last_stdout.contains(&expected),
        "expected stdout to contain {expected:?} but got:\n{}",
        world.last_stdout
    );
}

#[then(expr = "stderr contains {string}")]
async fn stderr_contains(world: &mut DeskWorld, expected: String) {
    assert!(
        world.last_stderr.contains(&expected),
        "expected stderr to contain {expected:?} but got:\n{}",
        world.last_stderr
    );
}

#[then(expr = "the JSON output field {string} equals {string}")]
async fn the_json_output_field_equals_string(
    world: &mut DeskWorld,
    path: String,
    expected: String,
) {
    let json = parse_stdout(world);
    let actual = json_at(&json, &path);
    assert_eq!(
        actual.as_str(),
        Some(expected.as_str()),
        "expected output field '{path}' to equal {expected:?} but got {actual}"
    );
}

#[then(expr = "the JSON output field {string} equals {int}")]
async fn the_json_output_field_equals_int(world: &mut DeskWorld, path: String, expected: i64) {
    let json = parse_stdout(world);
    let actual = json_at(&json, &path);
    assert_eq!(
        actual.as_i64(),
        Some(expected),
        "expected output field '{path}' to equal {expected} but got {actual}"
    );
}
