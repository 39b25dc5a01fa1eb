use cucumber::{given, then, when};
use reqwest::Method;
use serde_json::Value;

use crate::DeskWorld;
use crate::steps::common_steps::resolve_aliases;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Start an in-process axum server using the world's temp database.
/// Binds to a random free port (port 0) and records it on the world.
pub async fn start_test_server(world: &mut DeskWorld) -> u16 {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set; did you forget 'Given a taskdesk database is initialized'?")
        .clone();

    let db = taskdesk::db::Database::open(&db_path).expect("failed to open database for server");
    let app = taskdesk::web::create_router(taskdesk::web::AppState::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to ephemeral port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("web server error in test");
    });

    world.server_port = Some(port);
    world.server_handle = Some(handle);

    // Poll until the server answers (up to 20 tries).
    for _ in 0..20 {
        if world
            .http_client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    port
}

/// Send a request with an optional raw JSON body. Placeholders like
/// `<task:alias>` in the path and body are resolved first. Stores the status,
/// content type and body on the world.
pub async fn http_request(
    world: &mut DeskWorld,
    method: Method,
    path: &str,
    body: Option<&str>,
) -> (u16, String) {
    let port = world
        .server_port
        .expect("server not started; add 'Given the API server is running'");
    let path = resolve_aliases(world, path);
    let url = format!("http://127.0.0.1:{port}{path}");

    let mut req = world.http_client.request(method.clone(), &url);
    if let Some(raw) = body {
        req = req
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(resolve_aliases(world, raw));
    }
    let resp = req
        .send()
        .await
        .unwrap_or_else(|e| panic!("{method} {url} failed: {e}"));

    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let text = resp
        .text()
        .await
        .unwrap_or_else(|e| panic!("failed to read response body: {e}"));

    world.last_response_status = Some(status);
    world.last_response_content_type = content_type;
    world.last_response_body = Some(text.clone());
    (status, text)
}

/// Parse the last response body as JSON, panicking if it is not valid JSON.
pub fn parse_last_response(world: &DeskWorld) -> Value {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded");
    serde_json::from_str(body)
        .unwrap_or_else(|e| panic!("response body is not valid JSON: {e}\nbody: {body}"))
}

/// Walk a dot-separated path such as `tasks.0.title`. An empty path is the root.
pub fn json_at<'a>(json: &'a Value, path: &str) -> &'a Value {
    let mut current = json;
    for key in path.split('.').filter(|k| !k.is_empty()) {
        current = match key.parse::<usize>() {
            Ok(idx) if current.is_array() => &current[idx],
            _ => &current[key],
        };
    }
    current
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("the API server is running")]
async fn the_api_server_is_running(world: &mut DeskWorld) {
    start_test_server(world).await;
}

// ---------------------------------------------------------------------------
// When steps: raw HTTP verbs
// ---------------------------------------------------------------------------

#[when(expr = "I GET {string}")]
async fn i_get_path(world: &mut DeskWorld, path: String) {
    http_request(world, Method::GET, &path, None).await;
}

#[when(expr = "I POST {string} with body {string}")]
async fn i_post_path_with_body(world: &mut DeskWorld, path: String, body: String) {
    http_request(world, Method::POST, &path, Some(&body)).await;
}

#[when(expr = "I PUT {string} with body {string}")]
async fn i_put_path_with_body(world: &mut DeskWorld, path: String, body: String) {
    http_request(world, Method::PUT, &path, Some(&body)).await;
}

#[when(expr = "I PATCH {string} with body {string}")]
async fn i_patch_path_with_body(world: &mut DeskWorld, path: String, body: String) {
    http_request(world, Method::PATCH, &path, Some(&body)).await;
}

#[when(expr = "I DELETE {string}")]
async fn i_delete_path(world: &mut DeskWorld, path: String) {
    http_request(world, Method::DELETE, &path, None).await;
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then(expr = "the response status is {int}")]
async fn the_response_status_is(world: &mut DeskWorld, expected: u16) {
    let actual = world
        .last_response_status
        .expect("no HTTP response recorded; did you make a request?");
    assert_eq!(
        actual,
        expected,
        "expected HTTP status {expected} but got {actual}; body: {}",
        world.last_response_body.as_deref().unwrap_or("")
    );
}

#[then(expr = "the response body contains {string}")]
async fn the_response_body_contains(world: &mut DeskWorld, expected: String) {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded; did you make a request?");
    assert!(
        body.contains(&expected),
        "expected response body to contain {expected:?}, but body was:\n{body}"
    );
}

/// Partial match on the Content-Type header, e.g. "text/html".
#[then(expr = "the response content type is {string}")]
async fn the_response_content_type_is(world: &mut DeskWorld, expected: String) {
    let actual = world
        .last_response_content_type
        .as_deref()
        .unwrap_or("<no content-type header>");
    assert!(
        actual.contains(&expected),
        "expected Content-Type to contain {expected:?} but got {actual:?}"
    );
}

#[then(expr = "the error message is {string}")]
async fn the_error_message_is(world: &mut DeskWorld, expected: String) {
    let json = parse_last_response(world);
    assert_eq!(
        json["error"].as_str(),
        Some(expected.as_str()),
        "unexpected error body: {json}"
    );
}

#[then(expr = "the response JSON field {string} equals {string}")]
async fn the_response_json_field_equals_string(
    world: &mut DeskWorld,
    path: String,
    expected: String,
) {
    let json = parse_last_response(world);
    let actual = json_at(&json, &path);
    assert_eq!(
        actual.as_str(),
        Some(expected.as_str()),
        "expected JSON field '{path}' to equal {expected:?} but got {actual}"
    );
}

#[then(expr = "the response JSON field {string} equals {int}")]
async fn the_response_json_field_equals_int(world: &mut DeskWorld, path: String, expected: i64) {
    let json = parse_last_response(world);
    let actual = json_at(&json, &path);
    assert_eq!(
        actual.as_i64(),
        Some(expected),
        "expected JSON field '{path}' to equal {expected} but got {actual}"
    );
}

#[then(expr = "the response JSON field {string} is null")]
async fn the_response_json_field_is_null(world: &mut DeskWorld, path: String) {
    let json = parse_last_response(world);
    let obj_path = path.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
    let key = path.rsplit('.').next().unwrap_or(&path);
    let parent = json_at(&json, obj_path);
    assert!(
        parent.get(key).is_some_and(Value::is_null),
        "expected JSON field '{path}' to be present and null in: {json}"
    );
}

#[then(expr = "the response JSON list {string} has length {int}")]
async fn the_response_json_list_has_length(world: &mut DeskWorld, path: String, expected: usize) {
    let json = parse_last_response(world);
    let list = json_at(&json, &path)
        .as_array()
        .unwrap_or_else(|| panic!("expected '{path}' to be a JSON array in: {json}"));
    assert_eq!(
        list.len(),
        expected,
        "expected {expected} element(s) at '{path}' but got {}",
        list.len()
    );
}

/// Compare one field of every element, in order, against a comma-separated list.
#[then(expr = "the response JSON list {string} has {string} values {string}")]
async fn the_response_json_list_has_values(
    world: &mut DeskWorld,
    path: String,
    field: String,
    expected: String,
) {
    let json = parse_last_response(world);
    let list = json_at(&json, &path)
        .as_array()
        .unwrap_or_else(|| panic!("expected '{path}' to be a JSON array in: {json}"));
    let actual: Vec<String> = list
        .iter()
        .map(|item| match &item[&field] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let expected: Vec<String> = expected.split(", ").map(str::to_string).collect();
    assert_eq!(actual, expected, "unexpected '{field}' values at '{path}'");
}
