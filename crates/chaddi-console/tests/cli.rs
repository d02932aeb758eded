#![cfg(feature = "tui")]

mod support;

use std::process::{Command, Output};

use serde_json::{json, Value};
use support::StubServer;

fn routes(method: &str, url: &str) -> (u16, String) {
    let body = match (method, url) {
        ("GET", "/api/dashboard/metrics") => json!({ "messages_count": 98765, "groups_count": 3 }),
        ("GET", "/api/dashboard/activity") => json!({
            "most_active_bakchod": { "pretty_name": "Chutiya" },
            "most_active_group": { "group_id": -1001, "name": "bakchod hq" },
        }),
        ("GET", "/api/dashboard/random-quote") => json!({ "quote": null }),
        ("GET", "/api/dashboard/version") => json!({ "semver": "1.2.3", "git_commit_id": "abcdef1234567" }),
        ("GET", "/api/health") => json!({ "health": "ok" }),
        ("GET", "/api/groups/-1001/messages?page_number=1") => json!({
            "messages": [
                { "message_id": 2, "text": "second", "from_bakchod": { "username": "b" } },
                { "message_id": 1, "text": "first", "from_bakchod": { "username": "a" } },
            ],
            "total_pages": 4,
        }),
        ("POST", "/api/bakchod/rokda") => json!({ "message": "updated" }),
        _ => return (404, "{}".to_string()),
    };
    (200, body.to_string())
}

fn chaddi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chaddi-console"))
        .args(args)
        .env_remove("CHADDI_CONSOLE_BASE_URL")
        .output()
        .expect("failed to run chaddi-console")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_dashboard_json() {
    let server = StubServer::start(routes);
    let output = chaddi(&["--base-url", &server.base_url, "dashboard", "--format", "json"]);
    assert!(output.status.success(), "{:?}", output);

    let report: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(report["metrics"]["messages_count"], 98765);
    assert_eq!(report["health"]["health"], "ok");
    assert_eq!(report["version"]["semver"], "1.2.3");
    assert!(report["quote"].is_null());
}

#[test]
fn test_dashboard_fails_when_server_is_down() {
    let output = chaddi(&["--base-url", "http://127.0.0.1:1", "--timeout-ms", "500", "dashboard"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not load the dashboard"), "{}", stderr);
}

#[test]
fn test_messages_are_printed_oldest_first() {
    let server = StubServer::start(routes);
    let output = chaddi(&[
        "messages",
        "--group-id",
        "-1001",
        "--base-url",
        &server.base_url,
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let messages: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    let texts: Vec<&str> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[test]
fn test_set_rokda_validates_before_sending() {
    let server = StubServer::start(routes);
    let output = chaddi(&["--base-url", &server.base_url, "set-rokda", "--id", "42", "--rokda", "lots"]);
    assert!(!output.status.success());
    assert!(server.recorded().is_empty());

    let output = chaddi(&["--base-url", &server.base_url, "set-rokda", "--id", "42", "--rokda", "250"]);
    assert!(
        output.status.success(),
        "Command failed with status: {}",
        output.status
    );
    let stdout = stdout(&output);
    let expected = "rokda of 42 set to 250";
    assert!(
        stdout.contains(expected),
        "Expected:\n{expected}\n\nGot:\n{stdout}",
    );
    assert_eq!(server.recorded().len(), 1);
}

#[test]
fn test_set_metadata_rejects_invalid_json() {
    let output = chaddi(&["set-metadata", "--id", "42", "--metadata", "{not json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("metadata is not valid JSON"), "{}", stderr);
}
