use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::thread;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const BODY: &str = r#"[
  {"id": 1, "langcode": "fi", "title": "Kirjasto", "field_summary": "Lainaa kirjoja"},
  {"id": 2, "langcode": "fi", "title": "Uimahalli", "field_phone": "040 123"}
]"#;

/// Answer every incoming request with `BODY` until the test process exits.
fn serve_fixture() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{BODY}",
        BODY.len()
    );
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }
            let mut stream = stream;
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

fn placesync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("placesync"));
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info")
        .env_remove("TAMPERE_API_URL")
        .env_remove("TAMPERE_API_AUTH")
        .env_remove("PLACESYNC_STORE")
        .env_remove("PLACESYNC_LANGUAGES")
        .env_remove("PLACESYNC_DEFAULT_LANGUAGE")
        .env_remove("PLACESYNC_FALLBACK_LANGUAGE")
        .env_remove("PLACESYNC_HTTP_TIMEOUT_SECS");
    cmd
}

fn records_json(home: &Path, store: &Path) -> serde_json::Value {
    let output = placesync_cmd(home)
        .arg("--store")
        .arg(store)
        .args(["records", "--json"])
        .output()
        .expect("run placesync records");
    assert!(output.status.success(), "records failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("records JSON")
}

#[test]
fn sync_creates_records_from_remote_export() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");
    let base = serve_fixture();

    placesync_cmd(home.path())
        .env("TAMPERE_API_URL", &base)
        .env("TAMPERE_API_AUTH", "user:secret")
        .arg("--store")
        .arg(&store)
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("2 created"));

    let records = records_json(home.path(), &store);
    let records = records.as_array().expect("array");
    assert_eq!(records.len(), 2);
    let keys: Vec<&str> = records
        .iter()
        .filter_map(|r| r["external_key"].as_str())
        .collect();
    assert_eq!(keys, vec!["1-fi", "2-fi"]);
    assert_eq!(records[0]["title"], "Kirjasto");
    assert_eq!(records[0]["language"], "fi");
}

#[test]
fn second_sync_reports_records_unchanged() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");
    let base = serve_fixture();

    placesync_cmd(home.path())
        .env("TAMPERE_API_URL", &base)
        .env("TAMPERE_API_AUTH", "user:secret")
        .arg("--store")
        .arg(&store)
        .arg("sync")
        .assert()
        .success();

    placesync_cmd(home.path())
        .env("TAMPERE_API_URL", &base)
        .env("TAMPERE_API_AUTH", "user:secret")
        .arg("--store")
        .arg(&store)
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("0 created, 0 updated, 2 unchanged, 0 deleted"));

    assert_eq!(records_json(home.path(), &store).as_array().unwrap().len(), 2);
}

#[test]
fn dry_run_reports_plan_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");
    let base = serve_fixture();

    placesync_cmd(home.path())
        .env("TAMPERE_API_URL", &base)
        .env("TAMPERE_API_AUTH", "user:secret")
        .arg("--store")
        .arg(&store)
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("2 to create"))
        .stdout(contains("1-fi Kirjasto"));

    assert!(!store.exists(), "dry run must not create the store");
}

#[test]
fn unreachable_api_still_exits_successfully() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");
    let closed = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    placesync_cmd(home.path())
        .env("TAMPERE_API_URL", &base)
        .env("TAMPERE_API_AUTH", "user:secret")
        .env("PLACESYNC_HTTP_TIMEOUT_SECS", "2")
        .arg("--store")
        .arg(&store)
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("aborted"));

    assert!(!store.exists());
}

#[test]
fn missing_api_configuration_is_logged_not_fatal() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");

    placesync_cmd(home.path())
        .arg("--store")
        .arg(&store)
        .arg("import")
        .assert()
        .success()
        .stderr(contains("TAMPERE_API_URL"));

    assert!(!store.exists());
}

#[test]
fn records_on_empty_store() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("records.json");

    placesync_cmd(home.path())
        .arg("--store")
        .arg(&store)
        .arg("records")
        .assert()
        .success()
        .stdout(contains("No records."));
}
