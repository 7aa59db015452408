mod feed_stub;

use std::fs;

use predicates::prelude::*;
use serde_json::Value;

use feed_stub::{FEED, FeedStub};

fn shelfpulse() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("shelfpulse");
    cmd.env_remove("GOODREADS_RSS_URL")
        .env_remove("GOODREADS_USER_ID")
        .env_remove("GOODREADS_CHALLENGE_GOAL");
    cmd
}

#[test]
fn inspect_reports_groups_and_current_book() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("feed.xml");
    fs::write(&input, FEED).expect("write feed");

    let output = shelfpulse()
        .args(["inspect", "--input"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("inspect output is json");
    assert_eq!(json["entries_total"], 3);
    assert_eq!(json["current"]["title"], "Ender's Game");
    assert_eq!(json["current"]["progress_percent"], 41);
    assert_eq!(json["current"]["entries_count"], 2);
    assert!(json["challenge"].is_null());
}

#[test]
fn inspect_window_limits_considered_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("feed.xml");
    fs::write(&input, FEED).expect("write feed");

    let output = shelfpulse()
        .args(["inspect", "--entry-window", "1", "--input"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("inspect output is json");
    assert_eq!(json["entries_in_window"], 1);
    assert_eq!(json["current"]["entries_count"], 1);
}

#[test]
fn inspect_missing_file_fails() {
    shelfpulse()
        .args(["inspect", "--input", "/nonexistent/feed.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read feed file"));
}

#[test]
fn snapshot_prints_payload_from_live_feed() {
    let stub = FeedStub::spawn();

    let output = shelfpulse()
        .args(["snapshot", "--feed-url", &stub.feed_url()])
        .args(["--user-id", "42", "--profile-base-url", &stub.base_url])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("snapshot output is json");
    assert_eq!(json["title"], "Ender's Game");
    assert_eq!(json["progress"], 41);
    assert_eq!(json["challenge"], "26 of 30 books");
    assert_eq!(json["challenge_progress_percent"], 87);
}

#[test]
fn snapshot_without_feed_url_requires_configuration() {
    shelfpulse()
        .args(["snapshot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration required"));
}

#[test]
fn snapshot_rejects_placeholder_feed_url() {
    shelfpulse()
        .env(
            "GOODREADS_RSS_URL",
            "https://www.goodreads.com/user/updates_rss/YOUR_USER_ID?key=YOUR_RSS_KEY",
        )
        .args(["snapshot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("feed.xml");
    fs::write(&input, FEED).expect("write feed");

    shelfpulse()
        .env("RUST_LOG", "debug")
        .args(["inspect", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
