mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn cli() -> Command {
    let mut cmd = Command::new(cargo_bin!("bulk-processor"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_summarize_prints_batch_aggregate() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cli();
    cmd.arg("summarize").arg("tests/fixtures/batch.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "amount,currency,payerIdentifier,transactions",
        ))
        .stdout(predicate::str::contains("15.75,USD,24450000000,2"));

    Ok(())
}

#[test]
fn test_summarize_rejects_malformed_row() {
    let mut cmd = cli();
    cmd.arg("summarize").arg("tests/fixtures/malformed.csv");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("malformed row at line 3"));
}

#[test]
fn test_summarize_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generated.csv");
    common::generate_csv(&path, &["0.10", "0.20", "0.30"]).unwrap();

    let mut cmd = cli();
    cmd.arg("summarize").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.60,USD,24450000000,3"));
}

#[test]
fn test_run_reports_final_state() {
    let mut server = mockito::Server::new();
    let auth = server
        .mock("POST", mockito::Matcher::Regex("^/batches/".to_string()))
        .with_status(200)
        .create();
    let callback = server
        .mock("POST", "/cb")
        .with_status(200)
        .expect(1)
        .create();

    let mut cmd = cli();
    cmd.env("BULK_AUTHORIZATION_URL", server.url())
        .env("BULK_TENANTS", "gorilla")
        .env("BULK_THRESHOLD_DELAY_SECS", "0")
        .arg("run")
        .arg("tests/fixtures/batch.csv")
        .arg("--request-id")
        .arg("req-9")
        .arg("--tenant")
        .arg("gorilla")
        .arg("--callback-url")
        .arg(format!("{}/cb", server.url()));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"requestId\": \"req-9\""))
        .stdout(predicate::str::contains("\"phaseCount\": 8"))
        .stdout(predicate::str::contains("\"callbackSuccess\": true"));

    auth.assert();
    callback.assert();
}

#[test]
fn test_run_rejects_unknown_tenant() {
    let mut cmd = cli();
    cmd.env("BULK_TENANTS", "gorilla")
        .arg("run")
        .arg("tests/fixtures/batch.csv")
        .arg("--request-id")
        .arg("req-9")
        .arg("--tenant")
        .arg("rhino");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid tenant"));
}
