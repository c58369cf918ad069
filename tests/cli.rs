use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("cardreview")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("approve"))
        .stdout(predicate::str::contains("post"))
        .stdout(predicate::str::contains("duplicate"));
}

#[test]
fn test_list_rejects_malformed_date() {
    Command::cargo_bin("cardreview")
        .unwrap()
        .args(["list", "--from", "03/14/2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_missing_subcommand_fails_with_usage() {
    Command::cargo_bin("cardreview")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
