//! End-to-end runs of the `civhub` binary.

use std::fs;

use serde_json::Value;

use crate::common::{Sandbox, stdout};

#[test]
fn default_command_prints_status() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&[]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("System Status"));
    assert!(out.contains("META 50/50"));
    assert!(!out.contains("\x1b["), "piped output should not be colored");
}

#[test]
fn unknown_domain_exits_with_one() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--domain", "alchemy"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Domain 'alchemy' not found."));
}

#[test]
fn prove_as_json_is_parseable() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--prove", "--format", "json"]);
    assert!(output.status.success());

    let proof: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(proof["system"], "Civilisation Hub");
    assert_eq!(proof["all_valid"], true);
}

#[test]
fn save_list_and_stats_share_the_database() {
    let sandbox = Sandbox::new();
    assert!(sandbox.run(&["--save"]).status.success());
    assert!(sandbox.db_path().exists());

    let listed = stdout(&sandbox.run(&["--list-saved"]));
    assert!(listed.contains("Saved domains (5):"));
    assert!(listed.contains("✓ Physics (fundamental)"));

    let output = sandbox.run(&["--delete-domain", "physics"]);
    assert!(output.status.success());
    let stats = stdout(&sandbox.run(&["--db-stats"]));
    assert!(stats.contains("Total domains: 4"));

    let missing = sandbox.run(&["--delete-domain", "physics"]);
    assert_eq!(missing.status.code(), Some(1));
}

#[test]
fn config_format_applies_and_bad_config_fails() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.config_path(), "[output]\nformat = \"json\"\n").unwrap();
    let output = sandbox.run(&["--db-stats"]);
    assert!(output.status.success());
    let stats: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(stats["total_domains"], 0);

    fs::write(sandbox.config_path(), "[output\n").unwrap();
    let output = sandbox.run(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}

#[test]
fn remember_format_writes_config() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--format", "markdown", "--remember-format"]);
    assert!(output.status.success());

    let written = fs::read_to_string(sandbox.config_path()).unwrap();
    assert!(written.contains("format = \"markdown\""));
}

#[test]
fn logs_go_to_the_data_directory() {
    let sandbox = Sandbox::new();
    assert!(sandbox.run(&["--verbose"]).status.success());
    let log = sandbox.path().join(".civhub").join("logs").join("civhub.log");
    let content = fs::read_to_string(log).unwrap();
    assert!(content.contains("Logging initialized"));
}

#[test]
fn save_domain_as_json_is_parseable() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--save-domain", "physics", "--format", "json"]);
    assert!(output.status.success());
    let saved: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(saved["saved"], "Physics");

    let output = sandbox.run(&["--delete-domain", "physics", "--format", "json"]);
    let deleted: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(deleted["found"], true);

    let output = sandbox.run(&["--delete-domain", "physics", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let missing: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(missing["found"], false);
}

#[test]
fn saving_twice_across_runs_keeps_counts() {
    let sandbox = Sandbox::new();
    let db_stats = || -> Value {
        let output = sandbox.run(&["--db-stats", "--format", "json"]);
        serde_json::from_str(stdout(&output).trim()).unwrap()
    };

    assert!(sandbox.run(&["--save"]).status.success());
    let first = db_stats();
    assert!(first["total_concepts"].as_u64().unwrap() > 0);

    assert!(sandbox.run(&["--save"]).status.success());
    assert!(sandbox.run(&["--save-domain", "biology"]).status.success());
    assert_eq!(db_stats(), first);
}
