//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LISTENING_SET: &str = "../../question-sets/listening.json";
const BEHAVIOUR_SET: &str = "../../question-sets/behaviour.json";

/// A command isolated from any user or environment configuration.
fn skillcheck(home: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("skillcheck").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("SKILLCHECK_API_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Headless assessment sessions"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skillcheck"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    skillcheck(&dir)
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created skillcheck.toml"))
        .stdout(predicate::str::contains("Created question-sets/listening.json"))
        .stdout(predicate::str::contains("Created question-sets/behaviour.json"));

    assert!(dir.path().join("skillcheck.toml").exists());
    assert!(dir.path().join("question-sets/listening.json").exists());
    assert!(dir.path().join("question-sets/behaviour.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    skillcheck(&dir)
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    skillcheck(&dir)
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn simulate_listening_run_submits_and_navigates() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "listening", "--dry-run"])
        .args(["--question-set", LISTENING_SET])
        .args(["--script", "../../scripts/listening-complete.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("media corrected to 12.5s"))
        .stdout(predicate::str::contains("submitted"))
        .stdout(predicate::str::contains("navigate to TestSelection"))
        .stdout(predicate::str::contains("Responses recorded locally"));
}

#[test]
fn simulate_listening_incomplete_keeps_session_open() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "listening", "--dry-run"])
        .args(["--question-set", LISTENING_SET])
        .args(["--script", "../../scripts/listening-incomplete.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please answer all multiple choice questions before submitting.",
        ))
        .stdout(predicate::str::contains("InProgress"))
        .stdout(predicate::str::contains("lq2, lq3, lq4"));
}

#[test]
fn simulate_behaviour_run() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "behaviour", "--dry-run"])
        .args(["--question-set", BEHAVIOUR_SET])
        .args(["--script", "../../scripts/behaviour-complete.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 5 of 5"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("navigate to TestSelection"));
}

#[test]
fn simulate_without_play_credits_locks_questions() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("denied.toml");
    std::fs::write(
        &script,
        r#"
[[steps]]
action = "dismiss_instructions"

[[steps]]
action = "media"
media = "play_requested"
position = 3.0

[[steps]]
action = "select_option"
question_id = "lq1"
option = "A. The project sponsor was travelling"
"#,
    )
    .unwrap();

    skillcheck(&home)
        .args(["simulate", "--test", "listening", "--dry-run", "--max-plays", "0"])
        .args(["--question-set", LISTENING_SET])
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("media corrected to 0.0s"))
        .stdout(predicate::str::contains(
            "questions are not available until the audio has been heard",
        ));
}

#[test]
fn simulate_writes_transcript() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    skillcheck(&home)
        .args(["simulate", "--test", "behaviour", "--dry-run"])
        .args(["--question-set", BEHAVIOUR_SET])
        .args(["--script", "../../scripts/behaviour-complete.toml"])
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Transcript saved to"));

    let entries: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    let transcript: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&entries[0]).unwrap()).unwrap();
    assert_eq!(transcript["test"], "behaviour");
    assert!(transcript["session_id"].is_string());
    assert!(!transcript["steps"].as_array().unwrap().is_empty());
}

#[test]
fn simulate_missing_question_set_fails() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "listening", "--dry-run"])
        .args(["--question-set", "nonexistent.json"])
        .args(["--script", "../../scripts/listening-complete.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn simulate_unknown_sink_fails() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "behaviour", "--sink", "nope"])
        .args(["--question-set", BEHAVIOUR_SET])
        .args(["--script", "../../scripts/behaviour-complete.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sink 'nope' not found"));
}

#[test]
fn simulate_rejects_unknown_test_kind() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .args(["simulate", "--test", "reading", "--dry-run"])
        .args(["--question-set", BEHAVIOUR_SET])
        .args(["--script", "../../scripts/behaviour-complete.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown test kind"));
}

#[test]
fn list_sinks_without_config() {
    let home = TempDir::new().unwrap();
    skillcheck(&home)
        .current_dir(home.path())
        .arg("list-sinks")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sinks configured"));
}

#[test]
fn list_sinks_from_config_and_env() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("skillcheck.toml");
    std::fs::write(
        &config,
        "default_sink = \"console\"\n[sinks.console]\ntype = \"log\"\n",
    )
    .unwrap();

    skillcheck(&home)
        .env("SKILLCHECK_API_BASE_URL", "http://api.example.test")
        .arg("list-sinks")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("console (default)"))
        .stdout(predicate::str::contains("http://api.example.test/test/submit"));
}
