//! The `skillcheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing("skillcheck.toml", SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-sets")?;
    write_if_missing("question-sets/listening.json", SAMPLE_LISTENING_SET)?;
    write_if_missing("question-sets/behaviour.json", SAMPLE_BEHAVIOUR_SET)?;

    println!("\nNext steps:");
    println!("  1. Point the backend sink at your API in skillcheck.toml");
    println!("  2. Write an event script (see scripts/ in the repository)");
    println!(
        "  3. Run: skillcheck simulate --test listening --question-set question-sets/listening.json --script <script.toml> --dry-run"
    );

    Ok(())
}

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    if std::path::Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        std::fs::write(path, content)?;
        println!("Created {path}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# skillcheck configuration

default_sink = "backend"
user_id = 1
max_plays = 2

[sinks.backend]
type = "http"
base_url = "${SKILLCHECK_API_BASE_URL}"
listening_path = "/test/submit"
behaviour_path = "/test/behaviour/submit"

[sinks.console]
type = "log"
"#;

const SAMPLE_LISTENING_SET: &str = include_str!("../../../../question-sets/listening.json");

const SAMPLE_BEHAVIOUR_SET: &str = include_str!("../../../../question-sets/behaviour.json");
