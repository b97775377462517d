//! The `skillcheck list-sinks` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use skillcheck_sink::{load_config_from, SinkConfig};

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    if config.sinks.is_empty() {
        println!("No sinks configured. Run `skillcheck init` to create a config file,");
        println!("or set SKILLCHECK_API_BASE_URL to use the backend sink.");
        return Ok(());
    }

    let mut names: Vec<&String> = config.sinks.keys().collect();
    names.sort();

    let mut table = Table::new();
    table.set_header(vec!["Sink", "Type", "Listening endpoint", "Behaviour endpoint", "Timeout"]);

    for name in names {
        let label = if *name == config.default_sink {
            format!("{name} (default)")
        } else {
            name.clone()
        };
        match &config.sinks[name] {
            SinkConfig::Http {
                base_url,
                listening_path,
                behaviour_path,
                timeout_secs,
            } => {
                table.add_row(vec![
                    label,
                    "http".to_string(),
                    format!("{base_url}{listening_path}"),
                    format!("{base_url}{behaviour_path}"),
                    timeout_secs.map_or("none".to_string(), |s| format!("{s}s")),
                ]);
            }
            SinkConfig::Log => {
                table.add_row(vec![
                    label,
                    "log".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
            }
        }
    }

    println!("{table}");
    println!(
        "\nUser id: {}  Play credits: {}",
        config.user_id, config.max_plays
    );
    Ok(())
}
