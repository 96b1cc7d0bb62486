use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found. Variables already set in the process
/// environment win over the file.
pub fn load_env() {
    let mut loaded_env = false;
    for path in ENV_PATHS.iter() {
        if Path::new(path).exists() {
            if let Err(e) = load_env_from_file(path) {
                warn!("Failed to load environment from {}: {}", path, e);
            } else {
                info!("Loaded environment variables from {}", path);
                loaded_env = true;
                break;
            }
        }
    }
    if !loaded_env {
        info!("No .env file found, using environment variables from system");
    }
}

fn load_env_from_file(file_path: &str) -> Result<()> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(file_path).context(format!("Could not open env file '{}'", file_path))?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line.context("Failed to read line from env file")?;
        let Some((key, value)) = parse_env_line(&line) else {
            continue;
        };
        if std::env::var(key).is_err() {
            std::env::set_var(key, value);
            debug!(
                "Set env var from file: {} = {}",
                key,
                if is_secret_key(key) { "[hidden]" } else { value }
            );
        }
    }
    Ok(())
}

/// `KEY=value` with optional surrounding quotes. Comments and blank lines
/// yield `None`.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') || line.is_empty() {
        return None;
    }
    let idx = line.find('=')?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    let value = line[idx + 1..].trim().trim_matches('"');
    Some((key, value))
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["PASSWORD", "SECRET", "TOKEN", "API_KEY"]
        .iter()
        .any(|marker| key.contains(marker))
}
