use anyhow::{anyhow, Result};
use log::info;
use std::env;

use compass_analysis::env_loader;
use compass_analysis::report;
use compass_analysis::settings::Settings;
use compass_analysis::store::AnalysisStore;

const USAGE: &str = "usage: compass-history [list | show <organization> | remove <organization>]";

#[tokio::main]
async fn main() -> Result<()> {
    env_loader::load_env();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let settings = Settings::from_env()?;
    let store = settings.open_store().await?;

    match args.first().map(String::as_str) {
        None | Some("list") => list(store.as_ref()).await,
        Some("show") => show(store.as_ref(), &topic_arg(&args)?).await,
        Some("remove") => remove(store.as_ref(), &topic_arg(&args)?).await,
        Some(other) => Err(anyhow!("Unknown command '{}'\n{}", other, USAGE)),
    }
}

/// Everything after the command, so unquoted multi-word names work.
fn topic_arg(args: &[String]) -> Result<String> {
    let topic = args[1..].join(" ");
    if topic.trim().is_empty() {
        return Err(anyhow!("Missing organization name\n{}", USAGE));
    }
    Ok(topic)
}

async fn list(store: &dyn AnalysisStore) -> Result<()> {
    let summaries = store.list().await?;
    info!("Listing {} saved analyses", summaries.len());
    println!("\n📚 Saved analyses:");
    print!("{}", report::render_history(&summaries));
    Ok(())
}

async fn show(store: &dyn AnalysisStore, topic: &str) -> Result<()> {
    let analysis = store.load(topic).await?;
    println!("\n{}", report::render_analysis(&analysis));
    Ok(())
}

async fn remove(store: &dyn AnalysisStore, topic: &str) -> Result<()> {
    if store.remove(topic).await? {
        println!("🗑️  Removed saved analysis for {}", topic);
    } else {
        println!("Nothing saved for {}", topic);
    }
    Ok(())
}
