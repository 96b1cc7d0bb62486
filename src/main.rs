use anyhow::{anyhow, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::future::Future;
use std::time::Duration;

use compass_analysis::category::AnalysisCategory;
use compass_analysis::client::AnalysisClient;
use compass_analysis::env_loader;
use compass_analysis::models::OrganizationAnalysis;
use compass_analysis::report;
use compass_analysis::settings::Settings;
use compass_analysis::store::AnalysisStore;
use compass_analysis::suggestions::{filter_suggestions, merged_suggestions};

/// Most suggestions shown after the topic prompt.
const MAX_SUGGESTIONS: usize = 8;

/// What the user asked to fetch.
enum Selection {
    One(AnalysisCategory),
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_loader::load_env();
    env_logger::init();

    let settings = Settings::from_env()?;
    info!("Starting interactive analysis against {}", settings.api_base_url);

    let client = AnalysisClient::new(settings.client_config()).context("Failed to build HTTP client")?;
    let store = settings.open_store().await?;

    let saved_topics = store.list().await?.into_iter().map(|s| s.topic);
    let suggestions = merged_suggestions(saved_topics);
    let (selection, topic) = run_interactive_selection(&suggestions)?;

    let analyses = match selection {
        Selection::One(category) => {
            let analysis = with_spinner(
                format!("Fetching {} for {}...", category, topic),
                settings.request_timeout,
                client.fetch(category, &topic),
            )
            .await?
            .context(format!("{} fetch for '{}' failed", category, topic))?;
            vec![analysis]
        }
        Selection::All => {
            let results = with_spinner(
                format!("Fetching every category for {}...", topic),
                settings.request_timeout,
                client.fetch_many(&AnalysisCategory::SELECTABLE, &topic),
            )
            .await?;

            let mut analyses = Vec::new();
            for (category, result) in results {
                match result {
                    Ok(analysis) => analyses.push(analysis),
                    Err(e) => println!("❌ {}: {}", category, e),
                }
            }
            analyses
        }
    };

    if analyses.is_empty() {
        return Err(anyhow!("No analysis could be fetched for '{}'", topic));
    }
    for analysis in &analyses {
        println!("\n{}", report::render_analysis(analysis));
    }

    offer_save(store.as_ref(), &topic, &analyses).await?;
    Ok(())
}

/// Prompts for a category (or all of them) and a non-empty topic.
fn run_interactive_selection(suggestions: &[String]) -> Result<(Selection, String)> {
    let theme = ColorfulTheme::default();

    println!("\n🧭 Select an analysis:");
    let mut options: Vec<String> = AnalysisCategory::SELECTABLE
        .iter()
        .map(|c| format!("{} {}", c.icon(), c.display_name()))
        .collect();
    options.push("🔎 All categories".to_string());

    let choice = Select::with_theme(&theme)
        .with_prompt("Choose a category")
        .default(0)
        .items(&options)
        .interact()?;
    let selection = match AnalysisCategory::SELECTABLE.get(choice) {
        Some(&category) => {
            println!("✅ {}", category.prompt());
            Selection::One(category)
        }
        None => Selection::All,
    };

    let topic: String = Input::with_theme(&theme)
        .with_prompt("Organization")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Please enter an organization name")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let topic = pick_suggestion(&theme, topic.trim(), suggestions)?;
    Ok((selection, topic))
}

/// Offers known organizations matching what was typed; keeps the typed text
/// when nothing else matches or the user prefers it.
fn pick_suggestion(theme: &ColorfulTheme, typed: &str, suggestions: &[String]) -> Result<String> {
    let mut matches = filter_suggestions(typed, suggestions);
    matches.truncate(MAX_SUGGESTIONS);
    if matches.is_empty() || (matches.len() == 1 && matches[0].eq_ignore_ascii_case(typed)) {
        return Ok(typed.to_string());
    }

    let mut options = vec![format!("Use \"{}\" as typed", typed)];
    options.extend(matches.iter().map(|m| m.to_string()));
    let choice = Select::with_theme(theme)
        .with_prompt("Did you mean")
        .default(0)
        .items(&options)
        .interact()?;
    Ok(match choice {
        0 => typed.to_string(),
        n => matches[n - 1].to_string(),
    })
}

/// Runs `fut` behind a spinner, giving up after `timeout`.
async fn with_spinner<T>(message: String, timeout: Duration, fut: impl Future<Output = T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = tokio::time::timeout(timeout, fut).await;
    spinner.finish_and_clear();
    outcome.map_err(|_| anyhow!("Analysis service did not answer within {:?}", timeout))
}

async fn offer_save(store: &dyn AnalysisStore, topic: &str, analyses: &[OrganizationAnalysis]) -> Result<()> {
    let theme = ColorfulTheme::default();

    let to_save = if analyses.len() == 1 {
        if !Confirm::with_theme(&theme)
            .with_prompt("Save this analysis?")
            .default(false)
            .interact()?
        {
            return Ok(());
        }
        &analyses[0]
    } else {
        let mut options: Vec<String> = analyses.iter().map(|a| a.category.display_name().to_string()).collect();
        options.push("Don't save".to_string());
        let choice = Select::with_theme(&theme)
            .with_prompt("Save which analysis? (one per organization)")
            .default(options.len() - 1)
            .items(&options)
            .interact()?;
        match analyses.get(choice) {
            Some(analysis) => analysis,
            None => return Ok(()),
        }
    };

    if store.contains(topic).await? {
        let overwrite = Confirm::with_theme(&theme)
            .with_prompt(format!("'{}' is already saved. Replace it?", topic))
            .default(false)
            .interact()?;
        if !overwrite {
            return Ok(());
        }
    }

    if store.upsert(topic, to_save).await? {
        println!("💾 Saved {} for {}", to_save.category, topic);
    } else {
        println!("⚠️  Nothing saved: the organization name is blank");
    }
    Ok(())
}
