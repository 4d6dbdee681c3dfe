use anyhow::{Context, Result};
use chrono::Utc;

use flashmaster_lib::flashcards::{format_interval, Rating};

use crate::app::{short_id, App};
use crate::OutputFormat;

pub fn run(app: &App, project_name: &str, card_id: &str, rating: &str, format: &OutputFormat) -> Result<()> {
    // Validate the rating before touching storage
    let rating: Rating = rating.parse()?;

    let project = app.find_project(project_name)?;
    let card = app.find_card(project.id, card_id)?;
    let updated = app.storage
        .submit_review(project.id, card.id, rating, &app.scheduler, Utc::now())
        .context("Failed to save review")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => {
            println!("Card {} rated {}", short_id(updated.id), rating);
            println!("  State: {} -> {}", card.scheduling_state, updated.scheduling_state);
            println!("  Next review in {} ({})",
                format_interval(updated.interval_minutes),
                updated.due_at.format("%Y-%m-%d %H:%M"));
        }
    }

    Ok(())
}
