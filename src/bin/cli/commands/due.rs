use anyhow::{Context, Result};
use chrono::Utc;

use flashmaster_lib::flashcards::{format_interval, Rating};

use crate::app::{short_id, App};
use crate::render::terminal::{state_label, truncate};
use crate::OutputFormat;

pub fn run(
    app: &App,
    project_name: &str,
    deck_title: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck_id = app.find_deck_id(project.id, deck_title)?;
    let now = Utc::now();
    let due = app.storage.due_cards(project.id, deck_id, now)
        .context("Failed to load due cards")?;

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = due.iter().map(|card| {
                let preview = app.scheduler.preview(card);
                serde_json::json!({
                    "id": card.id.to_string(),
                    "question": card.question,
                    "schedulingState": card.scheduling_state,
                    "dueAt": card.due_at.to_rfc3339(),
                    "preview": Rating::ALL.iter().zip(preview).map(|(r, m)| {
                        (r.as_str().to_string(), serde_json::json!(m))
                    }).collect::<serde_json::Map<_, _>>(),
                })
            }).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due in {}. Come back later.", project.name);
                return Ok(());
            }

            for (i, card) in due.iter().enumerate() {
                let preview = app.scheduler.preview(card)
                    .iter()
                    .zip(Rating::ALL)
                    .map(|(m, r)| format!("{} {}", r, format_interval(*m)))
                    .collect::<Vec<_>>()
                    .join(" | ");
                println!("{:>3}. [{}] {} {}",
                    i + 1,
                    short_id(card.id),
                    state_label(card.scheduling_state, use_color),
                    truncate(&card.question, 50));
                println!("     {}", preview);
            }
            println!("\n{} cards due", due.len());
        }
    }

    Ok(())
}
