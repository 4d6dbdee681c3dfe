use std::collections::HashMap;

use anyhow::{Context, Result, bail};

use flashmaster_lib::flashcards::format_interval;

use crate::app::{short_id, App};
use crate::render::terminal::{state_label, truncate};
use crate::OutputFormat;

pub fn run_list(
    app: &App,
    project_name: &str,
    deck_title: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let project = app.find_project(project_name)?;
    let cards = match app.find_deck_id(project.id, deck_title)? {
        Some(deck_id) => app.storage.list_cards(project.id, deck_id)?,
        None => app.storage.list_project_cards(project.id)?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No cards found.");
                return Ok(());
            }

            let titles: HashMap<_, _> = app.storage.list_decks(project.id)?
                .into_iter()
                .map(|s| (s.deck.id, s.deck.title))
                .collect();

            println!("{:<8} {:<16} {:<40} {:<9} {:>8} {}",
                "ID", "Deck", "Question", "State", "Interval", "Due");
            for card in &cards {
                let deck = titles.get(&card.deck_id).map(String::as_str).unwrap_or("?");
                // Pad before coloring so escape codes don't skew the columns
                let state = state_label(card.scheduling_state, use_color);
                let pad = " ".repeat(9usize.saturating_sub(card.scheduling_state.to_string().len()));
                println!("{:<8} {:<16} {:<40} {}{} {:>8} {}",
                    short_id(card.id),
                    truncate(deck, 16),
                    truncate(&card.question, 40),
                    state,
                    pad,
                    format_interval(card.interval_minutes),
                    card.due_at.format("%Y-%m-%d %H:%M"));
            }
            println!("\n{} cards total", cards.len());
        }
    }

    Ok(())
}

pub fn run_add(
    app: &App,
    project_name: &str,
    deck_title: &str,
    question: &str,
    answer: &str,
    format: &OutputFormat,
) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck = app.find_deck(project.id, deck_title)?;
    let card = app.storage.create_card(project.id, deck.id, question, answer)
        .context("Failed to create card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => {
            println!("Added card to \"{}\"", deck.title);
            println!("  ID: {}", card.id);
        }
    }
    Ok(())
}

pub fn run_edit(
    app: &App,
    project_name: &str,
    card_id: &str,
    question: Option<&str>,
    answer: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    if question.is_none() && answer.is_none() {
        bail!("Nothing to change: pass --question and/or --answer");
    }

    let project = app.find_project(project_name)?;
    let card = app.find_card(project.id, card_id)?;
    let card = app.storage.update_card_content(project.id, card.id, question, answer)
        .context("Failed to update card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => println!("Updated card {}", short_id(card.id)),
    }
    Ok(())
}

pub fn run_delete(app: &App, project_name: &str, card_id: &str) -> Result<()> {
    let project = app.find_project(project_name)?;
    let card = app.find_card(project.id, card_id)?;
    app.storage.delete_card(project.id, card.id).context("Failed to delete card")?;
    println!("Deleted card {}", short_id(card.id));
    Ok(())
}
