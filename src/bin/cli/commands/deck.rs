use anyhow::{Context, Result, bail};

use crate::app::App;
use crate::OutputFormat;

pub fn run_list(app: &App, project_name: &str, format: &OutputFormat) -> Result<()> {
    let project = app.find_project(project_name)?;
    let decks = app.storage.list_decks(project.id).context("Failed to list decks")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decks)?),
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks in {}.", project.name);
                return Ok(());
            }

            let title_width = decks.iter().map(|d| d.deck.title.len()).max().unwrap_or(5).min(40).max(5);
            println!("{:<w$} {}", "Title", "Cards", w = title_width);
            println!("{} {}", "\u{2500}".repeat(title_width), "\u{2500}".repeat(5));
            for summary in &decks {
                println!("{:<w$} {}", summary.deck.title, summary.card_count, w = title_width);
            }

            let total: usize = decks.iter().map(|d| d.card_count).sum();
            println!("\n{} decks, {} cards total", decks.len(), total);
        }
    }

    Ok(())
}

pub fn run_new(app: &App, project_name: &str, title: &str, format: &OutputFormat) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck = app.storage.create_deck(project.id, title).context("Failed to create deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => {
            println!("Created deck \"{}\" in {}", deck.title, project.name);
            println!("  ID: {}", deck.id);
        }
    }
    Ok(())
}

pub fn run_rename(app: &App, project_name: &str, deck_title: &str, title: &str, format: &OutputFormat) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck = app.find_deck(project.id, deck_title)?;
    let deck = app.storage.rename_deck(project.id, deck.id, title)
        .context("Failed to rename deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => println!("Renamed deck to \"{}\"", deck.title),
    }
    Ok(())
}

pub fn run_delete(app: &App, project_name: &str, deck_title: &str, confirmed: bool) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck = app.find_deck(project.id, deck_title)?;

    if !confirmed {
        let summary = app.storage.deck_summary(project.id, deck.id)?;
        bail!(
            "Deleting '{}' removes its {} cards. Re-run with --yes to confirm.",
            deck.title,
            summary.card_count
        );
    }

    app.storage.delete_deck(project.id, deck.id).context("Failed to delete deck")?;
    println!("Deleted deck \"{}\"", deck.title);
    Ok(())
}
