use anyhow::{Context, Result};
use chrono::Utc;

use crate::app::App;
use crate::render::terminal::{paint, progress_bar, Color};
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
    let stats = app.storage.review_stats(project.id, deck_id, Utc::now())
        .context("Failed to compute statistics")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            let heading = match deck_title {
                Some(deck) => format!("{} / {}", project.name, deck),
                None => project.name.clone(),
            };
            println!("{}", paint(&heading, Color::BOLD, use_color));
            println!("{}", progress_bar(&stats, 40, use_color));
            println!("{} Completed ({})", paint("\u{25cf}", Color::MAGENTA, use_color), stats.completed_cards);
            println!("{} New ({})", paint("\u{25cf}", Color::BLUE, use_color), stats.new_cards);
            println!("{} Learn ({})", paint("\u{25cf}", Color::YELLOW, use_color), stats.learning_cards);
            println!("{} Due ({})", paint("\u{25cf}", Color::GREEN, use_color), stats.due_cards);
            println!("{} cards total", stats.total_cards);
        }
    }

    Ok(())
}
