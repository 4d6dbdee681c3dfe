use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;

use flashmaster_lib::flashcards::{format_interval, Rating, ReviewSession, SessionError, StorageError};

use crate::app::App;
use crate::render::terminal::{paint, state_label, Color};

pub fn run(app: &App, project_name: &str, deck_title: Option<&str>, use_color: bool) -> Result<()> {
    let project = app.find_project(project_name)?;
    let deck_id = app.find_deck_id(project.id, deck_title)?;
    let due = app.storage.due_cards(project.id, deck_id, Utc::now())
        .context("Failed to load due cards")?;

    let mut session = ReviewSession::with_limit(due, app.config.review.session_limit);
    if session.is_finished() {
        println!("Nothing due in {}. Come back later.", project.name);
        return Ok(());
    }

    println!("{}", paint(&format!("Learning {}", project.name), Color::BOLD, use_color));
    println!("Enter: show/hide answer, 1-4: Again/Hard/Good/Easy, s: skip, q: quit\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut shown = None;

    while let Some(card) = session.current() {
        if shown != Some((card.id, session.is_revealed())) {
            shown = Some((card.id, session.is_revealed()));
            let (n, total) = session.progress();
            println!("{} {}", paint(&format!("Card {} of {}", n, total), Color::DIM, use_color),
                state_label(card.scheduling_state, use_color));
            println!("{}", paint(&card.question, Color::BOLD, use_color));
            if session.is_revealed() {
                println!("\n{}\n", card.answer);
                let preview = app.scheduler.preview(card);
                let options = Rating::ALL.iter().zip(preview)
                    .map(|(r, m)| format!("{} {} ({})", r.key(), r, format_interval(m)))
                    .collect::<Vec<_>>()
                    .join("   ");
                println!("{}", options);
            }
        }

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let input = line?;
        let input = input.trim();

        match input {
            "" => session.toggle_reveal(),
            "q" | "quit" => break,
            "s" | "skip" => {
                session.skip()?;
            }
            other => {
                let Some(rating) = other.chars().next().filter(|_| other.len() == 1).and_then(Rating::from_key) else {
                    println!("Unknown input '{}'", other);
                    continue;
                };
                let expected = card.review_count;
                match session.answer(rating, &app.scheduler, Utc::now()) {
                    Ok(rated) => match app.storage.save_review(project.id, &rated, expected) {
                        Ok(()) => println!("Next review in {}\n", format_interval(rated.interval_minutes)),
                        Err(StorageError::Conflict { .. }) => {
                            session.unrecord(rating);
                            log::warn!("Card {} changed during the session; review not saved", rated.id);
                            println!("{}\n", paint("Card was reviewed elsewhere; skipped", Color::RED, use_color));
                        }
                        Err(e) => return Err(e).context("Failed to save review"),
                    },
                    Err(SessionError::NotRevealed) => println!("Press Enter to reveal the answer first"),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    println!("\n{}", paint("Session summary", Color::BOLD, use_color));
    for rating in Rating::ALL {
        println!("  {:<6} {}", rating, session.count(rating));
    }
    if session.skipped() > 0 {
        println!("  Skipped {}", session.skipped());
    }
    if session.remaining() > 0 {
        println!("  {} cards left", session.remaining());
    }

    Ok(())
}
