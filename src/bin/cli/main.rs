mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flashmaster-cli", about = "Flashcard projects and spaced repetition review", version)]
struct Cli {
    /// Config file (default: <config dir>/flashmaster/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage decks inside a project
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),

    /// Show the cards due now, in review order
    Due {
        /// Project name (case-insensitive prefix match)
        project: String,
        /// Limit to one deck
        #[arg(long)]
        deck: Option<String>,
    },

    /// Rate a single card (Again, Hard, Good or Easy)
    Rate {
        /// Project name
        project: String,
        /// Card ID
        card: String,
        /// Rating name
        rating: String,
    },

    /// Show study progress
    Stats {
        /// Project name
        project: String,
        /// Limit to one deck
        #[arg(long)]
        deck: Option<String>,
    },

    /// Review due cards interactively
    Learn {
        /// Project name
        project: String,
        /// Limit to one deck
        #[arg(long)]
        deck: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// List projects with their progress
    List,

    /// Create a project
    New {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Rename a project
    Rename {
        project: String,
        name: String,
    },

    /// Set or clear a project's description
    Describe {
        project: String,
        /// New description (empty to clear)
        description: String,
    },

    /// Delete a project with all its decks and cards
    Delete {
        project: String,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// List decks with card counts
    List {
        project: String,
    },

    /// Create a deck
    New {
        project: String,
        title: String,
    },

    /// Rename a deck
    Rename {
        project: String,
        deck: String,
        title: String,
    },

    /// Delete a deck and its cards
    Delete {
        project: String,
        deck: String,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    /// List cards
    List {
        project: String,
        #[arg(long)]
        deck: Option<String>,
    },

    /// Add a card to a deck
    Add {
        project: String,
        deck: String,
        question: String,
        answer: String,
    },

    /// Edit a card's question or answer
    Edit {
        project: String,
        card: String,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        answer: Option<String>,
    },

    /// Delete a card
    Delete {
        project: String,
        card: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && matches!(cli.format, OutputFormat::Plain) && atty_check();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Project(subcmd) => match subcmd {
            ProjectCommand::List => commands::project::run_list(&app, &cli.format, use_color)?,
            ProjectCommand::New { name, description } => {
                commands::project::run_new(&app, &name, description, &cli.format)?
            }
            ProjectCommand::Rename { project, name } => {
                commands::project::run_rename(&app, &project, &name, &cli.format)?
            }
            ProjectCommand::Describe { project, description } => {
                commands::project::run_describe(&app, &project, &description, &cli.format)?
            }
            ProjectCommand::Delete { project, yes } => {
                commands::project::run_delete(&app, &project, yes)?
            }
        },
        Command::Deck(subcmd) => match subcmd {
            DeckCommand::List { project } => commands::deck::run_list(&app, &project, &cli.format)?,
            DeckCommand::New { project, title } => {
                commands::deck::run_new(&app, &project, &title, &cli.format)?
            }
            DeckCommand::Rename { project, deck, title } => {
                commands::deck::run_rename(&app, &project, &deck, &title, &cli.format)?
            }
            DeckCommand::Delete { project, deck, yes } => {
                commands::deck::run_delete(&app, &project, &deck, yes)?
            }
        },
        Command::Card(subcmd) => match subcmd {
            CardCommand::List { project, deck } => {
                commands::card::run_list(&app, &project, deck.as_deref(), &cli.format, use_color)?
            }
            CardCommand::Add { project, deck, question, answer } => {
                commands::card::run_add(&app, &project, &deck, &question, &answer, &cli.format)?
            }
            CardCommand::Edit { project, card, question, answer } => commands::card::run_edit(
                &app,
                &project,
                &card,
                question.as_deref(),
                answer.as_deref(),
                &cli.format,
            )?,
            CardCommand::Delete { project, card } => {
                commands::card::run_delete(&app, &project, &card)?
            }
        },
        Command::Due { project, deck } => {
            commands::due::run(&app, &project, deck.as_deref(), &cli.format, use_color)?;
        }
        Command::Rate { project, card, rating } => {
            commands::rate::run(&app, &project, &card, &rating, &cli.format)?;
        }
        Command::Stats { project, deck } => {
            commands::stats::run(&app, &project, deck.as_deref(), &cli.format, use_color)?;
        }
        Command::Learn { project, deck } => {
            commands::learn::run(&app, &project, deck.as_deref(), use_color)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
