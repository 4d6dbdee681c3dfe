use anyhow::{Context, Result, bail};
use chrono::Utc;

use flashmaster_lib::flashcards::Project;

use crate::app::App;
use crate::render::terminal::{paint, progress_bar, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let projects = app.storage.list_projects().context("Failed to list projects")?;
    let now = Utc::now();

    match format {
        OutputFormat::Json => {
            let mut output = Vec::new();
            for project in &projects {
                let stats = app.storage.review_stats(project.id, None, now)?;
                output.push(serde_json::json!({
                    "id": project.id.to_string(),
                    "name": project.name,
                    "description": project.description,
                    "createdAt": project.created_at.to_rfc3339(),
                    "stats": stats,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if projects.is_empty() {
                println!("No projects yet. Create one with `project new <name>`.");
                return Ok(());
            }

            for project in &projects {
                let stats = app.storage.review_stats(project.id, None, now)?;
                println!("{}", paint(&project.name, Color::BOLD, use_color));
                if let Some(desc) = &project.description {
                    println!("  {}", desc);
                }
                println!("  {}", progress_bar(&stats, 30, use_color));
                println!(
                    "  {} cards: {} new, {} learning, {} due",
                    stats.total_cards, stats.new_cards, stats.learning_cards, stats.due_cards
                );
                println!();
            }
        }
    }

    Ok(())
}

pub fn run_new(app: &App, name: &str, description: Option<String>, format: &OutputFormat) -> Result<()> {
    let project = app.storage.create_project(name, description)
        .context("Failed to create project")?;
    print_project(&project, "Created project", format)
}

pub fn run_rename(app: &App, project_name: &str, new_name: &str, format: &OutputFormat) -> Result<()> {
    let project = app.find_project(project_name)?;
    let project = app.storage.rename_project(project.id, new_name)
        .context("Failed to rename project")?;
    print_project(&project, "Renamed project to", format)
}

pub fn run_describe(app: &App, project_name: &str, description: &str, format: &OutputFormat) -> Result<()> {
    let project = app.find_project(project_name)?;
    let project = app.storage
        .update_project_description(project.id, Some(description.to_string()))
        .context("Failed to update project")?;
    print_project(&project, "Updated project", format)
}

pub fn run_delete(app: &App, project_name: &str, confirmed: bool) -> Result<()> {
    let project = app.find_project(project_name)?;
    if !confirmed {
        let cards = app.storage.list_project_cards(project.id)?.len();
        bail!(
            "Deleting '{}' removes all its decks and {} cards. Re-run with --yes to confirm.",
            project.name,
            cards
        );
    }

    app.storage.delete_project(project.id).context("Failed to delete project")?;
    println!("Deleted project \"{}\"", project.name);
    Ok(())
}

fn print_project(project: &Project, action: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(project)?),
        OutputFormat::Plain => {
            println!("{} \"{}\"", action, project.name);
            println!("  ID: {}", project.id);
        }
    }
    Ok(())
}
