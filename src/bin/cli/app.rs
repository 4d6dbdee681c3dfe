use std::path::Path;

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use flashmaster_lib::flashcards::{Card, Deck, FlashcardStorage, Project, Scheduler};
use flashmaster_lib::AppConfig;

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub storage: FlashcardStorage,
    pub scheduler: Scheduler,
}

impl App {
    /// Load config and open storage
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load_or_default(config_path)
            .context("Failed to load configuration")?;
        let data_dir = config.resolve_data_dir()
            .context("Failed to get data directory")?;

        let storage = FlashcardStorage::new(data_dir);
        storage.init().context("Failed to initialize storage")?;

        let scheduler = config.scheduler();
        log::debug!("Using data dir {:?} with {} policy", storage.data_dir(), scheduler.policy_name());

        Ok(Self {
            config,
            storage,
            scheduler,
        })
    }

    /// Find a project by name (case-insensitive exact, then unique prefix)
    pub fn find_project(&self, name: &str) -> Result<Project> {
        let projects = self.storage.list_projects()
            .context("Failed to list projects")?;

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(p) = projects.iter().find(|p| p.name.to_lowercase() == name_lower) {
            return Ok(p.clone());
        }

        // Prefix match
        let matches: Vec<&Project> = projects.iter()
            .filter(|p| p.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!("No project matching '{}'. Available projects:\n{}", name,
                projects.iter().map(|p| format!("  - {}", p.name)).collect::<Vec<_>>().join("\n")),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous project name '{}'. Matches:\n{}", name,
                matches.iter().map(|p| format!("  - {}", p.name)).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Find a deck by title within a project (case-insensitive exact, then unique prefix)
    pub fn find_deck(&self, project_id: Uuid, title: &str) -> Result<Deck> {
        let decks: Vec<Deck> = self.storage.list_decks(project_id)
            .context("Failed to list decks")?
            .into_iter()
            .map(|s| s.deck)
            .collect();

        let title_lower = title.to_lowercase();

        if let Some(d) = decks.iter().find(|d| d.title.to_lowercase() == title_lower) {
            return Ok(d.clone());
        }

        let matches: Vec<&Deck> = decks.iter()
            .filter(|d| d.title.to_lowercase().starts_with(&title_lower))
            .collect();

        match matches.len() {
            0 => bail!("No deck matching '{}' in project", title),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous deck title '{}'. Matches:\n{}", title,
                matches.iter().map(|d| format!("  - {}", d.title)).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Resolve an optional deck filter to its ID
    pub fn find_deck_id(&self, project_id: Uuid, title: Option<&str>) -> Result<Option<Uuid>> {
        title.map(|t| self.find_deck(project_id, t).map(|d| d.id)).transpose()
    }

    /// Find a card by full ID or unique ID prefix
    pub fn find_card(&self, project_id: Uuid, id: &str) -> Result<Card> {
        if let Ok(card_id) = Uuid::parse_str(id) {
            return self.storage.get_card(project_id, card_id)
                .context(format!("Card '{}' not found", id));
        }

        let id_lower = id.to_lowercase();
        let cards = self.storage.list_project_cards(project_id)
            .context("Failed to list cards")?;
        let matches: Vec<&Card> = cards.iter()
            .filter(|c| c.id.to_string().starts_with(&id_lower))
            .collect();

        match matches.len() {
            0 => bail!("No card with ID starting '{}'", id),
            1 => Ok(matches[0].clone()),
            n => bail!("Card ID prefix '{}' is ambiguous ({} matches)", id, n),
        }
    }
}

/// First eight characters of an ID, enough to pass back to `find_card`
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
