//! Storage operations for flashcards
//!
//! Directory structure under the data directory:
//! ```text
//! {data_dir}/
//! ├── projects.json                # Array of all projects
//! └── projects/{project-id}/
//!     ├── decks.json               # Array of the project's decks
//!     └── cards/
//!         └── {card-id}.json       # Individual card files, scheduling included
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::models::*;
use super::scheduler::{select_due, summarize, Scheduler};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Invalid {0}: must not be empty")]
    InvalidName(&'static str),

    #[error("Card {card_id} was reviewed concurrently (expected review count {expected}, found {found})")]
    Conflict {
        card_id: Uuid,
        expected: u32,
        found: u32,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage manager for projects, decks and cards
pub struct FlashcardStorage {
    /// Base data directory (e.g., ~/.local/share/flashmaster)
    data_dir: PathBuf,
    /// Held across read-compare-write of a card file
    card_writes: Mutex<()>,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            card_writes: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn projects_path(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }

    fn project_dir(&self, project_id: Uuid) -> PathBuf {
        self.data_dir.join("projects").join(project_id.to_string())
    }

    fn decks_path(&self, project_id: Uuid) -> PathBuf {
        self.project_dir(project_id).join("decks.json")
    }

    fn cards_dir(&self, project_id: Uuid) -> PathBuf {
        self.project_dir(project_id).join("cards")
    }

    fn card_path(&self, project_id: Uuid, card_id: Uuid) -> PathBuf {
        self.cards_dir(project_id).join(format!("{}.json", card_id))
    }

    fn lock_card_writes(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a panicked holder leaves nothing torn
        self.card_writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize the data directory
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir.join("projects"))?;

        let projects_path = self.projects_path();
        if !projects_path.exists() {
            let empty: Vec<Project> = Vec::new();
            write_json(&projects_path, &empty)?;
        }

        Ok(())
    }

    fn init_project(&self, project_id: Uuid) -> Result<()> {
        fs::create_dir_all(self.cards_dir(project_id))?;

        let decks_path = self.decks_path(project_id);
        if !decks_path.exists() {
            let empty: Vec<Deck> = Vec::new();
            write_json(&decks_path, &empty)?;
        }

        Ok(())
    }

    // ==================== Project Operations ====================

    fn read_projects(&self) -> Result<Vec<Project>> {
        let path = self.projects_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let projects: Vec<Project> = serde_json::from_str(&content)?;
        Ok(projects)
    }

    fn write_projects(&self, projects: &[Project]) -> Result<()> {
        write_json(&self.projects_path(), &projects)
    }

    /// List all projects, newest first
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects = self.read_projects()?;
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    /// Get a specific project
    pub fn get_project(&self, project_id: Uuid) -> Result<Project> {
        self.read_projects()?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or(StorageError::ProjectNotFound(project_id))
    }

    /// Create a new project
    pub fn create_project(&self, name: &str, description: Option<String>) -> Result<Project> {
        let name = valid_name(name, "project name")?;
        self.init()?;

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let project = Project::new(name, description);

        let mut projects = self.read_projects()?;
        projects.push(project.clone());
        self.write_projects(&projects)?;
        self.init_project(project.id)?;

        log::info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    /// Rename a project
    pub fn rename_project(&self, project_id: Uuid, name: &str) -> Result<Project> {
        let name = valid_name(name, "project name")?;
        self.modify_project(project_id, |project| project.name = name)
    }

    /// Replace a project's description; an empty string clears it
    pub fn update_project_description(
        &self,
        project_id: Uuid,
        description: Option<String>,
    ) -> Result<Project> {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.modify_project(project_id, |project| project.description = description)
    }

    fn modify_project(
        &self,
        project_id: Uuid,
        change: impl FnOnce(&mut Project),
    ) -> Result<Project> {
        let mut projects = self.read_projects()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(StorageError::ProjectNotFound(project_id))?;

        change(project);
        project.updated_at = Utc::now();
        let updated = project.clone();

        self.write_projects(&projects)?;
        Ok(updated)
    }

    /// Delete a project with all its decks and cards
    pub fn delete_project(&self, project_id: Uuid) -> Result<()> {
        let mut projects = self.read_projects()?;
        let before = projects.len();
        projects.retain(|p| p.id != project_id);
        if projects.len() == before {
            return Err(StorageError::ProjectNotFound(project_id));
        }

        let project_dir = self.project_dir(project_id);
        if project_dir.exists() {
            fs::remove_dir_all(&project_dir)?;
        }
        self.write_projects(&projects)?;

        log::info!("Deleted project {}", project_id);
        Ok(())
    }

    // ==================== Deck Operations ====================

    fn read_decks(&self, project_id: Uuid) -> Result<Vec<Deck>> {
        // Fail on unknown projects rather than returning an empty list
        self.get_project(project_id)?;

        let path = self.decks_path(project_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let decks: Vec<Deck> = serde_json::from_str(&content)?;
        Ok(decks)
    }

    fn write_decks(&self, project_id: Uuid, decks: &[Deck]) -> Result<()> {
        self.init_project(project_id)?;
        write_json(&self.decks_path(project_id), &decks)
    }

    /// List the decks of a project with live card counts, newest first
    pub fn list_decks(&self, project_id: Uuid) -> Result<Vec<DeckSummary>> {
        let decks = self.read_decks(project_id)?;
        let cards = self.list_project_cards(project_id)?;

        let mut summaries: Vec<DeckSummary> = decks
            .into_iter()
            .map(|deck| {
                let card_count = cards.iter().filter(|c| c.deck_id == deck.id).count();
                DeckSummary { deck, card_count }
            })
            .collect();
        summaries.sort_by(|a, b| b.deck.created_at.cmp(&a.deck.created_at));

        Ok(summaries)
    }

    /// Get a specific deck
    pub fn get_deck(&self, project_id: Uuid, deck_id: Uuid) -> Result<Deck> {
        self.read_decks(project_id)?
            .into_iter()
            .find(|d| d.id == deck_id)
            .ok_or(StorageError::DeckNotFound(deck_id))
    }

    /// Get a deck with its live card count
    pub fn deck_summary(&self, project_id: Uuid, deck_id: Uuid) -> Result<DeckSummary> {
        let deck = self.get_deck(project_id, deck_id)?;
        let card_count = self.list_cards(project_id, deck_id)?.len();
        Ok(DeckSummary { deck, card_count })
    }

    /// Create a new deck in a project
    pub fn create_deck(&self, project_id: Uuid, title: &str) -> Result<Deck> {
        let title = valid_name(title, "deck title")?;

        let mut decks = self.read_decks(project_id)?;
        let deck = Deck::new(project_id, title);
        decks.push(deck.clone());
        self.write_decks(project_id, &decks)?;

        log::info!("Created deck {} ({}) in project {}", deck.title, deck.id, project_id);
        Ok(deck)
    }

    /// Rename a deck
    pub fn rename_deck(&self, project_id: Uuid, deck_id: Uuid, title: &str) -> Result<Deck> {
        let title = valid_name(title, "deck title")?;

        let mut decks = self.read_decks(project_id)?;
        let deck = decks
            .iter_mut()
            .find(|d| d.id == deck_id)
            .ok_or(StorageError::DeckNotFound(deck_id))?;

        deck.title = title;
        deck.updated_at = Utc::now();
        let updated = deck.clone();

        self.write_decks(project_id, &decks)?;
        Ok(updated)
    }

    /// Delete a deck and all its cards
    pub fn delete_deck(&self, project_id: Uuid, deck_id: Uuid) -> Result<()> {
        let mut decks = self.read_decks(project_id)?;
        if !decks.iter().any(|d| d.id == deck_id) {
            return Err(StorageError::DeckNotFound(deck_id));
        }

        for card in self.list_cards(project_id, deck_id)? {
            let card_path = self.card_path(project_id, card.id);
            if card_path.exists() {
                fs::remove_file(&card_path)?;
            }
        }

        decks.retain(|d| d.id != deck_id);
        self.write_decks(project_id, &decks)?;

        log::info!("Deleted deck {} from project {}", deck_id, project_id);
        Ok(())
    }

    // ==================== Card Operations ====================

    /// List all cards in a project (across all decks)
    pub fn list_project_cards(&self, project_id: Uuid) -> Result<Vec<Card>> {
        let cards_dir = self.cards_dir(project_id);
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                let card: Card = serde_json::from_str(&content)?;
                cards.push(card);
            }
        }

        // Directory order is unspecified
        cards.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.position.cmp(&b.position))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(cards)
    }

    /// List all cards in a deck
    pub fn list_cards(&self, project_id: Uuid, deck_id: Uuid) -> Result<Vec<Card>> {
        let mut cards = self.list_project_cards(project_id)?;
        cards.retain(|c| c.deck_id == deck_id);
        cards.sort_by(|a, b| a.position.cmp(&b.position));
        Ok(cards)
    }

    /// Get a specific card
    pub fn get_card(&self, project_id: Uuid, card_id: Uuid) -> Result<Card> {
        let card_path = self.card_path(project_id, card_id);
        if !card_path.exists() {
            return Err(StorageError::CardNotFound(card_id));
        }

        let content = fs::read_to_string(&card_path)?;
        let card: Card = serde_json::from_str(&content)?;
        Ok(card)
    }

    /// Create a new card in a deck
    pub fn create_card(
        &self,
        project_id: Uuid,
        deck_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<Card> {
        let question = valid_name(question, "question")?;
        let answer = valid_name(answer, "answer")?;
        self.get_deck(project_id, deck_id)?;
        self.init_project(project_id)?;

        // Position continues after the highest existing one so deletions
        // never produce duplicates
        let position = self
            .list_cards(project_id, deck_id)?
            .iter()
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);

        let mut card = Card::new(deck_id, question, answer, Utc::now());
        card.position = position;

        write_json(&self.card_path(project_id, card.id), &card)?;

        log::debug!("Created card {} in deck {}", card.id, deck_id);
        Ok(card)
    }

    /// Edit a card's question and/or answer. Scheduling is left untouched.
    pub fn update_card_content(
        &self,
        project_id: Uuid,
        card_id: Uuid,
        question: Option<&str>,
        answer: Option<&str>,
    ) -> Result<Card> {
        let _guard = self.lock_card_writes();
        let mut card = self.get_card(project_id, card_id)?;

        if let Some(q) = question {
            card.question = valid_name(q, "question")?;
        }
        if let Some(a) = answer {
            card.answer = valid_name(a, "answer")?;
        }
        card.updated_at = Utc::now();

        write_json(&self.card_path(project_id, card_id), &card)?;
        Ok(card)
    }

    /// Delete a card
    pub fn delete_card(&self, project_id: Uuid, card_id: Uuid) -> Result<()> {
        let card_path = self.card_path(project_id, card_id);
        if !card_path.exists() {
            return Err(StorageError::CardNotFound(card_id));
        }

        fs::remove_file(&card_path)?;
        log::debug!("Deleted card {}", card_id);
        Ok(())
    }

    // ==================== Review Operations ====================

    /// Persist a rated card.
    ///
    /// `expected_review_count` is the review count the caller read before
    /// rating; the write is refused if another review landed in between.
    pub fn save_review(
        &self,
        project_id: Uuid,
        card: &Card,
        expected_review_count: u32,
    ) -> Result<()> {
        let _guard = self.lock_card_writes();
        let stored = self.get_card(project_id, card.id)?;
        if stored.review_count != expected_review_count {
            log::warn!(
                "Rejected stale review of card {} (expected {}, stored {})",
                card.id,
                expected_review_count,
                stored.review_count
            );
            return Err(StorageError::Conflict {
                card_id: card.id,
                expected: expected_review_count,
                found: stored.review_count,
            });
        }

        write_json(&self.card_path(project_id, card.id), card)
    }

    fn cards_in_scope(&self, project_id: Uuid, deck_id: Option<Uuid>) -> Result<Vec<Card>> {
        match deck_id {
            Some(did) => {
                self.get_deck(project_id, did)?;
                self.list_cards(project_id, did)
            }
            None => {
                self.get_project(project_id)?;
                self.list_project_cards(project_id)
            }
        }
    }

    /// Due cards of a project (optionally one deck), in review order
    pub fn due_cards(
        &self,
        project_id: Uuid,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>> {
        let cards = self.cards_in_scope(project_id, deck_id)?;
        Ok(select_due(&cards, now).to_vec())
    }

    /// Rate a card and store the result
    pub fn submit_review(
        &self,
        project_id: Uuid,
        card_id: Uuid,
        rating: Rating,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let card = self.get_card(project_id, card_id)?;
        let updated = scheduler.rate(&card, rating, now);
        self.save_review(project_id, &updated, card.review_count)?;
        Ok(updated)
    }

    /// Progress buckets for a project (optionally one deck)
    pub fn review_stats(
        &self,
        project_id: Uuid,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ReviewStats> {
        let cards = self.cards_in_scope(project_id, deck_id)?;
        Ok(summarize(&cards, now))
    }
}

/// Write to a sibling .tmp file, then rename it into place
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn valid_name(value: &str, what: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidName(what));
    }
    Ok(trimmed.to_string())
}
