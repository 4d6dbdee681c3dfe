//! Data models for the flashcard system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scheduler::SchedulerError;

/// Ease factor every card starts with
pub const DEFAULT_EASE_FACTOR: f32 = 2.5;

/// A project groups decks, e.g. "Advanced Biology"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A deck is a set of cards inside a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(project_id: Uuid, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A deck together with its live card count.
///
/// The count is computed from the card files each time; it is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSummary {
    #[serde(flatten)]
    pub deck: Deck,
    pub card_count: usize,
}

/// Coarse review maturity of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SchedulingState {
    /// Never reviewed
    #[default]
    New,
    /// Reviewed, interval under one day
    Learning,
    /// Interval of one day or more
    Review,
}

impl fmt::Display for SchedulingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
        };
        f.write_str(label)
    }
}

/// A flashcard with its scheduling fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub scheduling_state: SchedulingState,
    #[serde(default)]
    pub interval_minutes: u32,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub review_count: u32,
    /// Only moved by the SM-2 policy
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f32,
    #[serde(default)]
    pub position: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

fn default_ease_factor() -> f32 {
    DEFAULT_EASE_FACTOR
}

impl Card {
    /// A fresh card is `New` and due immediately
    pub fn new(deck_id: Uuid, question: String, answer: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            question,
            answer,
            scheduling_state: SchedulingState::New,
            interval_minutes: 0,
            due_at: now,
            review_count: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            position: 0,
            created_at: now,
            updated_at: now,
            last_reviewed_at: None,
        }
    }
}

/// Self-assessed recall difficulty for one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Map a review-screen key (1-4) to a rating
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '1' => Some(Self::Again),
            '2' => Some(Self::Hard),
            '3' => Some(Self::Good),
            '4' => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Self::Again => '1',
            Self::Hard => '2',
            Self::Good => '3',
            Self::Easy => '4',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Rating::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SchedulerError::InvalidRating(s.to_string()))
    }
}

/// Progress buckets for a project or deck. Every card lands in exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub due_cards: usize,
    pub completed_cards: usize,
}
