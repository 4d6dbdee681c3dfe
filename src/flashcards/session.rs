//! Learn-screen session over a queue of due cards

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{Card, Rating};
use super::scheduler::Scheduler;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Reveal the answer before rating the card")]
    NotRevealed,

    #[error("No cards left in this session")]
    Finished,
}

/// Walks a due queue one card at a time.
///
/// The session only computes; rated cards are handed back to the caller,
/// which stores them.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    cards: Vec<Card>,
    index: usize,
    revealed: bool,
    tally: HashMap<Rating, usize>,
    skipped: usize,
}

impl ReviewSession {
    /// `cards` must already be in review order
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            index: 0,
            revealed: false,
            tally: HashMap::new(),
            skipped: 0,
        }
    }

    /// Keep at most `limit` cards
    pub fn with_limit(mut cards: Vec<Card>, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            cards.truncate(limit);
        }
        Self::new(cards)
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    /// (1-based position of the current card, total cards)
    pub fn progress(&self) -> (usize, usize) {
        let total = self.cards.len();
        ((self.index + 1).min(total), total)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.cards.len()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn reveal(&mut self) {
        if !self.is_finished() {
            self.revealed = true;
        }
    }

    pub fn toggle_reveal(&mut self) {
        if !self.is_finished() {
            self.revealed = !self.revealed;
        }
    }

    /// Rate the current card and move on. Returns the rated card.
    pub fn answer(
        &mut self,
        rating: Rating,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Result<Card, SessionError> {
        let card = self.current().ok_or(SessionError::Finished)?;
        if !self.revealed {
            return Err(SessionError::NotRevealed);
        }

        let rated = scheduler.rate(card, rating, now);
        *self.tally.entry(rating).or_insert(0) += 1;
        self.advance();
        Ok(rated)
    }

    /// Move past the current card without rating it
    pub fn skip(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.skipped += 1;
        self.advance();
        Ok(())
    }

    /// Count an answered card as skipped instead, for when its review
    /// could not be stored
    pub fn unrecord(&mut self, rating: Rating) {
        if let Some(n) = self.tally.get_mut(&rating).filter(|n| **n > 0) {
            *n -= 1;
            self.skipped += 1;
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        self.revealed = false;
    }

    /// How many times `rating` was given
    pub fn count(&self, rating: Rating) -> usize {
        self.tally.get(&rating).copied().unwrap_or(0)
    }

    pub fn reviewed(&self) -> usize {
        self.tally.values().sum()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
