//! Review scheduler
//!
//! Pure functions over card values: rate a card, test whether it is due,
//! and select the ordered queue of due cards. Time is always passed in;
//! nothing here reads the clock or touches storage.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::algorithm::{policy_for, preview_intervals, FixedPolicy, IntervalPolicy, PolicyKind};
use super::models::{Card, Rating, ReviewStats, SchedulingState};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invalid rating: {0:?} (expected Again, Hard, Good or Easy)")]
    InvalidRating(String),
}

/// Scheduler bound to an interval policy
pub struct Scheduler {
    policy: Box<dyn IntervalPolicy>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Box::new(FixedPolicy))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("policy", &self.policy.name())
            .finish()
    }
}

impl Scheduler {
    pub fn new(policy: Box<dyn IntervalPolicy>) -> Self {
        Self { policy }
    }

    pub fn with_kind(kind: PolicyKind, minimum_ease: f32) -> Self {
        Self::new(policy_for(kind, minimum_ease))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Apply a rating and return the updated card. The input is left as is.
    pub fn rate(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
        if let Some(last) = card.last_reviewed_at {
            if now < last {
                log::warn!(
                    "Card {} rated at {} before its last review at {}",
                    card.id,
                    now,
                    last
                );
            }
        }

        let step = self.policy.next_step(card, rating);
        log::debug!(
            "Card {} rated {}: {} -> {} ({} min, {})",
            card.id,
            rating,
            card.scheduling_state,
            step.state,
            step.interval_minutes,
            self.policy.name()
        );

        let mut updated = card.clone();
        updated.interval_minutes = step.interval_minutes;
        updated.scheduling_state = step.state;
        updated.ease_factor = step.ease_factor;
        updated.due_at = now
            .checked_add_signed(Duration::minutes(i64::from(step.interval_minutes)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        updated.review_count = card.review_count.saturating_add(1);
        updated.last_reviewed_at = Some(now);
        updated
    }

    /// Parse `rating` by name, then rate
    pub fn rate_named(
        &self,
        card: &Card,
        rating: &str,
        now: DateTime<Utc>,
    ) -> Result<Card, SchedulerError> {
        let rating: Rating = rating.parse()?;
        Ok(self.rate(card, rating, now))
    }

    /// Interval each rating would give this card
    pub fn preview(&self, card: &Card) -> [u32; 4] {
        preview_intervals(&*self.policy, card)
    }
}

/// Rate with the fixed policy
pub fn rate(card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
    Scheduler::default().rate(card, rating, now)
}

/// Rate by rating name with the fixed policy
pub fn rate_named(card: &Card, rating: &str, now: DateTime<Utc>) -> Result<Card, SchedulerError> {
    Scheduler::default().rate_named(card, rating, now)
}

/// A card is due when it is new or its due time has arrived
pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    card.scheduling_state == SchedulingState::New || card.due_at <= now
}

/// Due cards in review order.
///
/// New cards come first in creation order, then the remaining due cards,
/// most overdue first. The queue can be iterated any number of times.
#[derive(Debug, Clone)]
pub struct DueQueue<'a> {
    cards: Vec<&'a Card>,
}

impl<'a> DueQueue<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Card> + '_ {
        self.cards.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn first(&self) -> Option<&'a Card> {
        self.cards.first().copied()
    }

    pub fn to_vec(&self) -> Vec<Card> {
        self.cards.iter().map(|c| (*c).clone()).collect()
    }
}

impl<'a, 'q> IntoIterator for &'q DueQueue<'a> {
    type Item = &'a Card;
    type IntoIter = std::iter::Copied<std::slice::Iter<'q, &'a Card>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter().copied()
    }
}

impl<'a> IntoIterator for DueQueue<'a> {
    type Item = &'a Card;
    type IntoIter = std::vec::IntoIter<&'a Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

/// Select the due cards among `cards`, in review order
pub fn select_due(cards: &[Card], now: DateTime<Utc>) -> DueQueue<'_> {
    let mut due: Vec<&Card> = cards.iter().filter(|c| is_due(c, now)).collect();
    // Stable: cards equal on every key keep their input order
    due.sort_by(|a, b| review_order(a, b));
    DueQueue { cards: due }
}

fn review_order(a: &Card, b: &Card) -> Ordering {
    let a_new = a.scheduling_state == SchedulingState::New;
    let b_new = b.scheduling_state == SchedulingState::New;

    match (a_new, b_new) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => creation_order(a, b),
        (false, false) => a.due_at.cmp(&b.due_at).then_with(|| creation_order(a, b)),
    }
}

fn creation_order(a: &Card, b: &Card) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.position.cmp(&b.position))
}

/// Split cards into progress buckets at `now`
pub fn summarize<'a>(
    cards: impl IntoIterator<Item = &'a Card>,
    now: DateTime<Utc>,
) -> ReviewStats {
    let mut stats = ReviewStats::default();

    for card in cards {
        stats.total_cards += 1;
        match card.scheduling_state {
            SchedulingState::New => stats.new_cards += 1,
            _ if card.due_at <= now => stats.due_cards += 1,
            SchedulingState::Learning => stats.learning_cards += 1,
            SchedulingState::Review => stats.completed_cards += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::algorithm::MINUTES_PER_DAY;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn card_at(created: DateTime<Utc>) -> Card {
        Card::new(Uuid::new_v4(), "Q".to_string(), "A".to_string(), created)
    }

    fn review_card_due(due_at: DateTime<Utc>) -> Card {
        let mut card = card_at(due_at - Duration::days(10));
        card.scheduling_state = SchedulingState::Review;
        card.interval_minutes = MINUTES_PER_DAY;
        card.review_count = 3;
        card.due_at = due_at;
        card
    }

    #[test]
    fn test_new_cards_always_due() {
        let mut card = card_at(t0());
        // Even with a due time in the future
        card.due_at = t0() + Duration::days(365);

        assert!(is_due(&card, t0()));
        assert!(is_due(&card, t0() - Duration::days(30)));
        assert!(is_due(&card, t0() + Duration::days(3000)));
    }

    #[test]
    fn test_is_due_boundary() {
        let card = review_card_due(t0());
        assert!(is_due(&card, t0()));
        assert!(!is_due(&card, t0() - Duration::seconds(1)));
    }

    #[test]
    fn test_rate_sets_due_from_interval() {
        let card = card_at(t0());
        let now = t0() + Duration::hours(3);

        for (rating, minutes) in [
            (Rating::Again, 1),
            (Rating::Hard, 10),
            (Rating::Good, 1440),
            (Rating::Easy, 5760),
        ] {
            let rated = rate(&card, rating, now);
            assert_eq!(rated.interval_minutes, minutes);
            assert_eq!(rated.due_at, now + Duration::minutes(minutes as i64));
            assert_eq!(rated.review_count, card.review_count + 1);
            assert_eq!(rated.last_reviewed_at, Some(now));
        }
    }

    #[test]
    fn test_rate_is_deterministic() {
        let card = card_at(t0());
        let a = rate(&card, Rating::Hard, t0());
        let b = rate(&card, Rating::Hard, t0());
        assert_eq!(a, b);
    }

    #[test]
    fn test_rate_leaves_payload_alone() {
        let card = card_at(t0());
        let rated = rate(&card, Rating::Good, t0());

        assert_eq!(rated.id, card.id);
        assert_eq!(rated.deck_id, card.deck_id);
        assert_eq!(rated.question, card.question);
        assert_eq!(rated.answer, card.answer);
        assert_eq!(rated.created_at, card.created_at);
        assert_eq!(rated.ease_factor, card.ease_factor);
    }

    #[test]
    fn test_invalid_rating_leaves_card_untouched() {
        let card = card_at(t0());
        let before = card.clone();

        let err = rate_named(&card, "Unknown", t0()).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidRating("Unknown".to_string()));
        assert_eq!(card, before);
    }

    #[test]
    fn test_rate_named_accepts_names() {
        let card = card_at(t0());
        let rated = rate_named(&card, "easy", t0()).unwrap();
        assert_eq!(rated.interval_minutes, 5760);
    }

    #[test]
    fn test_good_then_again_scenario() {
        let card = card_at(t0());

        let first = rate(&card, Rating::Good, t0());
        assert_eq!(first.scheduling_state, SchedulingState::Review);
        assert_eq!(first.interval_minutes, 1440);
        assert_eq!(first.due_at, t0() + Duration::minutes(1440));
        assert_eq!(first.review_count, 1);

        let t1 = t0() + Duration::days(2);
        let second = rate(&first, Rating::Again, t1);
        assert_eq!(second.scheduling_state, SchedulingState::Learning);
        assert_eq!(second.interval_minutes, 1);
        assert_eq!(second.due_at, t1 + Duration::minutes(1));
        assert_eq!(second.review_count, 2);
    }

    #[test]
    fn test_rate_out_of_order_still_applies() {
        let card = rate(&card_at(t0()), Rating::Good, t0());
        let earlier = t0() - Duration::hours(1);

        let rated = rate(&card, Rating::Hard, earlier);
        assert_eq!(rated.due_at, earlier + Duration::minutes(10));
        assert_eq!(rated.review_count, 2);
    }

    #[test]
    fn test_select_due_new_first() {
        let now = t0();
        let a = card_at(now - Duration::days(5));
        let b = review_card_due(now - Duration::days(1));

        let cards = vec![b.clone(), a.clone()];
        let queue = select_due(&cards, now);
        let ids: Vec<_> = queue.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_select_due_excludes_future() {
        let now = t0();
        let future = review_card_due(now + Duration::minutes(1));
        let past = review_card_due(now - Duration::minutes(1));

        let cards = vec![future.clone(), past.clone()];
        let queue = select_due(&cards, now);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.first().map(|c| c.id), Some(past.id));
        assert!(queue.iter().all(|c| c.id != future.id));
    }

    #[test]
    fn test_select_due_most_overdue_first() {
        let now = t0();
        let recent = review_card_due(now - Duration::hours(1));
        let old = review_card_due(now - Duration::days(3));
        let mid = review_card_due(now - Duration::days(1));

        let cards = vec![recent.clone(), old.clone(), mid.clone()];
        let ids: Vec<_> = select_due(&cards, now).iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![old.id, mid.id, recent.id]);
    }

    #[test]
    fn test_select_due_equal_due_falls_back_to_creation() {
        let now = t0();
        let due_at = now - Duration::hours(2);
        let mut older = review_card_due(due_at);
        older.created_at = now - Duration::days(20);
        let mut newer = review_card_due(due_at);
        newer.created_at = now - Duration::days(5);

        let cards = vec![newer.clone(), older.clone()];
        let ids: Vec<_> = select_due(&cards, now).iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[test]
    fn test_select_due_full_ties_keep_input_order() {
        let now = t0();
        let first = review_card_due(now - Duration::hours(1));
        let second = Card {
            id: Uuid::new_v4(),
            ..first.clone()
        };

        let forward = vec![first.clone(), second.clone()];
        let ids: Vec<_> = select_due(&forward, now).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let reversed = vec![second.clone(), first.clone()];
        let ids: Vec<_> = select_due(&reversed, now).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_rate_near_max_time_saturates() {
        let card = card_at(t0());
        let now = DateTime::<Utc>::MAX_UTC - Duration::minutes(5);

        let rated = rate(&card, Rating::Easy, now);
        assert_eq!(rated.due_at, DateTime::<Utc>::MAX_UTC);
        assert_eq!(rated.interval_minutes, 5760);
        assert_eq!(rated.last_reviewed_at, Some(now));

        let rated = rate(&card, Rating::Again, now);
        assert_eq!(rated.due_at, now + Duration::minutes(1));
    }

    #[test]
    fn test_select_due_new_in_creation_order() {
        let now = t0();
        let first = card_at(now - Duration::days(2));
        let second = card_at(now - Duration::days(1));
        let mut third = card_at(now - Duration::days(1));
        third.position = 1;

        let cards = vec![third.clone(), second.clone(), first.clone()];
        let ids: Vec<_> = select_due(&cards, now).iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_select_due_restartable_and_idempotent() {
        let now = t0();
        let cards = vec![
            review_card_due(now - Duration::days(2)),
            card_at(now),
            review_card_due(now - Duration::days(4)),
        ];

        let queue = select_due(&cards, now);
        let once: Vec<_> = queue.iter().map(|c| c.id).collect();
        let twice: Vec<_> = (&queue).into_iter().map(|c| c.id).collect();
        let rerun: Vec<_> = select_due(&cards, now).into_iter().map(|c| c.id).collect();

        assert_eq!(once, twice);
        assert_eq!(once, rerun);
        assert_eq!(queue.to_vec().len(), 3);
    }

    #[test]
    fn test_select_due_empty() {
        let queue = select_due(&[], t0());
        assert!(queue.is_empty());
        assert!(queue.first().is_none());
    }

    #[test]
    fn test_summarize_partitions_cards() {
        let now = t0();
        let new_card = card_at(now);
        let due_review = review_card_due(now - Duration::hours(1));
        let done_review = review_card_due(now + Duration::days(2));
        let mut waiting_learning = card_at(now);
        waiting_learning.scheduling_state = SchedulingState::Learning;
        waiting_learning.due_at = now + Duration::minutes(10);
        let mut due_learning = waiting_learning.clone();
        due_learning.due_at = now - Duration::minutes(1);

        let cards = [new_card, due_review, done_review, waiting_learning, due_learning];
        let stats = summarize(&cards, now);

        assert_eq!(
            stats,
            ReviewStats {
                total_cards: 5,
                new_cards: 1,
                learning_cards: 1,
                due_cards: 2,
                completed_cards: 1,
            }
        );
    }

    #[test]
    fn test_scheduler_with_sm2() {
        let scheduler = Scheduler::with_kind(PolicyKind::Sm2, 1.3);
        assert_eq!(scheduler.policy_name(), "sm2");

        let card = review_card_due(t0());
        let card = Card {
            interval_minutes: 10 * MINUTES_PER_DAY,
            ..card
        };
        let rated = scheduler.rate(&card, Rating::Good, t0());
        assert_eq!(rated.interval_minutes, 25 * MINUTES_PER_DAY);
        assert_eq!(rated.due_at, t0() + Duration::days(25));
    }

    #[test]
    fn test_preview() {
        let card = card_at(t0());
        assert_eq!(Scheduler::default().preview(&card), [1, 10, 1440, 5760]);
    }
}
