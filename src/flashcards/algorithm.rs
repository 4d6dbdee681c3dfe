//! Interval policies
//!
//! A policy decides, for a card and a rating, how long until the card is
//! shown again and which scheduling state it moves to.
//!
//! Two policies are provided:
//! - [`FixedPolicy`]: the four-bucket table shown on the review screen
//!   (Again 1 min, Hard 10 min, Good 1 day, Easy 4 days). This is the default.
//! - [`Sm2Policy`]: an SM-2 style variant that grows review intervals by the
//!   card's ease factor.

use serde::{Deserialize, Serialize};

use super::models::{Card, Rating, SchedulingState};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f32 = 1.3;

/// Outcome of applying a policy to one rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub interval_minutes: u32,
    pub state: SchedulingState,
    pub ease_factor: f32,
}

/// Maps a card and a rating to the next step
pub trait IntervalPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn next_step(&self, card: &Card, rating: Rating) -> Step;
}

/// Which policy a scheduler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Fixed,
    Sm2,
}

/// Build the policy for a configured kind
pub fn policy_for(kind: PolicyKind, minimum_ease: f32) -> Box<dyn IntervalPolicy> {
    match kind {
        PolicyKind::Fixed => Box::new(FixedPolicy),
        PolicyKind::Sm2 => Box::new(Sm2Policy {
            minimum_ease: minimum_ease.max(MIN_EASE_FACTOR),
        }),
    }
}

/// Fixed lookup: the interval depends on the rating alone
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPolicy;

impl FixedPolicy {
    pub fn interval(rating: Rating) -> u32 {
        match rating {
            Rating::Again => 1,
            Rating::Hard => 10,
            Rating::Good => MINUTES_PER_DAY,
            Rating::Easy => 4 * MINUTES_PER_DAY,
        }
    }
}

impl IntervalPolicy for FixedPolicy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn next_step(&self, card: &Card, rating: Rating) -> Step {
        let interval_minutes = Self::interval(rating);
        Step {
            interval_minutes,
            state: state_for_interval(interval_minutes),
            ease_factor: card.ease_factor,
        }
    }
}

/// SM-2 style policy.
///
/// Cards that are new or still learning use the fixed table. Graduated cards
/// grow by the ease factor, which is adjusted with
/// `EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))`.
#[derive(Debug, Clone, Copy)]
pub struct Sm2Policy {
    pub minimum_ease: f32,
}

impl Default for Sm2Policy {
    fn default() -> Self {
        Self {
            minimum_ease: MIN_EASE_FACTOR,
        }
    }
}

impl Sm2Policy {
    /// SM-2 quality (0-5) for a rating
    fn quality(rating: Rating) -> i32 {
        match rating {
            Rating::Again => 1,
            Rating::Hard => 3,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }
}

impl IntervalPolicy for Sm2Policy {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn next_step(&self, card: &Card, rating: Rating) -> Step {
        if rating == Rating::Again {
            return Step {
                interval_minutes: FixedPolicy::interval(Rating::Again),
                state: SchedulingState::Learning,
                ease_factor: (card.ease_factor - 0.2).max(self.minimum_ease),
            };
        }

        let q = Self::quality(rating);
        let ease_factor = (card.ease_factor
            + (0.1 - (5 - q) as f32 * (0.08 + (5 - q) as f32 * 0.02)))
            .max(self.minimum_ease);

        let interval_minutes = match card.scheduling_state {
            SchedulingState::New | SchedulingState::Learning => FixedPolicy::interval(rating),
            SchedulingState::Review => {
                let base = card.interval_minutes.max(MINUTES_PER_DAY) as f32;
                let multiplier = match rating {
                    Rating::Hard => 1.2,
                    Rating::Easy => ease_factor * 1.3,
                    _ => ease_factor,
                };
                // Round to whole days so due dates stay on day boundaries
                let days = (base * multiplier / MINUTES_PER_DAY as f32).round().max(1.0);
                (days as u32).saturating_mul(MINUTES_PER_DAY)
            }
        };

        Step {
            interval_minutes,
            state: state_for_interval(interval_minutes),
            ease_factor,
        }
    }
}

fn state_for_interval(interval_minutes: u32) -> SchedulingState {
    if interval_minutes >= MINUTES_PER_DAY {
        SchedulingState::Review
    } else {
        SchedulingState::Learning
    }
}

/// Interval each rating would give, in `Rating::ALL` order.
/// Used to label the rating buttons.
pub fn preview_intervals(policy: &dyn IntervalPolicy, card: &Card) -> [u32; 4] {
    Rating::ALL.map(|rating| policy.next_step(card, rating).interval_minutes)
}

/// Format an interval in minutes to a short human-readable string
pub fn format_interval(minutes: u32) -> String {
    let days = minutes / MINUTES_PER_DAY;
    if minutes == 0 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{} min", minutes)
    } else if minutes < MINUTES_PER_DAY {
        format!("{} h", minutes / 60)
    } else if days == 1 {
        "1 day".to_string()
    } else if days < 7 {
        format!("{} days", days)
    } else if days < 30 {
        format!("{} wk", days / 7)
    } else if days < 365 {
        format!("{} mo", days / 30)
    } else {
        format!("{} yr", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn new_card() -> Card {
        Card::new(Uuid::new_v4(), "Q".to_string(), "A".to_string(), Utc::now())
    }

    fn review_card(interval_days: u32, ease: f32) -> Card {
        let mut card = new_card();
        card.scheduling_state = SchedulingState::Review;
        card.interval_minutes = interval_days * MINUTES_PER_DAY;
        card.review_count = 5;
        card.ease_factor = ease;
        card
    }

    #[test]
    fn test_fixed_table() {
        let card = new_card();
        let policy = FixedPolicy;

        let cases = [
            (Rating::Again, 1, SchedulingState::Learning),
            (Rating::Hard, 10, SchedulingState::Learning),
            (Rating::Good, 1440, SchedulingState::Review),
            (Rating::Easy, 5760, SchedulingState::Review),
        ];
        for (rating, minutes, state) in cases {
            let step = policy.next_step(&card, rating);
            assert_eq!(step.interval_minutes, minutes, "{rating}");
            assert_eq!(step.state, state, "{rating}");
            assert_eq!(step.ease_factor, card.ease_factor);
        }
    }

    #[test]
    fn test_fixed_ignores_history() {
        let card = review_card(30, 2.5);
        let step = FixedPolicy.next_step(&card, Rating::Good);
        assert_eq!(step.interval_minutes, MINUTES_PER_DAY);
    }

    #[test]
    fn test_sm2_learning_follows_table() {
        let card = new_card();
        let policy = Sm2Policy::default();

        assert_eq!(policy.next_step(&card, Rating::Hard).interval_minutes, 10);
        assert_eq!(policy.next_step(&card, Rating::Good).interval_minutes, MINUTES_PER_DAY);
        assert_eq!(policy.next_step(&card, Rating::Easy).interval_minutes, 4 * MINUTES_PER_DAY);
    }

    #[test]
    fn test_sm2_review_grows_by_ease() {
        let card = review_card(10, 2.5);
        let step = Sm2Policy::default().next_step(&card, Rating::Good);

        // Good keeps ease at 2.5: 10 * 2.5 = 25 days
        assert_eq!(step.interval_minutes, 25 * MINUTES_PER_DAY);
        assert_eq!(step.state, SchedulingState::Review);
        assert!((step.ease_factor - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_sm2_hard_and_easy() {
        let card = review_card(10, 2.5);
        let policy = Sm2Policy::default();

        let hard = policy.next_step(&card, Rating::Hard);
        assert_eq!(hard.interval_minutes, 12 * MINUTES_PER_DAY);
        assert!((hard.ease_factor - 2.36).abs() < 0.001);

        let easy = policy.next_step(&card, Rating::Easy);
        // ease 2.6 * 1.3 = 3.38 -> 33.8 days -> 34
        assert_eq!(easy.interval_minutes, 34 * MINUTES_PER_DAY);
        assert!((easy.ease_factor - 2.6).abs() < 0.001);
    }

    #[test]
    fn test_sm2_again_lapses() {
        let card = review_card(30, 2.5);
        let step = Sm2Policy::default().next_step(&card, Rating::Again);

        assert_eq!(step.interval_minutes, 1);
        assert_eq!(step.state, SchedulingState::Learning);
        assert!((step.ease_factor - 2.3).abs() < 0.001);
    }

    #[test]
    fn test_ease_factor_minimum() {
        let policy = Sm2Policy::default();
        let card = review_card(10, 1.4);

        let result = policy.next_step(&card, Rating::Again);
        assert!(result.ease_factor >= MIN_EASE_FACTOR);

        let again = policy.next_step(
            &Card {
                ease_factor: result.ease_factor,
                ..card
            },
            Rating::Again,
        );
        assert!(again.ease_factor >= MIN_EASE_FACTOR);
    }

    #[test]
    fn test_policy_for() {
        assert_eq!(policy_for(PolicyKind::Fixed, 1.3).name(), "fixed");
        assert_eq!(policy_for(PolicyKind::Sm2, 1.3).name(), "sm2");
    }

    #[test]
    fn test_preview_intervals() {
        let card = new_card();
        assert_eq!(preview_intervals(&FixedPolicy, &card), [1, 10, 1440, 5760]);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1 min");
        assert_eq!(format_interval(10), "10 min");
        assert_eq!(format_interval(120), "2 h");
        assert_eq!(format_interval(1440), "1 day");
        assert_eq!(format_interval(5760), "4 days");
        assert_eq!(format_interval(14 * MINUTES_PER_DAY), "2 wk");
        assert_eq!(format_interval(90 * MINUTES_PER_DAY), "3 mo");
        assert_eq!(format_interval(730 * MINUTES_PER_DAY), "2 yr");
    }
}
