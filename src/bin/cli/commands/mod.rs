pub mod card;
pub mod deck;
pub mod due;
pub mod learn;
pub mod project;
pub mod rate;
pub mod stats;
