pub mod config;
pub mod flashcards;

pub use config::{AppConfig, ConfigError};
