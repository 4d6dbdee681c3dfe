//! Flashcard and spaced repetition system for FlashMaster
//!
//! This module provides:
//! - Project, deck and card CRUD backed by JSON files
//! - Interval policies (fixed table, SM-2 style)
//! - The review scheduler: rating, due checks and due-queue ordering
//! - Learn sessions over the due queue

pub mod algorithm;
pub mod models;
pub mod scheduler;
pub mod session;
pub mod storage;

pub use algorithm::{format_interval, PolicyKind};
pub use models::*;
pub use scheduler::{is_due, rate, rate_named, select_due, DueQueue, Scheduler, SchedulerError};
pub use session::{ReviewSession, SessionError};
pub use storage::{FlashcardStorage, StorageError};
