//! # Storage Layer
//!
//! Persistence layer for the reader CLI.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Books, chapters, prerequisites, progress | SQLite | `Reader.db` (or `--db`) |
//! | Config | TOML | `~/.config/reader/config.toml` |
//!
//! ## Tables
//!
//! | Table | Key | Notes |
//! |-------|-----|-------|
//! | `books` | `title` | Created on first chapter |
//! | `chapters` | `(book_id, title)` | `required_percent` in 0..=100 |
//! | `prerequisites` | `(chapter_id, prerequisite_id)` | Set of edges, no self-loops |
//! | `progress` | `chapter_id` | At most one record per chapter |
//!
//! ## Key Types
//!
//! - [`ProgressStore`] - Gated reads and writes of reading progress
//! - [`Config`] - User configuration

mod config;
mod store;

pub use config::{Config, ConfigError};
pub use store::{BookStats, ProgressStore, StoreError};
