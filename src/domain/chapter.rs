//! Chapter and progress models
//!
//! A chapter counts as completed only when a progress record exists and its
//! percent reaches the chapter's threshold. Completion is never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::percent::Percent;

/// A chapter registered under a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub book: String,
    pub title: String,
    /// Threshold progress must reach for the chapter to count as completed
    pub required: Percent,
}

impl Chapter {
    pub fn new(book: impl Into<String>, title: impl Into<String>, required: Percent) -> Self {
        Self {
            book: book.into(),
            title: title.into(),
            required,
        }
    }

    /// Returns true if `progress` completes this chapter
    pub fn is_completed_by(&self, progress: Option<&Progress>) -> bool {
        is_completed(progress, self.required)
    }
}

/// The most recently reported progress for a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub percent: Percent,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    pub fn new(percent: Percent) -> Self {
        Self {
            percent,
            updated_at: Utc::now(),
        }
    }
}

/// Derived completion: a record must exist and meet the threshold (inclusive)
pub fn is_completed(progress: Option<&Progress>, required: Percent) -> bool {
    progress.is_some_and(|p| p.percent >= required)
}

/// A chapter together with its derived state, as listed by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterStatus {
    pub title: String,
    pub required: Percent,
    pub progress: Option<Progress>,
    pub completed: bool,
    /// Prerequisites that are not yet completed
    pub pending: Vec<String>,
}

impl ChapterStatus {
    /// Returns true if progress may currently be recorded for this chapter
    pub fn is_open(&self) -> bool {
        self.pending.is_empty()
    }
}
