//! Outcomes of store mutations
//!
//! A failed precondition is not an error: nothing is written and the caller
//! receives a [`Rejection`] saying why.

use std::fmt;

use serde::Serialize;

/// What happened to a requested mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// State now matches the request
    Applied,
    /// A precondition failed and nothing was written
    Rejected { reason: Rejection },
}

impl Outcome {
    pub fn rejected(reason: Rejection) -> Self {
        Outcome::Rejected { reason }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    /// Returns the rejection reason, if any
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Why a mutation was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    EmptyTitle {
        book: String,
        chapter: String,
    },
    BookNotFound {
        book: String,
    },
    ChapterNotFound {
        book: String,
        chapter: String,
    },
    PrerequisiteNotFound {
        book: String,
        prerequisite: String,
    },
    PrerequisitesIncomplete {
        chapter: String,
        pending: Vec<String>,
    },
    SelfPrerequisite {
        chapter: String,
    },
    CycleDetected {
        chapter: String,
        prerequisite: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyTitle { book, chapter } => write!(
                f,
                "book and chapter titles must not be empty (book '{}', chapter '{}')",
                book, chapter
            ),
            Rejection::BookNotFound { book } => write!(f, "book '{}' not found", book),
            Rejection::ChapterNotFound { book, chapter } => {
                write!(f, "chapter '{}' not found in '{}'", chapter, book)
            }
            Rejection::PrerequisiteNotFound { book, prerequisite } => {
                write!(f, "prerequisite '{}' not found in '{}'", prerequisite, book)
            }
            Rejection::PrerequisitesIncomplete { chapter, pending } => write!(
                f,
                "'{}' is locked until completed: {}",
                chapter,
                pending.join(", ")
            ),
            Rejection::SelfPrerequisite { chapter } => {
                write!(f, "'{}' cannot be its own prerequisite", chapter)
            }
            Rejection::CycleDetected {
                chapter,
                prerequisite,
            } => write!(
                f,
                "'{}' already depends on '{}'; the edge would create a cycle",
                prerequisite, chapter
            ),
        }
    }
}
