//! Completion gate
//!
//! Progress may be recorded against a chapter only when every one of its
//! prerequisites is completed. A chapter without prerequisites is always open.

use serde::Serialize;

use super::chapter::{Chapter, Progress};

/// Result of evaluating a chapter's prerequisites
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum Gate {
    Open,
    Blocked {
        /// Titles of prerequisites that are not completed, in input order
        pending: Vec<String>,
    },
}

impl Gate {
    /// Evaluates the gate over a chapter's prerequisites and their progress
    pub fn evaluate<'a, I>(prerequisites: I) -> Self
    where
        I: IntoIterator<Item = (&'a Chapter, Option<&'a Progress>)>,
    {
        let pending: Vec<String> = prerequisites
            .into_iter()
            .filter(|(chapter, progress)| !chapter.is_completed_by(*progress))
            .map(|(chapter, _)| chapter.title.clone())
            .collect();

        if pending.is_empty() {
            Gate::Open
        } else {
            Gate::Blocked { pending }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Gate::Open)
    }

    /// Returns the prerequisites holding the gate closed
    pub fn pending(&self) -> &[String] {
        match self {
            Gate::Open => &[],
            Gate::Blocked { pending } => pending,
        }
    }
}
