//! Domain models for reading progress
//!
//! Contains the gating rules without any I/O concerns.

mod percent;
mod chapter;
mod gate;
mod graph;
mod outcome;

pub use percent::{Percent, PercentError};
pub use chapter::{is_completed, Chapter, ChapterStatus, Progress};
pub use gate::Gate;
pub use graph::{GraphError, PrerequisiteGraph};
pub use outcome::{Outcome, Rejection};
