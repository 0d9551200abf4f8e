//! Reader - prerequisite-gated reading progress
//!
//! Books are made of chapters, and a chapter may require other chapters of
//! the same book to be completed before progress can be recorded against
//! it. A chapter is completed when its latest progress reaches its required
//! percentage.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Chapter, Gate, Outcome, Percent, Progress, Rejection};
pub use storage::{BookStats, ProgressStore};
