//! Output formatting for CLI commands

use serde::{Deserialize, Serialize};

use super::router::Response;
use crate::domain::{ChapterStatus, Outcome};

/// Output format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints the response to a dispatched command
    ///
    /// In text mode only `stats` and `chapters` write to stdout; mutation
    /// outcomes are reported through verbose output.
    pub fn response(&self, response: &Response) {
        if self.is_json() {
            self.data(response);
            return;
        }

        match response {
            Response::Stats { stats, .. } => {
                println!("{}", format_stats(stats.completed, stats.total));
            }
            Response::Chapters { book, chapters } => self.chapters(book, chapters),
            Response::Outcome { command, outcome } => match outcome {
                Outcome::Applied => self.verbose_ctx(command, "applied"),
                Outcome::Rejected { reason } => {
                    self.verbose_ctx(command, &format!("rejected: {}", reason))
                }
            },
        }
    }

    fn chapters(&self, book: &str, chapters: &[ChapterStatus]) {
        if chapters.is_empty() {
            println!("No chapters in '{}'.", book);
            return;
        }

        println!("{:<4} {:<24} {:>8} {:>8}  BLOCKED BY", "", "CHAPTER", "REQUIRED", "PROGRESS");
        println!("{}", "-".repeat(70));
        for chapter in chapters {
            let mark = if chapter.completed {
                "[x]"
            } else if chapter.is_open() {
                "[ ]"
            } else {
                "[-]"
            };
            let progress = chapter
                .progress
                .as_ref()
                .map(|p| format!("{}%", p.percent))
                .unwrap_or_else(|| "-".to_string());

            println!(
                "{:<4} {:<24} {:>7}% {:>8}  {}",
                mark,
                chapter.title,
                chapter.required,
                progress,
                chapter.pending.join(", ")
            );
        }
    }

    /// Prints an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// Formats book statistics the way the line protocol prints them
pub fn format_stats(completed: usize, total: usize) -> String {
    format!("{} of {}", completed, total)
}
