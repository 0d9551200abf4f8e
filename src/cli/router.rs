//! Command router for the line protocol
//!
//! Each line is a command name followed by whitespace-separated arguments.
//! Lines are parsed into a [`Command`] before anything touches the store, so
//! unknown names, wrong argument counts and bad percents never reach it.

use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{ChapterStatus, Outcome, Percent, PercentError};
use crate::storage::{BookStats, ProgressStore};

#[derive(Debug, Error, PartialEq)]
pub enum RouterError {
    #[error("Empty command line")]
    Empty,

    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected} argument(s), got {got}. Usage: {usage}")]
    ArgumentCount {
        command: &'static str,
        usage: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid {argument} for '{command}': {source}")]
    InvalidPercent {
        command: &'static str,
        argument: &'static str,
        #[source]
        source: PercentError,
    },
}

/// A parsed protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read {
        book: String,
        chapter: String,
        percent: Percent,
    },
    Stats {
        book: String,
    },
    AddChapter {
        book: String,
        chapter: String,
        required: Percent,
    },
    AddPrerequisite {
        book: String,
        chapter: String,
        prerequisite: String,
    },
    RemovePrerequisite {
        book: String,
        chapter: String,
        prerequisite: String,
    },
    Chapters {
        book: String,
    },
}

/// Entry in the command table
struct CommandSpec {
    name: &'static str,
    args: &'static [&'static str],
    build: fn(&[&str]) -> Result<Command, RouterError>,
}

impl CommandSpec {
    fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for arg in self.args {
            usage.push_str(&format!(" <{}>", arg));
        }
        usage
    }
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "read",
        args: &["book", "chapter", "percent"],
        build: |args| {
            Ok(Command::Read {
                book: args[0].to_string(),
                chapter: args[1].to_string(),
                percent: parse_percent("read", "percent", args[2])?,
            })
        },
    },
    CommandSpec {
        name: "stats",
        args: &["book"],
        build: |args| {
            Ok(Command::Stats {
                book: args[0].to_string(),
            })
        },
    },
    CommandSpec {
        name: "add_chapter",
        args: &["book", "chapter", "required_percent"],
        build: |args| {
            Ok(Command::AddChapter {
                book: args[0].to_string(),
                chapter: args[1].to_string(),
                required: parse_percent("add_chapter", "required_percent", args[2])?,
            })
        },
    },
    CommandSpec {
        name: "add_prerequisite_chapter",
        args: &["book", "chapter", "prerequisite"],
        build: |args| {
            Ok(Command::AddPrerequisite {
                book: args[0].to_string(),
                chapter: args[1].to_string(),
                prerequisite: args[2].to_string(),
            })
        },
    },
    CommandSpec {
        name: "remove_prerequisite_chapter",
        args: &["book", "chapter", "prerequisite"],
        build: |args| {
            Ok(Command::RemovePrerequisite {
                book: args[0].to_string(),
                chapter: args[1].to_string(),
                prerequisite: args[2].to_string(),
            })
        },
    },
    CommandSpec {
        name: "chapters",
        args: &["book"],
        build: |args| {
            Ok(Command::Chapters {
                book: args[0].to_string(),
            })
        },
    },
];

fn parse_percent(command: &'static str, argument: &'static str, raw: &str) -> Result<Percent, RouterError> {
    raw.parse().map_err(|source| RouterError::InvalidPercent {
        command,
        argument,
        source,
    })
}

impl Command {
    /// Parses one protocol line
    pub fn parse(line: &str) -> Result<Self, RouterError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(RouterError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        let spec = COMMANDS
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| RouterError::UnknownCommand(name.to_string()))?;

        if args.len() != spec.args.len() {
            return Err(RouterError::ArgumentCount {
                command: spec.name,
                usage: spec.usage(),
                expected: spec.args.len(),
                got: args.len(),
            });
        }

        (spec.build)(&args)
    }

    /// Returns the protocol name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Read { .. } => "read",
            Command::Stats { .. } => "stats",
            Command::AddChapter { .. } => "add_chapter",
            Command::AddPrerequisite { .. } => "add_prerequisite_chapter",
            Command::RemovePrerequisite { .. } => "remove_prerequisite_chapter",
            Command::Chapters { .. } => "chapters",
        }
    }

    /// Returns usage lines for every known command
    pub fn usage() -> Vec<String> {
        COMMANDS.iter().map(CommandSpec::usage).collect()
    }
}

impl FromStr for Command {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What a dispatched command produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    /// Result of a mutation
    Outcome {
        command: &'static str,
        #[serde(flatten)]
        outcome: Outcome,
    },
    Stats {
        book: String,
        #[serde(flatten)]
        stats: BookStats,
    },
    Chapters {
        book: String,
        chapters: Vec<ChapterStatus>,
    },
}

/// Routes protocol commands to a [`ProgressStore`]
pub struct CommandRouter {
    store: ProgressStore,
}

impl CommandRouter {
    pub fn new(store: ProgressStore) -> Self {
        Self { store }
    }

    /// Parses and executes one protocol line
    pub fn dispatch(&mut self, line: &str) -> Result<Response> {
        let command = Command::parse(line)?;
        self.execute(command)
    }

    /// Executes a parsed command against the store
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        let name = command.name();

        let outcome = match command {
            Command::Read {
                book,
                chapter,
                percent,
            } => self.store.record_progress(&book, &chapter, percent)?,
            Command::AddChapter {
                book,
                chapter,
                required,
            } => self.store.upsert_chapter(&book, &chapter, required)?,
            Command::AddPrerequisite {
                book,
                chapter,
                prerequisite,
            } => self.store.add_prerequisite(&book, &chapter, &prerequisite)?,
            Command::RemovePrerequisite {
                book,
                chapter,
                prerequisite,
            } => self.store.remove_prerequisite(&book, &chapter, &prerequisite)?,
            Command::Stats { book } => {
                let stats = self.store.stats(&book)?;
                return Ok(Response::Stats { book, stats });
            }
            Command::Chapters { book } => {
                let chapters = self.store.chapters(&book)?;
                return Ok(Response::Chapters { book, chapters });
            }
        };

        Ok(Response::Outcome {
            command: name,
            outcome,
        })
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }
}
