//! # Command-Line Interface
//!
//! User-facing CLI and the line protocol.
//!
//! ## Protocol Commands
//!
//! | Command | Arguments | Effect |
//! |---------|-----------|--------|
//! | `read` | book chapter percent | Record progress (gated on prerequisites) |
//! | `stats` | book | Print `<completed> of <total>` |
//! | `add_chapter` | book chapter required_percent | Register or update a chapter |
//! | `add_prerequisite_chapter` | book chapter prerequisite | Add a prerequisite edge |
//! | `remove_prerequisite_chapter` | book chapter prerequisite | Remove a prerequisite edge |
//! | `chapters` | book | List chapters in reading order |
//!
//! ## Modes
//!
//! - `reader` / `reader repl` - read commands from stdin until `end`
//! - `reader exec <command...>` - run one command
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - only `stats` and `chapters` print to stdout
//! - `json` - one JSON object per command, including rejections
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) to see each outcome on stderr:
//! ```bash
//! reader --verbose < commands.txt
//! ```

mod app;
mod output;
mod repl;
mod router;

pub use app::{run, Cli, Commands};
pub use output::{format_stats, Output, OutputFormat};
pub use repl::{ReplSummary, END_MARKER};
pub use router::{Command, CommandRouter, Response, RouterError};
