//! Main CLI application structure

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::repl;
use super::router::{Command, CommandRouter};
use crate::storage::{Config, ProgressStore};

#[derive(Parser)]
#[command(name = "reader")]
#[command(author, version, about = "Track reading progress through prerequisite-gated chapters")]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (defaults to the configured path, then Reader.db)
    #[arg(long, global = true, env = "READER_DB")]
    pub db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "READER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read commands from stdin until a line `end` (the default)
    Repl,

    /// Run a single protocol command, e.g. `reader exec stats Algebra`
    Exec {
        /// Command name followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// List the protocol commands
    Commands,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let output = Output::new(cli.format.unwrap_or(config.default_format), cli.verbose);

    output.verbose("reader starting");

    let command = cli.command.unwrap_or(Commands::Repl);
    if let Commands::Commands = command {
        if output.is_json() {
            output.data(&Command::usage());
        } else {
            for usage in Command::usage() {
                println!("{}", usage);
            }
        }
        return Ok(());
    }

    let db_path = config.database_path(cli.db.as_deref());
    output.verbose_ctx("store", &format!("Opening database: {}", db_path.display()));
    let store = ProgressStore::open(&db_path)?;
    let mut router = CommandRouter::new(store);

    match command {
        Commands::Repl => {
            let stdin = io::stdin();
            let summary = repl::run(&mut router, stdin.lock(), &output)?;
            if summary.failed > 0 {
                anyhow::bail!(
                    "{} of {} command(s) failed",
                    summary.failed,
                    summary.dispatched
                );
            }
        }
        Commands::Exec { tokens } => {
            let line = tokens.join(" ");
            output.verbose_ctx("exec", &line);
            let response = router.dispatch(&line)?;
            output.response(&response);
        }
        Commands::Commands => {}
    }

    output.verbose("Command completed successfully");
    Ok(())
}
