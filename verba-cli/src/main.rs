//! verba — word-level LPC fingerprinting of speech recordings.
//!
//! Records or decodes audio, cuts it into spoken words, reduces each word to
//! a sequence of linear-prediction coefficient vectors and keeps the result
//! in a local SQLite database for later comparison.

mod commands;
mod store;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::SizeArg;
use verba_core::WindowFunction;

#[derive(Parser)]
#[command(name = "verba", version, about = "Speech clip analysis and comparison")]
struct Cli {
    /// Database file to operate on.
    #[arg(short = 'd', long = "database", global = true, default_value = "verba.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the clip database.
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    /// Compare coefficient vectors between two stored words.
    ///
    /// Both sides are given as `clip:word_index[:offset]`; `count` vectors
    /// starting at each offset are compared position by position.
    Diff {
        first: String,
        second: String,
        count: usize,
    },
}

#[derive(Subcommand)]
enum DbCommand {
    /// List all clips in the database.
    List,
    /// Analyze a source and store the result as a new clip.
    Add(AddArgs),
    /// Remove a clip and all of its words.
    Remove { name: String },
}

#[derive(Args)]
pub struct AddArgs {
    /// Name of the new clip.
    pub name: String,

    /// `wav=<file>` to analyze a WAV file, or `record` to use the microphone.
    pub source: String,

    /// Coefficient vector size (the LPC order).
    #[arg(short = 'p', long, default_value_t = 16)]
    pub vector_size: usize,

    /// Analysis window size, in samples or with an `ms` suffix.
    #[arg(short = 'w', long, default_value = "1024")]
    pub window_size: SizeArg,

    /// Space between window centers, in samples or with an `ms` suffix.
    #[arg(short = 's', long, default_value = "512")]
    pub window_stride: SizeArg,

    /// Window function: hamming, hann or none.
    #[arg(short = 'f', long, default_value = "hann")]
    pub window_fn: WindowFunction,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Db { command } => match command {
            DbCommand::List => commands::db_list(&cli.database)?,
            DbCommand::Add(args) => commands::db_add(&cli.database, args)?,
            DbCommand::Remove { name } => commands::db_remove(&cli.database, &name)?,
        },
        Command::Diff {
            first,
            second,
            count,
        } => commands::diff(&cli.database, &first, &second, count)?,
    }
    Ok(())
}
