//! interview-sim: drives proctored interview sessions from the command line.
//!
//! Stands in for the browser shell: replays scripted page and voice events
//! against an `InterviewController` backed by the on-disk store, and prints
//! every effect the controller hands back as a JSON line.
//!
//! ## Subcommands
//!
//! - `run`: Replay a JSON-lines script
//! - `status`: Print the stored interview snapshot
//! - `reset`: Remove the stored interview snapshot

mod error;
mod logging;
mod run;
mod script;
mod voice;

use clap::{Parser, Subcommand};
use interview_core::{FileStore, InterviewStore};
use std::path::PathBuf;

use error::SimError;

#[derive(Parser)]
#[command(name = "interview-sim")]
#[command(about = "Scripted host for proctored mock interviews")]
#[command(version)]
struct Cli {
    /// Directory holding the interview snapshot (defaults to ~/.mock-interview)
    #[arg(long, global = true, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.mock-interview/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of host events, one JSON object per line
    Run {
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
    },

    /// Print the stored interview snapshot
    Status,

    /// Remove the stored interview snapshot
    Reset,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        tracing::error!(error = %e, "interview-sim failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), SimError> {
    let config = interview_core::load_config(cli.config)?;
    let store_dir = match cli.store_dir {
        Some(dir) => dir,
        None => config.store_dir()?,
    };
    let backend = FileStore::new(&store_dir);

    match cli.command {
        Commands::Run { script } => {
            let steps = script::load(&script)?;
            let stdout = std::io::stdout();
            let mut runner = run::Runner::new(config, backend, chrono::Utc::now(), stdout.lock());
            runner.run(&steps)
        }
        Commands::Status => {
            let store = InterviewStore::new(backend, &config.store.key);
            match store.load_snapshot()? {
                Some(snapshot) => {
                    let rendered = serde_json::to_string_pretty(&snapshot).map_err(|source| {
                        SimError::Encode {
                            context: "rendering snapshot".to_string(),
                            source,
                        }
                    })?;
                    println!("{}", rendered);
                }
                None => println!("No stored interview in {}", store_dir.display()),
            }
            Ok(())
        }
        Commands::Reset => {
            let mut store = InterviewStore::new(backend, &config.store.key);
            store.clear()?;
            tracing::info!(dir = %store_dir.display(), "Stored interview removed");
            println!("Cleared stored interview in {}", store_dir.display());
            Ok(())
        }
    }
}
