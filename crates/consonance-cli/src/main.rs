use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use consonance_engine::{Config, SearchOptions};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "consonance", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the fingerprint cache file (default from config)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fingerprint every audio file under a directory
    ///
    /// Recursively walks the specified directory and computes a compact
    /// acoustic fingerprint for every audio file found. For each file:
    ///
    /// - Decodes the audio to mono PCM at its native sample rate
    /// - Computes 13 time-averaged mel-cepstral coefficients (timbre)
    /// - Computes 12 time-averaged pitch-class energies (harmony)
    /// - Records the fingerprint against the file's path
    ///
    /// Considered extensions: mp3, wav, flac, ogg, wma. Files that fail
    /// to decode are logged and skipped; they never abort the pass.
    ///
    /// The pass is all-or-nothing: the cache file is replaced atomically
    /// after a complete walk, and a pass interrupted with Ctrl-C leaves
    /// the previous cache exactly as it was. There is no incremental
    /// update; re-run after the corpus changes.
    ///
    /// Output:
    /// - A progress line updated after each file
    /// - Summary showing files fingerprinted and files skipped
    Index {
        /// Path to the music directory
        path: PathBuf,
    },
    /// Rank cached files by acoustic similarity to a target file
    Search {
        /// The audio file to match against the corpus
        target: PathBuf,
        /// How many matches to report (default from config)
        #[arg(long)]
        top: Option<usize>,
        /// Worker threads for the distance computation, 1-100
        /// (default from config)
        #[arg(long)]
        workers: Option<usize>,
        /// Open the Nth result (1-based) with the system default player
        #[arg(long, value_name = "RANK")]
        open: Option<usize>,
    },
    /// Manage the corpus-relocation path mapping
    Remap {
        #[command(subcommand)]
        action: RemapAction,
    },
    /// Show a summary of the fingerprint cache
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum RemapAction {
    /// Set the active mapping: the recorded root folder name and where
    /// that root lives now
    Set {
        /// Folder name that roots the corpus in recorded paths
        root_folder_name: String,
        /// Where that root lives on this machine
        new_root_path: String,
    },
    /// Show the active mapping
    Show,
    /// Preview what a recorded path remaps to under the active mapping
    Try {
        /// A path as recorded in the cache
        path: String,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Create the config file with documented defaults
    Init,
    /// Show the current effective configuration
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let cache_path = cli.cache.unwrap_or_else(|| config.cache_path.clone());

    match cli.command {
        Commands::Index { path } => {
            commands::run_index(path, cache_path).await?;
        }
        Commands::Search {
            target,
            top,
            workers,
            open,
        } => {
            let options = SearchOptions {
                top_n: top.unwrap_or(config.top_n),
                workers: workers.unwrap_or(config.workers),
            };
            commands::run_search(target, cache_path, options, open).await?;
        }
        Commands::Remap { action } => match action {
            RemapAction::Set {
                root_folder_name,
                new_root_path,
            } => commands::remap_set(root_folder_name, new_root_path)?,
            RemapAction::Show => commands::remap_show()?,
            RemapAction::Try { path } => commands::remap_try(&path)?,
        },
        Commands::Status => {
            commands::show_status(cache_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config_init()?,
            ConfigAction::Show => commands::config_show()?,
            ConfigAction::Path => commands::config_path(),
        },
    }

    Ok(())
}
