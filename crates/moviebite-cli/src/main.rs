use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::Context;
use commands::{clear, config, history, play, resume, transfer, watch_later};
use moviebite_config::{Config, PathManager};
use moviebite_core::{FileStorage, PersonalizationStore};
use moviebite_models::{MediaLocator, MediaType};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "moviebite")]
#[command(about = "moviebite - watch later, watch history and resume points for your catalog browsing")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the watch-later list
    #[command(name = "watch-later")]
    WatchLater {
        #[command(subcommand)]
        cmd: WatchLaterCommands,
    },
    /// Record and inspect watch history
    History {
        #[command(subcommand)]
        cmd: HistoryCommands,
    },
    /// Save and look up resume points
    Resume {
        #[command(subcommand)]
        cmd: ResumeCommands,
    },
    /// Simulate a playback session that saves resume progress periodically
    #[command(long_about = "Run a simulated player for a movie or episode. The playback position advances once per second and is saved to the store at the configured interval, when the session ends, and on Ctrl-C. With --title the viewing is also recorded in watch history.")]
    Play {
        /// Locator such as movie-603, tv-1396-1-3 or anime-21-5
        locator: MediaLocator,

        /// Total runtime in seconds
        #[arg(long)]
        duration: f64,

        /// Start offset in seconds (defaults to the stored resume point)
        #[arg(long)]
        start: Option<f64>,

        /// Seconds of playback per wall-clock second
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Title to record in watch history
        #[arg(long)]
        title: Option<String>,

        /// Poster path to record in watch history
        #[arg(long)]
        poster: Option<String>,

        /// Genre id to record in watch history (repeatable)
        #[arg(long = "genre")]
        genres: Vec<u32>,
    },
    /// Export all personalization data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Replace all personalization data with an exported snapshot
    #[command(long_about = "Import a snapshot written by `export`, or a JSON dump of browser local storage containing watchLater, watchHistory and resumeProgress keys. Existing data is replaced.")]
    Import {
        file: PathBuf,
    },
    /// Delete all personalization data
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum WatchLaterCommands {
    /// Bookmark a title
    Add {
        id: u64,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: MediaType,
        #[arg(long)]
        title: String,
        #[arg(long)]
        poster: Option<String>,
    },
    /// Remove a bookmark (every media type unless --type is given)
    Remove {
        id: u64,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: Option<MediaType>,
    },
    /// Check whether a title is bookmarked
    Check {
        id: u64,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: Option<MediaType>,
    },
    /// List bookmarks, oldest first
    List,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Record that a title was watched now
    Add {
        id: u64,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: MediaType,
        #[arg(long)]
        title: String,
        #[arg(long)]
        poster: Option<String>,
        /// Genre id (repeatable)
        #[arg(long = "genre")]
        genres: Vec<u32>,
    },
    /// List history, most recent first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Most frequent genres across the history
    TopGenres {
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

#[derive(Subcommand)]
pub enum ResumeCommands {
    /// Store a playback offset
    Save {
        locator: MediaLocator,
        timestamp: f64,
        duration: f64,
    },
    /// Show the stored offset for a locator
    Get {
        locator: MediaLocator,
    },
    /// List offsets worth resuming, most recent first
    List {
        /// Include offsets below the minimum visible position
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Forget the offset for a locator
    Clear {
        locator: MediaLocator,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let path_manager = PathManager::default();
    let config_path = cli.config.clone().unwrap_or_else(|| path_manager.config_file());
    let app_config = Config::load_or_default(&config_path)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))
        .wrap_err_with(|| format!("Failed to load config from {}", config_path.display()))?;

    let log_file = app_config.logging.resolve_file(&path_manager);
    logging::init_logging(cli.verbose, cli.quiet, &app_config.logging, log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    // Config commands do not need the store
    let command = match cli.command {
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            return config::run_config(cmd, &app_config, &config_path, &output);
        }
        command => command,
    };

    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))
        .wrap_err("Failed to create data directories")?;
    let storage = FileStorage::new(path_manager.store_dir());
    let mut store = PersonalizationStore::open(storage, &app_config.store);

    match command {
        Commands::WatchLater { cmd } => watch_later::run_watch_later(cmd, &mut store, &output),
        Commands::History { cmd } => history::run_history(cmd, &mut store, &output),
        Commands::Resume { cmd } => resume::run_resume(cmd, &mut store, &app_config.resume, &output),
        Commands::Play {
            locator,
            duration,
            start,
            speed,
            title,
            poster,
            genres,
        } => {
            let session = play::PlaySession {
                locator,
                duration,
                start,
                speed,
                title,
                poster,
                genres,
            };
            play::run_play(session, &mut store, &app_config.resume, &output).await
        }
        Commands::Export { file } => transfer::run_export(&store, file, &output),
        Commands::Import { file } => transfer::run_import(&mut store, &file, &output),
        Commands::Clear { yes } => clear::run_clear(&mut store, yes, &output),
        Commands::Config { .. } => unreachable!("handled before the store is opened"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_later_add() {
        let cli = Cli::try_parse_from([
            "moviebite", "watch-later", "add", "42", "--type", "movie", "--title", "X",
        ])
        .unwrap();
        match cli.command {
            Commands::WatchLater {
                cmd: WatchLaterCommands::Add { id, media_type, title, poster },
            } => {
                assert_eq!(id, 42);
                assert_eq!(media_type, MediaType::Movie);
                assert_eq!(title, "X");
                assert!(poster.is_none());
            }
            _ => panic!("expected watch-later add"),
        }
    }

    #[test]
    fn test_parse_resume_save_locator() {
        let cli = Cli::try_parse_from(["moviebite", "resume", "save", "tv-1396-1-3", "42", "120"]).unwrap();
        match cli.command {
            Commands::Resume {
                cmd: ResumeCommands::Save { locator, timestamp, duration },
            } => {
                assert_eq!(locator, MediaLocator::tv_episode(1396, 1, 3));
                assert_eq!(timestamp, 42.0);
                assert_eq!(duration, 120.0);
            }
            _ => panic!("expected resume save"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_locator() {
        assert!(Cli::try_parse_from(["moviebite", "resume", "get", "movie"]).is_err());
        assert!(Cli::try_parse_from(["moviebite", "watch-later", "check", "1", "--type", "music"]).is_err());
    }
}
