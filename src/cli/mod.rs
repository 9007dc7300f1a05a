pub mod commands;
pub mod render;
pub mod triage;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::logging::init_logging;
use crate::models::Category;
use crate::utils::log_dir;

#[derive(Parser)]
#[command(name = "mod-triage")]
#[command(version)]
#[command(about = "Classify, mark and sort game mod archives", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to $MOD_TRIAGE_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug logging to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not write a log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List archives under a mods directory with their detected type
    Scan {
        /// Mods directory (defaults to $MOD_TRIAGE_ROOT or the game's mods folder)
        dir: Option<PathBuf>,
        /// Only list archives of this type
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
        /// Only list archives that have not been sorted yet
        #[arg(long)]
        unsorted: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show everything detected about one archive
    Inspect {
        archive: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Mark an archive as sorted
    Keep { archive: PathBuf },
    /// Remove the sorted marker from an archive
    Unmark { archive: PathBuf },
    /// Print the sorted marker stored in an archive
    Marker { archive: PathBuf },
    /// Move an archive to a directory or a configured move folder
    Move {
        archive: PathBuf,
        /// Destination directory, or the name/key of a configured move folder
        destination: String,
        /// Mods directory used to resolve relative move folders
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Delete an archive
    Delete {
        archive: PathBuf,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Review archives one by one from the terminal
    Triage {
        dir: Option<PathBuf>,
        /// Skip archives that are already sorted
        #[arg(long)]
        skip_marked: bool,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::parse(value).ok_or_else(|| format!("unknown type '{}', expected Vehicle, Map or Other", value))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = if cli.no_log_file { None } else { log_dir() };
    let _guard = init_logging(log_dir.as_deref(), cli.verbose);

    let Some(command) = cli.command else {
        println!("Use --help for usage information");
        return Ok(());
    };

    let settings = commands::load_settings(cli.config.as_deref())?;

    match command {
        Commands::Scan { dir, category, unsorted, json } => commands::scan(dir, &settings, category, unsorted, json),
        Commands::Inspect { archive, json } => commands::inspect(&archive, json),
        Commands::Keep { archive } => commands::keep(&archive, &settings),
        Commands::Unmark { archive } => commands::unmark(&archive),
        Commands::Marker { archive } => commands::show_marker(&archive),
        Commands::Move { archive, destination, root } => commands::move_archive(&archive, &destination, root, &settings),
        Commands::Delete { archive, yes } => commands::delete(&archive, yes, &settings),
        Commands::Triage { dir, skip_marked } => commands::triage(dir, settings, skip_marked),
    }
}
