mod platform;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use platform::commands::{self, EventKind};
use platform::logging;
use platform::settings::{self, Overrides, DEFAULT_SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "wikirag")]
#[command(about = "Export wiki pages into a retrieval index")]
#[command(version)]
struct Cli {
    /// Settings file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the directory-backed wiki
    #[arg(long)]
    wiki_root: Option<PathBuf>,

    /// Queue database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drain the export queue
    ExportQueued {
        /// Maximum number of pages to export
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Queue every indexable page and context provider
    ScheduleAll,

    /// Purge the target, then export everything
    FullReindex,

    /// Show queued work
    ShowQueued,

    /// Show export history of one page
    ShowHistory {
        /// Page as `Namespace:Title`
        #[arg(short, long)]
        page: String,
    },

    /// Export a single artifact without touching the queue
    ExportItem {
        /// Id base, `wiki|namespace|title`
        #[arg(long)]
        id: String,

        /// Data provider key
        #[arg(short, long)]
        provider: String,

        /// Write the content here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Deliver a page event to the change observers
    Notify {
        #[arg(value_enum)]
        event: EventKind,

        /// Page as `Namespace:Title`
        #[arg(short, long)]
        page: String,

        /// Destination of a move
        #[arg(long)]
        to: Option<String>,

        /// A redirect was left behind by the move
        #[arg(long)]
        redirect: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (settings_path, explicit) = match cli.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    let mut settings = settings::load_settings(&settings_path, explicit)?;
    settings.apply(Overrides {
        wiki_root: cli.wiki_root,
        database: cli.database,
    });

    logging::initialize(
        settings.log_destination,
        logging::level_for_verbosity(cli.verbose),
        &settings.log_file,
    );

    let services = commands::build_services(&settings)?;
    let output = match cli.command {
        Commands::ExportQueued { limit } => commands::export_queued(&services, limit)?,
        Commands::ScheduleAll => commands::schedule_all(&services)?,
        Commands::FullReindex => commands::full_reindex(&services)?,
        Commands::ShowQueued => commands::show_queued(&services)?,
        Commands::ShowHistory { page } => commands::show_history(&services, &page)?,
        Commands::ExportItem { id, provider, out } => {
            commands::export_item(&services, &id, &provider, out.as_deref())?
        }
        Commands::Notify {
            event,
            page,
            to,
            redirect,
        } => commands::notify(&services, event, &page, to.as_deref(), redirect)?,
    };
    print!("{output}");
    Ok(())
}
