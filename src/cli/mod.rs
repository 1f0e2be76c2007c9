use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::calendar::CalendarDate;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, ListArgs, MonthArgs};

#[derive(Parser, Debug)]
#[command(
    name = "calnotes",
    version,
    about = "Terminal month calendar with notes per day"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over CALNOTES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over CALNOTES_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive month view (default)
    Tui,
    /// Add an event to a day
    Add(AddArgs),
    /// Delete an event by its position in `list`
    Delete(DeleteArgs),
    /// Print the events of one day or of every day
    List(ListArgs),
    /// Print a month grid as text
    Month(MonthArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    // stderr would scribble over the alternate screen
    let log_file = matches!(command, Commands::Tui).then(|| loader.paths().log_file());
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    let storage = storage::open(&config.storage)?;

    let today = CalendarDate::today();
    let output = match command {
        Commands::Tui => {
            let mut app = App::new(config, storage);
            return commands::run_tui(&mut app);
        }
        Commands::Add(args) => commands::run_add(storage.as_ref(), &args, today)?,
        Commands::Delete(args) => commands::run_delete(storage.as_ref(), &args, today)?,
        Commands::List(args) => commands::run_list(storage.as_ref(), &args, today)?,
        Commands::Month(args) => commands::run_month(storage.as_ref(), &args, today)?,
    };
    print!("{output}");
    Ok(())
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_timer(UtcTime::rfc_3339())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
