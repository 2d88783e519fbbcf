use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{self, ConfigError, DEFAULT_PROFILE};
use crate::core_service::{CoreService, Outcome, ServiceError};
use crate::host::Host;
use crate::search::DisplayItem;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Service(#[from] ServiceError),
    #[error("no result at index {index} ({len} matches)")]
    NoSelection { index: usize, len: usize },
    #[error("action failed: {0}")]
    Action(String),
}

#[derive(Debug, Parser)]
#[command(name = "vscrecent")]
#[command(about = "Search, open and prune an editor's recently opened list", long_about = None)]
pub struct CliOptions {
    /// Editor profile, e.g. `code` or `cursor`
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    pub profile: String,
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Use this state database instead of the profile's
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the items a query produces; markers such as `-rm` are allowed
    List {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        query: Vec<String>,
    },
    /// Run the action of the N-th item a query produces
    Select {
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Answer yes to confirmations
        #[arg(long)]
        yes: bool,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        query: Vec<String>,
    },
    /// Remove history entries by their raw canonical path
    Remove {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Handle one JSON request and print the JSON response
    Json { payload: String },
    /// Write the active profile to the config file
    Init,
}

pub fn parse_cli_args(args: &[String]) -> Result<CliOptions, clap::Error> {
    CliOptions::try_parse_from(std::iter::once("vscrecent".to_string()).chain(args.iter().cloned()))
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    let _log_guard = match crate::logging::init(options.verbose) {
        Ok(guard) => Some(guard),
        Err(error) => {
            eprintln!("[vscrecent] logging disabled: {error}");
            None
        }
    };

    let config_path = options.config.unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_profile(&config_path, &options.profile)?;
    if let Some(database) = options.database {
        cfg.database = database;
        cfg.auto_detect_database = false;
    }
    tracing::info!(
        profile = %cfg.code,
        config = %config_path.display(),
        database = %cfg.database.display(),
        "startup"
    );

    let assume_yes = matches!(options.command, CliCommand::Select { yes: true, .. });
    let mut service = CoreService::new(cfg, Box::new(ConsoleHost { assume_yes }))?;

    match options.command {
        CliCommand::Init => {
            config::save_profile(&config_path, service.config())?;
            println!("wrote profile '{}' to {}", service.config().code, config_path.display());
        }
        CliCommand::List { query } => {
            let items = service.search(&query.join(" "))?;
            if items.is_empty() {
                println!("no matches");
            }
            for (index, item) in items.iter().enumerate() {
                print_item(index, item);
            }
        }
        CliCommand::Select { index, query, .. } => {
            let items = service.search(&query.join(" "))?;
            let item = items.get(index).ok_or(RuntimeError::NoSelection {
                index,
                len: items.len(),
            })?;
            let selection = service.select(item);
            if let Some(next) = &selection.next_query {
                println!("next query: {next}");
            }
            match selection.outcome {
                Outcome::Failed(message) => return Err(RuntimeError::Action(message)),
                Outcome::Copied(text) => println!("copied {text}"),
                other => println!("{other:?}"),
            }
        }
        CliCommand::Remove { paths } => {
            let removed = service.delete_paths(&paths)?;
            println!("removed {removed} of {} entries", paths.len());
        }
        CliCommand::Json { payload } => {
            println!("{}", crate::transport::handle_json(&mut service, &payload));
        }
    }

    Ok(())
}

fn print_item(index: usize, item: &DisplayItem) {
    println!("{index:>3}  {}\n     {}", item.title, item.subtitle);
}

struct ConsoleHost {
    assume_yes: bool,
}

impl Host for ConsoleHost {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!("{message}\n[y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn hide_window(&self) {
        tracing::debug!("hide window requested; nothing to hide in console mode");
    }
}
