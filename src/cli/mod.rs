//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::notify::ConsoleNotifier;
use crate::output::OutputOptions;
use crate::store::PostgrestStore;
use crate::sync::{LoadOutcome, TaskSync};

mod about;
mod calendar;
mod config;
mod home;
mod task;

/// taskboard - tasks, due dates and a month calendar
///
/// Manage tasks stored in a hosted table store: list, filter, create,
/// edit, complete and delete them, or browse them on a calendar.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to taskboard.toml
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store project URL (overrides the config file)
    #[arg(long, global = true, env = "TASKBOARD_STORE_URL")]
    pub store_url: Option<String>,

    /// Store API key (overrides the config file)
    #[arg(long, global = true, env = "TASKBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dashboard: counts and upcoming tasks
    Home,

    /// Task list management
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Month calendar
    #[command(subcommand)]
    Calendar(CalendarCommands),

    /// List categories defined in the store
    Categories,

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// What taskboard is and where to get help
    About,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Status filter: all, pending, completed
        #[arg(long, default_value = "all")]
        status: String,

        /// Case-insensitive text to look for in title and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Category (defaults to tasks.default_category)
        #[arg(short, long)]
        category: Option<String>,

        /// Priority: baja, media, alta
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Edit fields of a task
    Edit {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Flip a task between pending and completed
    Toggle {
        /// Task id
        id: String,
    },

    /// Delete one or more tasks
    Rm {
        /// Task ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Open tasks due from today on, soonest first
    Upcoming {
        /// Maximum entries (defaults to tasks.upcoming_limit)
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Calendar subcommands
#[derive(Subcommand, Debug)]
pub enum CalendarCommands {
    /// Show a month grid
    Show {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Show the tasks due on one day
    Day {
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (API key redacted)
    Show,
}

/// Everything a store-backed command needs.
pub struct Session {
    pub config: Config,
    pub sync: TaskSync,
    pub output: OutputOptions,
    pub today: NaiveDate,
}

impl Session {
    /// Initial fetch every store-backed command starts from.
    pub async fn load(&self) -> Result<usize> {
        match self.sync.load().await? {
            LoadOutcome::Applied(count) => Ok(count),
            LoadOutcome::Superseded => Ok(self.sync.len()),
        }
    }
}

impl Cli {
    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    fn effective_config(&self) -> Result<Config> {
        let config = Config::discover(self.config.as_deref())?
            .with_store_overrides(self.store_url.clone(), self.api_key.clone());
        config.validate()?;
        Ok(config)
    }

    fn session(&self) -> Result<Session> {
        let config = self.effective_config()?;
        let store = PostgrestStore::from_config(&config.store)?;
        debug!(base = %store.base_url(), "store client ready");
        let notifier = ConsoleNotifier::new(self.quiet || self.json);
        Ok(Session {
            sync: TaskSync::new(Arc::new(store), Arc::new(notifier)),
            output: self.output_options(),
            today: chrono::Local::now().date_naive(),
            config,
        })
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        if matches!(self.command, Commands::About) {
            return about::run(self.output_options());
        }
        if let Commands::Config(cmd) = &self.command {
            let options = self.output_options();
            return match cmd {
                ConfigCommands::Init { force } => config::run_init(
                    config::InitOptions {
                        path: self.config.clone(),
                        store_url: self.store_url.clone(),
                        api_key: self.api_key.clone(),
                        force: *force,
                    },
                    options,
                ),
                ConfigCommands::Show => config::run_show(&self.effective_config()?, options),
            };
        }

        let session = self.session()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(dispatch(self.command, &session))
    }
}

async fn dispatch(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Home => home::run(session).await,
        Commands::Categories => home::run_categories(session).await,
        Commands::Tasks(cmd) => match cmd {
            TaskCommands::List { status, search } => {
                task::run_list(
                    task::ListOptions {
                        status,
                        search: search.unwrap_or_default(),
                    },
                    session,
                )
                .await
            }
            TaskCommands::Add {
                title,
                description,
                due,
                category,
                priority,
            } => {
                task::run_add(
                    task::AddOptions {
                        title,
                        description,
                        due,
                        category,
                        priority,
                    },
                    session,
                )
                .await
            }
            TaskCommands::Edit {
                id,
                title,
                description,
                clear_description,
                due,
                clear_due,
                category,
                priority,
            } => {
                task::run_edit(
                    task::EditOptions {
                        id,
                        title,
                        description,
                        clear_description,
                        due,
                        clear_due,
                        category,
                        priority,
                    },
                    session,
                )
                .await
            }
            TaskCommands::Toggle { id } => task::run_toggle(&id, session).await,
            TaskCommands::Rm { ids } => task::run_rm(ids, session).await,
            TaskCommands::Upcoming { limit } => task::run_upcoming(limit, session).await,
        },
        Commands::Calendar(cmd) => match cmd {
            CalendarCommands::Show { month } => calendar::run_show(month.as_deref(), session).await,
            CalendarCommands::Day { date } => calendar::run_day(&date, session).await,
        },
        // handled before a session is built
        Commands::Config(_) | Commands::About => Ok(()),
    }
}
