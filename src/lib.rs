//! taskboard - tasks, due dates and a month calendar over a hosted table store
//!
//! This library provides the core functionality for the taskboard CLI:
//! a local task list kept in step with a remote PostgREST-style store.
//!
//! # Core Concepts
//!
//! - **Tasks**: title, optional description and due date, completion flag,
//!   category and priority
//! - **Sync**: every mutation goes to the store first; local state follows
//!   the store's answer
//! - **Views**: filters, dashboard counts and upcoming lists derived from
//!   the local list
//! - **Calendar**: month grid with tasks placed on their due date
//!
//! # Module Organization
//!
//! - `api`: Data-access functions, one store request each
//! - `calendar`: Month arithmetic and grid layout
//! - `category`: Store-defined category lookup
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskboard.toml`
//! - `error`: Error types and result aliases
//! - `notify`: Success/failure notices for user-initiated operations
//! - `output`: Human and JSON output
//! - `store`: Remote store trait, row mapping and HTTP client
//! - `sync`: Task-state synchronization
//! - `task`: Canonical task types
//! - `view`: Pure derived views

pub mod api;
pub mod calendar;
pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod output;
pub mod store;
pub mod sync;
pub mod task;
pub mod view;

pub use error::{Error, Result};
