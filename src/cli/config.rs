//! taskboard config command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct InitOptions {
    pub path: Option<PathBuf>,
    pub store_url: Option<String>,
    pub api_key: Option<String>,
    pub force: bool,
}

#[derive(Serialize)]
struct InitOutput {
    path: String,
    overwritten: bool,
}

pub fn run_init(options: InitOptions, output: OutputOptions) -> Result<()> {
    let path = Config::locate(options.path.as_deref()).ok_or_else(|| {
        Error::InvalidConfig("no config directory on this platform; pass --config".to_string())
    })?;
    let existed = path.exists();
    if existed && !options.force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let config = Config::default().with_store_overrides(options.store_url, options.api_key);
    config.validate()?;
    config.save(&path)?;

    let mut human = HumanOutput::new("Config written");
    human.push_summary("Path", path.display());
    if config.store.url.is_none() || config.store.api_key.is_none() {
        human.push_warning("store.url and store.api_key must be set before tasks can load");
    }
    emit_success(
        output,
        "config init",
        &InitOutput {
            path: path.display().to_string(),
            overwritten: existed,
        },
        Some(&human),
    )
}

pub fn run_show(config: &Config, output: OutputOptions) -> Result<()> {
    let shown = Config {
        store: config.store.redacted(),
        tasks: config.tasks.clone(),
    };

    let mut human = HumanOutput::new("Configuration");
    human.push_summary("Store URL", shown.store.url.as_deref().unwrap_or("(not set)"));
    human.push_summary("API key", shown.store.api_key.as_deref().unwrap_or("(not set)"));
    human.push_summary("Tasks table", &shown.store.tasks_table);
    human.push_summary("Categories table", &shown.store.categories_table);
    human.push_summary("Default category", &shown.tasks.default_category);
    human.push_summary("Default priority", &shown.tasks.default_priority);
    human.push_summary("Upcoming limit", shown.tasks.upcoming_limit);
    human.push_summary("Categories", shown.tasks.categories.join(", "));

    emit_success(output, "config show", &shown, Some(&human))
}
