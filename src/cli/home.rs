//! Dashboard and category listing.

use serde::Serialize;
use tracing::warn;

use crate::api::categories::get_categories;
use crate::category::{choices, CategoryEntry};
use crate::cli::Session;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{Category, Task};
use crate::view::{upcoming, TaskStats};

#[derive(Serialize)]
struct HomeOutput {
    today: chrono::NaiveDate,
    stats: TaskStats,
    completion_percent: u8,
    upcoming: Vec<Task>,
}

#[derive(Serialize)]
struct CategoriesOutput {
    /// Rows defined in the store
    entries: Vec<CategoryEntry>,
    /// Names offered when creating a task
    choices: Vec<Category>,
}

pub async fn run(session: &Session) -> Result<()> {
    session.load().await?;
    let tasks = session.sync.tasks();
    let stats = TaskStats::collect(&tasks, session.today);
    let next = upcoming(&tasks, session.today, session.config.tasks.upcoming_limit);

    let mut human = HumanOutput::new("Dashboard");
    human.push_summary("Total", stats.total);
    human.push_summary("Completed", stats.completed);
    human.push_summary("Pending", stats.pending);
    human.push_summary("Overdue", stats.overdue);
    human.push_summary("Progress", format!("{}%", stats.completion_percent()));
    if !next.is_empty() {
        human.push_detail("Upcoming:");
    }
    for task in &next {
        human.push_task(task, session.today);
    }
    if stats.overdue > 0 {
        human.push_warning(format!("{} overdue task(s)", stats.overdue));
    }

    let output = HomeOutput {
        today: session.today,
        completion_percent: stats.completion_percent(),
        stats,
        upcoming: next,
    };
    emit_success(session.output, "home", &output, Some(&human))
}

pub async fn run_categories(session: &Session) -> Result<()> {
    let store = session.sync.store();
    let mut human = HumanOutput::new("Categories");
    let entries = match get_categories(store.as_ref()).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "failed to load categories");
            human.push_warning(format!("store categories unavailable: {err}"));
            Vec::new()
        }
    };
    let choices = choices(&entries, &session.config.tasks.categories);

    if entries.is_empty() {
        human.push_summary("Source", "configured defaults");
    } else {
        human.push_summary("Source", "store");
    }
    for category in &choices {
        human.push_detail(category.to_string());
    }

    emit_success(
        session.output,
        "categories",
        &CategoriesOutput { entries, choices },
        Some(&human),
    )
}
