//! Derived views over a task list. Everything here is pure.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Category, Priority, Task};

pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    fn accepts(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" | "done" => Ok(StatusFilter::Completed),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status filter '{s}' (expected all|pending|completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub search: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.accepts(task) && task.matches_search(self.search.trim())
    }
}

/// Order-preserving filter by status and search text.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
}

/// Open tasks due today or later, soonest first, at most `limit` entries.
pub fn upcoming(tasks: &[Task], today: NaiveDate, limit: usize) -> Vec<Task> {
    let mut due: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.map(|d| d >= today).unwrap_or(false))
        .collect();
    due.sort_by_key(|t| t.due_date);
    due.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn collect(tasks: &[Task], today: NaiveDate) -> Self {
        tasks
            .iter()
            .filter(|t| !t.deleted)
            .fold(Self::default(), |mut stats, task| {
                stats.total += 1;
                if task.completed {
                    stats.completed += 1;
                } else {
                    stats.pending += 1;
                }
                if task.is_overdue(today) {
                    stats.overdue += 1;
                }
                stats
            })
    }

    /// Share of completed tasks, 0-100.
    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

pub fn category_color(category: &Category) -> &'static str {
    match category.as_str() {
        "trabajo" => "blue",
        "universidad" => "purple",
        "personal" => "green",
        _ => "gray",
    }
}

pub fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Alta => "red",
        Priority::Media => "yellow",
        Priority::Baja => "green",
    }
}

/// Relative label for a due date: "Today", "Tomorrow", "In N days" within a
/// week, otherwise day and abbreviated month.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        2..=7 => format!("In {days} days"),
        _ => due.format("%-d %b").to_string(),
    }
}
