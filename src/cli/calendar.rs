//! taskboard calendar command implementations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{tasks_on, DayCell, Month, MonthGrid, MonthStats, CELL_PREVIEW};
use crate::cli::Session;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{parse_due_date, Task};

const WEEKDAY_HEADER: &str = "Sun Mon Tue Wed Thu Fri Sat";

#[derive(Serialize)]
struct MonthOutput {
    month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<String>,
    leading_blanks: u32,
    stats: MonthStats,
    days: Vec<DayOutput>,
}

#[derive(Serialize)]
struct DayOutput {
    date: NaiveDate,
    is_today: bool,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct SelectedDayOutput {
    date: NaiveDate,
    tasks: Vec<Task>,
}

pub async fn run_show(month: Option<&str>, session: &Session) -> Result<()> {
    let month = match month {
        Some(raw) => raw.parse::<Month>()?,
        None => Month::containing(session.today),
    };
    session.load().await?;

    let tasks = session.sync.tasks();
    let grid = MonthGrid::build(month, &tasks, session.today);

    let mut human = HumanOutput::new(format!("Calendar {month}"));
    human.push_summary("Completed", grid.stats.completed);
    human.push_summary("Pending", grid.stats.pending);
    human.push_summary("Overdue", grid.stats.overdue);
    for line in render_grid(&grid) {
        human.push_detail(line);
    }
    for cell in grid.days.iter().filter(|c| !c.task_ids.is_empty()) {
        for line in cell_preview(cell, &tasks) {
            human.push_detail(line);
        }
    }
    if !grid.has_dated_tasks() {
        human.push_detail("No tasks due this month");
    }

    let output = MonthOutput {
        month: month.to_string(),
        previous: month.previous().map(|m| m.to_string()),
        next: month.next().map(|m| m.to_string()),
        leading_blanks: grid.leading_blanks,
        stats: grid.stats,
        days: grid
            .days
            .iter()
            .filter(|c| !c.task_ids.is_empty() || c.is_today)
            .map(|cell| DayOutput {
                date: cell.date,
                is_today: cell.is_today,
                tasks: tasks_on(&tasks, cell.date),
            })
            .collect(),
    };
    emit_success(session.output, "calendar show", &output, Some(&human))
}

pub async fn run_day(date: &str, session: &Session) -> Result<()> {
    let date = parse_due_date(date)?;
    session.load().await?;

    let tasks = tasks_on(&session.sync.tasks(), date);
    let mut human = HumanOutput::new(format!("Tasks due {}", date.format("%A %-d %B %Y")));
    human.set_empty_message("No tasks for this day");
    for task in &tasks {
        human.push_task(task, session.today);
    }
    emit_success(
        session.output,
        "calendar day",
        &SelectedDayOutput { date, tasks },
        Some(&human),
    )
}

/// Week rows with day numbers. `#` marks today and `*` a day with tasks.
fn render_grid(grid: &MonthGrid) -> Vec<String> {
    let mut lines = vec![WEEKDAY_HEADER.to_string()];
    for week in grid.weeks() {
        let row: Vec<String> = week
            .iter()
            .map(|slot| match slot {
                None => "   ".to_string(),
                Some(cell) => {
                    let mark = if cell.is_today {
                        '#'
                    } else if cell.task_ids.is_empty() {
                        ' '
                    } else {
                        '*'
                    };
                    format!("{:>2}{mark}", cell.day)
                }
            })
            .collect();
        lines.push(row.join(" ").trim_end().to_string());
    }
    lines
}

/// Up to `CELL_PREVIEW` titles for a day, then a "+N more" line.
fn cell_preview(cell: &DayCell, tasks: &[Task]) -> Vec<String> {
    let titles: Vec<&str> = cell
        .task_ids
        .iter()
        .filter_map(|id| tasks.iter().find(|t| &t.id == id))
        .map(|t| t.title.as_str())
        .collect();

    let mut lines = vec![format!("{:>2}: {}", cell.day, titles.first().copied().unwrap_or(""))];
    lines.extend(
        titles
            .iter()
            .take(CELL_PREVIEW)
            .skip(1)
            .map(|title| format!("    {title}")),
    );
    if titles.len() > CELL_PREVIEW {
        lines.push(format!("    +{} more", titles.len() - CELL_PREVIEW));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Category, Priority, TaskId};

    fn task(id: i64, due: NaiveDate) -> Task {
        Task {
            id: TaskId::from(id),
            title: format!("task {id}"),
            description: None,
            due_date: Some(due),
            completed: false,
            category: Category::default(),
            priority: Priority::default(),
            deleted: false,
        }
    }

    #[test]
    fn preview_collapses_extra_titles() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).expect("date");
        let tasks: Vec<Task> = (1..=5).map(|id| task(id, day)).collect();
        let grid = MonthGrid::build(Month::containing(day), &tasks, day);
        let lines = cell_preview(grid.cell(10).expect("cell"), &tasks);
        assert_eq!(
            lines,
            vec!["10: task 1", "    task 2", "    task 3", "    +2 more"]
        );
    }

    #[test]
    fn grid_rows_share_a_width() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        let grid = MonthGrid::build(Month::containing(today), &[task(1, today)], today);
        let lines = render_grid(&grid);
        assert_eq!(lines[0], WEEKDAY_HEADER);
        // January 2025 starts on a Wednesday.
        assert!(lines[1].starts_with(&format!("{} 1 ", " ".repeat(12))));
        assert!(lines.iter().any(|l| l.contains("15#")));
        assert!(lines[1..].iter().all(|l| l.len() <= WEEKDAY_HEADER.len()));
    }
}
