//! Month calendar layout and per-day task lookup.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Task, TaskId};

/// Titles shown per cell before collapsing into "+N more".
pub const CELL_PREVIEW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidArgument(format!(
                "invalid month {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// `None` past the last month chrono can represent.
    pub fn next(&self) -> Option<Self> {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map(Self::containing)
    }

    /// `None` before the first month chrono can represent.
    pub fn previous(&self) -> Option<Self> {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map(Self::containing)
    }

    pub fn days_in_month(&self) -> u32 {
        (28..=31)
            .rev()
            .find(|day| self.day(*day).is_some())
            .unwrap_or(28)
    }

    /// Empty cells before day 1 in a Sunday-first week.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("invalid month '{s}' (expected YYYY-MM)"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }
}

/// Tasks due on `date`, in list order. Soft-deleted tasks are skipped.
pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    tasks.iter().filter(|t| t.is_due_on(date)).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_today: bool,
    pub task_ids: Vec<TaskId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthStats {
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl MonthStats {
    pub fn collect(tasks: &[Task], month: Month, today: NaiveDate) -> Self {
        let mut stats = Self::default();
        for task in tasks.iter().filter(|t| !t.deleted) {
            let Some(due) = task.due_date else {
                continue;
            };
            if !month.contains(due) {
                continue;
            }
            if task.completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
                if due < today {
                    stats.overdue += 1;
                }
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub month: Month,
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
    pub stats: MonthStats,
}

impl MonthGrid {
    pub fn build(month: Month, tasks: &[Task], today: NaiveDate) -> Self {
        let days = (1..=month.days_in_month())
            .filter_map(|day| month.day(day))
            .map(|date| DayCell {
                date,
                day: date.day(),
                is_today: date == today,
                task_ids: tasks
                    .iter()
                    .filter(|t| t.is_due_on(date))
                    .map(|t| t.id.clone())
                    .collect(),
            })
            .collect();

        Self {
            month,
            leading_blanks: month.leading_blanks(),
            days,
            stats: MonthStats::collect(tasks, month, today),
        }
    }

    pub fn cell(&self, day: u32) -> Option<&DayCell> {
        self.days.iter().find(|cell| cell.day == day)
    }

    /// Rows of seven slots, `None` for padding before day 1 and after the
    /// last day.
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell>>> {
        let mut slots: Vec<Option<&DayCell>> = (0..self.leading_blanks).map(|_| None).collect();
        slots.extend(self.days.iter().map(Some));
        while slots.len() % 7 != 0 {
            slots.push(None);
        }
        slots.chunks(7).map(|week| week.to_vec()).collect()
    }

    pub fn has_dated_tasks(&self) -> bool {
        self.days.iter().any(|cell| !cell.task_ids.is_empty())
    }
}
