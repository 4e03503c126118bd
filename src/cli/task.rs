//! taskboard tasks command implementations.

use serde::Serialize;

use crate::cli::Session;
use crate::error::{Error, Result};
use crate::output::{emit_success, task_line, HumanOutput};
use crate::sync::{BulkDeleteReport, DeleteOutcome};
use crate::task::{parse_due_date, Category, Priority, Task, TaskId, TaskInput, TaskPatch};
use crate::view::{filter_tasks, upcoming, StatusFilter, TaskFilter};

pub struct ListOptions {
    pub status: String,
    pub search: String,
}

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub due: Option<String>,
    pub clear_due: bool,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    shown: usize,
    status: StatusFilter,
    #[serde(skip_serializing_if = "String::is_empty")]
    search: String,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskOutput {
    task: Task,
}

#[derive(Serialize)]
struct ToggleOutput {
    id: TaskId,
    completed: bool,
}

#[derive(Serialize)]
struct RemoveOutput {
    deleted: Vec<TaskId>,
}

#[derive(Serialize)]
struct UpcomingOutput {
    limit: usize,
    tasks: Vec<Task>,
}

pub async fn run_list(options: ListOptions, session: &Session) -> Result<()> {
    let filter = TaskFilter {
        status: options.status.parse()?,
        search: options.search,
    };
    session.load().await?;

    let all = session.sync.tasks();
    let tasks = filter_tasks(&all, &filter);

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Shown", format!("{} of {}", tasks.len(), all.len()));
    if filter.status != StatusFilter::All {
        human.push_summary("Status", format!("{:?}", filter.status).to_lowercase());
    }
    if !filter.search.trim().is_empty() {
        human.push_summary("Search", filter.search.trim());
    }
    human.set_empty_message("No tasks to show");
    for task in &tasks {
        human.push_task(task, session.today);
    }

    let output = TaskListOutput {
        total: all.len(),
        shown: tasks.len(),
        status: filter.status,
        search: filter.search.trim().to_string(),
        tasks,
    };
    emit_success(session.output, "tasks list", &output, Some(&human))
}

pub async fn run_add(options: AddOptions, session: &Session) -> Result<()> {
    let mut input = TaskInput::new(options.title.trim())
        .with_category(match options.category.as_deref() {
            Some(name) => Category::new(non_blank("category", name)?),
            None => session.config.tasks.category(),
        })
        .with_priority(match options.priority.as_deref() {
            Some(raw) => raw.parse::<Priority>()?,
            None => session.config.tasks.priority(),
        });
    if let Some(description) = options.description.as_deref() {
        input = input.with_description(non_blank("description", description)?);
    }
    if let Some(due) = options.due.as_deref() {
        input = input.with_due_date(parse_due_date(due)?);
    }
    input.validate()?;

    session.load().await?;
    let task = session.sync.create(input).await?;

    let mut human = HumanOutput::new("Task created");
    human.push_summary("Id", &task.id);
    human.push_task(&task, session.today);
    emit_success(session.output, "tasks add", &TaskOutput { task }, Some(&human))
}

pub async fn run_edit(options: EditOptions, session: &Session) -> Result<()> {
    let id = TaskId::new(options.id.trim());
    let patch = build_patch(&options)?;
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field".to_string(),
        ));
    }
    patch.validate()?;

    session.load().await?;
    let task = session.sync.update(&id, patch).await?;

    let mut human = HumanOutput::new("Task updated");
    human.push_task(&task, session.today);
    emit_success(session.output, "tasks edit", &TaskOutput { task }, Some(&human))
}

fn build_patch(options: &EditOptions) -> Result<TaskPatch> {
    let description = if options.clear_description {
        Some(None)
    } else {
        options
            .description
            .as_deref()
            .map(|d| {
                non_blank("description", d).map_err(|_| {
                    Error::InvalidArgument(
                        "--description cannot be blank; use --clear-description to remove it"
                            .to_string(),
                    )
                })
            })
            .transpose()?
            .map(|d| Some(d.to_string()))
    };
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(parse_due_date)
            .transpose()?
            .map(Some)
    };

    Ok(TaskPatch {
        title: options.title.as_ref().map(|t| t.trim().to_string()),
        description,
        due_date,
        completed: None,
        category: options
            .category
            .as_deref()
            .map(|name| non_blank("category", name).map(Category::new))
            .transpose()?,
        priority: options
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
    })
}

fn non_blank<'a>(flag: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("--{flag} cannot be blank")));
    }
    Ok(value)
}

pub async fn run_toggle(id: &str, session: &Session) -> Result<()> {
    let id = TaskId::new(id.trim());
    session.load().await?;
    let current = session
        .sync
        .get(&id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

    let completed = session.sync.toggle_completion(&id, current.completed).await?;

    let mut human = HumanOutput::new("Status updated");
    human.push_summary("Id", &id);
    human.push_summary("Status", if completed { "completed" } else { "pending" });
    emit_success(
        session.output,
        "tasks toggle",
        &ToggleOutput { id, completed },
        Some(&human),
    )
}

pub async fn run_rm(ids: Vec<String>, session: &Session) -> Result<()> {
    let ids: Vec<TaskId> = ids.iter().map(|id| TaskId::new(id.trim())).collect();
    session.load().await?;

    let report = match ids.as_slice() {
        [single] => {
            session.sync.remove(single).await?;
            BulkDeleteReport {
                outcomes: vec![DeleteOutcome {
                    id: single.clone(),
                    error: None,
                }],
            }
        }
        _ => session.sync.remove_many(&ids).await?.into_result()?,
    };

    let deleted: Vec<TaskId> = report.deleted().into_iter().cloned().collect();
    let mut human = HumanOutput::new(if deleted.len() == 1 {
        "Task deleted"
    } else {
        "Tasks deleted"
    });
    for id in &deleted {
        human.push_detail(id.to_string());
    }
    emit_success(
        session.output,
        "tasks rm",
        &RemoveOutput { deleted },
        Some(&human),
    )
}

pub async fn run_upcoming(limit: Option<usize>, session: &Session) -> Result<()> {
    let limit = limit.unwrap_or(session.config.tasks.upcoming_limit);
    if limit == 0 {
        return Err(Error::InvalidArgument("limit must be at least 1".to_string()));
    }
    session.load().await?;

    let tasks = upcoming(&session.sync.tasks(), session.today, limit);
    let mut human = HumanOutput::new("Upcoming");
    human.set_empty_message("Nothing due");
    for task in &tasks {
        human.push_detail(task_line(task, session.today));
    }
    emit_success(
        session.output,
        "tasks upcoming",
        &UpcomingOutput { limit, tasks },
        Some(&human),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn edit(id: &str) -> EditOptions {
        EditOptions {
            id: id.to_string(),
            title: None,
            description: None,
            clear_description: false,
            due: None,
            clear_due: false,
            category: None,
            priority: None,
        }
    }

    #[test]
    fn patch_without_fields_is_empty() {
        assert!(build_patch(&edit("1")).expect("patch").is_empty());
    }

    #[test]
    fn clear_flags_null_out_fields() {
        let mut options = edit("1");
        options.clear_description = true;
        options.clear_due = true;
        let patch = build_patch(&options).expect("patch");
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.title, None);
    }

    #[test]
    fn patch_parses_due_and_priority() {
        let mut options = edit("1");
        options.due = Some("2025-03-01".to_string());
        options.priority = Some("ALTA".to_string());
        options.description = Some("Pan integral".to_string());
        let patch = build_patch(&options).expect("patch");
        assert_eq!(patch.due_date, Some(NaiveDate::from_ymd_opt(2025, 3, 1)));
        assert_eq!(patch.priority, Some(Priority::Alta));
        assert_eq!(patch.description, Some(Some("Pan integral".to_string())));
    }

    #[test]
    fn blank_description_is_rejected_not_cleared() {
        let mut options = edit("1");
        options.description = Some("  ".to_string());
        match build_patch(&options) {
            Err(Error::InvalidArgument(message)) => {
                assert!(message.contains("--clear-description"), "{message}");
            }
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn blank_category_is_rejected() {
        let mut options = edit("1");
        options.category = Some(String::new());
        assert!(matches!(build_patch(&options), Err(Error::InvalidArgument(_))));

        options.category = Some("Trabajo".to_string());
        let patch = build_patch(&options).expect("patch");
        assert_eq!(patch.category, Some(Category::new("Trabajo")));
    }

    #[test]
    fn patch_rejects_bad_date() {
        let mut options = edit("1");
        options.due = Some("03/01/2025".to_string());
        assert!(matches!(build_patch(&options), Err(Error::InvalidArgument(_))));
    }
}
