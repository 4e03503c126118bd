//! Shared output formatting for taskboard CLI commands.
//!
//! `--json` wraps every result in a versioned envelope; human output is a
//! header followed by optional summary, detail and warning sections.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::task::Task;
use crate::view::{category_color, due_label, priority_color};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    empty_message: Option<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            empty_message: None,
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl ToString) {
        self.summary.push((key.into(), value.to_string()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_task(&mut self, task: &Task, today: NaiveDate) {
        self.details.push(task_line(task, today));
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    /// Shown in place of the details section when it is empty.
    pub fn set_empty_message(&mut self, value: impl Into<String>) {
        self.empty_message = Some(value.into());
    }
}

/// One-line rendering of a task: `[x] 12  Title  (trabajo/blue, alta/red, Tomorrow)`.
pub fn task_line(task: &Task, today: NaiveDate) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let mut tags = vec![
        format!("{}/{}", task.category, category_color(&task.category)),
        format!("{}/{}", task.priority, priority_color(task.priority)),
    ];
    if let Some(due) = task.due_date {
        tags.push(if task.is_overdue(today) {
            format!("overdue {due}")
        } else {
            due_label(due, today)
        });
    }
    format!("{mark} {}  {}  ({})", task.id, task.title, tags.join(", "))
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &crate::error::Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    if !output.summary.is_empty() {
        lines.push(String::new());
        for (key, value) in &output.summary {
            lines.push(format!("  {key}: {value}"));
        }
    }

    if output.details.is_empty() {
        if let Some(message) = &output.empty_message {
            lines.push(String::new());
            lines.push(format!("  {message}"));
        }
    } else {
        lines.push(String::new());
        lines.extend(output.details.iter().map(|detail| format!("  {detail}")));
    }

    if !output.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        lines.extend(output.warnings.iter().map(|warning| format!("- {warning}")));
    }

    lines.join("\n")
}

/// Best-effort command name (`tasks add`, `calendar`, ...) for error
/// envelopes emitted before clap has parsed anything.
pub fn infer_command_name_from_args() -> String {
    let words: Vec<String> = std::env::args()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .take(2)
        .collect();

    match words.as_slice() {
        [] => "taskboard".to_string(),
        [group, sub, ..] if matches!(group.as_str(), "tasks" | "calendar" | "config") => {
            format!("{group} {sub}")
        }
        [command, ..] => command.clone(),
    }
}

fn error_kind(err: &crate::error::Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &crate::error::Error) -> Vec<String> {
    use crate::error::Error;

    match err {
        Error::InvalidConfig(message) if message.contains("not set") => {
            vec!["taskboard config init --store-url <url> --api-key <key>".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix taskboard.toml then retry".to_string()],
        Error::TaskNotFound(_) => vec!["taskboard tasks list".to_string()],
        Error::PartialDelete { failed, .. } => {
            vec![format!("taskboard tasks rm {}", failed.join(" "))]
        }
        Error::Remote(_) => vec!["retry; nothing was changed locally".to_string()],
        _ => Vec::new(),
    }
}
