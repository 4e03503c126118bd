//! Server-sourced category lookup.

use serde::Serialize;

use crate::task::{Category, BUILTIN_CATEGORIES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    pub id: String,
    pub name: String,
}

/// Category names offered when creating or editing a task.
///
/// Store-defined names win; the configured fallback list is used only when
/// the store has none.
pub fn choices(entries: &[CategoryEntry], fallback: &[String]) -> Vec<Category> {
    let names: Vec<&str> = if entries.is_empty() {
        if fallback.is_empty() {
            BUILTIN_CATEGORIES.to_vec()
        } else {
            fallback.iter().map(String::as_str).collect()
        }
    } else {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    };

    let mut out: Vec<Category> = Vec::with_capacity(names.len());
    for name in names {
        let category = Category::new(name);
        if !out.contains(&category) {
            out.push(category);
        }
    }
    out
}
