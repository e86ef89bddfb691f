// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reducer-style todo store for the operator's checklist.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Created,
    Title,
    Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoState {
    pub items: Vec<Todo>,
    pub next_id: u64,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: SortBy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodoAction {
    Add { title: String, priority: Priority },
    Toggle(u64),
    Remove(u64),
    Edit(u64, String),
    ClearCompleted,
    SetFilter(Filter),
    SetSort(SortBy),
}

pub fn reduce(mut state: TodoState, action: TodoAction) -> TodoState {
    match action {
        TodoAction::Add { title, priority } => {
            let title = title.trim();
            if !title.is_empty() {
                state.next_id = state.next_id.max(1);
                state.items.push(Todo {
                    id: state.next_id,
                    title: title.to_string(),
                    completed: false,
                    priority,
                });
                state.next_id += 1;
            }
        }
        TodoAction::Toggle(id) => {
            if let Some(t) = state.items.iter_mut().find(|t| t.id == id) {
                t.completed = !t.completed;
            }
        }
        TodoAction::Remove(id) => state.items.retain(|t| t.id != id),
        TodoAction::Edit(id, title) => {
            let title = title.trim();
            if !title.is_empty() {
                if let Some(t) = state.items.iter_mut().find(|t| t.id == id) {
                    t.title = title.to_string();
                }
            }
        }
        TodoAction::ClearCompleted => state.items.retain(|t| !t.completed),
        TodoAction::SetFilter(f) => state.filter = f,
        TodoAction::SetSort(s) => state.sort = s,
    }
    state
}

impl TodoState {
    /// Items passing the current filter, in the current sort order.
    pub fn visible(&self) -> Vec<&Todo> {
        let mut out: Vec<&Todo> = self
            .items
            .iter()
            .filter(|t| match self.filter {
                Filter::All => true,
                Filter::Active => !t.completed,
                Filter::Completed => t.completed,
            })
            .collect();
        match self.sort {
            SortBy::Created => out.sort_by_key(|t| t.id),
            SortBy::Title => out.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            SortBy::Priority => out.sort_by_key(|t| (Reverse(t.priority), t.id)),
        }
        out
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|t| !t.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(state: TodoState, title: &str, priority: Priority) -> TodoState {
        reduce(
            state,
            TodoAction::Add {
                title: title.into(),
                priority,
            },
        )
    }

    fn seeded() -> TodoState {
        let s = add(TodoState::default(), "order diesel", Priority::High);
        let s = add(s, "Calibrate pump 3", Priority::Normal);
        add(s, "audit cash drawer", Priority::Low)
    }

    #[test]
    fn ids_are_monotonic_and_blank_titles_ignored() {
        let s = seeded();
        assert_eq!(s.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let s = add(s, "   ", Priority::High);
        assert_eq!(s.items.len(), 3);

        let s = reduce(s, TodoAction::Remove(3));
        let s = add(s, "restock oil", Priority::Normal);
        assert_eq!(s.items.last().unwrap().id, 4);
    }

    #[test]
    fn toggle_and_filter() {
        let s = reduce(seeded(), TodoAction::Toggle(2));
        assert!(s.items[1].completed);
        assert_eq!(s.remaining(), 2);

        let s = reduce(s, TodoAction::SetFilter(Filter::Completed));
        let ids: Vec<u64> = s.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);

        let s = reduce(s, TodoAction::SetFilter(Filter::Active));
        let ids: Vec<u64> = s.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let s = reduce(s, TodoAction::Toggle(2));
        assert_eq!(s.remaining(), 3);
    }

    #[test]
    fn sorting_by_title_and_priority() {
        let s = reduce(seeded(), TodoAction::SetSort(SortBy::Title));
        let titles: Vec<&str> = s.visible().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["audit cash drawer", "Calibrate pump 3", "order diesel"]);

        let s = reduce(s, TodoAction::SetSort(SortBy::Priority));
        let ids: Vec<u64> = s.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn edit_and_clear_completed() {
        let s = reduce(seeded(), TodoAction::Edit(1, "  order diesel 20k L ".into()));
        assert_eq!(s.items[0].title, "order diesel 20k L");
        let s = reduce(s, TodoAction::Edit(1, "".into()));
        assert_eq!(s.items[0].title, "order diesel 20k L");

        let s = reduce(s, TodoAction::Toggle(1));
        let s = reduce(s, TodoAction::ClearCompleted);
        assert_eq!(s.items.len(), 2);
        assert!(s.items.iter().all(|t| t.id != 1));
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let before = seeded();
        let after = reduce(before.clone(), TodoAction::Toggle(42));
        assert_eq!(before, after);
    }
}
