// Data models for the task list

use crate::record::{IndexValue, Record};
use chrono::{DateTime, NaiveDate};
use eyre::{Result, eyre};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Storage key the full task set lives under
pub const TASKS_KEY: &str = "tasks";

/// Colour given to tasks when none is chosen
pub const DEFAULT_COLOR: &str = "#ffffff";

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| eyre!("Unknown priority: {} (expected low, medium or high)", s))
    }
}

impl Task {
    /// Due date as a calendar date, if it parses
    ///
    /// Accepts `YYYY-MM-DD` (what a date input produces) and RFC 3339 timestamps.
    pub fn due(&self) -> Option<NaiveDate> {
        parse_due_date(&self.due_date)
    }
}

pub(crate) fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        TASKS_KEY
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("priority".to_string(), IndexValue::from(self.priority.as_str()));
        fields.insert("isCompleted".to_string(), IndexValue::Bool(self.is_completed));
        fields.insert("color".to_string(), IndexValue::String(self.color.clone()));
        fields.insert("description".to_string(), IndexValue::String(self.description.clone()));
        // Undated tasks have no dueDate to compare against
        if let Some(due) = self.due() {
            fields.insert("dueDate".to_string(), IndexValue::String(due.format("%Y-%m-%d").to_string()));
        }
        fields
    }
}

/// Editable copy of a task's fields while an edit is in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub color: String,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date.clone(),
            color: task.color.clone(),
        }
    }
}

/// Source of fresh task ids
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Time-ordered UUIDv7 ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::now_v7().to_string()
    }
}

/// `task-1`, `task-2`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    issued: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("task-{}", self.issued)
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

// Older data stored ids as random floats
fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid task id: {}", other))),
    }
}
