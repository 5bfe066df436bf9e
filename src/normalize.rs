use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{Category, Priority, Task};

pub fn tasks_from_snapshot(snapshot: Option<Value>) -> Vec<Task> {
    let entries: Vec<(String, Value)> = match snapshot {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        Some(other) => {
            log::warn!("task snapshot is not a collection, ignoring value={other}");
            return Vec::new();
        }
    };

    let mut entries: Vec<(String, Map<String, Value>)> = entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(fields) => Some((key, fields)),
            Value::Null => None,
            other => {
                log::warn!("skipping malformed task record key={key} value={other}");
                None
            }
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));

    entries
        .into_iter()
        .map(|(key, fields)| task_from_fields(key, &fields))
        .collect()
}

/// Integer-like keys first in numeric order, then the rest lexicographically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn integer_key(key: &str) -> Option<u64> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

fn task_from_fields(key: String, fields: &Map<String, Value>) -> Task {
    Task {
        name: text_field(fields, "name"),
        details: text_field(fields, "details"),
        category: category_field(&key, fields),
        priority: priority_field(&key, fields),
        due_date: due_date_field(&key, fields),
        is_completed: fields
            .get("isCompleted")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        key,
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn category_field(key: &str, fields: &Map<String, Value>) -> Category {
    match fields.get("category") {
        None | Some(Value::Null) => Category::default(),
        Some(Value::String(raw)) if raw.is_empty() => Category::default(),
        Some(Value::String(raw)) => raw.parse().unwrap_or_else(|_| {
            log::warn!("unknown task category key={key} category={raw}");
            Category::default()
        }),
        Some(other) => {
            log::warn!("non-text task category key={key} category={other}");
            Category::default()
        }
    }
}

fn priority_field(key: &str, fields: &Map<String, Value>) -> u8 {
    let Some(raw) = fields.get("priority") else {
        return Priority::default().index();
    };
    let index = raw
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .or_else(|| {
            // Whole floats such as `2.0` are still valid indices.
            raw.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u8::MAX))
                .map(|f| f as u8)
        });
    match index.and_then(Priority::from_index) {
        Some(priority) => priority.index(),
        None => {
            if !raw.is_null() {
                log::warn!("invalid task priority key={key} priority={raw}");
            }
            Priority::default().index()
        }
    }
}

fn due_date_field(key: &str, fields: &Map<String, Value>) -> Option<DateTime<Utc>> {
    match fields.get("dueDate") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(err) => {
                log::warn!("unparseable due date key={key} due_date={raw} error={err}");
                None
            }
        },
        Some(other) => {
            log::warn!("non-text due date key={key} due_date={other}");
            None
        }
    }
}
