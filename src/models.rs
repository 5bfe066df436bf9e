use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;
pub type TaskKey = String;
pub type UserId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Personal => "Personal",
            Category::Work => "Work",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn index(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Priority::ALL.get(usize::from(index)).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Priority::Low => "#8BC34A",
            Priority::Medium => "#FFC107",
            Priority::High => "#F44336",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if let Ok(index) = wanted.parse::<u8>() {
            return Priority::from_index(index).ok_or_else(|| UnknownVariant(s.to_string()));
        }
        Priority::ALL
            .into_iter()
            .find(|priority| priority.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    None,
    PriorityAsc,
    PriorityDesc,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::None => "Sort Tasks",
            SortMode::PriorityAsc => "Priority: Low to High",
            SortMode::PriorityDesc => "Priority: High to Low",
        }
    }
}

impl FromStr for SortMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(SortMode::None),
            "priority_asc" | "asc" => Ok(SortMode::PriorityAsc),
            "priority_desc" | "desc" => Ok(SortMode::PriorityDesc),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub key: TaskKey,
    pub name: String,
    pub details: String,
    pub category: Category,
    pub priority: u8,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl Task {
    pub fn priority_level(&self) -> Priority {
        Priority::from_index(self.priority).unwrap_or_default()
    }

    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            name: self.name.clone(),
            details: self.details.clone(),
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
            is_completed: self.is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub name: String,
    pub details: String,
    pub category: Category,
    pub priority: u8,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl TaskRecord {
    pub fn into_task(self, key: TaskKey) -> Task {
        Task {
            key,
            name: self.name,
            details: self.details,
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
            is_completed: self.is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct TaskDraft {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            details: task.details.clone(),
            category: Some(task.category),
            priority: Some(task.priority_level()),
            due_date: task.due_date,
        }
    }

    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn into_record(self, is_completed: bool) -> TaskRecord {
        TaskRecord {
            name: self.name.trim().to_string(),
            details: self.details,
            category: self.category.unwrap_or_default(),
            priority: self.priority.unwrap_or_default().index(),
            due_date: self.due_date,
            is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub id_token: String,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}
