use crate::models::{Category, SortMode, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub category: Option<Category>,
    pub search: String,
    pub sort: SortMode,
}

impl ViewQuery {
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        filtered_tasks(tasks, self.category, &self.search, self.sort)
    }
}

pub fn filter_by_category(tasks: &[Task], category: Option<Category>) -> Vec<Task> {
    match category {
        None => tasks.to_vec(),
        Some(category) => tasks
            .iter()
            .filter(|task| task.category == category)
            .cloned()
            .collect(),
    }
}

pub fn search_by_text(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.trim().is_empty() {
        return tasks.to_vec();
    }
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.name.to_lowercase().contains(&needle)
                || (!task.details.is_empty() && task.details.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Stable: equal priorities keep their relative input order.
pub fn sort_by_priority(tasks: &[Task], mode: SortMode) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    match mode {
        SortMode::None => {}
        SortMode::PriorityAsc => sorted.sort_by_key(|task| task.priority),
        SortMode::PriorityDesc => sorted.sort_by(|a, b| b.priority.cmp(&a.priority)),
    }
    sorted
}

pub fn filtered_tasks(
    tasks: &[Task],
    category: Option<Category>,
    query: &str,
    mode: SortMode,
) -> Vec<Task> {
    let filtered = filter_by_category(tasks, category);
    let searched = search_by_text(&filtered, query);
    sort_by_priority(&searched, mode)
}
