use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;

use crate::backend::{task_path, AuthProvider, TaskBackend};
use crate::error::{BackendError, TodoError, ValidationError};
use crate::models::{Category, SortMode, Task, TaskDraft, TaskKey, TaskRecord, Timestamp, UserId};
use crate::notice::{Notifier, MSG_DELETE_FAILED, MSG_TASK_ADDED, MSG_TASK_DELETED, MSG_TASK_UPDATED};
use crate::pipeline::{filtered_tasks, ViewQuery};
use crate::state::TaskStore;

pub const DELETE_PROMPT: &str = "Are you sure you have done the task?";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: TaskKey,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

#[derive(Default)]
pub struct KeyGenerator {
    last: Mutex<Timestamp>,
}

impl KeyGenerator {
    pub fn next_at(&self, now: Timestamp) -> TaskKey {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let key = now.max(*last + 1);
        *last = key;
        key.to_string()
    }

    pub fn next(&self) -> TaskKey {
        self.next_at(Utc::now().timestamp_millis())
    }
}

#[derive(Debug, Default)]
struct UiState {
    selected: Option<TaskKey>,
    editing: Option<TaskKey>,
    query: ViewQuery,
}

pub struct TaskList {
    auth: Arc<dyn AuthProvider>,
    backend: Arc<dyn TaskBackend>,
    store: TaskStore,
    notifier: Arc<dyn Notifier>,
    keys: KeyGenerator,
    ui: Mutex<UiState>,
}

impl TaskList {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        backend: Arc<dyn TaskBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store: TaskStore::new(backend.clone()),
            auth,
            backend,
            notifier,
            keys: KeyGenerator::default(),
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub async fn refresh(&self) -> Result<Vec<Task>, TodoError> {
        let result = match self.require_user() {
            Ok(user) => self.reload(&user).await,
            Err(err) => Err(err),
        };
        self.report(result)
    }

    pub fn filtered_tasks(&self) -> Vec<Task> {
        let query = self.ui().query.clone();
        query.apply(&self.visible_tasks())
    }

    pub fn get_filtered_tasks(
        &self,
        category: Option<Category>,
        search: &str,
        sort: SortMode,
    ) -> Vec<Task> {
        filtered_tasks(&self.visible_tasks(), category, search, sort)
    }

    pub fn query(&self) -> ViewQuery {
        self.ui().query.clone()
    }

    pub fn set_filter_category(&self, category: Option<Category>) {
        self.ui().query.category = category;
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.ui().query.search = search.into();
    }

    pub fn set_sort(&self, sort: SortMode) {
        self.ui().query.sort = sort;
    }

    pub fn toggle_selection(&self, key: &str) -> Option<TaskKey> {
        let mut ui = self.ui();
        ui.selected = match ui.selected.take() {
            Some(current) if current == key => None,
            _ => Some(key.to_string()),
        };
        ui.selected.clone()
    }

    pub fn selected_task(&self) -> Option<Task> {
        let key = self.ui().selected.clone()?;
        self.visible_tasks().into_iter().find(|task| task.key == key)
    }

    pub fn begin_edit(&self, key: &str) -> Result<TaskDraft, TodoError> {
        let task = self
            .require_user()
            .and_then(|user| self.owned_task(&user, key));
        let task = self.report(task)?;
        self.ui().editing = Some(task.key.clone());
        Ok(TaskDraft::from_task(&task))
    }

    pub fn cancel_edit(&self) {
        self.ui().editing = None;
    }

    pub fn editing_key(&self) -> Option<TaskKey> {
        self.ui().editing.clone()
    }

    pub async fn submit(&self, draft: TaskDraft) -> Result<Task, TodoError> {
        match self.editing_key() {
            Some(key) => self.update(&key, draft).await,
            None => self.create(draft).await,
        }
    }

    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TodoError> {
        let result = self.create_inner(draft).await;
        self.report(result)
    }

    // Concurrent submits are not de-duplicated: two creates in flight make two records
    // and overlapping updates of one task keep whichever write lands last.
    async fn create_inner(&self, draft: TaskDraft) -> Result<Task, TodoError> {
        let user = self.require_user()?;
        validate(&draft)?;
        let key = self.keys.next();
        let record = draft.into_record(false);
        self.write(&user, &key, Some(&record)).await?;
        log::info!("task created user={user} key={key}");
        self.notifier.show_success(MSG_TASK_ADDED);
        self.reload(&user).await?;
        Ok(record.into_task(key))
    }

    pub async fn update(&self, key: &str, draft: TaskDraft) -> Result<Task, TodoError> {
        let result = self.update_inner(key, draft).await;
        self.report(result)
    }

    async fn update_inner(&self, key: &str, draft: TaskDraft) -> Result<Task, TodoError> {
        let user = self.require_user()?;
        validate(&draft)?;
        let existing = self.owned_task(&user, key)?;
        let record = draft.into_record(existing.is_completed);
        self.write(&user, key, Some(&record)).await?;
        log::info!("task updated user={user} key={key}");
        self.notifier.show_success(MSG_TASK_UPDATED);
        {
            let mut ui = self.ui();
            if ui.editing.as_deref() == Some(key) {
                ui.editing = None;
            }
        }
        self.reload(&user).await?;
        Ok(record.into_task(key.to_string()))
    }

    pub async fn toggle_completion(&self, task: &Task) -> Result<Task, TodoError> {
        let result = self.toggle_inner(task).await;
        self.report(result)
    }

    async fn toggle_inner(&self, task: &Task) -> Result<Task, TodoError> {
        let user = self.require_user()?;
        self.owned_task(&user, &task.key)?;
        let mut record = task.to_record();
        record.is_completed = !task.is_completed;
        self.write(&user, &task.key, Some(&record)).await?;
        log::info!(
            "task completion toggled user={user} key={} completed={}",
            task.key,
            record.is_completed
        );
        self.reload(&user).await?;
        Ok(record.into_task(task.key.clone()))
    }

    pub fn request_delete(&self, key: &str) -> DeleteRequest {
        DeleteRequest {
            key: key.to_string(),
            prompt: DELETE_PROMPT,
        }
    }

    pub async fn delete(
        &self,
        request: DeleteRequest,
        answer: Confirmation,
    ) -> Result<bool, TodoError> {
        if answer == Confirmation::No {
            log::debug!("delete cancelled key={}", request.key);
            return Ok(false);
        }
        let result = self.delete_inner(&request.key).await;
        if let Err(TodoError::WriteFailed(err)) = &result {
            log::warn!("task delete failed key={} error={err}", request.key);
            self.notifier.show_error(MSG_DELETE_FAILED);
            return result;
        }
        self.report(result)
    }

    async fn delete_inner(&self, key: &str) -> Result<bool, TodoError> {
        let user = self.require_user()?;
        let listed = self.owned_task(&user, key).is_ok();
        self.write(&user, key, None).await?;
        if listed {
            log::info!("task deleted user={user} key={key}");
            self.notifier.show_success(MSG_TASK_DELETED);
        } else {
            log::debug!("removed key absent from snapshot user={user} key={key}");
        }
        {
            let mut ui = self.ui();
            if ui.selected.as_deref() == Some(key) {
                ui.selected = None;
            }
            if ui.editing.as_deref() == Some(key) {
                ui.editing = None;
            }
        }
        self.reload(&user).await?;
        Ok(listed)
    }

    pub async fn handle_auth_change(&self, user: Option<UserId>) -> Result<(), TodoError> {
        match user {
            None => {
                log::info!("signed out, clearing task list");
                self.store.clear();
                let mut ui = self.ui();
                ui.selected = None;
                ui.editing = None;
                Ok(())
            }
            Some(user) => {
                log::info!("signed in user={user}");
                let result = self.reload(&user).await.map(|_| ());
                self.report(result)
            }
        }
    }

    pub async fn follow_auth(&self) {
        let mut changes = self.auth.subscribe();
        while changes.changed().await.is_ok() {
            let user = changes.borrow_and_update().clone();
            // Failures were already reported on the notice channel.
            let _ = self.handle_auth_change(user).await;
        }
    }

    fn require_user(&self) -> Result<UserId, TodoError> {
        self.auth.current_user().ok_or(TodoError::NotAuthenticated)
    }

    fn visible_tasks(&self) -> Vec<Task> {
        match self.auth.current_user() {
            Some(user) if self.store.is_owned_by(&user) => self.store.current(),
            _ => Vec::new(),
        }
    }

    fn owned_task(&self, user: &str, key: &str) -> Result<Task, TodoError> {
        if !self.store.is_owned_by(user) {
            return Err(TodoError::NotFound(key.to_string()));
        }
        self.store
            .get(key)
            .ok_or_else(|| TodoError::NotFound(key.to_string()))
    }

    async fn write(
        &self,
        user: &str,
        key: &str,
        record: Option<&TaskRecord>,
    ) -> Result<(), TodoError> {
        let value = record
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| TodoError::WriteFailed(BackendError::Json(err)))?;
        self.backend
            .set(&task_path(user, key), value)
            .await
            .map_err(TodoError::WriteFailed)
    }

    async fn reload(&self, user: &str) -> Result<Vec<Task>, TodoError> {
        if !self.store.is_owned_by(user) {
            let mut ui = self.ui();
            ui.selected = None;
            ui.editing = None;
        }
        let tasks = self.store.load(user).await?;
        let mut ui = self.ui();
        if let Some(selected) = &ui.selected {
            if !tasks.iter().any(|task| &task.key == selected) {
                ui.selected = None;
            }
        }
        Ok(tasks)
    }

    fn report<T>(&self, result: Result<T, TodoError>) -> Result<T, TodoError> {
        if let Err(err) = &result {
            log::warn!("task operation failed error={err}");
            self.notifier.show_error(err.user_message());
        }
        result
    }

    fn ui(&self) -> MutexGuard<'_, UiState> {
        self.ui.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(draft: &TaskDraft) -> Result<(), ValidationError> {
    draft
        .trimmed_name()
        .map(|_| ())
        .ok_or(ValidationError::EmptyName)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryAuth, MemoryBackend, Operation};
    use crate::models::Priority;
    use crate::notice::{NoticeBoard, NoticeKind};
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        auth: Arc<MemoryAuth>,
        backend: MemoryBackend,
        notices: NoticeBoard,
        list: TaskList,
    }

    fn harness() -> Harness {
        let auth = Arc::new(MemoryAuth::signed_in("u1"));
        let backend = MemoryBackend::new();
        let notices = NoticeBoard::new();
        let list = TaskList::new(
            auth.clone(),
            Arc::new(backend.clone()),
            Arc::new(notices.clone()),
        );
        Harness {
            auth,
            backend,
            notices,
            list,
        }
    }

    fn draft(name: &str, category: Category, priority: Priority) -> TaskDraft {
        TaskDraft {
            name: name.to_string(),
            details: String::new(),
            category: Some(category),
            priority: Some(priority),
            due_date: None,
        }
    }

    fn last_notice(h: &Harness) -> (NoticeKind, String) {
        let notice = h.notices.last().expect("a notice was posted");
        (notice.kind, notice.message)
    }

    #[test]
    fn key_generator_is_strictly_increasing() {
        let keys = KeyGenerator::default();
        assert_eq!(keys.next_at(1_000), "1000");
        assert_eq!(keys.next_at(1_000), "1001");
        assert_eq!(keys.next_at(999), "1002");
        assert_eq!(keys.next_at(5_000), "5000");
    }

    #[tokio::test]
    async fn created_task_is_the_only_row_of_an_empty_list() {
        let h = harness();
        let created = h
            .list
            .create(draft("Buy milk", Category::Shopping, Priority::Low))
            .await
            .unwrap();

        let rows = h.list.get_filtered_tasks(None, "", SortMode::None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], created);
        assert_eq!(rows[0].name, "Buy milk");
        assert_eq!(rows[0].category, Category::Shopping);
        assert_eq!(rows[0].priority, 0);
        assert!(!rows[0].is_completed);
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Success, MSG_TASK_ADDED.to_string())
        );

        let stored = h
            .backend
            .value_at(&task_path("u1", &created.key))
            .unwrap();
        assert_eq!(stored["isCompleted"], json!(false));
        assert_eq!(stored["category"], json!("Shopping"));
    }

    #[tokio::test]
    async fn priority_sort_scenario() {
        let h = harness();
        h.list
            .create(draft("A", Category::Personal, Priority::High))
            .await
            .unwrap();
        h.list
            .create(draft("B", Category::Personal, Priority::Low))
            .await
            .unwrap();

        let names = |mode| -> Vec<String> {
            h.list
                .get_filtered_tasks(None, "", mode)
                .into_iter()
                .map(|task| task.name)
                .collect()
        };
        assert_eq!(names(SortMode::PriorityAsc), ["B", "A"]);
        assert_eq!(names(SortMode::PriorityDesc), ["A", "B"]);
        assert_eq!(names(SortMode::None), ["A", "B"]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_a_write() {
        let h = harness();
        let err = h
            .list
            .create(draft("   ", Category::Work, Priority::Low))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TodoError::Validation(ValidationError::EmptyName)
        ));
        assert_eq!(h.backend.write_count(), 0);
        assert!(h.list.store().is_empty());
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Error, "Task name cannot be empty".to_string())
        );
    }

    #[tokio::test]
    async fn mutations_require_a_signed_in_user() {
        let h = harness();
        let task = h
            .list
            .create(draft("x", Category::Work, Priority::Low))
            .await
            .unwrap();
        let writes = h.backend.write_count();
        h.auth.sign_out();

        assert!(matches!(
            h.list.create(TaskDraft::new("y")).await,
            Err(TodoError::NotAuthenticated)
        ));
        assert!(matches!(
            h.list.update(&task.key, TaskDraft::new("y")).await,
            Err(TodoError::NotAuthenticated)
        ));
        assert!(matches!(
            h.list.toggle_completion(&task).await,
            Err(TodoError::NotAuthenticated)
        ));
        let request = h.list.request_delete(&task.key);
        assert!(matches!(
            h.list.delete(request, Confirmation::Yes).await,
            Err(TodoError::NotAuthenticated)
        ));
        assert!(matches!(
            h.list.refresh().await,
            Err(TodoError::NotAuthenticated)
        ));
        assert_eq!(h.backend.write_count(), writes);
        assert_eq!(
            last_notice(&h),
            (
                NoticeKind::Error,
                "You must be logged in to manage tasks".to_string()
            )
        );
    }

    #[tokio::test]
    async fn update_replaces_record_and_keeps_completion() {
        let h = harness();
        let task = h
            .list
            .create(draft("Draft", Category::Work, Priority::Low))
            .await
            .unwrap();
        let task = h.list.toggle_completion(&task).await.unwrap();
        assert!(task.is_completed);

        let mut form = h.list.begin_edit(&task.key).unwrap();
        assert_eq!(h.list.editing_key(), Some(task.key.clone()));
        form.name = " Final ".to_string();
        form.priority = Some(Priority::Medium);
        let updated = h.list.submit(form).await.unwrap();

        assert_eq!(updated.key, task.key);
        assert_eq!(updated.name, "Final");
        assert_eq!(updated.priority, 1);
        assert!(updated.is_completed);
        assert_eq!(h.list.editing_key(), None);
        assert_eq!(h.list.store().len(), 1);
        assert_eq!(h.list.store().get(&task.key), Some(updated));
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Success, MSG_TASK_UPDATED.to_string())
        );
    }

    #[tokio::test]
    async fn update_of_unknown_key_is_not_found() {
        let h = harness();
        let err = h
            .list
            .update("404", TaskDraft::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::NotFound(ref key) if key == "404"));
        assert_eq!(h.backend.write_count(), 0);
    }

    #[tokio::test]
    async fn toggle_completion_round_trips() {
        let h = harness();
        let task = h.list.create(TaskDraft::new("flip")).await.unwrap();
        let done = h.list.toggle_completion(&task).await.unwrap();
        assert!(done.is_completed);
        assert!(h.list.store().get(&task.key).unwrap().is_completed);
        let undone = h.list.toggle_completion(&done).await.unwrap();
        assert!(!undone.is_completed);
        assert!(!h.list.store().get(&task.key).unwrap().is_completed);
    }

    #[tokio::test]
    async fn delete_needs_an_affirmative_answer() {
        let h = harness();
        let task = h.list.create(TaskDraft::new("bye")).await.unwrap();
        h.list.toggle_selection(&task.key);
        let writes = h.backend.write_count();

        let request = h.list.request_delete(&task.key);
        assert_eq!(request.prompt, DELETE_PROMPT);
        assert!(!h.list.delete(request.clone(), Confirmation::No).await.unwrap());
        assert_eq!(h.backend.write_count(), writes);
        assert_eq!(h.list.store().len(), 1);

        assert!(h.list.delete(request, Confirmation::Yes).await.unwrap());
        assert!(h.list.store().is_empty());
        assert_eq!(h.backend.value_at(&task_path("u1", &task.key)), None);
        assert_eq!(h.list.selected_task(), None);
    }

    #[tokio::test]
    async fn deleting_an_unknown_key_is_a_quiet_no_op() {
        let h = harness();
        h.list.create(TaskDraft::new("keep")).await.unwrap();
        let writes = h.backend.write_count();

        let request = h.list.request_delete("does-not-exist");
        assert!(!h.list.delete(request, Confirmation::Yes).await.unwrap());
        assert_eq!(h.backend.write_count(), writes + 1);
        assert_eq!(h.list.store().len(), 1);
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Success, MSG_TASK_ADDED.to_string())
        );
    }

    #[tokio::test]
    async fn toggling_a_deleted_task_does_not_recreate_it() {
        let h = harness();
        let task = h.list.create(TaskDraft::new("gone")).await.unwrap();
        let request = h.list.request_delete(&task.key);
        assert!(h.list.delete(request, Confirmation::Yes).await.unwrap());
        assert!(h.list.store().is_empty());
        let writes = h.backend.write_count();

        let err = h.list.toggle_completion(&task).await.unwrap_err();
        assert!(matches!(err, TodoError::NotFound(ref key) if key == &task.key));
        assert_eq!(h.backend.write_count(), writes);
        assert!(h.list.store().is_empty());
        assert_eq!(h.backend.value_at(&task_path("u1", &task.key)), None);
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Error, "Task no longer exists".to_string())
        );
    }

    #[tokio::test]
    async fn switching_users_with_a_failed_fetch_hides_previous_tasks() {
        let h = harness();
        let secret = h.list.create(TaskDraft::new("u1 secret")).await.unwrap();
        h.list.toggle_selection(&secret.key);
        h.list.begin_edit(&secret.key).unwrap();

        h.auth.sign_in("u2");
        assert!(h.list.filtered_tasks().is_empty());

        h.backend.fail(Operation::Get, "offline");
        let err = h
            .list
            .handle_auth_change(Some("u2".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::FetchFailed(_)));
        assert!(h.list.filtered_tasks().is_empty());
        assert!(h.list.get_filtered_tasks(None, "", SortMode::None).is_empty());
        assert_eq!(h.list.selected_task(), None);
        assert_eq!(h.list.editing_key(), None);
        assert!(h.list.refresh().await.is_err());
        assert!(h.list.store().is_empty());

        let writes = h.backend.write_count();
        let err = h
            .list
            .update(&secret.key, TaskDraft::new("hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::NotFound(_)));
        assert!(matches!(
            h.list.toggle_completion(&secret).await,
            Err(TodoError::NotFound(_))
        ));
        assert_eq!(h.backend.write_count(), writes);
        assert_eq!(h.backend.value_at(&task_path("u2", &secret.key)), None);
    }

    #[tokio::test]
    async fn write_failure_keeps_last_good_snapshot() {
        let h = harness();
        let task = h.list.create(TaskDraft::new("kept")).await.unwrap();
        h.backend.fail(Operation::Set, "offline");

        let err = h.list.create(TaskDraft::new("lost")).await.unwrap_err();
        assert!(matches!(err, TodoError::WriteFailed(_)));
        assert_eq!(h.list.store().current(), vec![task.clone()]);
        assert_eq!(
            last_notice(&h),
            (
                NoticeKind::Error,
                "Failed to save task. Please try again.".to_string()
            )
        );

        let request = h.list.request_delete(&task.key);
        let err = h.list.delete(request, Confirmation::Yes).await.unwrap_err();
        assert!(matches!(err, TodoError::WriteFailed(_)));
        assert_eq!(
            last_notice(&h),
            (NoticeKind::Error, MSG_DELETE_FAILED.to_string())
        );
        assert_eq!(h.list.store().len(), 1);
    }

    #[tokio::test]
    async fn reload_failure_after_write_reports_fetch_error() {
        let h = harness();
        h.list.create(TaskDraft::new("first")).await.unwrap();
        h.backend.fail(Operation::Get, "timeout");

        let err = h.list.create(TaskDraft::new("second")).await.unwrap_err();
        assert!(matches!(err, TodoError::FetchFailed(_)));
        // The write went through; only the local snapshot is stale.
        assert_eq!(h.list.store().len(), 1);
        h.backend.clear_failures();
        assert_eq!(h.list.refresh().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn filtered_tasks_follow_the_current_query() {
        let h = harness();
        h.list
            .create(draft("Pay Rent", Category::Personal, Priority::Low))
            .await
            .unwrap();
        h.list
            .create(TaskDraft {
                details: "RENT due".to_string(),
                ..draft("x", Category::Work, Priority::High)
            })
            .await
            .unwrap();
        h.list
            .create(draft("Gym", Category::Health, Priority::Medium))
            .await
            .unwrap();

        h.list.set_search("rent");
        h.list.set_sort(SortMode::PriorityDesc);
        let names: Vec<String> = h
            .list
            .filtered_tasks()
            .into_iter()
            .map(|task| task.name)
            .collect();
        assert_eq!(names, ["x", "Pay Rent"]);

        h.list.set_filter_category(Some(Category::Personal));
        assert_eq!(h.list.filtered_tasks().len(), 1);
        assert_eq!(h.list.query().category, Some(Category::Personal));
    }

    #[tokio::test]
    async fn selection_is_by_key_and_survives_reordering() {
        let h = harness();
        let low = h
            .list
            .create(draft("low", Category::Personal, Priority::Low))
            .await
            .unwrap();
        h.list
            .create(draft("high", Category::Personal, Priority::High))
            .await
            .unwrap();

        assert_eq!(h.list.toggle_selection(&low.key), Some(low.key.clone()));
        h.list.set_sort(SortMode::PriorityDesc);
        assert_eq!(h.list.selected_task().map(|task| task.name), Some("low".into()));
        assert_eq!(h.list.toggle_selection(&low.key), None);
    }

    #[tokio::test]
    async fn refresh_repairs_legacy_records() {
        let h = harness();
        h.backend
            .set("Users/u1/Tasks/1", Some(json!({ "name": "old", "details": "" })))
            .await
            .unwrap();
        let tasks = h.list.refresh().await.unwrap();
        assert_eq!(tasks[0].category, Category::Personal);
        assert_eq!(tasks[0].priority, 0);
    }

    #[tokio::test]
    async fn sign_out_clears_snapshot_and_ui_state() {
        let h = harness();
        let task = h.list.create(TaskDraft::new("mine")).await.unwrap();
        h.list.toggle_selection(&task.key);
        h.list.begin_edit(&task.key).unwrap();

        h.list.handle_auth_change(None).await.unwrap();
        assert!(h.list.store().is_empty());
        assert_eq!(h.list.editing_key(), None);
        assert_eq!(h.list.selected_task(), None);

        h.list
            .handle_auth_change(Some("u1".to_string()))
            .await
            .unwrap();
        assert_eq!(h.list.store().len(), 1);
    }

    #[tokio::test]
    async fn follow_auth_reacts_to_sign_out() {
        let h = harness();
        h.list.create(TaskDraft::new("mine")).await.unwrap();

        let follow = h.list.follow_auth();
        tokio::pin!(follow);
        tokio::select! {
            _ = &mut follow => {}
            _ = async {
                tokio::task::yield_now().await;
                h.auth.sign_out();
                tokio::time::sleep(Duration::from_millis(20)).await;
            } => {}
        }
        assert!(h.list.store().is_empty());
    }
}
