use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{tasks_path, TaskBackend};
use crate::error::TodoError;
use crate::models::{Task, UserId};
use crate::normalize::tasks_from_snapshot;

#[derive(Debug, Default)]
struct Snapshot {
    owner: Option<UserId>,
    tasks: Vec<Task>,
}

#[derive(Clone)]
pub struct TaskStore {
    backend: Arc<dyn TaskBackend>,
    inner: Arc<Mutex<Snapshot>>,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(Snapshot::default())),
        }
    }

    // Switching users empties the snapshot before the fetch.
    pub async fn load(&self, user_id: &str) -> Result<Vec<Task>, TodoError> {
        {
            let mut snapshot = self.lock();
            if snapshot.owner.as_deref() != Some(user_id) {
                if let Some(previous) = &snapshot.owner {
                    log::info!("snapshot owner changed from={previous} to={user_id}");
                }
                snapshot.owner = Some(user_id.to_string());
                snapshot.tasks.clear();
            }
        }

        let raw = self
            .backend
            .get(&tasks_path(user_id))
            .await
            .map_err(TodoError::FetchFailed)?;
        if raw.is_none() {
            log::debug!("no tasks stored user={user_id}");
        }
        let tasks = tasks_from_snapshot(raw);

        let mut snapshot = self.lock();
        if snapshot.owner.as_deref() == Some(user_id) {
            log::debug!("snapshot loaded user={user_id} count={}", tasks.len());
            snapshot.tasks = tasks.clone();
        } else {
            log::debug!("discarding snapshot for user={user_id}, owner changed during fetch");
        }
        Ok(tasks)
    }

    pub fn owner(&self) -> Option<UserId> {
        self.lock().owner.clone()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.lock().owner.as_deref() == Some(user_id)
    }

    pub fn current(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn get(&self, key: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|task| task.key == key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().tasks.iter().any(|task| task.key == key)
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    pub fn clear(&self) {
        let mut snapshot = self.lock();
        snapshot.owner = None;
        snapshot.tasks.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
