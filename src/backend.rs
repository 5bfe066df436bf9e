use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::BackendError;
use crate::models::UserId;

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

/// Keyed JSON store addressed by slash-separated paths. Setting `None` removes the node.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, BackendError>;
    async fn set(&self, path: &str, value: Option<Value>) -> Result<(), BackendError>;
}

pub fn tasks_path(user_id: &str) -> String {
    format!("Users/{user_id}/Tasks")
}

pub fn task_path(user_id: &str, key: &str) -> String {
    format!("Users/{user_id}/Tasks/{key}")
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

pub struct MemoryAuth {
    sender: watch::Sender<Option<UserId>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        let auth = Self::new();
        auth.sign_in(user_id);
        auth
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        self.sender.send_replace(Some(user_id.into()));
    }

    pub fn sign_out(&self) {
        self.sender.send_replace(None);
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for MemoryAuth {
    fn current_user(&self) -> Option<UserId> {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.sender.subscribe()
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryData>>,
}

#[derive(Default)]
struct MemoryData {
    root: Map<String, Value>,
    failures: HashMap<Operation, String>,
    writes: usize,
    reads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        let mut guard = self.lock();
        guard.failures.insert(operation, message.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    pub fn value_at(&self, path: &str) -> Option<Value> {
        let guard = self.lock();
        lookup(&guard.root, path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = segments(path);
    let first = parts.next()?;
    let mut node = root.get(first)?;
    for part in parts {
        node = node.as_object()?.get(part)?;
    }
    Some(node)
}

fn insert(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), BackendError> {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(BackendError::Rejected("cannot overwrite the root".to_string()));
    };
    let mut node = root;
    for part in parents {
        let child = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = child
            .as_object_mut()
            .ok_or_else(|| BackendError::Rejected(format!("cannot descend into {part}")))?;
    }
    node.insert(last.to_string(), value);
    Ok(())
}

fn remove(node: &mut Map<String, Value>, parts: &[&str]) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    if rest.is_empty() {
        node.remove(*first);
        return;
    }
    let now_empty = match node.get_mut(*first) {
        Some(Value::Object(child)) => {
            remove(child, rest);
            child.is_empty()
        }
        _ => false,
    };
    if now_empty {
        node.remove(*first);
    }
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Option<Value>, BackendError> {
        let mut guard = self.lock();
        if let Some(message) = guard.failures.get(&Operation::Get) {
            return Err(BackendError::Transport(message.clone()));
        }
        guard.reads += 1;
        Ok(lookup(&guard.root, path).cloned())
    }

    async fn set(&self, path: &str, value: Option<Value>) -> Result<(), BackendError> {
        let mut guard = self.lock();
        if let Some(message) = guard.failures.get(&Operation::Set) {
            return Err(BackendError::Transport(message.clone()));
        }
        guard.writes += 1;
        match value {
            Some(Value::Null) | None => {
                let parts: Vec<&str> = segments(path).collect();
                remove(&mut guard.root, &parts);
                Ok(())
            }
            Some(value) => insert(&mut guard.root, path, value),
        }
    }
}
