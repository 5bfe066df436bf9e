pub mod backend;
#[cfg(feature = "app")]
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "app")]
pub mod firebase;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod notice;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod task_list;

pub use backend::{AuthProvider, MemoryAuth, MemoryBackend, TaskBackend};
pub use config::{AppConfig, FirebaseConfig};
pub use error::{BackendError, TodoError, ValidationError};
pub use models::{Category, Priority, Session, SortMode, Task, TaskDraft, TaskKey, UserId};
pub use notice::{Notice, NoticeBoard, NoticeKind, Notifier};
pub use pipeline::{filter_by_category, filtered_tasks, search_by_text, sort_by_priority, ViewQuery};
pub use state::TaskStore;
pub use storage::{Storage, StorageError};
pub use task_list::{Confirmation, DeleteRequest, TaskList};
