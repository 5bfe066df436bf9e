use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use crate::firebase::{FirebaseAuth, RealtimeDatabase};
use crate::logging;
use crate::models::{Category, Priority, SortMode, Task, TaskDraft};
use crate::notice::{NoticeBoard, NoticeKind};
use crate::storage::Storage;
use crate::task_list::{Confirmation, TaskList};
use crate::TodoError;

#[derive(Debug, Parser)]
#[command(name = "cloud-todo", version, about = "Cloud-synced personal todo list")]
pub struct Cli {
    /// Directory holding config.json, session.json and logs.
    #[arg(long, env = "CLOUD_TODO_HOME", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store Firebase project settings.
    Configure {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        database_url: String,
        #[arg(long, default_value = "")]
        project_id: String,
    },
    Login(Credentials),
    Signup(Credentials),
    Logout,
    /// Show tasks through the category filter, search text and sort order.
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "none")]
        sort: SortMode,
    },
    Add(TaskFields),
    Edit {
        key: String,
        #[command(flatten)]
        fields: EditFields,
    },
    /// Flip a task between open and done.
    Toggle { key: String },
    Delete {
        key: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "CLOUD_TODO_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct TaskFields {
    pub name: String,
    #[arg(long, default_value = "")]
    pub details: String,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DateTime<Utc>>,
}

impl TaskFields {
    fn into_draft(self) -> TaskDraft {
        TaskDraft {
            name: self.name,
            details: self.details,
            category: self.category,
            priority: self.priority,
            due_date: self.due,
        }
    }
}

#[derive(Debug, Args)]
pub struct EditFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub details: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
    pub due: Option<DateTime<Utc>>,
    #[arg(long)]
    pub clear_due: bool,
}

impl EditFields {
    fn apply(self, draft: &mut TaskDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(details) = self.details {
            draft.details = details;
        }
        if self.category.is_some() {
            draft.category = self.category;
        }
        if self.priority.is_some() {
            draft.priority = self.priority;
        }
        if self.clear_due {
            draft.due_date = None;
        } else if self.due.is_some() {
            draft.due_date = self.due;
        }
    }
}

pub fn parse_due(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("invalid date: {raw}"));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid due date {raw}: {err}"))
}

pub fn format_row(position: usize, task: &Task) -> String {
    let mark = if task.is_completed { "x" } else { " " };
    let mut row = format!(
        "{position:>3}. [{mark}] {}  ({}, {})",
        task.name,
        task.category,
        task.priority_level().label()
    );
    if let Some(due) = task.due_date {
        row.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
    }
    row.push_str(&format!("  #{}", task.key));
    if !task.details.is_empty() {
        row.push_str(&format!("\n       {}", task.details));
    }
    row
}

fn data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    directories::ProjectDirs::from("dev", "cloud-todo", "cloud-todo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("no home directory; pass --data-dir"))
}

fn user_facing(err: TodoError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

pub async fn run(cli: Cli) -> Result<()> {
    let storage = Storage::new(data_dir(cli.data_dir)?);
    storage.ensure_dirs()?;
    let mut config = storage.load_config().context("failed to read config.json")?;
    let _logger = logging::init_logging(storage.root(), config.log_spec.as_deref())?;

    if let Command::Configure {
        api_key,
        database_url,
        project_id,
    } = cli.command
    {
        config.firebase.api_key = api_key;
        config.firebase.database_url = database_url;
        config.firebase.project_id = project_id;
        storage.save_config(&config)?;
        println!("Saved {}", storage.root().join("config.json").display());
        return Ok(());
    }

    let config = config.with_env_overrides();
    anyhow::ensure!(
        config.firebase.is_complete(),
        "Firebase is not configured; run `cloud-todo configure` first"
    );

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let auth = Arc::new(FirebaseAuth::new(config.firebase.clone(), timeout)?);
    if let Some(session) = storage.load_session()? {
        if !auth.restore(session) {
            storage.clear_session()?;
        }
    }
    let database = RealtimeDatabase::new(&config.firebase, auth.clone(), timeout)?;
    let notices = NoticeBoard::new();
    let list = TaskList::new(auth.clone(), Arc::new(database), Arc::new(notices.clone()));

    execute(cli.command, &storage, &auth, &list).await?;
    if let Some(notice) = notices.last() {
        if notice.kind == NoticeKind::Success {
            println!("{}", notice.message);
        }
    }
    Ok(())
}

async fn execute(
    command: Command,
    storage: &Storage,
    auth: &FirebaseAuth,
    list: &TaskList,
) -> Result<()> {
    match command {
        Command::Configure { .. } => Ok(()),
        Command::Login(credentials) => {
            let session = auth
                .sign_in(&credentials.email, &credentials.password)
                .await?;
            storage.save_session(&session)?;
            println!("Logged in successfully!");
            Ok(())
        }
        Command::Signup(credentials) => {
            auth.sign_up(&credentials.email, &credentials.password)
                .await?;
            println!("Account created successfully! Please check your email to verify your account.");
            Ok(())
        }
        Command::Logout => {
            auth.sign_out();
            storage.clear_session()?;
            list.handle_auth_change(None).await.map_err(user_facing)?;
            println!("Logged out");
            Ok(())
        }
        Command::List {
            category,
            search,
            sort,
        } => {
            list.refresh().await.map_err(user_facing)?;
            list.set_filter_category(category);
            list.set_search(search);
            list.set_sort(sort);
            let rows = list.filtered_tasks();
            if rows.is_empty() {
                println!("No tasks");
            }
            for (index, task) in rows.iter().enumerate() {
                println!("{}", format_row(index + 1, task));
            }
            Ok(())
        }
        Command::Add(fields) => {
            let task = list.create(fields.into_draft()).await.map_err(user_facing)?;
            println!("{}", format_row(1, &task));
            Ok(())
        }
        Command::Edit { key, fields } => {
            list.refresh().await.map_err(user_facing)?;
            let mut draft = list.begin_edit(&key).map_err(user_facing)?;
            fields.apply(&mut draft);
            list.submit(draft).await.map_err(user_facing)?;
            Ok(())
        }
        Command::Toggle { key } => {
            list.refresh().await.map_err(user_facing)?;
            let task = list
                .store()
                .get(&key)
                .ok_or_else(|| user_facing(TodoError::NotFound(key.clone())))?;
            let task = list.toggle_completion(&task).await.map_err(user_facing)?;
            let state = if task.is_completed { "done" } else { "open" };
            println!("{} is now {state}", task.name);
            Ok(())
        }
        Command::Delete { key, yes } => {
            let request = list.request_delete(&key);
            if !yes {
                println!("{} Re-run with --yes to delete #{}.", request.prompt, request.key);
                return Ok(());
            }
            list.refresh().await.map_err(user_facing)?;
            let removed = list
                .delete(request, Confirmation::Yes)
                .await
                .map_err(user_facing)?;
            if !removed {
                println!("No task #{key}");
            }
            Ok(())
        }
    }
}
