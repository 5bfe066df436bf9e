use serde::{Deserialize, Serialize};

pub const ENV_API_KEY: &str = "CLOUD_TODO_API_KEY";
pub const ENV_DATABASE_URL: &str = "CLOUD_TODO_DATABASE_URL";
pub const ENV_PROJECT_ID: &str = "CLOUD_TODO_PROJECT_ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub project_id: String,
}

impl FirebaseConfig {
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.database_url.trim().is_empty()
    }

    pub fn database_root(&self) -> &str {
        self.database_url.trim().trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default)]
    pub firebase: FirebaseConfig,
    /// Overrides the log filter when neither `CLOUD_TODO_LOG` nor `RUST_LOG` is set.
    #[serde(default)]
    pub log_spec: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            firebase: FirebaseConfig::default(),
            log_spec: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(value) = non_empty(ENV_API_KEY) {
            self.firebase.api_key = value;
        }
        if let Some(value) = non_empty(ENV_DATABASE_URL) {
            self.firebase.database_url = value;
        }
        if let Some(value) = non_empty(ENV_PROJECT_ID) {
            self.firebase.project_id = value;
        }
        self
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigFile {
    pub schema_version: u32,
    pub settings: AppConfig,
}
