use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::backend::{AuthProvider, TaskBackend};
use crate::config::FirebaseConfig;
use crate::error::BackendError;
use crate::models::{Session, Timestamp, UserId};

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields";
pub const MSG_VERIFY_EMAIL: &str = "Please verify your email before logging in.";

fn build_client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| BackendError::Transport(format!("failed to build http client: {err}")))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value["error"]["message"]
                .as_str()
                .or_else(|| value["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// User-facing text for Identity Toolkit error codes such as `EMAIL_NOT_FOUND` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn auth_error_message(code: &str) -> String {
    let (head, detail) = match code.split_once(':') {
        Some((head, detail)) => (head.trim(), Some(detail.trim())),
        None => (code.trim(), None),
    };
    match head {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password.".to_string()
        }
        "EMAIL_EXISTS" => {
            "This email address is already in use. Please log in or use a different email."
                .to_string()
        }
        "INVALID_EMAIL" => "Please enter a valid email address.".to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many attempts. Please try again later.".to_string()
        }
        "WEAK_PASSWORD" => detail
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Password should be at least 6 characters.".to_string()),
        _ => "Failed to authenticate. Please try again.".to_string(),
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, BackendError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(BackendError::Http {
            status: status.as_u16(),
            message: error_message(&text),
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn into_auth_error(err: BackendError) -> BackendError {
    match err {
        BackendError::Http { message, .. } => BackendError::Rejected(auth_error_message(&message)),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: Timestamp) -> Session {
        let lifetime = self
            .expires_in
            .as_deref()
            .and_then(|secs| secs.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Session {
            user_id: self.local_id,
            email: self.email,
            id_token: self.id_token,
            expires_at: now + lifetime * 1000,
        }
    }
}

fn email_verified(lookup: &Value) -> bool {
    lookup["users"][0]["emailVerified"]
        .as_bool()
        .unwrap_or(false)
}

fn require_credentials(email: &str, password: &str) -> Result<(), BackendError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(BackendError::Rejected(MSG_MISSING_FIELDS.to_string()));
    }
    Ok(())
}

pub struct FirebaseAuth {
    config: FirebaseConfig,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
    sender: watch::Sender<Option<UserId>>,
}

impl FirebaseAuth {
    pub fn new(config: FirebaseConfig, timeout: Duration) -> Result<Self, BackendError> {
        let (sender, _) = watch::channel(None);
        Ok(Self {
            config,
            client: build_client(timeout)?,
            session: Mutex::new(None),
            sender,
        })
    }

    pub fn restore(&self, session: Session) -> bool {
        if session.is_expired_at(Utc::now().timestamp_millis()) {
            log::info!("saved session expired user={}", session.user_id);
            return false;
        }
        self.install(Some(session));
        true
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn id_token(&self) -> Option<String> {
        self.lock().as_ref().map(|session| session.id_token.clone())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        require_credentials(email, password)?;
        let body = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let value = self
            .identity_call("accounts:signInWithPassword", &body)
            .await?;
        let session =
            serde_json::from_value::<TokenResponse>(value)?.into_session(Utc::now().timestamp_millis());

        let lookup = self
            .identity_call(
                "accounts:lookup",
                &serde_json::json!({ "idToken": session.id_token }),
            )
            .await?;
        if !email_verified(&lookup) {
            log::info!("sign-in refused, email not verified user={}", session.user_id);
            return Err(BackendError::Rejected(MSG_VERIFY_EMAIL.to_string()));
        }

        log::info!("signed in user={}", session.user_id);
        self.install(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, BackendError> {
        require_credentials(email, password)?;
        let body = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let value = self.identity_call("accounts:signUp", &body).await?;
        let created = serde_json::from_value::<TokenResponse>(value)?;
        self.identity_call(
            "accounts:sendOobCode",
            &serde_json::json!({ "requestType": "VERIFY_EMAIL", "idToken": created.id_token }),
        )
        .await?;
        log::info!("account created user={}", created.local_id);
        Ok(created.local_id)
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.session() {
            log::info!("signed out user={}", session.user_id);
        }
        self.install(None);
    }

    async fn identity_call(&self, method: &str, body: &Value) -> Result<Value, BackendError> {
        let url = format!("{IDENTITY_URL}/{method}");
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        read_json(resp).await.map_err(into_auth_error)
    }

    fn install(&self, session: Option<Session>) {
        let user = session.as_ref().map(|s| s.user_id.clone());
        *self.lock() = session;
        self.sender.send_replace(user);
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthProvider for FirebaseAuth {
    fn current_user(&self) -> Option<UserId> {
        self.lock().as_ref().map(|session| session.user_id.clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.sender.subscribe()
    }
}

pub fn node_url(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_matches('/');
    format!("{root}/{path}.json")
}

pub struct RealtimeDatabase {
    root: String,
    client: reqwest::Client,
    auth: Arc<FirebaseAuth>,
}

impl RealtimeDatabase {
    pub fn new(
        config: &FirebaseConfig,
        auth: Arc<FirebaseAuth>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            root: config.database_root().to_string(),
            client: build_client(timeout)?,
            auth,
        })
    }

    fn token(&self) -> Result<String, BackendError> {
        self.auth.id_token().ok_or(BackendError::Unauthenticated)
    }
}

#[async_trait]
impl TaskBackend for RealtimeDatabase {
    async fn get(&self, path: &str) -> Result<Option<Value>, BackendError> {
        let token = self.token()?;
        let resp = self
            .client
            .get(node_url(&self.root, path))
            .query(&[("auth", token.as_str())])
            .send()
            .await?;
        let value = read_json(resp).await?;
        log::debug!("database get path={path} found={}", !value.is_null());
        Ok((!value.is_null()).then_some(value))
    }

    async fn set(&self, path: &str, value: Option<Value>) -> Result<(), BackendError> {
        let token = self.token()?;
        let url = node_url(&self.root, path);
        let delete = value.as_ref().map_or(true, Value::is_null);
        let request = match &value {
            Some(value) if !delete => self.client.put(url).json(value),
            _ => self.client.delete(url),
        };
        let resp = request.query(&[("auth", token.as_str())]).send().await?;
        read_json(resp).await?;
        log::debug!("database set path={path} delete={delete}");
        Ok(())
    }
}
