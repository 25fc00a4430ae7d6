// Tokens and the tenant selection are stored separately; clearing one keeps the other

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::ClientConfig;

mod navigator;

pub use navigator::{Navigator, NoopNavigator, RecordingNavigator};

const SESSION_FILE: &str = "session.json";
const TENANT_FILE: &str = "tenant.json";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot locate config directory: {0}")]
    NoConfigDir(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Tokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TenantSelection {
    #[serde(default)]
    current_tenant: Option<String>,
}

/// Storage seam for everything that must survive a restart
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_tokens(&self) -> Result<Tokens, SessionError>;
    async fn save_tokens(&self, tokens: &Tokens) -> Result<(), SessionError>;
    async fn clear_tokens(&self) -> Result<(), SessionError>;
    async fn load_active_tenant(&self) -> Result<Option<String>, SessionError>;
    async fn save_active_tenant(&self, tenant_id: Option<&str>) -> Result<(), SessionError>;
}

/// JSON files in the CLI config directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$OPSDESK_CONFIG_DIR`, or `~/.config/opsdesk`
    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        let dir = match config.session.config_dir {
            Some(ref dir) => dir.clone(),
            None => {
                let home = std::env::var("HOME")
                    .map_err(|_| SessionError::NoConfigDir("HOME environment variable not set".to_string()))?;
                PathBuf::from(home).join(".config").join("opsdesk")
            }
        };
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_json<T: for<'de> Deserialize<'de> + Default>(&self, name: &str) -> Result<T, SessionError> {
        let path = self.dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::write(self.dir.join(name), content).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load_tokens(&self) -> Result<Tokens, SessionError> {
        self.read_json(SESSION_FILE).await
    }

    async fn save_tokens(&self, tokens: &Tokens) -> Result<(), SessionError> {
        self.write_json(SESSION_FILE, tokens).await
    }

    async fn clear_tokens(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.dir.join(SESSION_FILE)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_active_tenant(&self) -> Result<Option<String>, SessionError> {
        let selection: TenantSelection = self.read_json(TENANT_FILE).await?;
        Ok(selection.current_tenant)
    }

    async fn save_active_tenant(&self, tenant_id: Option<&str>) -> Result<(), SessionError> {
        let selection = TenantSelection {
            current_tenant: tenant_id.map(str::to_string),
        };
        self.write_json(TENANT_FILE, &selection).await
    }
}

/// Process-local store for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: Mutex<Tokens>,
    tenant: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: Tokens) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            tenant: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_tokens(&self) -> Result<Tokens, SessionError> {
        Ok(self.tokens.lock().await.clone())
    }

    async fn save_tokens(&self, tokens: &Tokens) -> Result<(), SessionError> {
        *self.tokens.lock().await = tokens.clone();
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), SessionError> {
        *self.tokens.lock().await = Tokens::default();
        Ok(())
    }

    async fn load_active_tenant(&self) -> Result<Option<String>, SessionError> {
        Ok(self.tenant.lock().await.clone())
    }

    async fn save_active_tenant(&self, tenant_id: Option<&str>) -> Result<(), SessionError> {
        *self.tenant.lock().await = tenant_id.map(str::to_string);
        Ok(())
    }
}

// Used by the navigator to keep its route log without async
pub(crate) fn lock_ignoring_poison<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
