use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_page_size: u32,
}

/// OpenID Connect provider used for password and refresh-token grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub stale_time_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub config_dir: Option<PathBuf>,
    pub login_route: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("OPSDESK_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Presets first, then individual variables win
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("OPSDESK_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("OPSDESK_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("OPSDESK_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Identity provider overrides
        if let Ok(v) = env::var("OPSDESK_IDP_URL") {
            self.identity.url = v;
        }
        if let Ok(v) = env::var("OPSDESK_IDP_REALM") {
            self.identity.realm = v;
        }
        if let Ok(v) = env::var("OPSDESK_IDP_CLIENT_ID") {
            self.identity.client_id = v;
        }

        // Retry overrides
        if let Ok(v) = env::var("OPSDESK_MAX_RETRIES") {
            self.retry.max_retries = v.parse().unwrap_or(self.retry.max_retries);
        }
        if let Ok(v) = env::var("OPSDESK_RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = v.parse().unwrap_or(self.retry.base_delay_ms);
        }

        // Cache overrides
        if let Ok(v) = env::var("OPSDESK_STALE_TIME_SECS") {
            self.cache.stale_time_secs = v.parse().unwrap_or(self.cache.stale_time_secs);
        }

        // Session overrides
        if let Ok(v) = env::var("OPSDESK_CONFIG_DIR") {
            self.session.config_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("OPSDESK_LOGIN_ROUTE") {
            self.session.login_route = v;
        }

        self
    }

    /// Config pointed at an explicit server, used by tests and `--api-url`
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_time_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// Token endpoint of the configured realm
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.identity.url.trim_end_matches('/'),
            self.identity.realm
        )
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_secs: 30,
                max_page_size: 500,
            },
            identity: IdentityConfig {
                url: "http://localhost:8080".to_string(),
                realm: "opsdesk".to_string(),
                client_id: "opsdesk-web".to_string(),
            },
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 200,
            },
            cache: CacheConfig {
                stale_time_secs: 30,
            },
            session: SessionConfig {
                config_dir: None,
                login_route: "/login".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.opsdesk.example.com/api".to_string(),
                timeout_secs: 20,
                max_page_size: 200,
            },
            identity: IdentityConfig {
                url: "https://auth.staging.opsdesk.example.com".to_string(),
                realm: "opsdesk".to_string(),
                client_id: "opsdesk-web".to_string(),
            },
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 250,
            },
            cache: CacheConfig {
                stale_time_secs: 30,
            },
            session: SessionConfig {
                config_dir: None,
                login_route: "/login".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://opsdesk.example.com/api".to_string(),
                timeout_secs: 15,
                max_page_size: 100,
            },
            identity: IdentityConfig {
                url: "https://auth.opsdesk.example.com".to_string(),
                realm: "opsdesk".to_string(),
                client_id: "opsdesk-web".to_string(),
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 500,
            },
            cache: CacheConfig {
                stale_time_secs: 60,
            },
            session: SessionConfig {
                config_dir: None,
                login_route: "/login".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once on first use
pub static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

pub fn config() -> &'static ClientConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
