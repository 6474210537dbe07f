//! Configuration loader (C10, ambient): typed, validated startup config.
//!
//! Grounded in the teacher's `RateLimitConfig::from_env` (env var reads with
//! defaults, `if let ... = env::var(...) && let Ok(n) = val.parse()`), and
//! in `server/internal/config/config.go` for the option names themselves
//! (`APP_*`, per-backend, `KAFKA_BROKER_0`, `WEBHOOK_*`), per spec §6.

use std::env;
use std::time::Duration;

const MAX_CHAT_SIZE_CAP: usize = 5000;
const MAX_CHATS_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Local,
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    Postgres,
    Redis,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub address: String,
    pub port_grpc: u16,
    pub port_http: u16,
    pub env: Env,
    pub max_chat_size: usize,
    pub max_chats: usize,
    pub backend: Backend,
    /// Per-request deadline (spec §5: "every operation accepts a deadline
    /// from the caller"). Not one of spec §6's named options; an ambient
    /// default the HTTP binary applies to every backend call.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub flush_on_start: bool,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub broker: String,
    pub topic: String,
    pub consumer_group: String,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub method: String,
    pub url: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub kafka: KafkaConfig,
    pub webhook: WebhookConfig,
}

/// Loading a config can fail on malformed or conflicting environment
/// values; these are caller-visible startup errors, not silently-defaulted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a number ≤ 65535")]
    InvalidPort(&'static str),
    #[error("APP_PORTGRPC and APP_PORTHTTP must be distinct")]
    DuplicatePorts,
    #[error("APP_ENV must be one of local, dev, prod (got {0:?})")]
    InvalidEnv(String),
    #[error("APP_DB must be one of inmemory, postgres, redis (got {0:?})")]
    InvalidBackend(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = AppConfig::from_env()?;
        let backend = BackendConfig::from_env();
        let kafka = KafkaConfig::from_env();
        let webhook = WebhookConfig::from_env();

        Ok(Self {
            app,
            backend,
            kafka,
            webhook,
        })
    }
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let address = env::var("APP_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port_grpc = parse_port("APP_PORTGRPC", 9090)?;
        let port_http = parse_port("APP_PORTHTTP", 8080)?;
        if port_grpc == port_http {
            return Err(ConfigError::DuplicatePorts);
        }

        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "local" => Env::Local,
            "dev" => Env::Dev,
            "prod" => Env::Prod,
            other => return Err(ConfigError::InvalidEnv(other.to_string())),
        };

        let mut max_chat_size = 5000usize;
        if let Ok(val) = env::var("APP_MAXCHATSIZE")
            && let Ok(n) = val.parse::<usize>()
        {
            max_chat_size = n;
        }
        max_chat_size = max_chat_size.min(MAX_CHAT_SIZE_CAP);

        let mut max_chats = 1000usize;
        if let Ok(val) = env::var("APP_MAXCHATS")
            && let Ok(n) = val.parse::<usize>()
        {
            max_chats = n;
        }
        max_chats = max_chats.min(MAX_CHATS_CAP);

        let backend = match env::var("APP_DB").unwrap_or_else(|_| "inmemory".to_string()).as_str() {
            "inmemory" => Backend::InMemory,
            "postgres" => Backend::Postgres,
            "redis" => Backend::Redis,
            other => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        let mut request_timeout_ms = 5000u64;
        if let Ok(val) = env::var("APP_REQUEST_TIMEOUT_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            request_timeout_ms = n;
        }

        Ok(Self {
            address,
            port_grpc,
            port_http,
            env,
            max_chat_size,
            max_chats,
            backend,
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }
}

fn parse_port(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(val) => val.parse::<u32>().ok().filter(|n| *n <= 65535).map(|n| n as u16).ok_or(ConfigError::InvalidPort(var)),
    }
}

impl BackendConfig {
    fn from_env() -> Self {
        let mut cfg = Self {
            host: "localhost".to_string(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            database: "chat".to_string(),
            flush_on_start: false,
        };

        if let Ok(val) = env::var("DB_HOST") {
            cfg.host = val;
        }
        if let Ok(val) = env::var("DB_PORT")
            && let Ok(n) = val.parse::<u16>()
        {
            cfg.port = n;
        }
        if let Ok(val) = env::var("DB_USER") {
            cfg.user = val;
        }
        if let Ok(val) = env::var("DB_PASSWORD") {
            cfg.password = val;
        }
        if let Ok(val) = env::var("DB_DATABASE") {
            cfg.database = val;
        }
        if let Ok(val) = env::var("DB_FLUSH_ON_START") {
            cfg.flush_on_start = val == "true" || val == "1";
        }

        cfg
    }

    pub fn postgres_dsn(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    pub fn redis_addr(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl KafkaConfig {
    fn from_env() -> Self {
        Self {
            broker: env::var("KAFKA_BROKER_0").unwrap_or_else(|_| "localhost:9092".to_string()),
            topic: env::var("KAFKA_TOPIC").unwrap_or_else(|_| "chat-created".to_string()),
            consumer_group: env::var("KAFKA_CONSUMER_GROUP")
                .unwrap_or_else(|_| "ephemeral-chat-webhook".to_string()),
        }
    }
}

impl WebhookConfig {
    fn from_env() -> Self {
        let mut max_retries = 3u32;
        if let Ok(val) = env::var("WEBHOOK_MAX_RETRIES")
            && let Ok(n) = val.parse::<u32>()
        {
            max_retries = n;
        }
        let mut timeout_secs = 5u64;
        if let Ok(val) = env::var("WEBHOOK_TIMEOUT")
            && let Ok(n) = val.parse::<u64>()
        {
            timeout_secs = n;
        }

        Self {
            method: env::var("WEBHOOK_METHOD").unwrap_or_else(|_| "POST".to_string()),
            url: env::var("WEBHOOK_URL").unwrap_or_else(|_| "http://localhost:8081/hook".to_string()),
            max_retries: max_retries.max(1),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl From<WebhookConfig> for crate::webhook::WebhookConfig {
    fn from(cfg: WebhookConfig) -> Self {
        crate::webhook::WebhookConfig {
            method: cfg.method,
            url: cfg.url,
            max_retries: cfg.max_retries,
            timeout: cfg.timeout,
        }
    }
}
