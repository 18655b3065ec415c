//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Worker pool configuration.
    #[serde(default)]
    pub workers: WorkerConfig,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Delivery configuration.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which queue backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// Bounded in-process queue.
    Memory,
    /// Redis-backed queue shared across processes.
    Redis,
}

/// Queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue backend selection.
    #[serde(default = "default_backend")]
    pub backend: QueueBackend,
    /// Capacity of the in-process queue (ignored by the redis backend).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Redis connection settings (used when `backend = "redis"`).
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Redis connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Redis list key holding queued jobs.
    #[serde(default = "default_redis_key")]
    pub key: String,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers draining the queue.
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries before a job is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between retries, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

impl RetryConfig {
    /// The retry delay as a [`Duration`].
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// How delivery attempts are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Probabilistic in-process simulation.
    Simulated,
    /// Real SMTP delivery.
    Smtp,
}

/// Delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Delivery mode selection.
    #[serde(default = "default_delivery_mode")]
    pub mode: DeliveryMode,
    /// Success probability of the simulated sender (0.0 to 1.0).
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Simulated per-send latency, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// SMTP settings (used when `mode = "smtp"`).
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// SMTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay URL, e.g. `smtp://localhost:25`.
    #[serde(default = "default_smtp_url")]
    pub url: String,
    /// Envelope sender address.
    #[serde(default = "default_smtp_from")]
    pub from: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_backend() -> QueueBackend {
    QueueBackend::Memory
}

const fn default_capacity() -> usize {
    100
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_key() -> String {
    "mailroom:jobs".to_string()
}

const fn default_worker_count() -> usize {
    3
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_secs() -> u64 {
    5
}

const fn default_delivery_mode() -> DeliveryMode {
    DeliveryMode::Simulated
}

const fn default_success_rate() -> f64 {
    0.8
}

const fn default_latency_ms() -> u64 {
    1000
}

fn default_smtp_url() -> String {
    "smtp://localhost:25".to_string()
}

fn default_smtp_from() -> String {
    "mailroom@localhost".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            capacity: default_capacity(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key: default_redis_key(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: default_delivery_mode(),
            success_rate: default_success_rate(),
            latency_ms: default_latency_ms(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            url: default_smtp_url(),
            from: default_smtp_from(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MAILROOM_ENV`)
    /// 3. Environment variables with `MAILROOM` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("MAILROOM_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MAILROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MAILROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
