//! Process configuration read once at startup and passed down explicitly.
//!
//! # Responsibility
//! - Resolve the connection string and pool tuning from environment keys.
//! - Parse `sqlite` connection strings into a concrete `StoreLocation`.
//!
//! # Invariants
//! - Nothing here is global; callers own the loaded `AppConfig` value.
//! - Missing keys fall back to defaults; malformed values are errors.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_URL_KEY: &str = "DATABASE_URL";
pub const POOL_RECYCLE_KEY: &str = "DATABASE_POOL_RECYCLE_SECS";
pub const POOL_SIZE_KEY: &str = "DATABASE_POOL_SIZE";
pub const POOL_PRE_PING_KEY: &str = "DATABASE_POOL_PRE_PING";
pub const LOG_LEVEL_KEY: &str = "MENAGERIE_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "MENAGERIE_LOG_DIR";

/// File-backed store next to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///mydatabase.db";
pub const DEFAULT_POOL_RECYCLE: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where a SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-process database, discarded with its last connection.
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// Parses a `sqlite:` connection string.
    ///
    /// Accepted forms:
    /// - `sqlite:///relative.db` and `sqlite://relative.db`
    /// - `sqlite:////absolute/path.db`
    /// - `sqlite:path.db`
    /// - `sqlite://`, `sqlite:///:memory:`, `sqlite::memory:` for in-memory stores
    ///
    /// A trailing query string is ignored.
    ///
    /// # Errors
    /// Returns a human-readable reason for empty input, a missing scheme or
    /// any scheme other than `sqlite`.
    pub fn parse(url: &str) -> Result<Self, String> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err("connection string is empty".to_string());
        }

        let Some((scheme, rest)) = trimmed.split_once(':') else {
            return Err("missing scheme; expected `sqlite:`".to_string());
        };
        if !scheme.eq_ignore_ascii_case("sqlite") {
            return Err(format!(
                "unsupported scheme `{scheme}`; only `sqlite` is supported"
            ));
        }

        let rest = rest.split_once('?').map_or(rest, |(path, _)| path);
        let path = match rest.strip_prefix("//") {
            Some(after_authority) => after_authority
                .strip_prefix('/')
                .unwrap_or(after_authority),
            None => rest,
        };

        if path.is_empty() || path == MEMORY_PATH {
            return Ok(Self::Memory);
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

/// Connection and pool settings for `Database::connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `sqlite:` connection string.
    pub url: String,
    /// Validate a pooled connection before handing it out.
    pub pool_pre_ping: bool,
    /// Maximum connection age before it is discarded and reopened.
    /// `None` keeps connections indefinitely.
    pub pool_recycle: Option<Duration>,
    /// Upper bound of pooled connections for file-backed stores.
    pub max_connections: u32,
    /// How long a checkout waits for a free connection.
    pub connection_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            pool_pre_ping: true,
            pool_recycle: Some(DEFAULT_POOL_RECYCLE),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

impl DatabaseConfig {
    /// Default settings with a custom connection string.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Settings for a private in-memory store.
    pub fn in_memory() -> Self {
        Self::new("sqlite://")
    }

    pub fn location(&self) -> Result<StoreLocation, String> {
        StoreLocation::parse(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Rolling log file directory; `None` logs to stderr.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Everything the entry point needs, loaded once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// absent or blank keys.
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` when a numeric or boolean key is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut database = DatabaseConfig::default();
        if let Some(url) = read(DATABASE_URL_KEY) {
            database.url = url;
        }
        if let Some(value) = read(POOL_RECYCLE_KEY) {
            let secs = parse_number::<u64>(POOL_RECYCLE_KEY, &value)?;
            database.pool_recycle = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(value) = read(POOL_SIZE_KEY) {
            let size = parse_number::<u32>(POOL_SIZE_KEY, &value)?;
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    key: POOL_SIZE_KEY,
                    value,
                    reason: "pool size must be at least 1".to_string(),
                });
            }
            database.max_connections = size;
        }
        if let Some(value) = read(POOL_PRE_PING_KEY) {
            database.pool_pre_ping = parse_flag(POOL_PRE_PING_KEY, &value)?;
        }

        let mut log = LogConfig::default();
        if let Some(level) = read(LOG_LEVEL_KEY) {
            log.level = level;
        }
        log.dir = read(LOG_DIR_KEY).map(PathBuf::from);

        Ok(Self { database, log })
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    value.parse::<T>().map_err(|err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true|false".to_string(),
        }),
    }
}
