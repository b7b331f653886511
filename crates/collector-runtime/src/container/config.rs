//! # Collector Configuration
//!
//! Unified configuration for the gateway, backends and flush schedule, read
//! from environment variables with defaults.
//!
//! ## Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `APP_NAME` | `report-collector` |
//! | `APP_ENV` | `development` |
//! | `APP_HOST` | `0.0.0.0` |
//! | `APP_PORT` | `8080` |
//! | `MAX_BODY_BYTES` | `65536` |
//! | `ALLOWED_DOMAINS` | empty (any origin) |
//! | `STORAGE_DRIVER` | `file` |
//! | `STORAGE_PATH` | `data/reports.db` |
//! | `CACHE_ENABLED` | `false` |
//! | `CACHE_DRIVER` | `file` |
//! | `FILE_CACHE_DIR` | `cache` |
//! | `CACHE_TTL_SECONDS` | `3600` |
//! | `CACHE_PURGE_INTERVAL_SECONDS` | `300` |
//! | `QUEUE_ENABLED` | `true` |
//! | `QUEUE_DRIVER` | `memory` |
//! | `QUEUE_NAME` | `reports` |
//! | `QUEUE_PATH` | `data/queue.db` |
//! | `BATCH_FLUSH_INTERVAL_MINUTES` | `15` |
//! | `BATCH_FLUSH_BATCH_SIZE` | `100` |
//! | `BATCH_FLUSH_DRAIN_ON_SHUTDOWN` | `true` |
//! | `REDIS_URL` | built from the three below |
//! | `REDIS_ADDR` | `localhost:6379` |
//! | `REDIS_PASSWORD` | empty |
//! | `REDIS_DB` | `0` |
//! | `MEMCACHED_SERVERS` | `localhost:11211` |
//!
//! A variable that is set but does not parse is an error, not a silent
//! fallback to the default.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rc_01_report_queue::{QueueDriver, QueueOptions};
use rc_03_report_cache::{CacheDriver, CacheOptions};
use rc_05_api_gateway::GatewayConfig;
use shared_store::StoreDriver;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set to a value of the wrong shape.
    #[error("{key}={value:?} is not a valid {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A driver name is not supported by this build.
    #[error("Unknown {kind} driver '{name}' (supported: {supported})")]
    UnknownDriver {
        kind: &'static str,
        name: String,
        supported: String,
    },

    /// A value parsed but is out of range.
    #[error("{0}")]
    OutOfRange(String),

    /// The gateway section failed its own validation.
    #[error("Gateway configuration: {0}")]
    Gateway(String),
}

/// Longest accepted flush interval.
pub const MAX_FLUSH_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest accepted cache purge interval.
pub const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Complete collector configuration.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// Application identity.
    pub app: AppConfig,
    /// HTTP gateway.
    pub gateway: GatewayConfig,
    /// Report storage.
    pub storage: StorageConfig,
    /// Direct-path cache and buffering switch.
    pub cache: CacheConfig,
    /// Buffer queue.
    pub queue: QueueConfig,
    /// Flush schedule.
    pub flush: FlushConfig,
    /// Shared Redis server for the `redis` queue and cache drivers.
    pub redis: RedisConfig,
}

/// Application identity.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "report-collector".to_string(),
            env: "development".to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend name: `file`, `memory` or `rocksdb`.
    pub driver: String,
    /// Store file or directory.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: "file".to_string(),
            path: PathBuf::from("data/reports.db"),
        }
    }
}

impl StorageConfig {
    pub fn driver(&self) -> Result<StoreDriver, ConfigError> {
        parse_driver("storage", &self.driver, StoreDriver::NAMES)
    }
}

/// Cache configuration.
///
/// `enabled` switches intake into buffering mode: reports go through the
/// queue when one is configured, else through the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Backend name: `file`, `memory`, `redis` or `memcached`.
    pub driver: String,
    /// Directory for the `file` driver.
    pub dir: PathBuf,
    /// Lifetime of a "recently seen" marker.
    pub ttl: Duration,
    /// How often expired markers are swept from local backends.
    pub purge_interval: Duration,
    /// `host:port` list for the `memcached` driver.
    pub memcached_servers: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            driver: "file".to_string(),
            dir: PathBuf::from("cache"),
            ttl: Duration::from_secs(3600),
            purge_interval: Duration::from_secs(300),
            memcached_servers: vec!["localhost:11211".to_string()],
        }
    }
}

impl CacheConfig {
    pub fn driver(&self) -> Result<CacheDriver, ConfigError> {
        parse_driver("cache", &self.driver, CacheDriver::NAMES)
    }
}

/// Queue configuration. Only used when the cache is enabled.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub enabled: bool,
    /// Backend name: `memory`, `file`, `rocksdb` or `redis`.
    pub driver: String,
    /// Queue name, part of every persistent key.
    pub name: String,
    /// Store path for persistent drivers.
    pub path: PathBuf,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            driver: "memory".to_string(),
            name: "reports".to_string(),
            path: PathBuf::from("data/queue.db"),
        }
    }
}

impl QueueConfig {
    pub fn driver(&self) -> Result<QueueDriver, ConfigError> {
        parse_driver("queue", &self.driver, QueueDriver::NAMES)
    }
}

/// Redis connection.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Full connection URL. Overrides the other fields when set.
    pub url: Option<String>,
    pub addr: String,
    pub password: String,
    pub db: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            addr: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
        }
    }
}

impl RedisConfig {
    /// `redis://[:password@]addr/db`, or `url` when set.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        if self.password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!(
                "redis://:{}@{}/{}",
                percent_encode(&self.password),
                self.addr,
                self.db
            )
        }
    }
}

/// Encode everything outside the URL unreserved set.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Flush schedule configuration.
#[derive(Debug, Clone)]
pub struct FlushConfig {
    pub interval: Duration,
    pub batch_size: usize,
    /// Drain the queue into storage before exiting.
    pub drain_on_shutdown: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            batch_size: 100,
            drain_on_shutdown: true,
        }
    }
}

impl CollectorConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let app = AppConfig {
            name: env.string("APP_NAME", &defaults.app.name),
            env: env.string("APP_ENV", &defaults.app.env),
        };

        let gateway = GatewayConfig {
            host: env.parsed("APP_HOST", defaults.gateway.host, "IP address")?,
            port: env.parsed("APP_PORT", defaults.gateway.port, "port number")?,
            max_body_bytes: env.parsed(
                "MAX_BODY_BYTES",
                defaults.gateway.max_body_bytes,
                "byte count",
            )?,
            allowed_domains: env.list("ALLOWED_DOMAINS"),
            ..defaults.gateway
        };

        let storage = StorageConfig {
            driver: env.string("STORAGE_DRIVER", &defaults.storage.driver),
            path: env.path("STORAGE_PATH", defaults.storage.path),
        };

        let cache = CacheConfig {
            enabled: env.flag("CACHE_ENABLED", defaults.cache.enabled)?,
            driver: env.string("CACHE_DRIVER", &defaults.cache.driver),
            dir: env.path("FILE_CACHE_DIR", defaults.cache.dir),
            ttl: Duration::from_secs(env.parsed(
                "CACHE_TTL_SECONDS",
                defaults.cache.ttl.as_secs(),
                "number of seconds",
            )?),
            purge_interval: Duration::from_secs(env.parsed(
                "CACHE_PURGE_INTERVAL_SECONDS",
                defaults.cache.purge_interval.as_secs(),
                "number of seconds",
            )?),
            memcached_servers: env
                .get("MEMCACHED_SERVERS")
                .map(|_| env.list("MEMCACHED_SERVERS"))
                .unwrap_or(defaults.cache.memcached_servers),
        };

        let queue = QueueConfig {
            enabled: env.flag("QUEUE_ENABLED", defaults.queue.enabled)?,
            driver: env.string("QUEUE_DRIVER", &defaults.queue.driver),
            name: env.string("QUEUE_NAME", &defaults.queue.name),
            path: env.path("QUEUE_PATH", defaults.queue.path),
        };

        let interval_minutes: u64 = env.parsed(
            "BATCH_FLUSH_INTERVAL_MINUTES",
            defaults.flush.interval.as_secs() / 60,
            "number of minutes",
        )?;
        let interval_secs = interval_minutes.checked_mul(60).ok_or_else(|| {
            ConfigError::OutOfRange(format!(
                "BATCH_FLUSH_INTERVAL_MINUTES={interval_minutes} is too large"
            ))
        })?;

        let flush = FlushConfig {
            interval: Duration::from_secs(interval_secs),
            batch_size: env.parsed(
                "BATCH_FLUSH_BATCH_SIZE",
                defaults.flush.batch_size,
                "batch size",
            )?,
            drain_on_shutdown: env.flag(
                "BATCH_FLUSH_DRAIN_ON_SHUTDOWN",
                defaults.flush.drain_on_shutdown,
            )?,
        };

        let redis = RedisConfig {
            url: env.get("REDIS_URL").filter(|url| !url.trim().is_empty()),
            addr: env.string("REDIS_ADDR", &defaults.redis.addr),
            password: env.string("REDIS_PASSWORD", &defaults.redis.password),
            db: env.parsed("REDIS_DB", defaults.redis.db, "database number")?,
        };

        Ok(Self {
            app,
            gateway,
            storage,
            cache,
            queue,
            flush,
            redis,
        })
    }

    /// Whether intake buffers through the queue and a flusher runs.
    pub fn buffering_with_queue(&self) -> bool {
        self.cache.enabled && self.queue.enabled
    }

    /// Whether intake consults the cache (buffering on, no queue).
    pub fn uses_cache(&self) -> bool {
        self.cache.enabled && !self.queue.enabled
    }

    /// Backend locations for `open_cache`.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            dir: self.cache.dir.clone(),
            redis_url: self.redis.connection_url(),
            memcached_servers: self.cache.memcached_servers.clone(),
        }
    }

    /// Backend locations for `open_queue`.
    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            name: self.queue.name.clone(),
            path: self.queue.path.clone(),
            redis_url: self.redis.connection_url(),
        }
    }

    /// Check ranges and driver names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway
            .validate()
            .map_err(|e| ConfigError::Gateway(e.to_string()))?;

        self.storage.driver()?;
        self.cache.driver()?;
        self.queue.driver()?;

        if self.cache.ttl.is_zero() {
            return Err(ConfigError::OutOfRange(
                "CACHE_TTL_SECONDS must be greater than 0".into(),
            ));
        }
        if self.cache.purge_interval.is_zero() || self.cache.purge_interval > MAX_PURGE_INTERVAL {
            return Err(ConfigError::OutOfRange(format!(
                "CACHE_PURGE_INTERVAL_SECONDS must be between 1 and {}",
                MAX_PURGE_INTERVAL.as_secs()
            )));
        }
        if self.flush.interval.is_zero() || self.flush.interval > MAX_FLUSH_INTERVAL {
            return Err(ConfigError::OutOfRange(format!(
                "BATCH_FLUSH_INTERVAL_MINUTES must be between 1 and {}",
                MAX_FLUSH_INTERVAL.as_secs() / 60
            )));
        }
        if self.flush.batch_size == 0 {
            return Err(ConfigError::OutOfRange(
                "BATCH_FLUSH_BATCH_SIZE must be greater than 0".into(),
            ));
        }
        if self.queue.name.trim().is_empty() {
            return Err(ConfigError::OutOfRange("QUEUE_NAME cannot be empty".into()));
        }
        if self.buffering_with_queue() && self.queue_shares_storage_path()? {
            return Err(ConfigError::OutOfRange(format!(
                "QUEUE_PATH and STORAGE_PATH both point at {}",
                self.queue.path.display()
            )));
        }

        Ok(())
    }

    /// Two on-disk stores opened on one path overwrite each other.
    fn queue_shares_storage_path(&self) -> Result<bool, ConfigError> {
        let queue_on_disk = matches!(self.queue.driver()?, QueueDriver::File | QueueDriver::RocksDb);
        let storage_on_disk = matches!(self.storage.driver()?, StoreDriver::File | StoreDriver::RocksDb);
        Ok(queue_on_disk && storage_on_disk && self.queue.path == self.storage.path)
    }
}

fn parse_driver<D>(kind: &'static str, name: &str, supported: &[&str]) -> Result<D, ConfigError>
where
    D: FromStr,
{
    name.parse().map_err(|_| ConfigError::UnknownDriver {
        kind,
        name: name.to_string(),
        supported: supported.join(", "),
    })
}

/// Typed reads over a variable lookup.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn path(&self, key: &str, default: PathBuf) -> PathBuf {
        self.get(key).map(PathBuf::from).unwrap_or(default)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parsed<T: FromStr>(
        &self,
        key: &'static str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key,
                value,
                expected,
            }),
        }
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" => Ok(true),
                "0" | "f" | "false" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key,
                    value,
                    expected: "boolean",
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<CollectorConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CollectorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.app.name, "report-collector");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.max_body_bytes, 65536);
        assert!(config.gateway.allowed_domains.is_empty());
        assert_eq!(config.storage.driver().unwrap(), StoreDriver::File);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert!(config.queue.enabled);
        assert_eq!(config.queue.driver().unwrap(), QueueDriver::Memory);
        assert_eq!(config.flush.interval, Duration::from_secs(900));
        assert_eq!(config.flush.batch_size, 100);
        assert!(config.flush.drain_on_shutdown);
        assert!(!config.buffering_with_queue());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("APP_PORT", "9090"),
            ("ALLOWED_DOMAINS", "example.com, *.example.org,,"),
            ("STORAGE_DRIVER", "memory"),
            ("CACHE_ENABLED", "true"),
            ("CACHE_DRIVER", "memory"),
            ("CACHE_TTL_SECONDS", "60"),
            ("QUEUE_DRIVER", "file"),
            ("BATCH_FLUSH_INTERVAL_MINUTES", "1"),
            ("BATCH_FLUSH_BATCH_SIZE", "10"),
            ("BATCH_FLUSH_DRAIN_ON_SHUTDOWN", "0"),
        ])
        .unwrap();

        assert_eq!(config.gateway.port, 9090);
        assert_eq!(
            config.gateway.allowed_domains,
            vec!["example.com".to_string(), "*.example.org".to_string()]
        );
        assert_eq!(config.cache.driver().unwrap(), CacheDriver::Memory);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert_eq!(config.flush.interval, Duration::from_secs(60));
        assert_eq!(config.flush.batch_size, 10);
        assert!(!config.flush.drain_on_shutdown);
        assert!(config.buffering_with_queue());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_value_is_error() {
        let err = config(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "APP_PORT", .. }));

        let err = config(&[("CACHE_ENABLED", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "CACHE_ENABLED", .. }));
    }

    #[test]
    fn test_unknown_driver_lists_supported() {
        let config = config(&[("CACHE_DRIVER", "mongo")]).unwrap();
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::UnknownDriver {
                kind, supported, ..
            } => {
                assert_eq!(kind, "cache");
                assert_eq!(supported, "memory, file, redis, memcached");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_huge_flush_interval_is_error_not_panic() {
        let huge = u64::MAX.to_string();
        let err = config(&[("BATCH_FLUSH_INTERVAL_MINUTES", huge.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange(_)));

        let config = config(&[("BATCH_FLUSH_INTERVAL_MINUTES", "10081")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn test_purge_interval_bounds() {
        let config = config(&[("CACHE_PURGE_INTERVAL_SECONDS", "90000")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn test_queue_path_clash_with_storage_rejected() {
        let clash = [
            ("CACHE_ENABLED", "true"),
            ("QUEUE_DRIVER", "file"),
            ("QUEUE_PATH", "data/shared.db"),
            ("STORAGE_PATH", "data/shared.db"),
        ];
        let err = config(&clash).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("data/shared.db"), "{err}");

        // In-memory queue, or no queue at all, has no file to clash with.
        let mut vars = clash.to_vec();
        vars.push(("QUEUE_DRIVER", "memory"));
        assert!(config(&vars).unwrap().validate().is_ok());

        let mut vars = clash.to_vec();
        vars.push(("CACHE_ENABLED", "false"));
        assert!(config(&vars).unwrap().validate().is_ok());
    }

    #[test]
    fn test_redis_connection_url() {
        let defaults = config(&[]).unwrap();
        assert_eq!(defaults.redis.connection_url(), "redis://localhost:6379/0");

        let parts = config(&[
            ("REDIS_ADDR", "cache.internal:6380"),
            ("REDIS_PASSWORD", "p@ss word"),
            ("REDIS_DB", "2"),
        ])
        .unwrap();
        assert_eq!(
            parts.redis.connection_url(),
            "redis://:p%40ss%20word@cache.internal:6380/2"
        );
        assert_eq!(parts.queue_options().redis_url, parts.redis.connection_url());

        let explicit =
            config(&[("REDIS_URL", "rediss://r.example:6379/1"), ("REDIS_DB", "5")]).unwrap();
        assert_eq!(explicit.cache_options().redis_url, "rediss://r.example:6379/1");
    }

    #[test]
    fn test_memcached_servers() {
        assert_eq!(
            config(&[]).unwrap().cache.memcached_servers,
            vec!["localhost:11211".to_string()]
        );
        let listed = config(&[("MEMCACHED_SERVERS", "a:11211, b:11211")]).unwrap();
        assert_eq!(
            listed.cache_options().memcached_servers,
            vec!["a:11211".to_string(), "b:11211".to_string()]
        );
    }

    #[test]
    fn test_zero_values_rejected() {
        for (key, value) in [
            ("BATCH_FLUSH_BATCH_SIZE", "0"),
            ("BATCH_FLUSH_INTERVAL_MINUTES", "0"),
            ("CACHE_TTL_SECONDS", "0"),
        ] {
            let config = config(&[(key, value)]).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::OutOfRange(_))),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn test_bad_domain_pattern_rejected() {
        let config = config(&[("ALLOWED_DOMAINS", "ok.example.com,bad..example.com")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Gateway(_))));
    }
}
