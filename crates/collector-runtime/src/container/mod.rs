//! # Component Container
//!
//! Configuration plus the backends opened from it, handed to the runtime
//! as `Arc`s so tests can substitute their own.

pub mod components;
pub mod config;

pub use components::Components;
pub use config::{
    AppConfig, CacheConfig, CollectorConfig, ConfigError, FlushConfig, QueueConfig, RedisConfig,
    StorageConfig,
};
