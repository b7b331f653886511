//! Cache backends.

mod file;
#[cfg(feature = "memcached")]
mod memcached;
mod memory;
mod noop;
#[cfg(feature = "redis")]
mod redis;

pub use file::FileCache;
#[cfg(feature = "memcached")]
pub use memcached::MemcachedCache;
pub use memory::InMemoryCache;
pub use noop::NoOpCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;
