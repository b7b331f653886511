//! Queue backends.

mod memory;
mod persistent;
#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryQueue;
pub use persistent::PersistentQueue;
#[cfg(feature = "redis")]
pub use self::redis::RedisQueue;
