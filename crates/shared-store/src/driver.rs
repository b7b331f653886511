//! Driver selection by name.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::adapters::{FileBackedKVStore, InMemoryKVStore};
use crate::errors::KVStoreError;
use crate::ports::KeyValueStore;

/// Key-value backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDriver {
    Memory,
    File,
    RocksDb,
}

impl StoreDriver {
    /// Every driver name accepted by [`FromStr`].
    pub const NAMES: &'static [&'static str] = &["memory", "file", "rocksdb"];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreDriver::Memory => "memory",
            StoreDriver::File => "file",
            StoreDriver::RocksDb => "rocksdb",
        }
    }
}

impl fmt::Display for StoreDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreDriver {
    type Err = KVStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreDriver::Memory),
            "file" => Ok(StoreDriver::File),
            "rocksdb" => Ok(StoreDriver::RocksDb),
            other => Err(KVStoreError::UnknownDriver {
                name: other.to_string(),
                supported: Self::NAMES.join(", "),
            }),
        }
    }
}

/// Open the backend named by `driver` at `path` (ignored for `memory`).
pub fn open_store(driver: StoreDriver, path: &Path) -> Result<Box<dyn KeyValueStore>, KVStoreError> {
    match driver {
        StoreDriver::Memory => Ok(Box::new(InMemoryKVStore::new())),
        StoreDriver::File => Ok(Box::new(FileBackedKVStore::open(path)?)),
        #[cfg(feature = "rocksdb")]
        StoreDriver::RocksDb => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Ok(Box::new(crate::adapters::RocksDbStore::open_path(path)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        StoreDriver::RocksDb => Err(KVStoreError::DriverUnavailable(driver.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver_names() {
        assert_eq!("memory".parse::<StoreDriver>().unwrap(), StoreDriver::Memory);
        assert_eq!(" FILE ".parse::<StoreDriver>().unwrap(), StoreDriver::File);
        assert_eq!("rocksdb".parse::<StoreDriver>().unwrap(), StoreDriver::RocksDb);
    }

    #[test]
    fn test_unknown_driver_lists_supported() {
        let err = "sqlite".parse::<StoreDriver>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown store driver \"sqlite\" (supported: memory, file, rocksdb)"
        );
    }

    #[test]
    fn test_open_memory_store() {
        let mut store = open_store(StoreDriver::Memory, Path::new("unused")).unwrap();
        store.put(b"k", b"v").unwrap();
        assert!(store.exists(b"k").unwrap());
    }
}
