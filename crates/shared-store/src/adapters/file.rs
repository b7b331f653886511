//! File-backed key-value store.
//!
//! Persists the whole map to one binary file, rewritten through a temp file
//! and rename on every mutation.
//!
//! Format: `[key_len:u32 LE][key][value_len:u32 LE][value]...`

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::adapters::memory::{apply, scan};
use crate::errors::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore};

/// File-backed key-value store for durability without RocksDB.
#[derive(Debug)]
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file starts an empty store. A truncated or otherwise
    /// unreadable file is reported as corruption rather than discarded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = decode(&bytes).map_err(|message| KVStoreError::CorruptionError {
                    message: format!("{}: {}", path.display(), message),
                })?;
                tracing::info!(
                    path = %path.display(),
                    keys = data.len(),
                    "Loaded key-value store"
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No existing store file, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { data, path })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = encode(data)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Apply a mutation to a copy, persist it, then swap it in so a failed
    /// write leaves the in-memory view untouched.
    fn commit(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.data.clone();
        apply(&mut next, operations);
        self.save_to_file(&next)?;
        self.data = next;
        Ok(())
    }
}

fn encode(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<Vec<u8>, KVStoreError> {
    let mut bytes = Vec::new();
    for (key, value) in data {
        for part in [key, value] {
            let len = u32::try_from(part.len()).map_err(|_| KVStoreError::IOError {
                message: format!("entry of {} bytes exceeds the file format limit", part.len()),
            })?;
            bytes.extend_from_slice(&len.to_le_bytes());
            bytes.extend_from_slice(part);
        }
    }
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, String> {
    fn read_part<'a>(bytes: &'a [u8], cursor: &mut usize) -> Result<&'a [u8], String> {
        let header = bytes
            .get(*cursor..*cursor + 4)
            .ok_or_else(|| format!("truncated length header at offset {}", cursor))?;
        let mut len = [0u8; 4];
        len.copy_from_slice(header);
        let len = u32::from_le_bytes(len) as usize;
        *cursor += 4;

        let part = bytes
            .get(*cursor..*cursor + len)
            .ok_or_else(|| format!("truncated entry of {} bytes at offset {}", len, cursor))?;
        *cursor += len;
        Ok(part)
    }

    let mut data = BTreeMap::new();
    let mut cursor = 0;
    while cursor < bytes.len() {
        let key = read_part(bytes, &mut cursor)?.to_vec();
        let value = read_part(bytes, &mut cursor)?.to_vec();
        data.insert(key, value);
    }
    Ok(data)
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.commit(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        if !self.data.contains_key(key) {
            return Ok(());
        }
        self.commit(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if operations.is_empty() {
            return Ok(());
        }
        self.commit(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(scan(&self.data, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reopen_preserves_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.db");

        {
            let mut store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![
                    BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                    BatchOperation::put(b"b".to_vec(), Vec::new()),
                ])
                .unwrap();
            store.put(b"c", b"3").unwrap();
            store.delete(b"a").unwrap();
        }

        let store = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        assert_eq!(store.get(b"b").unwrap(), Some(Vec::new()));
        assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileBackedKVStore::open(dir.path().join("absent.db")).unwrap();
        assert!(store.prefix_scan(b"").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_file_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        {
            let mut store = FileBackedKVStore::open(&path).unwrap();
            store.put(b"key", b"value").unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let err = FileBackedKVStore::open(&path).unwrap_err();
        assert!(matches!(err, KVStoreError::CorruptionError { .. }));
    }
}
