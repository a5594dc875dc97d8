use super::{
    join_url, validate_key, ObjectStorage, PutOptions, StorageError, StorageResult, StoredObject,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// An object held by [`MemoryStorage`], with the options it was written with
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub options: PutOptions,
}

/// In-process store, used for dry runs and tests
#[derive(Debug)]
pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<HashMap<(String, String), StoredBlob>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("memory://storage")
    }
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredBlob> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), StoredBlob>> {
        // A panic while holding the lock cannot leave the map half-written
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<StoredObject> {
        validate_key(bucket)?;
        validate_key(key)?;

        let mut objects = self.lock();
        let id = (bucket.to_string(), key.to_string());
        if !options.overwrite && objects.contains_key(&id) {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        objects.insert(
            id,
            StoredBlob {
                data,
                options: options.clone(),
            },
        );
        Ok(StoredObject {
            path: key.to_string(),
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        join_url(&self.base_url, bucket, key)
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> StorageResult<()> {
        let mut objects = self.lock();
        for key in keys {
            objects.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }
}
