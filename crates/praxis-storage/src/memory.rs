use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::store::{BoxFuture, ObjectStore, StoredObject};

/// In-process [`ObjectStore`] for tests and local runs.
///
/// Versions are a store-wide counter, so every write yields a fresh token.
#[derive(Default)]
pub struct MemoryObjectStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    objects: HashMap<String, StoredObject>,
    next_version: u64,
}

impl MemoryState {
    fn write(&mut self, key: &str, body: Vec<u8>) -> String {
        self.next_version += 1;
        let version = format!("v{}", self.next_version);
        self.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                version: version.clone(),
            },
        );
        version
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.state.lock().await.objects.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().await.objects.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .objects
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    key: key.to_string(),
                })
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move { Ok(self.state.lock().await.write(key, body)) })
    }

    fn put_if_match<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        expected_version: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let matches = state
                .objects
                .get(key)
                .map(|current| current.version == expected_version);
            match matches {
                Some(true) => Ok(state.write(key, body)),
                Some(false) => Err(StorageError::PreconditionFailed {
                    key: key.to_string(),
                }),
                None => Err(StorageError::NotFound {
                    key: key.to_string(),
                }),
            }
        })
    }

    fn put_if_absent<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.objects.contains_key(key) {
                return Err(StorageError::AlreadyExists {
                    key: key.to_string(),
                });
            }
            Ok(state.write(key, body))
        })
    }
}
