//! In-memory storage backend for tests and local development.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{Storage, StorageError, StorageResult};

pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored objects. Test helper.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Content type recorded for a key, if stored. Test helper.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(self.public_url(key))
    }

    async fn download(&self, key: &str) -> StorageResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_download_delete() {
        let storage = MemoryStorage::new("https://cdn");

        let url = storage
            .put("videos/1-cat.mp4", Bytes::from_static(b"mp4"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn/videos/1-cat.mp4");
        assert_eq!(
            storage.download("videos/1-cat.mp4").await.unwrap(),
            Bytes::from_static(b"mp4")
        );
        assert_eq!(
            storage.content_type_of("videos/1-cat.mp4").as_deref(),
            Some("video/mp4")
        );

        storage.delete("videos/1-cat.mp4").await.unwrap();
        assert!(matches!(
            storage.download("videos/1-cat.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
