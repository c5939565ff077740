//! Object storage stand-in.
//!
//! Uploads are kept in memory; public URLs point at a fixed set of travel
//! photos so covers render without a real bucket.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::error::{SdkError, SdkResult};

const PUBLIC_IMAGES: [&str; 5] = [
    "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1499856871940-a09627c6dcf6?auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1500835556837-99ac94a94552?auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1523906834658-6e24ef2386f9?auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1516483638261-f4dbaf036963?auto=format&fit=crop&w=1200&q=80",
];

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub path: String,
}

/// Entry point for bucket handles.
#[derive(Clone, Debug, Default)]
pub struct StorageClient {
    objects: Arc<RwLock<HashMap<(String, String), Bytes>>>,
    latency: Duration,
}

impl StorageClient {
    pub fn new(latency: Duration) -> Self {
        Self {
            objects: Arc::default(),
            latency,
        }
    }

    pub fn from(&self, bucket: impl Into<String>) -> Bucket {
        Bucket {
            name: bucket.into(),
            client: self.clone(),
        }
    }
}

/// Handle to one named bucket.
#[derive(Clone, Debug)]
pub struct Bucket {
    name: String,
    client: StorageClient,
}

impl Bucket {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `data` at `path`, replacing any previous object.
    pub async fn upload(&self, path: &str, data: impl Into<Bytes>) -> SdkResult<UploadedObject> {
        if !self.client.latency.is_zero() {
            tokio::time::sleep(self.client.latency).await;
        }
        let data = data.into();
        debug!(bucket = %self.name, path, bytes = data.len(), "object uploaded");
        self.client
            .objects
            .write()
            .map_err(|e| SdkError::LockPoisoned(e.to_string()))?
            .insert((self.name.clone(), path.to_string()), data);
        Ok(UploadedObject {
            path: path.to_string(),
        })
    }

    pub fn download(&self, path: &str) -> SdkResult<Option<Bytes>> {
        Ok(self
            .client
            .objects
            .read()
            .map_err(|e| SdkError::LockPoisoned(e.to_string()))?
            .get(&(self.name.clone(), path.to_string()))
            .cloned())
    }

    /// Public URL for `path`. The choice depends only on the path length in
    /// UTF-16 code units.
    pub fn get_public_url(&self, path: &str) -> String {
        PUBLIC_IMAGES[path.encode_utf16().count() % PUBLIC_IMAGES.len()].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_download() {
        let covers = StorageClient::default().from("trip-covers");
        let uploaded = covers.upload("t1/cover.jpg", Bytes::from_static(b"jpeg")).await.unwrap();
        assert_eq!(uploaded.path, "t1/cover.jpg");
        assert_eq!(covers.download("t1/cover.jpg").unwrap(), Some(Bytes::from_static(b"jpeg")));
        assert_eq!(covers.download("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn buckets_share_client_but_not_paths() {
        let storage = StorageClient::default();
        storage.from("a").upload("x", vec![1u8]).await.unwrap();
        assert!(storage.from("b").download("x").unwrap().is_none());
        assert!(storage.from("a").download("x").unwrap().is_some());
    }

    #[test]
    fn public_url_is_deterministic_by_length() {
        let bucket = StorageClient::default().from("trip-covers");
        assert_eq!(bucket.get_public_url("abcde"), PUBLIC_IMAGES[0]);
        assert_eq!(bucket.get_public_url("abc"), PUBLIC_IMAGES[3]);
        assert_eq!(bucket.get_public_url("xyz"), bucket.get_public_url("abc"));
    }

    #[test]
    fn public_url_counts_utf16_units() {
        let bucket = StorageClient::default().from("trip-covers");
        // 4 bytes, 3 UTF-16 units.
        assert_eq!(bucket.get_public_url("déj"), PUBLIC_IMAGES[3]);
        // 4 bytes, 2 UTF-16 units (one surrogate pair).
        assert_eq!(bucket.get_public_url("🗺"), PUBLIC_IMAGES[2]);
    }
}
