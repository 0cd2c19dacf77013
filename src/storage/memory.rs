//! In-memory object store
//!
//! Test double for the storage backend: keeps objects in insertion order,
//! serves marker-based pages of a configurable size, counts calls, and can
//! inject probe/write failures. Bucket names only affect the reported
//! object location; the store holds a single logical bucket.

use crate::core::error::StoreError;
use crate::core::traits::{ListPage, ObjectBody, ObjectStore, Presence, PutReceipt, RemoteObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    key: String,
    data: Vec<u8>,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: Vec<StoredObject>,
    head_calls: usize,
    put_calls: usize,
    list_calls: usize,
    fail_head: bool,
    fail_put: bool,
}

/// In-memory [`ObjectStore`] implementation
pub struct MemoryObjectStore {
    state: Mutex<State>,
    page_size: usize,
    omit_next_marker: bool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Store serving listing pages of at most `page_size` entries
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size,
            omit_next_marker: false,
        }
    }

    /// Truncated pages will report `next_marker: None`, as list-objects v1
    /// does without a delimiter
    pub fn without_next_marker(mut self) -> Self {
        self.omit_next_marker = true;
        self
    }

    /// Seed an object without going through `put_object`
    pub async fn insert(&self, key: &str, last_modified: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.objects.push(StoredObject {
            key: key.to_string(),
            data: Vec::new(),
            last_modified,
        });
    }

    /// Make every subsequent `head_object` fail
    pub async fn fail_head_requests(&self) {
        self.state.lock().await.fail_head = true;
    }

    /// Make every subsequent `put_object` fail
    pub async fn fail_put_requests(&self) {
        self.state.lock().await.fail_put = true;
    }

    /// Stored bytes for a key, if present
    pub async fn object_data(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state
            .objects
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.data.clone())
    }

    pub async fn stored_keys(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.objects.iter().map(|o| o.key.clone()).collect()
    }

    pub async fn head_calls(&self) -> usize {
        self.state.lock().await.head_calls
    }

    pub async fn put_calls(&self) -> usize {
        self.state.lock().await.put_calls
    }

    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head_object(&self, _bucket: &str, key: &str) -> Result<Presence, StoreError> {
        let mut state = self.state.lock().await;
        state.head_calls += 1;

        if state.fail_head {
            return Err(StoreError::UnexpectedStatus {
                operation: "head_object",
                status: 500,
            });
        }

        if state.objects.iter().any(|o| o.key == key) {
            Ok(Presence::Present)
        } else {
            Ok(Presence::Absent)
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: ObjectBody,
    ) -> Result<PutReceipt, StoreError> {
        {
            let mut state = self.state.lock().await;
            state.put_calls += 1;

            if state.fail_put {
                return Err(StoreError::UnexpectedStatus {
                    operation: "put_object",
                    status: 503,
                });
            }
        }

        // Drain the stream outside the lock so producer backpressure
        // cannot deadlock against other store calls
        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(StoreError::Body)?;
            data.extend_from_slice(&chunk);
        }

        let mut state = self.state.lock().await;
        state.objects.retain(|o| o.key != key);
        state.objects.push(StoredObject {
            key: key.to_string(),
            data,
            last_modified: Utc::now(),
        });

        Ok(PutReceipt {
            location: format!("memory://{}/{}", bucket, key),
        })
    }

    async fn list_objects(
        &self,
        _bucket: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let mut state = self.state.lock().await;
        state.list_calls += 1;

        let start = match marker {
            Some(marker) => state
                .objects
                .iter()
                .position(|o| o.key == marker)
                .map(|i| i + 1)
                .unwrap_or(state.objects.len()),
            None => 0,
        };

        let page: Vec<RemoteObject> = state.objects[start..]
            .iter()
            .take(self.page_size)
            .map(|o| RemoteObject {
                key: o.key.clone(),
                last_modified: o.last_modified,
            })
            .collect();

        let is_truncated = start + page.len() < state.objects.len();
        let next_marker = if is_truncated && !self.omit_next_marker {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            is_truncated,
            next_marker,
        })
    }
}
