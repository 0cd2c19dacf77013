//! Object-storage capability interface
//!
//! The publish and list workflows only ever touch the storage backend
//! through the [`ObjectStore`] trait: a metadata-only existence probe, a
//! single streaming object write, and marker-based listing. Concrete
//! backends live in `crate::storage`.

use crate::core::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

/// Streamed object body: chunks are produced incrementally so the upload
/// never materializes the whole payload in memory.
pub type ObjectBody = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Outcome of a metadata-only existence probe.
///
/// A transport or service failure is *not* a `Presence`; the probe returns
/// `Err(StoreError)` instead, so callers cannot mistake an outage for a
/// confirmed absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// Confirmation returned by a successful object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// Retrievable location of the stored object
    pub location: String,
}

/// One entry of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// One page of an object listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Entries in backend-provided order
    pub objects: Vec<RemoteObject>,

    /// Whether further pages remain
    pub is_truncated: bool,

    /// Continuation marker for the next page, when the backend supplies one
    pub next_marker: Option<String>,
}

/// Storage backend capability interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Probe whether an object exists, without fetching its body
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Presence, StoreError>;

    /// Write a single object from a streamed body
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody,
    ) -> Result<PutReceipt, StoreError>;

    /// Fetch one page of the bucket listing, starting after `marker`
    async fn list_objects(
        &self,
        bucket: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError>;
}
