//! Published version listing
//!
//! Walks the bucket listing page by page, classifies every key against the
//! naming convention, and accumulates the complete result set. Pages are
//! fetched strictly sequentially since each fetch needs the previous
//! page's continuation marker.

use crate::core::artifact::{classify_key, KeyClass};
use crate::core::error::{PublishError, StoreError};
use crate::core::traits::ObjectStore;
use chrono::{DateTime, Utc};

/// One published version of the queried package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub key: String,
    pub version: String,
    pub last_modified: DateTime<Utc>,
}

/// Complete listing result for one package
#[derive(Debug, Clone, Default)]
pub struct VersionListing {
    /// Matched versions in page-arrival order
    pub versions: Vec<PublishedVersion>,

    /// Keys that do not follow the naming convention. Reported to the
    /// caller instead of aborting the listing or being silently dropped.
    pub malformed: Vec<String>,
}

/// Paginated, filtered lister over a storage backend
pub struct VersionLister<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
}

impl<'a> VersionLister<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str) -> Self {
        Self { store, bucket }
    }

    /// Collect every published version of `package_name` across all pages
    pub async fn list(&self, package_name: &str) -> Result<VersionListing, PublishError> {
        let mut listing = VersionListing::default();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .store
                .list_objects(self.bucket, marker.as_deref())
                .await
                .map_err(|source| PublishError::Backend {
                    operation: "list_objects",
                    source,
                })?;

            let last_key = page.objects.last().map(|o| o.key.clone());

            for object in page.objects {
                match classify_key(&object.key, package_name) {
                    KeyClass::Matched { version, .. } => {
                        listing.versions.push(PublishedVersion {
                            key: object.key,
                            version,
                            last_modified: object.last_modified,
                        });
                    }
                    KeyClass::Ignored => {}
                    KeyClass::Malformed => listing.malformed.push(object.key),
                }
            }

            if !page.is_truncated {
                break;
            }

            // list-objects v1 may truncate without a NextMarker; the last
            // key of the page is the marker in that case. The marker must
            // advance, or the same page would be fetched forever.
            let next = page.next_marker.or(last_key);
            match next {
                Some(next) if marker.as_deref() != Some(next.as_str()) => {
                    marker = Some(next);
                }
                _ => {
                    return Err(PublishError::Backend {
                        operation: "list_objects",
                        source: StoreError::MalformedListing {
                            message: "truncated listing page without an advancing marker"
                                .to_string(),
                        },
                    });
                }
            }
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryObjectStore;

    async fn seeded_store(page_size: usize, keys: &[&str]) -> MemoryObjectStore {
        let store = MemoryObjectStore::with_page_size(page_size);
        for key in keys {
            store.insert(key, Utc::now()).await;
        }
        store
    }

    #[tokio::test]
    async fn test_union_across_pages_no_dupes_no_omissions() {
        // Pages of 2, 2, 1 entries
        let store = seeded_store(
            2,
            &[
                "demo-1.0.0.tgz",
                "demo-1.1.0.tgz",
                "demo-2.0.0.tgz",
                "demo-3.0.0.tgz",
                "demo-4.0.0.tgz",
            ],
        )
        .await;

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        let versions: Vec<&str> = listing.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0", "2.0.0", "3.0.0", "4.0.0"]);
        assert_eq!(store.list_calls().await, 3);
        assert!(listing.malformed.is_empty());
    }

    #[tokio::test]
    async fn test_terminates_on_single_page() {
        let store = seeded_store(1000, &["demo-1.0.0.tgz"]).await;

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        assert_eq!(listing.versions.len(), 1);
        assert_eq!(store.list_calls().await, 1);
    }

    #[tokio::test]
    async fn test_filters_other_packages() {
        let store = seeded_store(
            1000,
            &["demo-1.0.0.tgz", "demo-2.0.0.tgz", "other-1.0.0.tgz"],
        )
        .await;

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        let keys: Vec<&str> = listing.versions.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["demo-1.0.0.tgz", "demo-2.0.0.tgz"]);
    }

    #[tokio::test]
    async fn test_malformed_keys_reported_not_fatal() {
        let store = seeded_store(
            1000,
            &["demo-1.0.0.tgz", "junk.txt", "demo-2.0.0.tgz", "demo.tgz"],
        )
        .await;

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        assert_eq!(listing.versions.len(), 2);
        assert_eq!(
            listing.malformed,
            vec!["junk.txt".to_string(), "demo.tgz".to_string()]
        );
    }

    #[tokio::test]
    async fn test_truncation_without_marker_uses_last_key() {
        let store = MemoryObjectStore::with_page_size(2).without_next_marker();
        for key in ["demo-1.0.0.tgz", "demo-2.0.0.tgz", "demo-3.0.0.tgz"] {
            store.insert(key, Utc::now()).await;
        }

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        assert_eq!(listing.versions.len(), 3);
        assert_eq!(store.list_calls().await, 2);
    }

    #[tokio::test]
    async fn test_truncated_page_with_stuck_marker_is_an_error() {
        struct StallingStore;

        #[async_trait::async_trait]
        impl ObjectStore for StallingStore {
            async fn head_object(
                &self,
                _: &str,
                _: &str,
            ) -> Result<crate::core::Presence, crate::core::StoreError> {
                unreachable!()
            }

            async fn put_object(
                &self,
                _: &str,
                _: &str,
                _: crate::core::ObjectBody,
            ) -> Result<crate::core::PutReceipt, crate::core::StoreError> {
                unreachable!()
            }

            // Claims more pages exist but never supplies a way forward
            async fn list_objects(
                &self,
                _: &str,
                _: Option<&str>,
            ) -> Result<crate::core::ListPage, crate::core::StoreError> {
                Ok(crate::core::ListPage {
                    objects: vec![],
                    is_truncated: true,
                    next_marker: None,
                })
            }
        }

        let err = VersionLister::new(&StallingStore, "releases")
            .list("demo")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "BACKEND_FAILED");
        assert!(err.to_string().contains("advancing marker"));
    }

    #[tokio::test]
    async fn test_repeated_marker_terminates_with_error() {
        struct RepeatingStore;

        #[async_trait::async_trait]
        impl ObjectStore for RepeatingStore {
            async fn head_object(
                &self,
                _: &str,
                _: &str,
            ) -> Result<crate::core::Presence, crate::core::StoreError> {
                unreachable!()
            }

            async fn put_object(
                &self,
                _: &str,
                _: &str,
                _: crate::core::ObjectBody,
            ) -> Result<crate::core::PutReceipt, crate::core::StoreError> {
                unreachable!()
            }

            // Always serves the same truncated page with the same marker
            async fn list_objects(
                &self,
                _: &str,
                _: Option<&str>,
            ) -> Result<crate::core::ListPage, crate::core::StoreError> {
                Ok(crate::core::ListPage {
                    objects: vec![crate::core::RemoteObject {
                        key: "demo-1.0.0.tgz".to_string(),
                        last_modified: Utc::now(),
                    }],
                    is_truncated: true,
                    next_marker: Some("demo-1.0.0.tgz".to_string()),
                })
            }
        }

        let err = VersionLister::new(&RepeatingStore, "releases")
            .list("demo")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "BACKEND_FAILED");
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let store = MemoryObjectStore::new();

        let listing = VersionLister::new(&store, "releases")
            .list("demo")
            .await
            .unwrap();

        assert!(listing.versions.is_empty());
        assert!(listing.malformed.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl ObjectStore for FailingStore {
            async fn head_object(
                &self,
                _: &str,
                _: &str,
            ) -> Result<crate::core::Presence, crate::core::StoreError> {
                unreachable!()
            }

            async fn put_object(
                &self,
                _: &str,
                _: &str,
                _: crate::core::ObjectBody,
            ) -> Result<crate::core::PutReceipt, crate::core::StoreError> {
                unreachable!()
            }

            async fn list_objects(
                &self,
                _: &str,
                _: Option<&str>,
            ) -> Result<crate::core::ListPage, crate::core::StoreError> {
                Err(crate::core::StoreError::UnexpectedStatus {
                    operation: "list_objects",
                    status: 500,
                })
            }
        }

        let err = VersionLister::new(&FailingStore, "releases")
            .list("demo")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "BACKEND_FAILED");
    }
}
