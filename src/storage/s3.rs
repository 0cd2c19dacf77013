//! Thin S3 HTTP client
//!
//! Speaks to a public S3 (or S3-compatible) bucket over plain HTTP:
//! virtual-host URLs against AWS, path-style URLs when an endpoint
//! override is configured (MinIO, LocalStack). Listing uses the
//! list-objects v1 marker protocol. Credentials and request signing are
//! intentionally out of scope.

use crate::core::config::PublisherConfig;
use crate::core::error::StoreError;
use crate::core::traits::{ListPage, ObjectBody, ObjectStore, Presence, PutReceipt, RemoteObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref CONTENTS_RE: Regex = Regex::new(r"(?s)<Contents>(.*?)</Contents>").unwrap();
    static ref KEY_RE: Regex = Regex::new(r"<Key>([^<]*)</Key>").unwrap();
    static ref LAST_MODIFIED_RE: Regex =
        Regex::new(r"<LastModified>([^<]*)</LastModified>").unwrap();
    static ref IS_TRUNCATED_RE: Regex =
        Regex::new(r"<IsTruncated>(true|false)</IsTruncated>").unwrap();
    static ref NEXT_MARKER_RE: Regex = Regex::new(r"<NextMarker>([^<]*)</NextMarker>").unwrap();
}

/// S3-backed [`ObjectStore`] implementation
pub struct S3ObjectStore {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    /// Build a client from publisher configuration (endpoint override and
    /// per-request timeout)
    pub fn new(config: &PublisherConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    fn bucket_url(&self, bucket: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.amazonaws.com", bucket),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}", self.bucket_url(bucket), key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Presence, StoreError> {
        let url = self.object_url(bucket, key);
        log::debug!("HEAD {}", url);

        let response = self.http.head(&url).send().await?;

        match response.status().as_u16() {
            200 => Ok(Presence::Present),
            404 => Ok(Presence::Absent),
            status => Err(StoreError::UnexpectedStatus {
                operation: "head_object",
                status,
            }),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody,
    ) -> Result<PutReceipt, StoreError> {
        let url = self.object_url(bucket, key);
        log::debug!("PUT {}", url);

        let response = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/gzip")
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                operation: "put_object",
                status: status.as_u16(),
            });
        }

        Ok(PutReceipt { location: url })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let url = self.bucket_url(bucket);
        log::debug!("GET {} marker={:?}", url, marker);

        let mut request = self.http.get(&url);
        if let Some(marker) = marker {
            request = request.query(&[("marker", marker)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                operation: "list_objects",
                status: status.as_u16(),
            });
        }

        let xml = response.text().await?;
        parse_list_page(&xml)
    }
}

/// Pull the fields this tool needs out of a ListBucketResult document.
///
/// The response is mined with anchored patterns rather than a full XML
/// parse; the four fields used here are flat and unambiguous within each
/// `<Contents>` block.
fn parse_list_page(xml: &str) -> Result<ListPage, StoreError> {
    let is_truncated = IS_TRUNCATED_RE
        .captures(xml)
        .map(|caps| &caps[1] == "true")
        .ok_or_else(|| StoreError::MalformedListing {
            message: "missing IsTruncated element".to_string(),
        })?;

    let mut objects = Vec::new();
    for block in CONTENTS_RE.captures_iter(xml) {
        let entry = &block[1];

        let key = KEY_RE
            .captures(entry)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| StoreError::MalformedListing {
                message: "listing entry without Key element".to_string(),
            })?;

        let raw_modified = LAST_MODIFIED_RE
            .captures(entry)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| StoreError::MalformedListing {
                message: format!("entry {} has no LastModified element", key),
            })?;

        let last_modified: DateTime<Utc> = raw_modified
            .parse::<DateTime<Utc>>()
            .map_err(|e| StoreError::MalformedListing {
                message: format!("entry {} has unparseable LastModified: {}", key, e),
            })?;

        objects.push(RemoteObject { key, last_modified });
    }

    let next_marker = NEXT_MARKER_RE.captures(xml).map(|caps| caps[1].to_string());

    Ok(ListPage {
        objects,
        is_truncated,
        next_marker,
    })
}
